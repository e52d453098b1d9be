// End-to-end export scenarios across dialects.

use camkit_core::error::CamError;
use camkit_core::request::ToolpathRequest;
use camkit_core::types::CancelToken;
use camkit_post::{generate_program, ApproveAll};

fn rect_request(post_id: &str) -> ToolpathRequest {
    serde_json::from_value(serde_json::json!({
        "loops": [{"pts": [[0.0, 0.0], [100.0, 0.0], [100.0, 60.0], [0.0, 60.0]]}],
        "tool_d": 6.0,
        "stepover": 0.45,
        "stepdown": 1.5,
        "feed_xy": 1200.0,
        "feed_z": 300.0,
        "safe_z": 5.0,
        "z_rough": -3.0,
        "post_id": post_id
    }))
    .unwrap()
}

#[test]
fn test_rectangle_grbl_export() -> anyhow::Result<()> {
    let program = generate_program(&rect_request("grbl"), &ApproveAll, &CancelToken::new())?;

    assert_eq!(program.passes.len(), 2);

    let lines: Vec<&str> = program.gcode.lines().collect();
    assert_eq!(lines[0], "G21");
    assert_eq!(lines[1], "G90");
    assert_eq!(lines[2], "G17");

    let spindle_on = lines.iter().filter(|l| l.starts_with("M3 S16000")).count();
    assert_eq!(spindle_on, 1);
    assert_eq!(*lines.last().unwrap(), "M30");
    Ok(())
}

#[test]
fn test_island_excluded_from_path() {
    let request: ToolpathRequest = serde_json::from_value(serde_json::json!({
        "loops": [
            {"pts": [[0.0, 0.0], [100.0, 0.0], [100.0, 60.0], [0.0, 60.0]]},
            {"pts": [[40.0, 20.0], [60.0, 20.0], [60.0, 40.0], [40.0, 40.0]]}
        ],
        "tool_d": 6.0,
        "stepover": 0.45,
        "stepdown": 1.5,
        "feed_xy": 1200.0,
        "feed_z": 300.0,
        "safe_z": 5.0,
        "z_rough": -3.0,
        "post_id": "grbl"
    }))
    .unwrap();
    let program = generate_program(&request, &ApproveAll, &CancelToken::new()).unwrap();

    // No cutting endpoint may land inside the island's offset boundary
    // (island grown by the 3 mm tool radius).
    let tol = 1e-6;
    for pass in &program.passes {
        for seg in pass.segments.iter().filter(|s| s.kind.is_cutting()) {
            for p in [&seg.start, &seg.end] {
                let inside = p.x > 37.0 + tol
                    && p.x < 63.0 - tol
                    && p.y > 17.0 + tol
                    && p.y < 43.0 - tol;
                assert!(!inside, "cut endpoint inside island boundary: ({}, {})", p.x, p.y);
            }
        }
    }
}

#[test]
fn test_linuxcnc_ends_m2() -> anyhow::Result<()> {
    let program =
        generate_program(&rect_request("linuxcnc"), &ApproveAll, &CancelToken::new())?;
    let last = program.gcode.lines().last().unwrap();
    assert_eq!(last, "M2");
    assert!(!program.gcode.contains("M30"));
    Ok(())
}

#[test]
fn test_oversized_tool_rejected() {
    let request: ToolpathRequest = serde_json::from_value(serde_json::json!({
        "loops": [{"pts": [[0.0, 0.0], [40.0, 0.0], [40.0, 5.0], [0.0, 5.0]]}],
        "tool_d": 6.0,
        "stepover": 0.45,
        "stepdown": 1.5,
        "feed_xy": 1200.0,
        "feed_z": 300.0,
        "safe_z": 5.0,
        "z_rough": -3.0,
        "post_id": "grbl"
    }))
    .unwrap();
    let err = generate_program(&request, &ApproveAll, &CancelToken::new()).unwrap_err();
    assert!(matches!(err, CamError::Geometry(_)), "expected GeometryError, got {err:?}");
}

#[test]
fn test_byte_identical_output() {
    let a = generate_program(&rect_request("grbl"), &ApproveAll, &CancelToken::new())
        .unwrap();
    let b = generate_program(&rect_request("grbl"), &ApproveAll, &CancelToken::new())
        .unwrap();
    assert_eq!(a.gcode, b.gcode);
}

#[test]
fn test_cutting_move_ratio_in_text() {
    let program = generate_program(&rect_request("grbl"), &ApproveAll, &CancelToken::new())
        .unwrap();
    let mut cutting = 0usize;
    let mut rapid = 0usize;
    for line in program.gcode.lines() {
        if line.starts_with("G1 X") || line.starts_with("G2") || line.starts_with("G3") {
            cutting += 1;
        } else if line.starts_with("G0") {
            rapid += 1;
        }
    }
    assert!(cutting > 0);
    let ratio = cutting as f64 / (cutting + rapid) as f64;
    assert!(ratio >= 0.9, "cutting move ratio {} below 0.9", ratio);
}

#[test]
fn test_all_dialects_render() {
    for post_id in ["grbl", "mach4", "linuxcnc", "pathpilot", "masso", "fanuc"] {
        let program = generate_program(&rect_request(post_id), &ApproveAll, &CancelToken::new())
            .unwrap_or_else(|e| panic!("{post_id} failed: {e}"));
        assert!(program.gcode.contains("M3 S16000"), "{post_id} missing spindle-on");
        assert!(program.gcode.contains("M5"), "{post_id} missing spindle-off");
    }
}

#[test]
fn test_fanuc_program_wrap() {
    let program = generate_program(&rect_request("fanuc"), &ApproveAll, &CancelToken::new())
        .unwrap();
    let lines: Vec<&str> = program.gcode.lines().collect();
    assert_eq!(lines[0], "%");
    assert_eq!(lines[1], "O1000");
    assert_eq!(*lines.last().unwrap(), "%");
    assert_eq!(lines[lines.len() - 2], "M30");
}

#[test]
fn test_blending_dialect_estimates_faster() {
    let grbl = generate_program(&rect_request("grbl"), &ApproveAll, &CancelToken::new())
        .unwrap();
    let lcnc = generate_program(&rect_request("linuxcnc"), &ApproveAll, &CancelToken::new())
        .unwrap();
    assert!(lcnc.estimate.seconds < grbl.estimate.seconds);
}

#[test]
fn test_cancellation_propagates() {
    let cancel = CancelToken::new();
    cancel.cancel();
    let err = generate_program(&rect_request("grbl"), &ApproveAll, &cancel).unwrap_err();
    assert!(matches!(err, CamError::Cancelled));
}
