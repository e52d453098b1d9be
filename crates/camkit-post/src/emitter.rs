//! G-code text emission.
//!
//! Walks the scheduled passes and renders controller-specific G-code. The
//! emitter is a three-phase state machine (header, body, footer); phases
//! always run in order and the footer is emitted exactly once. Coordinates
//! are formatted at three decimals and feeds at whole units, with modal
//! feed suppression keyed on the formatted value so output is byte-stable.

use crate::profile::{CommentStyle, MachineProfile};
use camkit_core::error::EmitError;
use camkit_toolpath::{MoveKind, Pass, Segment};
use std::f64::consts::PI;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Header,
    Body,
    Footer,
}

pub struct Emitter<'a> {
    profile: &'a MachineProfile,
    safe_z: f64,
    phase: Phase,
    out: String,
    /// Last emitted F word, formatted. Modal comparison happens on the
    /// rendered text, not the float, so rounding can never desync it.
    last_feed: Option<String>,
    current_z: f64,
}

impl<'a> Emitter<'a> {
    pub fn new(profile: &'a MachineProfile, safe_z: f64) -> Self {
        Self {
            profile,
            safe_z,
            phase: Phase::Header,
            out: String::new(),
            last_feed: None,
            current_z: safe_z,
        }
    }

    /// Renders the complete program.
    pub fn emit(mut self, passes: &[Pass]) -> Result<String, EmitError> {
        self.header();
        self.phase = Phase::Body;
        for (i, pass) in passes.iter().enumerate() {
            self.pass_comment(i + 1, passes.len(), pass.z);
            for seg in &pass.segments {
                self.segment(seg);
            }
        }
        self.phase = Phase::Footer;
        self.footer();
        debug!(
            bytes = self.out.len(),
            dialect = %self.profile.dialect,
            "program emitted"
        );
        Ok(self.out)
    }

    fn line(&mut self, text: &str) {
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn comment(&mut self, text: &str) {
        let rendered = self.profile.comment_style.render(text);
        self.line(&rendered);
    }

    fn header(&mut self) {
        debug_assert_eq!(self.phase, Phase::Header);
        if let Some(o) = self.profile.program_number {
            self.line("%");
            self.line(&format!("O{:04}", o));
        }
        self.line("G21");
        self.line("G90");
        self.line("G17");
        self.comment(&format!("{} pocket roughing", self.profile.dialect));
        self.comment(&format!("T{}", self.profile.tool_id));
        self.line(&format!("M3 S{}", self.profile.spindle_rpm));
        if let Some(dwell) = self.profile.spindle_dwell {
            self.line(&format!("G4 P{:.1}", dwell));
        }
        self.line(&format!("G0 Z{:.3}", self.safe_z));
        self.current_z = self.safe_z;
    }

    fn pass_comment(&mut self, index: usize, total: usize, z: f64) {
        self.comment(&format!("pass {}/{} z={:.3}", index, total, z));
    }

    fn footer(&mut self) {
        debug_assert_eq!(self.phase, Phase::Footer);
        self.line(&format!("G0 Z{:.3}", self.safe_z));
        self.line("M5");
        self.line(self.profile.program_end);
        if self.profile.program_number.is_some() {
            self.line("%");
        }
    }

    fn segment(&mut self, seg: &Segment) {
        debug_assert_eq!(self.phase, Phase::Body);
        match seg.kind {
            MoveKind::RapidRetract => {
                if (self.current_z - seg.z).abs() > 1e-9 {
                    self.line(&format!("G0 Z{:.3}", seg.z));
                    self.current_z = seg.z;
                }
            }
            MoveKind::RapidTraverse => {
                self.line(&format!("G0 X{:.3} Y{:.3}", seg.end.x, seg.end.y));
            }
            MoveKind::LinearCut => {
                let xy_unchanged = seg.start.distance_to(&seg.end) < 1e-9;
                if xy_unchanged && (self.current_z - seg.z).abs() > 1e-9 {
                    // Plunge.
                    let feed = self.feed_word(seg.feed);
                    self.line(&format!("G1 Z{:.3}{}", seg.z, feed));
                    self.current_z = seg.z;
                } else if !xy_unchanged {
                    let feed = self.feed_word(seg.feed * seg.feed_scale);
                    self.line(&format!("G1 X{:.3} Y{:.3}{}", seg.end.x, seg.end.y, feed));
                }
            }
            MoveKind::ArcCw | MoveKind::ArcCcw => self.arc(seg),
        }
    }

    fn arc(&mut self, seg: &Segment) {
        let Some(center) = seg.center else {
            // Degenerate arc record, emit as a line rather than drop motion.
            let feed = self.feed_word(seg.feed * seg.feed_scale);
            self.line(&format!("G1 X{:.3} Y{:.3}{}", seg.end.x, seg.end.y, feed));
            return;
        };
        // Controllers disagree on full/reflex arc handling, so anything over
        // a half circle is split at its angular midpoint.
        if seg.sweep_angle() > PI + 1e-9 {
            let (first, second) = split_arc(seg, center);
            self.arc(&first);
            self.arc(&second);
            return;
        }
        let code = match seg.kind {
            MoveKind::ArcCw => "G2",
            _ => "G3",
        };
        let i = center.x - seg.start.x;
        let j = center.y - seg.start.y;
        let feed = self.feed_word(seg.feed * seg.feed_scale);
        self.line(&format!(
            "{} X{:.3} Y{:.3} I{:.3} J{:.3}{}",
            code, seg.end.x, seg.end.y, i, j, feed
        ));
    }

    /// Returns " F<v>" when the formatted feed differs from the last one
    /// emitted, empty otherwise.
    fn feed_word(&mut self, feed: f64) -> String {
        let formatted = format!("{:.0}", feed);
        if self.last_feed.as_deref() == Some(formatted.as_str()) {
            String::new()
        } else {
            self.last_feed = Some(formatted.clone());
            format!(" F{}", formatted)
        }
    }
}

/// Splits an arc at its angular midpoint, preserving direction and feed.
fn split_arc(seg: &Segment, center: camkit_core::geom::Point) -> (Segment, Segment) {
    let sweep = seg.sweep_angle();
    let half = match seg.kind {
        MoveKind::ArcCw => -sweep / 2.0,
        _ => sweep / 2.0,
    };
    let dx = seg.start.x - center.x;
    let dy = seg.start.y - center.y;
    let (sin, cos) = half.sin_cos();
    let mid = camkit_core::geom::Point::new(
        center.x + dx * cos - dy * sin,
        center.y + dx * sin + dy * cos,
    );
    let mut first = seg.clone();
    first.end = mid;
    let mut second = seg.clone();
    second.start = mid;
    (first, second)
}

/// Renders all passes for the given profile.
pub fn emit_program(
    passes: &[Pass],
    profile: &MachineProfile,
    safe_z: f64,
) -> Result<String, EmitError> {
    Emitter::new(profile, safe_z).emit(passes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Dialect;
    use camkit_core::geom::Point;

    fn pass() -> Pass {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        let mut retract = Segment::rapid_retract(a);
        retract.z = 5.0;
        let mut traverse = Segment::rapid_traverse(a, a);
        traverse.z = 5.0;
        let mut plunge = Segment::linear(a, a, 300.0, 0.0);
        plunge.z = -1.5;
        let mut cut = Segment::linear(a, b, 1200.0, 2.7);
        cut.z = -1.5;
        Pass {
            z: -1.5,
            segments: vec![retract, traverse, plunge, cut],
        }
    }

    #[test]
    fn test_grbl_header_order() {
        let profile = MachineProfile::for_dialect(Dialect::Grbl);
        let gcode = emit_program(&[pass()], &profile, 5.0).unwrap();
        let lines: Vec<&str> = gcode.lines().collect();
        assert_eq!(lines[0], "G21");
        assert_eq!(lines[1], "G90");
        assert_eq!(lines[2], "G17");
        assert!(gcode.contains("M3 S16000"));
        assert!(gcode.trim_end().ends_with("M30"));
    }

    #[test]
    fn test_linuxcnc_ends_with_m2() {
        let profile = MachineProfile::for_dialect(Dialect::LinuxCnc);
        let gcode = emit_program(&[pass()], &profile, 5.0).unwrap();
        assert!(gcode.trim_end().ends_with("M2"));
        assert!(!gcode.contains("M30"));
    }

    #[test]
    fn test_fanuc_percent_wrap() {
        let profile = MachineProfile::for_dialect(Dialect::Fanuc);
        let gcode = emit_program(&[pass()], &profile, 5.0).unwrap();
        let lines: Vec<&str> = gcode.lines().collect();
        assert_eq!(lines[0], "%");
        assert_eq!(lines[1], "O1000");
        assert_eq!(*lines.last().unwrap(), "%");
        assert!(gcode.contains("G4 P2.0"));
    }

    #[test]
    fn test_plunge_then_cut() {
        let profile = MachineProfile::for_dialect(Dialect::Grbl);
        let gcode = emit_program(&[pass()], &profile, 5.0).unwrap();
        assert!(gcode.contains("G1 Z-1.500 F300"));
        assert!(gcode.contains("G1 X10.000 Y0.000 F1200"));
    }

    #[test]
    fn test_modal_feed_suppressed() {
        let profile = MachineProfile::for_dialect(Dialect::Grbl);
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        let c = Point::new(10.0, 10.0);
        let mut s1 = Segment::linear(a, b, 1200.0, 2.7);
        s1.z = -1.0;
        let mut s2 = Segment::linear(b, c, 1200.0, 2.7);
        s2.z = -1.0;
        let pass = Pass {
            z: -1.0,
            segments: vec![s1, s2],
        };
        let gcode = emit_program(&[pass], &profile, 5.0).unwrap();
        assert!(gcode.contains("G1 X10.000 Y0.000 F1200"));
        assert!(gcode.contains("G1 X10.000 Y10.000\n"));
    }

    #[test]
    fn test_feed_scale_becomes_f_override() {
        let profile = MachineProfile::for_dialect(Dialect::Grbl);
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        let mut s = Segment::linear(a, b, 1200.0, 2.7);
        s.feed_scale = 0.5;
        s.z = -1.0;
        let pass = Pass {
            z: -1.0,
            segments: vec![s],
        };
        let gcode = emit_program(&[pass], &profile, 5.0).unwrap();
        assert!(gcode.contains("F600"));
    }

    #[test]
    fn test_large_arc_split() {
        let profile = MachineProfile::for_dialect(Dialect::Grbl);
        let a = Point::new(10.0, 0.0);
        let center = Point::new(0.0, 0.0);
        // CCW from (10,0) down to (0,-10) sweeps 270 degrees.
        let c = Point::new(0.0, -10.0);
        let mut arc = Segment::arc(MoveKind::ArcCcw, a, c, center, 1200.0, 2.7);
        arc.z = -1.0;
        let sweep = arc.sweep_angle();
        assert!(sweep > PI);
        let pass = Pass {
            z: -1.0,
            segments: vec![arc],
        };
        let gcode = emit_program(&[pass], &profile, 5.0).unwrap();
        let g3_count = gcode.lines().filter(|l| l.starts_with("G3")).count();
        assert_eq!(g3_count, 2);
    }

    #[test]
    fn test_arc_ij_relative_to_start() {
        let profile = MachineProfile::for_dialect(Dialect::Grbl);
        let a = Point::new(10.0, 0.0);
        let b = Point::new(0.0, 10.0);
        let center = Point::new(0.0, 0.0);
        let mut arc = Segment::arc(MoveKind::ArcCcw, a, b, center, 1200.0, 2.7);
        arc.z = -1.0;
        let pass = Pass {
            z: -1.0,
            segments: vec![arc],
        };
        let gcode = emit_program(&[pass], &profile, 5.0).unwrap();
        assert!(gcode.contains("G3 X0.000 Y10.000 I-10.000 J0.000"));
    }

    #[test]
    fn test_byte_identical_reruns() {
        let profile = MachineProfile::for_dialect(Dialect::Grbl);
        let a = emit_program(&[pass()], &profile, 5.0).unwrap();
        let b = emit_program(&[pass()], &profile, 5.0).unwrap();
        assert_eq!(a, b);
    }
}
