//! Toolpath segment arena and pass container.
//!
//! Segments are created by the strategy generator, annotated in place by the
//! curvature analyzer, and spliced by index by the trochoidal inserter.
//! Downstream stages treat them as read-only. Keeping each pass as a plain
//! `Vec<Segment>` with index-based references avoids aliasing trouble during
//! splice operations.

use camkit_core::geom::Point;

/// Kind of machine move a segment represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    /// Rapid Z lift to the safe height.
    RapidRetract,
    /// Rapid XY reposition at the safe height.
    RapidTraverse,
    /// Feed move. Covers XY cutting moves and Z plunges (XY unchanged).
    LinearCut,
    /// Clockwise arc (G2).
    ArcCw,
    /// Counter-clockwise arc (G3).
    ArcCcw,
}

impl MoveKind {
    /// True for moves that remove material (G1/G2/G3).
    pub fn is_cutting(&self) -> bool {
        matches!(self, MoveKind::LinearCut | MoveKind::ArcCw | MoveKind::ArcCcw)
    }

    pub fn is_arc(&self) -> bool {
        matches!(self, MoveKind::ArcCw | MoveKind::ArcCcw)
    }
}

/// One toolpath move with its adaptive annotations.
#[derive(Debug, Clone)]
pub struct Segment {
    pub kind: MoveKind,
    pub start: Point,
    pub end: Point,
    /// Arc center; present iff `kind.is_arc()`.
    pub center: Option<Point>,
    /// Target Z level (mm). Safe height for rapids, pass depth for cuts.
    pub z: f64,
    /// Programmed feed before feed-scale is applied (mm/min). Unused for
    /// rapids.
    pub feed: f64,
    /// Estimated radial engagement (mm).
    pub engagement: f64,
    /// Curvature-derived feed scale in [floor, 1.0].
    pub feed_scale: f64,
}

impl Segment {
    pub fn linear(start: Point, end: Point, feed: f64, engagement: f64) -> Self {
        Self {
            kind: MoveKind::LinearCut,
            start,
            end,
            center: None,
            z: 0.0,
            feed,
            engagement,
            feed_scale: 1.0,
        }
    }

    pub fn arc(
        kind: MoveKind,
        start: Point,
        end: Point,
        center: Point,
        feed: f64,
        engagement: f64,
    ) -> Self {
        debug_assert!(kind.is_arc());
        Self {
            kind,
            start,
            end,
            center: Some(center),
            z: 0.0,
            feed,
            engagement,
            feed_scale: 1.0,
        }
    }

    pub fn rapid_retract(at: Point) -> Self {
        Self {
            kind: MoveKind::RapidRetract,
            start: at,
            end: at,
            center: None,
            z: 0.0,
            feed: 0.0,
            engagement: 0.0,
            feed_scale: 1.0,
        }
    }

    pub fn rapid_traverse(start: Point, end: Point) -> Self {
        Self {
            kind: MoveKind::RapidTraverse,
            start,
            end,
            center: None,
            z: 0.0,
            feed: 0.0,
            engagement: 0.0,
            feed_scale: 1.0,
        }
    }

    /// XY path length of the move. Arcs use radius x sweep.
    pub fn length(&self) -> f64 {
        match self.center {
            Some(center) => {
                let r = center.distance_to(&self.start);
                r * self.sweep_angle()
            }
            None => self.start.distance_to(&self.end),
        }
    }

    /// Absolute swept angle of an arc in radians; 0 for non-arcs.
    pub fn sweep_angle(&self) -> f64 {
        let Some(center) = self.center else {
            return 0.0;
        };
        let a0 = (self.start.y - center.y).atan2(self.start.x - center.x);
        let a1 = (self.end.y - center.y).atan2(self.end.x - center.x);
        let mut sweep = match self.kind {
            MoveKind::ArcCcw => a1 - a0,
            MoveKind::ArcCw => a0 - a1,
            _ => 0.0,
        };
        while sweep <= 1e-9 {
            sweep += 2.0 * std::f64::consts::PI;
        }
        sweep
    }
}

/// One Z level of the scheduled toolpath.
#[derive(Debug, Clone)]
pub struct Pass {
    /// Target cut depth for this pass (mm, negative).
    pub z: f64,
    pub segments: Vec<Segment>,
}

impl Pass {
    /// Total cutting distance in this pass (mm).
    pub fn cutting_length(&self) -> f64 {
        self.segments
            .iter()
            .filter(|s| s.kind.is_cutting())
            .map(|s| s.length())
            .sum()
    }

    /// Fraction of moves that cut material.
    pub fn cutting_move_ratio(&self) -> f64 {
        if self.segments.is_empty() {
            return 0.0;
        }
        let cutting = self.segments.iter().filter(|s| s.kind.is_cutting()).count();
        cutting as f64 / self.segments.len() as f64
    }
}
