//! 2D geometry primitives for pocket boundaries and toolpaths.

use serde::{Deserialize, Serialize};

/// A point in the XY plane, millimeters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Midpoint between this point and another.
    pub fn midpoint(&self, other: &Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// Role of a loop inside a pocket definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopRole {
    /// The pocket boundary (material is removed inside it).
    Outer,
    /// Material kept standing inside the outer boundary.
    Island,
}

/// A closed polygonal loop. The closing edge from the last point back to the
/// first is implicit; `pts` never stores a duplicated closing vertex.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loop {
    pub pts: Vec<Point>,
    pub role: LoopRole,
}

impl Loop {
    pub fn new(pts: Vec<Point>, role: LoopRole) -> Self {
        Self { pts, role }
    }

    /// Signed area via the shoelace formula. Positive for counter-clockwise
    /// winding.
    pub fn signed_area(&self) -> f64 {
        signed_area(&self.pts)
    }

    /// Absolute enclosed area.
    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// True if `p` lies strictly inside the loop (ray casting).
    pub fn contains(&self, p: &Point) -> bool {
        point_in_polygon(p, &self.pts)
    }
}

/// A validated and classified set of loops: exactly one outer boundary plus
/// zero or more islands, all invariants checked by the normalizer.
#[derive(Debug, Clone)]
pub struct LoopSet {
    pub outer: Loop,
    pub islands: Vec<Loop>,
}

/// Shoelace signed area over an implicitly closed vertex list.
pub fn signed_area(pts: &[Point]) -> f64 {
    if pts.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..pts.len() {
        let a = pts[i];
        let b = pts[(i + 1) % pts.len()];
        sum += a.x * b.y - b.x * a.y;
    }
    sum / 2.0
}

/// Ray-casting point containment test against an implicitly closed polygon.
pub fn point_in_polygon(p: &Point, pts: &[Point]) -> bool {
    let mut inside = false;
    let n = pts.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let a = pts[i];
        let b = pts[j];
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Collapses consecutive vertices closer than `tolerance` and drops a
/// duplicated closing vertex if present.
pub fn dedupe_vertices(pts: &[Point], tolerance: f64) -> Vec<Point> {
    let mut clean: Vec<Point> = Vec::with_capacity(pts.len());
    for p in pts {
        match clean.last() {
            Some(last) if last.distance_to(p) <= tolerance => {}
            _ => clean.push(*p),
        }
    }
    if clean.len() > 1 {
        let first = clean[0];
        if clean.last().is_some_and(|last| last.distance_to(&first) <= tolerance) {
            clean.pop();
        }
    }
    clean
}

/// True if segment a0-a1 properly intersects segment b0-b1.
pub fn segments_intersect(a0: &Point, a1: &Point, b0: &Point, b1: &Point) -> bool {
    fn orient(p: &Point, q: &Point, r: &Point) -> f64 {
        (q.x - p.x) * (r.y - p.y) - (q.y - p.y) * (r.x - p.x)
    }
    let d1 = orient(b0, b1, a0);
    let d2 = orient(b0, b1, a1);
    let d3 = orient(a0, a1, b0);
    let d4 = orient(a0, a1, b1);
    ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
}

/// Intersection parameter of segment a0-a1 with segment b0-b1, as a fraction
/// along a0-a1, if the segments properly cross.
pub fn segment_intersection_t(a0: &Point, a1: &Point, b0: &Point, b1: &Point) -> Option<f64> {
    let r = Point::new(a1.x - a0.x, a1.y - a0.y);
    let s = Point::new(b1.x - b0.x, b1.y - b0.y);
    let denom = r.x * s.y - r.y * s.x;
    if denom.abs() < 1e-12 {
        return None;
    }
    let qp = Point::new(b0.x - a0.x, b0.y - a0.y);
    let t = (qp.x * s.y - qp.y * s.x) / denom;
    let u = (qp.x * r.y - qp.y * r.x) / denom;
    if t > 0.0 && t < 1.0 && u >= 0.0 && u <= 1.0 {
        Some(t)
    } else {
        None
    }
}
