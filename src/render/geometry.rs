//! Corner clip outlines: circular rounded rectangles and squircles
//!
//! Outlines are plain lists of points and segments in canvas pixels so they
//! can be inspected in tests and converted to any path type for drawing.
//!
//! A squircle corner replaces the quarter circle with three curves: an entry
//! curve easing off the straight edge, a shorter circular arc, and a
//! mirrored exit curve. `smoothing` trades arc for easing; at zero the corner
//! is exactly the circular one.

use std::f64::consts::{FRAC_PI_2, SQRT_2};

/// Quarter-circle bezier approximation constant: 4/3 * (sqrt(2) - 1)
pub const BEZIER_K: f64 = 0.552_284_749_830_793_4;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Segment {
    Line(Point),
    Cubic(Point, Point, Point),
}

impl Segment {
    pub fn end(&self) -> Point {
        match *self {
            Segment::Line(p) => p,
            Segment::Cubic(_, _, p) => p,
        }
    }
}

/// Closed outline starting at `start`
#[derive(Clone, Debug, PartialEq)]
pub struct Outline {
    pub start: Point,
    pub segments: Vec<Segment>,
}

impl Outline {
    /// Every point of the outline, control points included
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        std::iter::once(self.start).chain(self.segments.iter().flat_map(|s| match *s {
            Segment::Line(p) => vec![p],
            Segment::Cubic(a, b, c) => vec![a, b, c],
        }))
    }

    pub fn cubic_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Cubic(..)))
            .count()
    }
}

/// Shape parameters of one corner, in pixels along the edges
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CornerParams {
    pub radius: f64,
    /// Straight-edge length consumed by the corner on each side
    pub p: f64,
    /// Entry/exit curve control offsets
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    /// Span of the circular arc, in radians
    pub arc_angle: f64,
    /// Chord of the circular arc along each axis
    pub arc_section: f64,
}

impl CornerParams {
    /// Plain quarter-circle corner
    pub fn circular(radius: f64) -> Self {
        Self {
            radius,
            p: radius,
            a: 0.0,
            b: 0.0,
            c: 0.0,
            d: 0.0,
            arc_angle: FRAC_PI_2,
            arc_section: radius,
        }
    }

    /// Squircle corner for `radius` and `smoothing` given the straight-edge
    /// budget (half the shorter side).
    ///
    /// Returns `None` when the corner degenerates to a circular one: no
    /// radius, no smoothing, or no budget left for smoothing at this radius.
    pub fn squircle(radius: f64, smoothing: f64, budget: f64) -> Option<Self> {
        let radius = radius.min(budget);
        if radius <= 0.0 || smoothing <= 0.0 {
            return None;
        }
        let smoothing = smoothing.min(1.0).min(budget / radius - 1.0);
        if smoothing <= 0.0 {
            return None;
        }

        let p = ((1.0 + smoothing) * radius).min(budget);
        let arc_measure = 90.0 * (1.0 - smoothing);
        let arc_section = (arc_measure / 2.0).to_radians().sin() * radius * SQRT_2;
        let angle_alpha = (90.0 - arc_measure) / 2.0;
        let p3_to_p4 = radius * (angle_alpha / 2.0).to_radians().tan();
        let angle_beta = 45.0 * smoothing;
        let c = p3_to_p4 * angle_beta.to_radians().cos();
        let d = c * angle_beta.to_radians().tan();
        let b = (p - arc_section - c - d) / 3.0;
        let a = 2.0 * b;

        Some(Self {
            radius,
            p,
            a,
            b,
            c,
            d,
            arc_angle: arc_measure.to_radians(),
            arc_section,
        })
    }

    fn is_circular(&self) -> bool {
        self.a == 0.0 && self.b == 0.0 && self.c == 0.0 && self.d == 0.0
    }
}

/// One corner of the rectangle, walking clockwise. Local coordinates `(u, v)`
/// map to `corner + u * incoming + v * outgoing`.
struct Corner {
    at: Point,
    incoming: Point,
    outgoing: Point,
}

impl Corner {
    fn map(&self, u: f64, v: f64) -> Point {
        Point::new(
            self.at.x + u * self.incoming.x + v * self.outgoing.x,
            self.at.y + u * self.incoming.y + v * self.outgoing.y,
        )
    }
}

fn corners(width: f64, height: f64) -> [Corner; 4] {
    [
        Corner {
            at: Point::new(width, 0.0),
            incoming: Point::new(1.0, 0.0),
            outgoing: Point::new(0.0, 1.0),
        },
        Corner {
            at: Point::new(width, height),
            incoming: Point::new(0.0, 1.0),
            outgoing: Point::new(-1.0, 0.0),
        },
        Corner {
            at: Point::new(0.0, height),
            incoming: Point::new(-1.0, 0.0),
            outgoing: Point::new(0.0, -1.0),
        },
        Corner {
            at: Point::new(0.0, 0.0),
            incoming: Point::new(0.0, -1.0),
            outgoing: Point::new(1.0, 0.0),
        },
    ]
}

/// Emit the curves of one corner, starting `p` before it on the incoming edge
/// and ending `p` after it on the outgoing edge.
fn push_corner(segments: &mut Vec<Segment>, corner: &Corner, params: &CornerParams) {
    let CornerParams {
        radius: r,
        p,
        a,
        b,
        c,
        d,
        arc_angle,
        arc_section,
    } = *params;

    // Arc endpoints in local coordinates; the circle is centred at (-r, r)
    let (arc_start_u, arc_start_v) = (-p + a + b + c, d);
    let (arc_end_u, arc_end_v) = (arc_start_u + arc_section, arc_start_v + arc_section);

    if !params.is_circular() {
        segments.push(Segment::Cubic(
            corner.map(-p + a, 0.0),
            corner.map(-p + a + b, 0.0),
            corner.map(arc_start_u, arc_start_v),
        ));
    }

    let kappa = 4.0 / 3.0 * (arc_angle / 4.0).tan();
    let start_angle = -FRAC_PI_2 + (FRAC_PI_2 - arc_angle) / 2.0;
    let end_angle = start_angle + arc_angle;
    let handle = kappa * r;
    segments.push(Segment::Cubic(
        corner.map(
            arc_start_u - handle * start_angle.sin(),
            arc_start_v + handle * start_angle.cos(),
        ),
        corner.map(
            arc_end_u + handle * end_angle.sin(),
            arc_end_v - handle * end_angle.cos(),
        ),
        corner.map(arc_end_u, arc_end_v),
    ));

    if !params.is_circular() {
        segments.push(Segment::Cubic(
            corner.map(arc_end_u + d, arc_end_v + c),
            corner.map(arc_end_u + d, arc_end_v + b + c),
            corner.map(0.0, p),
        ));
    }
}

fn build_outline(width: f64, height: f64, params: &CornerParams) -> Outline {
    let corners = corners(width, height);
    let start = corners[0].map(-params.p, 0.0);
    let mut segments = Vec::with_capacity(16);
    for (i, corner) in corners.iter().enumerate() {
        push_corner(&mut segments, corner, params);
        let next = &corners[(i + 1) % corners.len()];
        let edge_end = next.map(-params.p, 0.0);
        if segments.last().map(Segment::end) != Some(edge_end) {
            segments.push(Segment::Line(edge_end));
        }
    }
    Outline { start, segments }
}

/// Rectangle with circular corners of `radius`, clamped to half the shorter side
pub fn rounded_rect_outline(width: f64, height: f64, radius: f64) -> Outline {
    let budget = width.min(height) / 2.0;
    let radius = radius.clamp(0.0, budget.max(0.0));
    build_outline(width, height, &CornerParams::circular(radius))
}

/// Rectangle with squircle corners, falling back to [`rounded_rect_outline`]
/// whenever the squircle degenerates
pub fn squircle_outline(width: f64, height: f64, radius: f64, smoothing: f64) -> Outline {
    let budget = width.min(height) / 2.0;
    match CornerParams::squircle(radius, smoothing, budget) {
        Some(params) => build_outline(width, height, &params),
        None => rounded_rect_outline(width, height, radius),
    }
}
