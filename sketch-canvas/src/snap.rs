use std::cmp::Ordering;

use crate::{DrawRegion, LineSegment, Point};

/// Distance (per axis) under which a point locks onto an existing endpoint
pub const SNAP_TOLERANCE: f64 = 10.0;
/// Maximum deviation from horizontal/vertical for orthogonal snapping
pub const ANGLE_TOLERANCE_DEG: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Horizontal,
    Vertical,
}

/// Snap a candidate point for an orthogonal, endpoint-aligned sketch.
///
/// The candidate is first clamped into `region`. When the stroke from
/// `previous` is close to horizontal or vertical it is straightened, taking
/// the matching coordinate of the nearest endpoint within tolerance.
/// Otherwise each axis independently snaps to the nearest endpoint coordinate.
pub fn snap_point(
    candidate: Point,
    previous: Option<Point>,
    segments: &[LineSegment],
    region: &DrawRegion,
) -> Point {
    let point = region.clamp(candidate);

    if let Some(prev) = previous {
        if let Some(axis) = orthogonal_axis(prev, point) {
            return align(prev, point, axis, segments);
        }
    }

    let snapped = Point {
        x: nearest_within(point.x, endpoints(segments).map(|p| p.x)).unwrap_or(point.x),
        y: nearest_within(point.y, endpoints(segments).map(|p| p.y)).unwrap_or(point.y),
    };

    // A partial snap can pull the stroke into the orthogonal cone
    match previous {
        Some(prev) => match orthogonal_axis(prev, snapped) {
            Some(axis) => align(prev, snapped, axis, segments),
            None => snapped,
        },
        None => snapped,
    }
}

fn orthogonal_axis(prev: Point, point: Point) -> Option<Axis> {
    let dx = point.x - prev.x;
    let dy = point.y - prev.y;

    if dx == 0.0 && dy == 0.0 {
        return None;
    }
    if dx == 0.0 {
        return Some(Axis::Vertical);
    }

    let angle = (dy / dx).atan().to_degrees().abs();
    if angle < ANGLE_TOLERANCE_DEG || angle > 90.0 - ANGLE_TOLERANCE_DEG {
        if dx.abs() > dy.abs() {
            Some(Axis::Horizontal)
        } else {
            Some(Axis::Vertical)
        }
    } else {
        None
    }
}

fn align(prev: Point, point: Point, axis: Axis, segments: &[LineSegment]) -> Point {
    match axis {
        Axis::Horizontal => Point {
            x: nearest_within(point.x, endpoints(segments).map(|p| p.x)).unwrap_or(point.x),
            y: prev.y,
        },
        Axis::Vertical => Point {
            x: prev.x,
            y: nearest_within(point.y, endpoints(segments).map(|p| p.y)).unwrap_or(point.y),
        },
    }
}

fn endpoints(segments: &[LineSegment]) -> impl Iterator<Item = Point> + '_ {
    segments.iter().flat_map(|s| [s.start, s.end])
}

/// Closest coordinate strictly within `SNAP_TOLERANCE`; ties keep the first seen
fn nearest_within(value: f64, coords: impl Iterator<Item = f64>) -> Option<f64> {
    coords
        .filter(|c| (c - value).abs() < SNAP_TOLERANCE)
        .min_by(|a, b| {
            (a - value)
                .abs()
                .partial_cmp(&(b - value).abs())
                .unwrap_or(Ordering::Equal)
        })
}
