use serde::{Deserialize, Serialize};

pub mod canvas;
pub mod raster;
pub mod render;
pub mod snap;

pub use canvas::{ClickOutcome, Preview, SketchCanvas};
pub use raster::{rasterize, BinaryMask};
pub use render::{render_canvas, render_strokes};

/// Side of the square draw region in pixels (matches the model training size)
pub const DRAW_REGION_SIZE: u32 = 400;
/// Mask resolution expected by the diffusion model
pub const MASK_RESOLUTION: u32 = 64;
/// Default scale used for on-screen length labels
pub const DEFAULT_PIXELS_PER_METER: f64 = 20.0;
/// Smallest canvas dimension accepted on resize
pub const MIN_CANVAS_DIMENSION: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    fn translate(&self, dx: f64, dy: f64) -> Point {
        Point {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Length annotation drawn next to a segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LengthLabel {
    pub text: String,
    pub anchor: Point,
}

impl LengthLabel {
    /// Label for the segment `start -> end`, placed 10px above its midpoint
    pub fn for_segment(start: Point, end: Point, pixels_per_meter: f64) -> Self {
        Self {
            text: format_length(start.distance_to(&end), pixels_per_meter),
            anchor: Point {
                x: (start.x + end.x) / 2.0,
                y: (start.y + end.y) / 2.0 - 10.0,
            },
        }
    }
}

/// Format a pixel length as meters, e.g. `"12.50 m"`
pub fn format_length(pixel_length: f64, pixels_per_meter: f64) -> String {
    let scale = if pixels_per_meter > 0.0 {
        pixels_per_meter
    } else {
        1.0
    };
    format!("{:.2} m", pixel_length / scale)
}

/// Wall stroke drawn by the user, in canvas coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    pub start: Point,
    pub end: Point,
    pub label: LengthLabel,
}

impl LineSegment {
    pub fn new(start: Point, end: Point, pixels_per_meter: f64) -> Self {
        Self {
            start,
            end,
            label: LengthLabel::for_segment(start, end, pixels_per_meter),
        }
    }

    pub fn length(&self) -> f64 {
        self.start.distance_to(&self.end)
    }

    pub fn relabel(&mut self, pixels_per_meter: f64) {
        self.label = LengthLabel::for_segment(self.start, self.end, pixels_per_meter);
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.start = self.start.translate(dx, dy);
        self.end = self.end.translate(dx, dy);
        self.label.anchor = self.label.anchor.translate(dx, dy);
    }
}

/// Fixed-size square area, centered in the canvas, that accepts strokes
/// and displays generated plans.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawRegion {
    pub left: f64,
    pub top: f64,
    pub size: f64,
}

impl DrawRegion {
    pub fn centered(canvas_width: u32, canvas_height: u32, size: u32) -> Self {
        let half = (size / 2) as f64;
        Self {
            left: (canvas_width / 2) as f64 - half,
            top: (canvas_height / 2) as f64 - half,
            size: size as f64,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.size
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.size
    }

    /// Inclusive on all four edges
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left && point.x <= self.right() && point.y >= self.top && point.y <= self.bottom()
    }

    pub fn clamp(&self, point: Point) -> Point {
        Point {
            x: point.x.clamp(self.left, self.right()),
            y: point.y.clamp(self.top, self.bottom()),
        }
    }

    /// Convert a canvas point into region-relative coordinates
    pub fn to_local(&self, point: Point) -> Point {
        Point {
            x: point.x - self.left,
            y: point.y - self.top,
        }
    }

    pub fn center(&self) -> Point {
        Point {
            x: self.left + self.size / 2.0,
            y: self.top + self.size / 2.0,
        }
    }
}
