use serde::Serialize;
use tracing::debug;

use crate::raster::{rasterize, BinaryMask};
use crate::snap::snap_point;
use crate::{
    format_length, DrawRegion, LineSegment, Point, DEFAULT_PIXELS_PER_METER, DRAW_REGION_SIZE,
    MASK_RESOLUTION, MIN_CANVAS_DIMENSION,
};

/// Result of a pointer-down event
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClickOutcome {
    /// Drawing disabled or click outside the draw region
    Ignored,
    /// First point of a new polyline
    Anchored { point: Point },
    /// A segment was committed from the previous anchor
    Segment { segment: LineSegment },
}

/// Dashed rubber-band line shown while moving the pointer in draw mode
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preview {
    pub from: Point,
    pub to: Point,
    pub label: String,
    pub label_position: Point,
}

/// Sketch state: the ordered segments, the active anchor and draw mode
#[derive(Debug, Clone)]
pub struct SketchCanvas {
    width: u32,
    height: u32,
    region_size: u32,
    mask_resolution: u32,
    region: DrawRegion,
    segments: Vec<LineSegment>,
    anchor: Option<Point>,
    drawing_enabled: bool,
    pixels_per_meter: f64,
}

impl Default for SketchCanvas {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

impl SketchCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_geometry(width, height, DRAW_REGION_SIZE, MASK_RESOLUTION)
    }

    pub fn with_geometry(width: u32, height: u32, region_size: u32, mask_resolution: u32) -> Self {
        let width = width.max(MIN_CANVAS_DIMENSION);
        let height = height.max(MIN_CANVAS_DIMENSION);
        Self {
            width,
            height,
            region_size,
            mask_resolution,
            region: DrawRegion::centered(width, height, region_size),
            segments: Vec::new(),
            anchor: None,
            drawing_enabled: false,
            pixels_per_meter: DEFAULT_PIXELS_PER_METER,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn region(&self) -> DrawRegion {
        self.region
    }

    pub fn segments(&self) -> &[LineSegment] {
        &self.segments
    }

    pub fn anchor(&self) -> Option<Point> {
        self.anchor
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing_enabled
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn pixels_per_meter(&self) -> f64 {
        self.pixels_per_meter
    }

    pub fn mask_resolution(&self) -> u32 {
        self.mask_resolution
    }

    pub fn toggle_draw_mode(&mut self) -> bool {
        if self.drawing_enabled {
            self.exit_draw_mode();
        } else {
            self.drawing_enabled = true;
        }
        self.drawing_enabled
    }

    pub fn exit_draw_mode(&mut self) {
        self.drawing_enabled = false;
        self.anchor = None;
    }

    pub fn click(&mut self, x: f64, y: f64) -> ClickOutcome {
        let point = Point::new(x, y);
        if !self.drawing_enabled || !self.region.contains(point) {
            return ClickOutcome::Ignored;
        }

        let snapped = snap_point(point, self.anchor, &self.segments, &self.region);
        let outcome = match self.anchor {
            Some(prev) => {
                let segment = LineSegment::new(prev, snapped, self.pixels_per_meter);
                debug!(
                    "Segment ({:.1}, {:.1}) -> ({:.1}, {:.1}), {}",
                    prev.x, prev.y, snapped.x, snapped.y, segment.label.text
                );
                self.segments.push(segment.clone());
                ClickOutcome::Segment { segment }
            }
            None => ClickOutcome::Anchored { point: snapped },
        };

        self.anchor = Some(snapped);
        outcome
    }

    pub fn pointer_move(&self, x: f64, y: f64) -> Option<Preview> {
        if !self.drawing_enabled {
            return None;
        }
        let from = self.anchor?;
        let to = snap_point(Point::new(x, y), Some(from), &self.segments, &self.region);

        let label_position = Point {
            x: (x + 10.0).max(10.0).min(self.width as f64 - 40.0),
            y: (y - 10.0).max(10.0).min(self.height as f64 - 10.0),
        };

        Some(Preview {
            from,
            to,
            label: format_length(from.distance_to(&to), self.pixels_per_meter),
            label_position,
        })
    }

    /// Drop the most recent segment; returns it when one existed
    pub fn undo(&mut self) -> Option<LineSegment> {
        let removed = self.segments.pop()?;
        self.anchor = self.segments.last().map(|s| s.end);
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.segments.clear();
        self.exit_draw_mode();
    }

    pub fn set_scale(&mut self, pixels_per_meter: f64) {
        self.pixels_per_meter = pixels_per_meter;
        for segment in &mut self.segments {
            segment.relabel(pixels_per_meter);
        }
    }

    /// Re-center the draw region; strokes move with it
    pub fn resize(&mut self, width: u32, height: u32) {
        let width = width.max(MIN_CANVAS_DIMENSION);
        let height = height.max(MIN_CANVAS_DIMENSION);
        if width == self.width && height == self.height {
            return;
        }

        let region = DrawRegion::centered(width, height, self.region_size);
        let dx = region.left - self.region.left;
        let dy = region.top - self.region.top;

        for segment in &mut self.segments {
            segment.translate(dx, dy);
        }
        self.anchor = self.anchor.map(|p| p.translate(dx, dy));

        self.width = width;
        self.height = height;
        self.region = region;
    }

    pub fn to_mask(&self) -> Option<BinaryMask> {
        rasterize(&self.segments, &self.region, self.mask_resolution)
    }
}
