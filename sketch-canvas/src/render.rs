use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

use crate::raster::stroke_pixels;
use crate::{DrawRegion, Point, SketchCanvas};

const PADDING: u32 = 20;
const DASH_ON: f64 = 4.0;
const DASH_OFF: f64 = 2.0;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const PADDING_SHADE: Rgb<u8> = Rgb([0xf5, 0xf5, 0xf5]);
const GRID: Rgb<u8> = Rgb([0xe8, 0xe8, 0xe8]);
const BOUNDARY: Rgb<u8> = Rgb([255, 0, 0]);
const WALL: Rgb<u8> = Rgb([0, 0, 0]);

/// Compose what the canvas shows.
///
/// With a generated plan the result is upscaled into the draw region and
/// replaces the sketch; otherwise the padding, region boundary, 1m grid and
/// strokes are drawn.
pub fn render_canvas(canvas: &SketchCanvas, result: Option<&DynamicImage>) -> RgbImage {
    let mut img = RgbImage::from_pixel(canvas.width(), canvas.height(), WHITE);
    let region = canvas.region();

    if let Some(prediction) = result {
        let size = region.size as u32;
        let resized = prediction.resize_exact(size, size, FilterType::Lanczos3).to_rgb8();
        imageops::overlay(&mut img, &resized, region.left as i64, region.top as i64);
        return img;
    }

    shade_padding(&mut img);
    draw_grid(&mut img, &region, canvas.pixels_per_meter());
    draw_dashed_outline(&mut img, &region);

    for segment in canvas.segments() {
        draw_wall(&mut img, segment.start, segment.end);
    }
    img
}

/// Only the strokes on a white canvas, used when saving a sketch
pub fn render_strokes(canvas: &SketchCanvas) -> RgbImage {
    let mut img = RgbImage::from_pixel(canvas.width(), canvas.height(), WHITE);
    for segment in canvas.segments() {
        draw_wall(&mut img, segment.start, segment.end);
    }
    img
}

fn shade_padding(img: &mut RgbImage) {
    let (w, h) = img.dimensions();
    let p = PADDING.min(w / 2).min(h / 2);
    if p == 0 {
        return;
    }
    draw_filled_rect_mut(img, Rect::at(0, 0).of_size(w, p), PADDING_SHADE);
    draw_filled_rect_mut(img, Rect::at(0, (h - p) as i32).of_size(w, p), PADDING_SHADE);
    draw_filled_rect_mut(img, Rect::at(0, 0).of_size(p, h), PADDING_SHADE);
    draw_filled_rect_mut(img, Rect::at((w - p) as i32, 0).of_size(p, h), PADDING_SHADE);
}

fn draw_dashed_outline(img: &mut RgbImage, region: &DrawRegion) {
    let corners = [
        Point::new(region.left, region.top),
        Point::new(region.right(), region.top),
        Point::new(region.right(), region.bottom()),
        Point::new(region.left, region.bottom()),
    ];
    for i in 0..corners.len() {
        let start = corners[i];
        let end = corners[(i + 1) % corners.len()];
        let length = start.distance_to(&end);
        let (ux, uy) = ((end.x - start.x) / length, (end.y - start.y) / length);

        let mut t = 0.0;
        while t < length {
            let stop = (t + DASH_ON).min(length);
            let a = Point::new(start.x + ux * t, start.y + uy * t);
            let b = Point::new(start.x + ux * stop, start.y + uy * stop);
            put_stroke(img, a, b, BOUNDARY);
            t += DASH_ON + DASH_OFF;
        }
    }
}

/// One line per meter, skipped when the scale is too dense to read
fn draw_grid(img: &mut RgbImage, region: &DrawRegion, pixels_per_meter: f64) {
    let spacing = pixels_per_meter as i64;
    if spacing <= 5 {
        return;
    }
    let (left, top) = (region.left as i64, region.top as i64);
    let (right, bottom) = (region.right() as i64, region.bottom() as i64);

    for gx in (left..right).step_by(spacing as usize) {
        draw_line_segment_mut(img, (gx as f32, top as f32), (gx as f32, bottom as f32), GRID);
    }
    for gy in (top..bottom).step_by(spacing as usize) {
        draw_line_segment_mut(img, (left as f32, gy as f32), (right as f32, gy as f32), GRID);
    }
}

fn draw_wall(img: &mut RgbImage, start: Point, end: Point) {
    put_stroke(img, start, end, WALL);
}

fn put_stroke(img: &mut RgbImage, start: Point, end: Point, color: Rgb<u8>) {
    let (width, height) = img.dimensions();
    for (x, y) in stroke_pixels(start, end) {
        if x >= 0 && y >= 0 && (x as u32) < width && (y as u32) < height {
            img.put_pixel(x as u32, y as u32, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sketch_render_shows_region_and_walls() {
        let mut canvas = SketchCanvas::new(800, 600);
        canvas.toggle_draw_mode();
        canvas.click(250.0, 200.0);
        canvas.click(450.0, 200.0);

        let img = render_canvas(&canvas, None);
        assert_eq!(img.dimensions(), (800, 600));
        assert_eq!(*img.get_pixel(5, 5), PADDING_SHADE);
        assert_eq!(*img.get_pixel(200, 100), BOUNDARY);
        assert_eq!(*img.get_pixel(350, 200), WALL);
        assert_eq!(*img.get_pixel(100, 300), WHITE);
    }

    #[test]
    fn test_result_render_fills_region() {
        let canvas = SketchCanvas::new(800, 600);
        let prediction = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 64, Rgb([10, 200, 30])));

        let img = render_canvas(&canvas, Some(&prediction));
        let center = img.get_pixel(400, 300);
        assert!((center[1] as i32 - 200).abs() <= 2);
        assert_eq!(*img.get_pixel(100, 300), WHITE);
    }

    #[test]
    fn test_strokes_only_render() {
        let mut canvas = SketchCanvas::new(800, 600);
        canvas.toggle_draw_mode();
        canvas.click(250.0, 200.0);
        canvas.click(250.0, 400.0);

        let img = render_strokes(&canvas);
        assert_eq!(*img.get_pixel(250, 300), WALL);
        assert_eq!(*img.get_pixel(5, 5), WHITE);
    }
}
