use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use imageproc::drawing::BresenhamLineIter;
use std::collections::VecDeque;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

use crate::{DrawRegion, LineSegment, Point};

pub const FOREGROUND: u8 = 255;
pub const BACKGROUND: u8 = 0;

const INK: u8 = 0;
const PAPER: u8 = 255;
const BINARY_THRESHOLD: u8 = 128;

/// Model conditioning mask: 255 inside the sketched outline, 0 elsewhere
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryMask {
    image: GrayImage,
}

impl BinaryMask {
    pub fn from_image(image: GrayImage) -> Self {
        Self { image }
    }

    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    pub fn into_image(self) -> GrayImage {
        self.image
    }

    pub fn resolution(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn foreground_pixels(&self) -> usize {
        self.image.pixels().filter(|p| p[0] == FOREGROUND).count()
    }

    pub fn is_empty(&self) -> bool {
        self.foreground_pixels() == 0
    }

    pub fn to_png_bytes(&self) -> Result<Vec<u8>, image::ImageError> {
        let mut png_bytes = Vec::new();
        DynamicImage::ImageLuma8(self.image.clone())
            .write_to(&mut Cursor::new(&mut png_bytes), ImageFormat::Png)?;
        Ok(png_bytes)
    }

    pub fn save(&self, path: &Path) -> Result<(), image::ImageError> {
        self.image.save_with_format(path, ImageFormat::Png)
    }
}

/// Rasterize the sketch into a `resolution` x `resolution` mask.
///
/// Returns `None` when nothing has been drawn. More than one segment is
/// closed back to the first point before filling from the region center.
pub fn rasterize(segments: &[LineSegment], region: &DrawRegion, resolution: u32) -> Option<BinaryMask> {
    if segments.is_empty() {
        return None;
    }

    let size = region.size as u32;
    let mut sheet = GrayImage::from_pixel(size, size, Luma([PAPER]));

    for segment in segments {
        draw_stroke(&mut sheet, region.to_local(segment.start), region.to_local(segment.end));
    }

    if segments.len() > 1 {
        if let (Some(first), Some(last)) = (segments.first(), segments.last()) {
            draw_stroke(&mut sheet, region.to_local(last.end), region.to_local(first.start));
        }
    }

    if !fill_enclosed(&mut sheet, (size / 2, size / 2), INK) {
        debug!("Region center is not enclosed by the sketch, mask holds strokes only");
    }

    let binary = threshold(&sheet);
    let reduced = area_downsample(&binary, resolution, resolution);
    Some(BinaryMask::from_image(threshold_foreground(&reduced)))
}

/// Pixels covered by a 2px stroke between two points
pub(crate) fn stroke_pixels(start: Point, end: Point) -> impl Iterator<Item = (i32, i32)> {
    BresenhamLineIter::new((start.x as f32, start.y as f32), (end.x as f32, end.y as f32))
        .flat_map(|(x, y)| [(x - 1, y - 1), (x, y - 1), (x - 1, y), (x, y)])
}

fn draw_stroke(img: &mut GrayImage, start: Point, end: Point) {
    let (width, height) = img.dimensions();
    for (x, y) in stroke_pixels(start, end) {
        if x >= 0 && y >= 0 && (x as u32) < width && (y as u32) < height {
            img.put_pixel(x as u32, y as u32, Luma([INK]));
        }
    }
}

/// 4-connected fill of the seed's color region.
///
/// Nothing is painted if the region touches the image border or the seed
/// already has `color`; returns whether the fill was applied.
fn fill_enclosed(img: &mut GrayImage, seed: (u32, u32), color: u8) -> bool {
    let (width, height) = img.dimensions();
    if seed.0 >= width || seed.1 >= height {
        return false;
    }

    let target = img.get_pixel(seed.0, seed.1)[0];
    if target == color {
        return false;
    }

    let mut visited = vec![false; width as usize * height as usize];
    let mut queue = VecDeque::new();
    let mut region = Vec::new();

    queue.push_back(seed);
    visited[(seed.1 as usize * width as usize) + seed.0 as usize] = true;

    while let Some((x, y)) = queue.pop_front() {
        if x == 0 || y == 0 || x == width - 1 || y == height - 1 {
            return false;
        }
        region.push((x, y));

        for (nx, ny) in [(x - 1, y), (x + 1, y), (x, y - 1), (x, y + 1)] {
            let nidx = (ny as usize * width as usize) + nx as usize;
            if !visited[nidx] && img.get_pixel(nx, ny)[0] == target {
                visited[nidx] = true;
                queue.push_back((nx, ny));
            }
        }
    }

    for (x, y) in region {
        img.put_pixel(x, y, Luma([color]));
    }
    true
}

/// Dark pixels become foreground, light pixels background
fn threshold(img: &GrayImage) -> GrayImage {
    let mut binary = GrayImage::new(img.width(), img.height());
    for (x, y, pixel) in img.enumerate_pixels() {
        let val = if pixel[0] > BINARY_THRESHOLD { BACKGROUND } else { FOREGROUND };
        binary.put_pixel(x, y, Luma([val]));
    }
    binary
}

fn threshold_foreground(img: &GrayImage) -> GrayImage {
    let mut binary = GrayImage::new(img.width(), img.height());
    for (x, y, pixel) in img.enumerate_pixels() {
        let val = if pixel[0] >= BINARY_THRESHOLD { FOREGROUND } else { BACKGROUND };
        binary.put_pixel(x, y, Luma([val]));
    }
    binary
}

/// Resample by exact area averaging; each output pixel is the mean of the
/// source area it covers, including fractional edge pixels.
fn area_downsample(img: &GrayImage, out_width: u32, out_height: u32) -> GrayImage {
    let (width, height) = img.dimensions();
    let x_weights = axis_weights(width, out_width);
    let y_weights = axis_weights(height, out_height);
    let cell_area = (width as f64 / out_width as f64) * (height as f64 / out_height as f64);

    let mut out = GrayImage::new(out_width, out_height);
    for (oy, row_weights) in y_weights.iter().enumerate() {
        for (ox, col_weights) in x_weights.iter().enumerate() {
            let mut sum = 0.0;
            for &(sy, wy) in row_weights {
                for &(sx, wx) in col_weights {
                    sum += img.get_pixel(sx, sy)[0] as f64 * wx * wy;
                }
            }
            let value = (sum / cell_area).round().clamp(0.0, 255.0) as u8;
            out.put_pixel(ox as u32, oy as u32, Luma([value]));
        }
    }
    out
}

/// For every output index, the source indices it overlaps and the overlap length
fn axis_weights(src_len: u32, dst_len: u32) -> Vec<Vec<(u32, f64)>> {
    let scale = src_len as f64 / dst_len as f64;
    (0..dst_len)
        .map(|i| {
            let start = i as f64 * scale;
            let end = (i + 1) as f64 * scale;
            let first = start.floor() as u32;
            let last = (end.ceil() as u32).min(src_len);
            (first..last)
                .filter_map(|s| {
                    let overlap = end.min(s as f64 + 1.0) - start.max(s as f64);
                    (overlap > 0.0).then_some((s, overlap))
                })
                .collect()
        })
        .collect()
}
