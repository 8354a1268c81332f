//! Software raster surface backed by an `image::RgbaImage`

use anyhow::Context;
use image::{Rgba, RgbaImage};
use mosaic_core::Rgb;
use mosaic_particles::RenderSurface;
use std::path::Path;

/// 2D affine transform in canvas convention:
/// `x' = a*x + c*y + e`, `y' = b*x + d*y + f`
#[derive(Debug, Clone, Copy, PartialEq)]
struct Affine {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Affine {
    const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    fn translate(&mut self, tx: f32, ty: f32) {
        self.e += self.a * tx + self.c * ty;
        self.f += self.b * tx + self.d * ty;
    }

    fn rotate(&mut self, radians: f32) {
        let (sin, cos) = radians.sin_cos();
        let Affine { a, b, c, d, .. } = *self;
        self.a = a * cos + c * sin;
        self.b = b * cos + d * sin;
        self.c = c * cos - a * sin;
        self.d = d * cos - b * sin;
    }

    fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    fn invert(&self, x: f32, y: f32) -> Option<(f32, f32)> {
        let det = self.a * self.d - self.b * self.c;
        if det.abs() < f32::EPSILON {
            return None;
        }
        let (dx, dy) = (x - self.e, y - self.f);
        Some((
            (self.d * dx - self.c * dy) / det,
            (self.a * dy - self.b * dx) / det,
        ))
    }

    fn is_axis_aligned(&self) -> bool {
        self.b.abs() < 1e-6 && self.c.abs() < 1e-6
    }
}

pub struct RasterSurface {
    image: RgbaImage,
    background: Rgba<u8>,
    transform: Affine,
    stack: Vec<Affine>,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32, background: Rgb) -> Self {
        let background = Rgba([background.r, background.g, background.b, 255]);
        Self {
            image: RgbaImage::from_pixel(width.max(1), height.max(1), background),
            background,
            transform: Affine::IDENTITY,
            stack: Vec::new(),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Count of pixels that differ from the background
    pub fn lit_pixels(&self) -> usize {
        self.image
            .pixels()
            .filter(|p| **p != self.background)
            .count()
    }

    pub fn save_png(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        self.image
            .save(path)
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    fn fill_span(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, color: Rgba<u8>) {
        let (w, h) = (self.image.width() as f32, self.image.height() as f32);
        let xs = x0.min(x1).round().clamp(0.0, w) as u32;
        let xe = x0.max(x1).round().clamp(0.0, w) as u32;
        let ys = y0.min(y1).round().clamp(0.0, h) as u32;
        let ye = y0.max(y1).round().clamp(0.0, h) as u32;
        for y in ys..ye {
            for x in xs..xe {
                self.image.put_pixel(x, y, color);
            }
        }
    }

    fn fill_transformed(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba<u8>) {
        let corners = [
            self.transform.apply(x, y),
            self.transform.apply(x + w, y),
            self.transform.apply(x, y + h),
            self.transform.apply(x + w, y + h),
        ];
        let (mut min_x, mut min_y) = (f32::MAX, f32::MAX);
        let (mut max_x, mut max_y) = (f32::MIN, f32::MIN);
        for (cx, cy) in corners {
            min_x = min_x.min(cx);
            min_y = min_y.min(cy);
            max_x = max_x.max(cx);
            max_y = max_y.max(cy);
        }

        let (iw, ih) = (self.image.width() as f32, self.image.height() as f32);
        let xs = min_x.floor().clamp(0.0, iw) as u32;
        let xe = max_x.ceil().clamp(0.0, iw) as u32;
        let ys = min_y.floor().clamp(0.0, ih) as u32;
        let ye = max_y.ceil().clamp(0.0, ih) as u32;

        let (left, right) = (x.min(x + w), x.max(x + w));
        let (top, bottom) = (y.min(y + h), y.max(y + h));
        for py in ys..ye {
            for px in xs..xe {
                let Some((lx, ly)) = self.transform.invert(px as f32 + 0.5, py as f32 + 0.5)
                else {
                    return;
                };
                if lx >= left && lx < right && ly >= top && ly < bottom {
                    self.image.put_pixel(px, py, color);
                }
            }
        }
    }
}

impl RenderSurface for RasterSurface {
    fn width(&self) -> u32 {
        self.image.width()
    }

    fn height(&self) -> u32 {
        self.image.height()
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.image = RgbaImage::from_pixel(width.max(1), height.max(1), self.background);
        self.transform = Affine::IDENTITY;
        self.stack.clear();
    }

    fn clear(&mut self, width: f32, height: f32) {
        let background = self.background;
        self.fill_span(0.0, 0.0, width, height, background);
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgb) {
        let color = Rgba([color.r, color.g, color.b, 255]);
        if self.transform.is_axis_aligned() {
            let (x0, y0) = self.transform.apply(x, y);
            let (x1, y1) = self.transform.apply(x + w, y + h);
            self.fill_span(x0, y0, x1, y1, color);
        } else {
            self.fill_transformed(x, y, w, h, color);
        }
    }

    fn save(&mut self) {
        self.stack.push(self.transform);
    }

    fn translate(&mut self, x: f32, y: f32) {
        self.transform.translate(x, y);
    }

    fn rotate(&mut self, radians: f32) {
        self.transform.rotate(radians);
    }

    fn restore(&mut self) {
        if let Some(previous) = self.stack.pop() {
            self.transform = previous;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgb = Rgb::new(255, 0, 0);

    fn pixel(surface: &RasterSurface, x: u32, y: u32) -> [u8; 4] {
        surface.image().get_pixel(x, y).0
    }

    #[test]
    fn test_fill_and_clear() {
        let mut surface = RasterSurface::new(20, 20, Rgb::BLACK);
        surface.fill_rect(2.0, 3.0, 4.0, 5.0, RED);
        assert_eq!(surface.lit_pixels(), 20);
        assert_eq!(pixel(&surface, 2, 3), [255, 0, 0, 255]);
        assert_eq!(pixel(&surface, 6, 3), [0, 0, 0, 255]);

        surface.clear(20.0, 20.0);
        assert_eq!(surface.lit_pixels(), 0);
    }

    #[test]
    fn test_fill_is_clipped() {
        let mut surface = RasterSurface::new(10, 10, Rgb::BLACK);
        surface.fill_rect(-5.0, 8.0, 100.0, 100.0, Rgb::WHITE);
        assert_eq!(surface.lit_pixels(), 20);
        surface.fill_rect(50.0, 50.0, 3.0, 3.0, Rgb::WHITE);
        assert_eq!(surface.lit_pixels(), 20);
    }

    #[test]
    fn test_translate_then_restore() {
        let mut surface = RasterSurface::new(20, 20, Rgb::BLACK);
        surface.save();
        surface.translate(10.0, 10.0);
        surface.fill_rect(-1.0, -1.0, 2.0, 2.0, RED);
        surface.restore();
        assert_eq!(pixel(&surface, 9, 9), [255, 0, 0, 255]);
        assert_eq!(pixel(&surface, 10, 10), [255, 0, 0, 255]);

        surface.fill_rect(0.0, 0.0, 1.0, 1.0, RED);
        assert_eq!(pixel(&surface, 0, 0), [255, 0, 0, 255]);
        assert_eq!(surface.lit_pixels(), 5);
    }

    #[test]
    fn test_rotated_square_covers_center_not_corners() {
        let mut surface = RasterSurface::new(40, 40, Rgb::BLACK);
        surface.save();
        surface.translate(20.0, 20.0);
        surface.rotate(std::f32::consts::FRAC_PI_4);
        surface.fill_rect(-8.0, -8.0, 16.0, 16.0, Rgb::WHITE);
        surface.restore();

        assert_eq!(pixel(&surface, 20, 20), [255, 255, 255, 255]);
        // A diamond reaches further along the axes than the square did
        assert_eq!(pixel(&surface, 20, 30), [255, 255, 255, 255]);
        // but not into the axis-aligned square's corner
        assert_eq!(pixel(&surface, 13, 13), [0, 0, 0, 255]);
        let area = surface.lit_pixels() as f32;
        assert!((area - 256.0).abs() < 30.0, "area {}", area);
    }

    #[test]
    fn test_resize_resets_transform() {
        let mut surface = RasterSurface::new(4, 4, Rgb::BLACK);
        surface.save();
        surface.translate(100.0, 100.0);
        surface.resize(8, 6);
        assert_eq!((surface.width(), surface.height()), (8, 6));
        surface.fill_rect(0.0, 0.0, 1.0, 1.0, RED);
        assert_eq!(surface.lit_pixels(), 1);
    }

    #[test]
    fn test_save_png() {
        let dir = std::env::temp_dir().join(format!("mosaic_raster_{}", uuid::Uuid::new_v4()));
        let path = dir.join("frames/canvas0.png");
        let mut surface = RasterSurface::new(8, 8, Rgb::BLACK);
        surface.fill_rect(1.0, 1.0, 2.0, 2.0, Rgb::WHITE);
        surface.save_png(&path).unwrap();

        let loaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(loaded.dimensions(), (8, 8));
        assert_eq!(loaded.get_pixel(1, 1).0, [255, 255, 255, 255]);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
