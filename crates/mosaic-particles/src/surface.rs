//! 2D draw-call boundary
//!
//! Particles only issue draw calls; creating and presenting the backing
//! raster belongs to whoever implements [`RenderSurface`].

use mosaic_core::Rgb;

pub trait RenderSurface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Request a new size; contents are unspecified afterwards
    fn resize(&mut self, width: u32, height: u32);

    /// Clear a `width` x `height` region from the origin
    fn clear(&mut self, width: f32, height: f32);

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgb);

    fn save(&mut self);
    fn translate(&mut self, x: f32, y: f32);
    /// Rotate subsequent draws by `radians` about the current origin
    fn rotate(&mut self, radians: f32);
    fn restore(&mut self);
}

/// Surface that only counts calls. Used by headless tests.
#[derive(Debug, Default, Clone)]
pub struct RecordingSurface {
    pub width: u32,
    pub height: u32,
    pub clears: usize,
    pub fills: usize,
    /// Fills issued while a rotation was in effect
    pub rotated_fills: usize,
    pub last_fill: Option<(f32, f32, f32, f32, Rgb)>,
    depth: usize,
    rotated_depth: Option<usize>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Nesting depth of unmatched `save` calls
    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl RenderSurface for RecordingSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    fn clear(&mut self, _width: f32, _height: f32) {
        self.clears += 1;
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgb) {
        self.fills += 1;
        if self.rotated_depth.is_some() {
            self.rotated_fills += 1;
        }
        self.last_fill = Some((x, y, w, h, color));
    }

    fn save(&mut self) {
        self.depth += 1;
    }

    fn translate(&mut self, _x: f32, _y: f32) {}

    fn rotate(&mut self, radians: f32) {
        if radians != 0.0 && self.rotated_depth.is_none() {
            self.rotated_depth = Some(self.depth);
        }
    }

    fn restore(&mut self) {
        if self.rotated_depth == Some(self.depth) {
            self.rotated_depth = None;
        }
        self.depth = self.depth.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restore_ends_rotation_scope() {
        let mut surface = RecordingSurface::new(10, 10);
        surface.save();
        surface.rotate(0.5);
        surface.fill_rect(0.0, 0.0, 1.0, 1.0, Rgb::WHITE);
        surface.restore();
        surface.fill_rect(0.0, 0.0, 1.0, 1.0, Rgb::WHITE);
        assert_eq!(surface.fills, 2);
        assert_eq!(surface.rotated_fills, 1);
        assert_eq!(surface.depth(), 0);
    }

    #[test]
    fn resize_updates_dimensions() {
        let mut surface = RecordingSurface::new(10, 10);
        surface.resize(40, 30);
        assert_eq!((surface.width(), surface.height()), (40, 30));
    }
}
