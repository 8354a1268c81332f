//! Geometry, color, and sampled pixel types

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Sub};

/// A 2D vector in canvas pixel space
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Linear interpolation from `self` toward `other`
    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

impl Add for Vec2 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, scalar: f32) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }
}

/// 8-bit RGB color
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Self = Self {
        r: 255,
        g: 255,
        b: 255,
    };
    pub const BLACK: Self = Self { r: 0, g: 0, b: 0 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Mean of the three channels, in `[0, 255]`
    pub fn brightness(&self) -> f32 {
        (self.r as f32 + self.g as f32 + self.b as f32) / 3.0
    }

    pub fn inverted(&self) -> Self {
        Self {
            r: 255 - self.r,
            g: 255 - self.g,
            b: 255 - self.b,
        }
    }
}

/// One sampled pixel of a photo: where a particle should land and the source color.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PixelSample {
    pub x: f32,
    pub y: f32,
    pub color: Rgb,
}

impl PixelSample {
    pub const fn new(x: f32, y: f32, color: Rgb) -> Self {
        Self { x, y, color }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec2_operations() {
        let a = Vec2::new(1.0, 2.0);
        let b = Vec2::new(4.0, 6.0);
        assert_eq!(a + b, Vec2::new(5.0, 8.0));
        assert_eq!(b - a, Vec2::new(3.0, 4.0));
        assert_eq!(a * 2.0, Vec2::new(2.0, 4.0));
        assert!(((b - a).length() - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_vec2_lerp_endpoints() {
        let a = Vec2::new(0.0, 10.0);
        let b = Vec2::new(10.0, 0.0);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 0.5), Vec2::new(5.0, 5.0));
    }

    #[test]
    fn test_rgb_brightness_and_invert() {
        assert_eq!(Rgb::WHITE.brightness(), 255.0);
        assert_eq!(Rgb::BLACK.brightness(), 0.0);
        assert_eq!(Rgb::new(10, 20, 30).inverted(), Rgb::new(245, 235, 225));
    }

    #[test]
    fn test_sample_serializes_flat() {
        let sample = PixelSample::new(22.0, 44.0, Rgb::new(1, 2, 3));
        let json = serde_json::to_string(&sample).unwrap();
        assert_eq!(json, r#"{"x":22.0,"y":44.0,"color":{"r":1,"g":2,"b":3}}"#);
    }
}
