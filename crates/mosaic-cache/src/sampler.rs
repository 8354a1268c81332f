//! Photo → pixel samples

use crate::roster::Person;
use image::RgbaImage;
use mosaic_core::{MosaicError, PixelSample, Result, Rgb};
use std::path::{Path, PathBuf};

/// Turns a roster entry into the target layout for one photo
pub trait PixelSampler: Send + Sync {
    fn sample(
        &self,
        person: &Person,
        step_pixel: u32,
        target_width: u32,
        target_height: u32,
    ) -> Result<Vec<PixelSample>>;
}

/// Sample `image` scaled to cover a `target_width` x `target_height`
/// canvas (centered crop), every `step_pixel` pixels in raster order.
/// Pixels with alpha ≤ 128 are skipped; colors are inverted.
pub fn sample_pixels(
    image: &RgbaImage,
    step_pixel: u32,
    target_width: u32,
    target_height: u32,
) -> Vec<PixelSample> {
    let (iw, ih) = image.dimensions();
    if iw == 0 || ih == 0 || target_width == 0 || target_height == 0 {
        return Vec::new();
    }
    let step = step_pixel.max(1);

    let scale = (target_width as f32 / iw as f32).max(target_height as f32 / ih as f32);
    let offset_x = (target_width as f32 - iw as f32 * scale) / 2.0;
    let offset_y = (target_height as f32 - ih as f32 * scale) / 2.0;

    let mut samples = Vec::new();
    for y in (0..target_height).step_by(step as usize) {
        let sy = ((y as f32 - offset_y) / scale).floor() as u32;
        for x in (0..target_width).step_by(step as usize) {
            let sx = ((x as f32 - offset_x) / scale).floor() as u32;
            let [r, g, b, a] = image.get_pixel(sx.min(iw - 1), sy.min(ih - 1)).0;
            if a > 128 {
                samples.push(PixelSample::new(
                    x as f32,
                    y as f32,
                    Rgb::new(r, g, b).inverted(),
                ));
            }
        }
    }
    samples
}

/// Loads photos from disk with the `image` crate
#[derive(Debug, Clone)]
pub struct ImageSampler {
    root: PathBuf,
}

impl ImageSampler {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// The image ref under the root, or `<root>/<display_name>.png` if that
    /// does not exist
    pub fn resolve(&self, person: &Person) -> PathBuf {
        let primary = self.root.join(&person.image_ref);
        if primary.is_file() {
            return primary;
        }
        let fallback = self.root.join(format!("{}.png", person.display_name));
        if fallback.is_file() {
            log::debug!(
                "Image {} missing, using {}",
                primary.display(),
                fallback.display()
            );
            return fallback;
        }
        primary
    }

    pub fn load(&self, person: &Person) -> Result<RgbaImage> {
        let path = self.resolve(person);
        let image = image::open(&path)
            .map_err(|e| MosaicError::ImageError(format!("{}: {}", path.display(), e)))?;
        Ok(image.to_rgba8())
    }
}

impl PixelSampler for ImageSampler {
    fn sample(
        &self,
        person: &Person,
        step_pixel: u32,
        target_width: u32,
        target_height: u32,
    ) -> Result<Vec<PixelSample>> {
        let image = self.load(person)?;
        Ok(sample_pixels(&image, step_pixel, target_width, target_height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("mosaic_sampler_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn samples_on_stride_and_inverts() {
        let image = RgbaImage::from_pixel(100, 100, Rgba([10, 20, 30, 255]));
        let samples = sample_pixels(&image, 10, 100, 100);
        assert_eq!(samples.len(), 100);
        assert_eq!(samples[0].color, Rgb::new(245, 235, 225));
        assert_eq!((samples[1].x, samples[1].y), (10.0, 0.0));
        assert_eq!((samples[10].x, samples[10].y), (0.0, 10.0));
    }

    #[test]
    fn transparent_pixels_are_skipped() {
        let mut image = RgbaImage::from_pixel(20, 20, Rgba([0, 0, 0, 255]));
        for y in 0..20 {
            for x in 0..10 {
                image.put_pixel(x, y, Rgba([0, 0, 0, 100]));
            }
        }
        let samples = sample_pixels(&image, 5, 20, 20);
        assert_eq!(samples.len(), 8);
        assert!(samples.iter().all(|s| s.x >= 10.0));
    }

    #[test]
    fn cover_fit_crops_the_long_side() {
        // Left half red, right half blue; a square canvas sees the middle
        let mut image = RgbaImage::from_pixel(200, 100, Rgba([255, 0, 0, 255]));
        for y in 0..100 {
            for x in 100..200 {
                image.put_pixel(x, y, Rgba([0, 0, 255, 255]));
            }
        }
        let samples = sample_pixels(&image, 10, 100, 100);
        assert_eq!(samples.len(), 100);
        let first = samples[0].color.inverted();
        let last = samples[9].color.inverted();
        assert_eq!(first, Rgb::new(255, 0, 0));
        assert_eq!(last, Rgb::new(0, 0, 255));
    }

    #[test]
    fn empty_inputs_give_no_samples() {
        let image = RgbaImage::new(0, 0);
        assert!(sample_pixels(&image, 10, 100, 100).is_empty());
        let image = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        assert!(sample_pixels(&image, 10, 0, 100).is_empty());
    }

    #[test]
    fn image_sampler_reads_png_with_fallback() {
        let dir = temp_dir();
        let image = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 255]));
        image.save(dir.join("Jane.png")).unwrap();

        let sampler = ImageSampler::new(&dir);
        let person = Person::new("Jane", "missing.jpg");
        assert_eq!(sampler.resolve(&person), dir.join("Jane.png"));
        let samples = sampler.sample(&person, 2, 8, 8).unwrap();
        assert_eq!(samples.len(), 16);
        assert_eq!(samples[0].color, Rgb::WHITE);

        let nobody = Person::new("Nobody", "nobody.png");
        assert!(matches!(
            sampler.sample(&nobody, 2, 8, 8),
            Err(MosaicError::ImageError(_))
        ));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
