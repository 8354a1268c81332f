//! Sample a single image the way the cache would

use anyhow::{bail, Context, Result};
use mosaic_cache::sample_pixels;
use mosaic_core::PixelSample;
use serde::Serialize;

pub struct SampleArgs {
    pub image: String,
    pub step: u32,
    pub width: u32,
    pub height: u32,
    pub format: String,
}

#[derive(Debug, Serialize, PartialEq)]
struct SampleStats {
    samples: usize,
    grid_cells: usize,
    coverage: f32,
    mean_brightness: f32,
    bounds: Option<[f32; 4]>,
}

pub fn run(args: SampleArgs) -> Result<()> {
    if args.step == 0 {
        bail!("--step must be at least 1");
    }
    let image = image::open(&args.image)
        .with_context(|| format!("Failed to open image {}", args.image))?
        .to_rgba8();
    let samples = sample_pixels(&image, args.step, args.width, args.height);
    let stats = summarize(&samples, args.step, args.width, args.height);

    match args.format.as_str() {
        "json" => {
            let output = serde_json::json!({
                "image": args.image,
                "step": args.step,
                "width": args.width,
                "height": args.height,
                "stats": stats,
                "samples": samples,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        "text" => {
            let (iw, ih) = image.dimensions();
            println!("Image: {} ({}x{})", args.image, iw, ih);
            println!(
                "Canvas: {}x{}, step {}",
                args.width, args.height, args.step
            );
            println!(
                "Samples: {} of {} grid cells ({:.1}%)",
                stats.samples,
                stats.grid_cells,
                stats.coverage * 100.0
            );
            println!("Mean brightness (inverted): {:.1}", stats.mean_brightness);
            if let Some([x0, y0, x1, y1]) = stats.bounds {
                println!("Bounds: ({}, {}) - ({}, {})", x0, y0, x1, y1);
            }
        }
        other => bail!("Unknown format '{}'; valid values: text, json", other),
    }
    Ok(())
}

fn summarize(samples: &[PixelSample], step: u32, width: u32, height: u32) -> SampleStats {
    let columns = width.div_ceil(step) as usize;
    let rows = height.div_ceil(step) as usize;
    let grid_cells = columns * rows;

    let bounds = samples.iter().fold(None, |acc: Option<[f32; 4]>, s| {
        Some(match acc {
            None => [s.x, s.y, s.x, s.y],
            Some([x0, y0, x1, y1]) => [x0.min(s.x), y0.min(s.y), x1.max(s.x), y1.max(s.y)],
        })
    });
    let mean_brightness = if samples.is_empty() {
        0.0
    } else {
        samples.iter().map(|s| s.color.brightness()).sum::<f32>() / samples.len() as f32
    };

    SampleStats {
        samples: samples.len(),
        grid_cells,
        coverage: if grid_cells == 0 {
            0.0
        } else {
            samples.len() as f32 / grid_cells as f32
        },
        mean_brightness,
        bounds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mosaic_core::Rgb;

    #[test]
    fn test_summarize_counts_and_bounds() {
        let samples = vec![
            PixelSample::new(0.0, 10.0, Rgb::WHITE),
            PixelSample::new(20.0, 0.0, Rgb::BLACK),
            PixelSample::new(10.0, 30.0, Rgb::WHITE),
        ];
        let stats = summarize(&samples, 10, 40, 40);
        assert_eq!(stats.samples, 3);
        assert_eq!(stats.grid_cells, 16);
        assert_eq!(stats.bounds, Some([0.0, 0.0, 20.0, 30.0]));
        assert!((stats.mean_brightness - 170.0).abs() < 1e-3);
        assert!((stats.coverage - 3.0 / 16.0).abs() < 1e-6);
    }

    #[test]
    fn test_summarize_empty() {
        let stats = summarize(&[], 22, 480, 1080);
        assert_eq!(stats.samples, 0);
        assert_eq!(stats.bounds, None);
        assert_eq!(stats.mean_brightness, 0.0);
        // 22 columns by 50 rows
        assert_eq!(stats.grid_cells, 1100);
    }

    #[test]
    fn test_run_rejects_unknown_format() {
        let dir = std::env::temp_dir().join(format!("mosaic_sample_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("dot.png");
        image::RgbaImage::from_pixel(4, 4, image::Rgba([0, 0, 0, 255]))
            .save(&path)
            .unwrap();

        let args = |format: &str| SampleArgs {
            image: path.to_string_lossy().into_owned(),
            step: 2,
            width: 8,
            height: 8,
            format: format.to_string(),
        };
        assert!(run(args("json")).is_ok());
        assert!(run(args("yaml")).is_err());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
