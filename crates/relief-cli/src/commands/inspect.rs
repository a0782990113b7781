//! Heightmap inspection command

use std::path::Path;

use anyhow::{Context, Result};
use relief_convert::{HeightmapSource, RAW_SIDE};
use relief_terrain::{decode, detect_raw_depth, grayscale16, is_legacy_grid, HeightmapBuffer};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct Report {
    path: String,
    format: String,
    width: u32,
    height: u32,
    bit_depth: u8,
    legacy_grid: bool,
    needs_blur: bool,
    min: f32,
    max: f32,
    mean: f32,
}

pub fn run(path: &str, format: &str) -> Result<()> {
    let file = Path::new(path);

    let (kind, bit_depth, buffer) = match HeightmapSource::detect(file) {
        HeightmapSource::Raw => {
            let bytes = std::fs::read(file)
                .with_context(|| format!("Failed to read '{}'", path))?;
            let depth = detect_raw_depth(bytes.len(), RAW_SIDE, RAW_SIDE).with_context(|| {
                format!(
                    "'{}' is {} bytes, expected {} (8-bit) or {} (16-bit) for {}x{}",
                    path,
                    bytes.len(),
                    RAW_SIDE as usize * RAW_SIDE as usize,
                    RAW_SIDE as usize * RAW_SIDE as usize * 2,
                    RAW_SIDE,
                    RAW_SIDE
                )
            })?;
            let buffer = decode(&bytes, RAW_SIDE, RAW_SIDE, depth)?;
            ("raw".to_string(), depth.bits(), buffer)
        }
        HeightmapSource::Image => {
            let image = image::open(file)
                .with_context(|| format!("Failed to open image '{}'", path))?;
            let color = image.color();
            let bits = (color.bits_per_pixel() / color.channel_count() as u16) as u8;
            (format!("image ({:?})", color), bits, grayscale16(&image))
        }
    };

    let report = build_report(path, kind, bit_depth, &buffer);

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => print_text(&report),
    }
    Ok(())
}

fn build_report(path: &str, format: String, bit_depth: u8, buffer: &HeightmapBuffer) -> Report {
    let stats = buffer.stats();
    let legacy_grid = is_legacy_grid(buffer.width(), buffer.height());
    Report {
        path: path.to_string(),
        needs_blur: format != "raw" || bit_depth == 8,
        format,
        width: buffer.width(),
        height: buffer.height(),
        bit_depth,
        legacy_grid,
        min: stats.min,
        max: stats.max,
        mean: stats.mean,
    }
}

fn print_text(report: &Report) {
    println!("{}", report.path);
    println!("  format:    {}", report.format);
    println!("  size:      {}x{}", report.width, report.height);
    println!("  bit depth: {}", report.bit_depth);
    if report.legacy_grid {
        println!("  grid:      legacy (resampled on import)");
    }
    println!("  blur:      {}", if report.needs_blur { "required" } else { "not required" });
    println!(
        "  range:     {:.4} .. {:.4} (mean {:.4})",
        report.min, report.max, report.mean
    );
}
