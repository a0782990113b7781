//! 8-bit to 16-bit raw expansion

use std::path::Path;

use anyhow::{Context, Result};
use relief_terrain::{read_raw, write_raw, BitDepth};

pub fn run(input: &str, width: u32, height: u32, output: &str) -> Result<()> {
    let source = read_raw(Path::new(input), width, height, BitDepth::Eight)
        .with_context(|| format!("Failed to read 8-bit heightmap '{}'", input))?;

    let expanded = source.into_gray16();
    write_raw(Path::new(output), &expanded)?;

    println!(
        "Expanded {}x{} heightmap to 16-bit: {} ({} bytes)",
        width,
        height,
        output,
        expanded.byte_len()
    );
    Ok(())
}
