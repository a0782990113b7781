//! Heightmap load and export entry points
//!
//! Loading picks a path by file type and size:
//! - 16-bit raw (4096x4096): applied as-is
//! - 8-bit raw (4096x4096): expanded to 16-bit, then blurred
//! - image on the legacy 1081x1081 grid: resampled to 4096x4096, then blurred
//! - any other image: converted to 16-bit grayscale, then blurred

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use relief_core::{FormatError, ReliefError, Result};
use relief_terrain::{
    decode, detect_raw_depth, grayscale16, is_legacy_grid, load_image, resample, write_raw,
    BitDepth, HeightmapBuffer, TerrainHost, DEFAULT_ELEVATION_OFFSET,
};

use crate::job::{ConversionJob, ConversionRequest, JobOptions};
use crate::kernel::BlurKernel;

/// Side length of raw heightmap files
pub const RAW_SIDE: u32 = 4096;

/// How a heightmap file is decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeightmapSource {
    Raw,
    Image,
}

impl HeightmapSource {
    /// Pick a decoder from the file extension
    pub fn detect(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());
        match ext.as_deref() {
            Some("png") | Some("tif") | Some("tiff") => HeightmapSource::Image,
            _ => HeightmapSource::Raw,
        }
    }
}

/// A decoded heightmap that has not been blurred
#[derive(Debug)]
pub struct PreparedHeightmap {
    /// Always 16-bit
    pub buffer: HeightmapBuffer,
    pub source: HeightmapSource,
    /// Whether the legacy grid was resampled
    pub legacy: bool,
    /// Whether the blur pass should run before the heightmap is used
    pub needs_blur: bool,
}

/// Outcome of `load_heightmap`
pub enum LoadPlan {
    /// The heightmap was ready and the callback has already run
    Ready,
    /// The heightmap needs blurring; start or submit the job to finish it
    Blur(ConversionJob),
}

impl std::fmt::Debug for LoadPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadPlan::Ready => write!(f, "Ready"),
            LoadPlan::Blur(job) => write!(f, "Blur({})", job.id()),
        }
    }
}

enum Decoded {
    Raw8(Vec<u8>),
    Raw16(HeightmapBuffer),
    Image { buffer: HeightmapBuffer, legacy: bool },
}

fn decode_file(path: &Path) -> Result<Decoded> {
    match HeightmapSource::detect(path) {
        HeightmapSource::Raw => {
            let bytes = std::fs::read(path).map_err(|e| ReliefError::io(path, e))?;
            match detect_raw_depth(bytes.len(), RAW_SIDE, RAW_SIDE) {
                Some(BitDepth::Eight) => Ok(Decoded::Raw8(bytes)),
                Some(BitDepth::Sixteen) => Ok(Decoded::Raw16(decode(
                    &bytes,
                    RAW_SIDE,
                    RAW_SIDE,
                    BitDepth::Sixteen,
                )?)),
                None => Err(FormatError::UnrecognizedRawSize {
                    path: path.to_path_buf(),
                    side: RAW_SIDE,
                    expected8: RAW_SIDE as usize * RAW_SIDE as usize,
                    expected16: RAW_SIDE as usize * RAW_SIDE as usize * 2,
                    actual: bytes.len(),
                }
                .into()),
            }
        }
        HeightmapSource::Image => {
            let image = load_image(path)?;
            if is_legacy_grid(image.width(), image.height()) {
                let buffer = resample(&image, DEFAULT_ELEVATION_OFFSET)?;
                Ok(Decoded::Image {
                    buffer,
                    legacy: true,
                })
            } else {
                Ok(Decoded::Image {
                    buffer: image,
                    legacy: false,
                })
            }
        }
    }
}

/// Decode a heightmap file without blurring it
pub fn prepare(path: &Path) -> Result<PreparedHeightmap> {
    let prepared = match decode_file(path)? {
        Decoded::Raw8(bytes) => PreparedHeightmap {
            buffer: decode(&bytes, RAW_SIDE, RAW_SIDE, BitDepth::Eight)?.into_gray16(),
            source: HeightmapSource::Raw,
            legacy: false,
            needs_blur: true,
        },
        Decoded::Raw16(buffer) => PreparedHeightmap {
            buffer,
            source: HeightmapSource::Raw,
            legacy: false,
            needs_blur: false,
        },
        Decoded::Image { buffer, legacy } => PreparedHeightmap {
            buffer,
            source: HeightmapSource::Image,
            legacy,
            needs_blur: true,
        },
    };
    Ok(prepared)
}

/// Load a heightmap file and deliver the finished 16-bit buffer to
/// `on_complete`, either immediately or through a blur job.
///
/// A missing or unavailable kernel is `DependencyUnavailable` unless the
/// file needs no blur. The callback never runs when loading fails.
pub fn load_heightmap<F>(
    path: &Path,
    kernel: Option<Arc<dyn BlurKernel>>,
    options: JobOptions,
    on_complete: F,
) -> Result<LoadPlan>
where
    F: FnOnce(HeightmapBuffer) + Send + 'static,
{
    let request = match decode_file(path)? {
        Decoded::Raw16(buffer) => {
            log::info!("Applying 16-bit heightmap {} directly", path.display());
            on_complete(buffer);
            return Ok(LoadPlan::Ready);
        }
        Decoded::Raw8(bytes) => ConversionRequest::Raw8 {
            bytes,
            width: RAW_SIDE,
            height: RAW_SIDE,
        },
        Decoded::Image { buffer, .. } => ConversionRequest::Buffer(buffer),
    };

    let job = ConversionJob::new(request, kernel, options, on_complete)?;
    log::info!("Queued blur job {} for {}", job.id(), path.display());
    Ok(LoadPlan::Blur(job))
}

/// Export the host's current heightmap as a 16-bit raw file
pub fn export_heightmap(host: &dyn TerrainHost, path: &Path) -> Result<HeightmapBuffer> {
    let image = host.heightmap()?;
    let buffer = grayscale16(&image);
    write_raw(path, &buffer)?;
    Ok(buffer)
}

/// `<Documents>/<name>.raw`, or the working directory without a Documents folder
pub fn default_export_path(name: &str) -> PathBuf {
    let dir = dirs::document_dir().unwrap_or_else(|| PathBuf::from("."));
    dir.join(format!("{}.raw", name))
}

/// Completion callback that installs the finished heightmap on a host
pub fn apply_to_host<H>(host: Arc<Mutex<H>>) -> impl FnOnce(HeightmapBuffer) + Send + 'static
where
    H: TerrainHost + Send + 'static,
{
    move |buffer: HeightmapBuffer| match host.lock() {
        Ok(mut host) => {
            if let Err(e) = host.replace_heightmap(buffer) {
                log::error!("Failed to apply heightmap: {}", e);
            }
        }
        Err(_) => log::error!("Failed to apply heightmap: terrain host lock poisoned"),
    }
}
