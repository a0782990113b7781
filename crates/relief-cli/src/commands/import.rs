//! Full heightmap load pipeline

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use relief_convert::{
    load_heightmap, prepare, BlurKernel, ConversionScheduler, GaussianKernel, IdentityKernel,
    LoadPlan, ReliefConfig,
};
use relief_terrain::{write_raw, HeightmapBuffer};

pub struct ImportArgs {
    pub path: String,
    pub output: String,
    pub intensity: Option<f32>,
    pub radius: Option<u32>,
    pub kernel: String,
    pub allow_unblurred: bool,
}

/// Layer command-line blur settings over the loaded config and re-check it
fn apply_overrides(
    config: &mut ReliefConfig,
    intensity: Option<f32>,
    radius: Option<u32>,
) -> Result<()> {
    if let Some(intensity) = intensity {
        config.blur.intensity = intensity;
    }
    if let Some(radius) = radius {
        config.blur.radius = radius;
    }
    config
        .validate()
        .context("Invalid blur settings on the command line")?;
    Ok(())
}

pub fn run(args: ImportArgs) -> Result<()> {
    let mut config = ReliefConfig::load().context("Failed to load relief config")?;
    apply_overrides(&mut config, args.intensity, args.radius)?;

    let kernel: Option<Arc<dyn BlurKernel>> = match args.kernel.as_str() {
        "gaussian" => Some(Arc::new(GaussianKernel::new(config.blur.radius))),
        "identity" => Some(Arc::new(IdentityKernel::new())),
        _ => None,
    };

    let path = Path::new(&args.path);
    let output = Path::new(&args.output);
    let result: Arc<Mutex<Option<HeightmapBuffer>>> = Arc::new(Mutex::new(None));
    let slot = result.clone();

    let plan = load_heightmap(path, kernel, config.job_options()?, move |buffer| {
        if let Ok(mut slot) = slot.lock() {
            *slot = Some(buffer);
        }
    });

    match plan {
        Ok(LoadPlan::Ready) => {}
        Ok(LoadPlan::Blur(job)) => {
            let mut scheduler = ConversionScheduler::new();
            scheduler.submit(job)?;

            let mut clock = config.clock();
            if let Some(failure) = scheduler.run_until_idle(&mut clock).into_iter().next() {
                anyhow::bail!("Blur job {} failed: {}", failure.job_id, failure.error);
            }
        }
        Err(e) if e.is_dependency_unavailable() && args.allow_unblurred => {
            log::warn!("{}; writing the heightmap without the blur pass", e);
            let prepared = prepare(path)
                .with_context(|| format!("Failed to load heightmap '{}'", path.display()))?;
            write_raw(output, &prepared.buffer)?;
            println!(
                "Wrote unblurred {}x{} heightmap to {}",
                prepared.buffer.width(),
                prepared.buffer.height(),
                output.display()
            );
            return Ok(());
        }
        Err(e) => {
            return Err(e)
                .with_context(|| format!("Failed to load heightmap '{}'", path.display()))
        }
    }

    let buffer = result
        .lock()
        .map_err(|_| anyhow::anyhow!("result slot poisoned"))?
        .take()
        .context("Pipeline finished without producing a heightmap")?;

    write_raw(output, &buffer)?;
    println!(
        "Wrote {}x{} heightmap to {}",
        buffer.width(),
        buffer.height(),
        output.display()
    );
    Ok(())
}
