//! # lowpoly
//!
//! Batch decimation of high-polygon scans into low-polygon assets, with the
//! geometric error of every material group kept under a size-relative
//! Hausdorff tolerance.
//!
//! ## Usage
//!
//! ```bash
//! # Medium preset (100k polygons per group)
//! lowpoly -i scan.obj -o scan_low.obj
//!
//! # Explicit target and a looser tolerance
//! lowpoly -i scan.obj -o scan_low.obj -q custom --custom-target 20000 --threshold 0.005
//!
//! # Settings from a file, one session per worker thread
//! lowpoly -i scan.obj -o scan_low.obj --config lowpoly.toml --parallel
//! ```
//!
//! ## Configuration (lowpoly.toml)
//!
//! ```toml
//! parallel = false
//!
//! [decimation]
//! preset = "medium"
//! relative_threshold = 0.001
//! max_attempts = 6
//! strict_presets = false
//!
//! [cleanup]
//! merge_distance = 0.0001
//! remove_loose = true
//! triangulate = false
//! ```

mod config;

use anyhow::{Context, Result};
use clap::Parser;
use config::PipelineConfig;
use lowpoly_io::{store_for_path, MaterialCompositor, MeshHandle, SceneCompositor};
use lowpoly_simplification::{GroupOutcome, GroupPipeline};
use rayon::prelude::*;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "lowpoly")]
#[command(about = "Adaptive low-poly decimation with Hausdorff quality control")]
#[command(version)]
struct Args {
    /// Input mesh (.obj)
    #[arg(short, long)]
    input: PathBuf,

    /// Output mesh (.obj)
    #[arg(short, long)]
    output: PathBuf,

    /// Quality preset: low, medium, high or custom
    #[arg(short, long)]
    quality: Option<String>,

    /// Target polygon count for the custom preset
    #[arg(long)]
    custom_target: Option<usize>,

    /// Hausdorff tolerance as a fraction of the bounding-box diagonal
    #[arg(long)]
    threshold: Option<f64>,

    /// Decimation passes allowed per group
    #[arg(long)]
    max_attempts: Option<usize>,

    /// Configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Process material groups in parallel
    #[arg(long)]
    parallel: bool,

    /// Reject unknown preset names instead of falling back to medium
    #[arg(long)]
    strict_presets: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// CLI flags take precedence over the configuration file.
fn apply_overrides(config: &mut PipelineConfig, args: &Args) {
    if let Some(quality) = &args.quality {
        config.decimation.preset = quality.clone();
    }
    if args.custom_target.is_some() {
        config.decimation.custom_target = args.custom_target;
    }
    if let Some(threshold) = args.threshold {
        config.decimation.relative_threshold = threshold;
    }
    if let Some(max_attempts) = args.max_attempts {
        config.decimation.max_attempts = max_attempts;
    }
    config.parallel |= args.parallel;
    config.decimation.strict_presets |= args.strict_presets;
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

// ============================================================================
// Processing
// ============================================================================

fn process_group(pipeline: &GroupPipeline, handle: MeshHandle) -> Result<(MeshHandle, GroupOutcome)> {
    let MeshHandle {
        name,
        material,
        mesh,
        material_libs,
    } = handle;
    let mut outcome = pipeline
        .run(mesh)
        .with_context(|| format!("failed to decimate group '{}'", name))?;

    let mesh = std::mem::take(&mut outcome.mesh);
    Ok((MeshHandle::new(name, material, mesh).with_material_libs(material_libs), outcome))
}

fn print_summary(handles: &[MeshHandle], outcomes: &[GroupOutcome], args: &Args, elapsed_secs: f64) {
    let rule = "=".repeat(72);
    println!("{rule}");
    println!("Decimation complete");
    println!("{rule}");
    println!(
        "{:<24} {:>10} {:>10} {:>9} {:>12} {:>8}",
        "group", "original", "final", "reduced", "hausdorff", "passes"
    );
    for (handle, o) in handles.iter().zip(outcomes) {
        let flag = if o.report.accepted_via_exhaustion { " !" } else { "" };
        println!(
            "{:<24} {:>10} {:>10} {:>8.1}% {:>12.6} {:>8}{}",
            handle.name,
            o.input_faces,
            o.final_faces,
            o.reduction_percent,
            o.report.final_distance,
            o.report.decimation_calls,
            flag
        );
    }

    let original: usize = outcomes.iter().map(|o| o.input_faces).sum();
    let fin: usize = outcomes.iter().map(|o| o.final_faces).sum();
    let reduction = if original == 0 {
        0.0
    } else {
        (1.0 - fin as f64 / original as f64) * 100.0
    };
    let shortfalls: Vec<&str> = handles
        .iter()
        .zip(outcomes)
        .filter(|(_, o)| o.report.accepted_via_exhaustion)
        .map(|(h, _)| h.name.as_str())
        .collect();

    println!("{rule}");
    println!("Original faces: {}", original);
    println!("Final faces:    {}", fin);
    println!("Reduction:      {:.1}%", reduction);
    if !shortfalls.is_empty() {
        println!("Quality threshold missed (!): {}", shortfalls.join(", "));
    }
    println!("Output saved to: {}", args.output.display());
    println!("Elapsed: {:.2}s", elapsed_secs);
    println!("{rule}");
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    apply_overrides(&mut config, &args);

    // Fail on bad settings or formats before any work is done
    let target = config.decimation.initial_target()?;
    let reader = store_for_path(&args.input)?;
    let writer = store_for_path(&args.output)?;

    info!(
        input = %args.input.display(),
        output = %args.output.display(),
        preset = %config.decimation.preset,
        target,
        relative_threshold = config.decimation.relative_threshold,
        max_attempts = config.decimation.max_attempts,
        parallel = config.parallel,
        "starting"
    );

    let start = Instant::now();
    let handles = reader
        .load(&args.input)
        .with_context(|| format!("failed to load {}", args.input.display()))?;
    let groups = MaterialCompositor::new().compose(handles)?;
    info!(groups = groups.len(), "scene composed");

    let pipeline = GroupPipeline::new(config.decimation.clone(), config.cleanup);
    let results: Vec<(MeshHandle, GroupOutcome)> = if config.parallel {
        groups
            .into_par_iter()
            .map(|handle| process_group(&pipeline, handle))
            .collect::<Result<_>>()?
    } else {
        groups
            .into_iter()
            .map(|handle| process_group(&pipeline, handle))
            .collect::<Result<_>>()?
    };

    let (out, outcomes): (Vec<MeshHandle>, Vec<GroupOutcome>) = results.into_iter().unzip();
    for (handle, o) in out.iter().zip(&outcomes) {
        if o.report.accepted_via_exhaustion {
            warn!(group = %handle.name, "delivered below the requested quality");
        }
    }

    writer
        .save(&args.output, &out)
        .with_context(|| format!("failed to save {}", args.output.display()))?;

    print_summary(&out, &outcomes, &args, start.elapsed().as_secs_f64());
    Ok(())
}
