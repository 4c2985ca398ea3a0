use std::{fs::File, io::BufWriter, path::PathBuf};

use anyhow::{Context, Result};
use brats_eval::{
    backend::{default_device, EvalBackend, BACKEND_NAME},
    evaluate_manifest,
    util::NiftiVolumeSource,
    EvaluationConfig, Manifest,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "brats-eval")]
#[command(about = "Evaluate BraTS brain-tumor segmentations against their ground truth")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate every case of a manifest and write the CSV report
    Evaluate {
        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Dataset manifest (required without --config)
        #[arg(short, long)]
        manifest: Option<PathBuf>,

        /// Root of the case directories
        #[arg(long)]
        data_root: Option<PathBuf>,

        /// Report file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only evaluate cases of this split
        #[arg(long)]
        split: Option<String>,

        /// Hausdorff percentile in (0, 100]
        #[arg(long)]
        percentile: Option<f64>,

        /// Measure Hausdorff distances in millimetres
        #[arg(long)]
        voxel_spacing: bool,

        /// Append accuracy and confusion counts to the report
        #[arg(long)]
        extended: bool,
    },

    /// Show backend information
    Info,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Evaluate {
            config,
            manifest,
            data_root,
            output,
            split,
            percentile,
            voxel_spacing,
            extended,
        } => {
            let mut config = match (config, manifest) {
                (Some(path), manifest) => {
                    let mut config = EvaluationConfig::from_file(&path)
                        .with_context(|| format!("loading {}", path.display()))?;
                    if let Some(manifest) = manifest {
                        config.manifest = manifest;
                    }
                    config
                }
                (None, Some(manifest)) => EvaluationConfig::new(manifest),
                (None, None) => anyhow::bail!("either --config or --manifest is required"),
            };
            if data_root.is_some() {
                config.data_root = data_root;
            }
            if let Some(output) = output {
                config.output = output;
            }
            if split.is_some() {
                config.split = split;
            }
            if let Some(percentile) = percentile {
                config.hausdorff_percentile = percentile;
            }
            config.use_voxel_spacing |= voxel_spacing;
            config.extended_report |= extended;

            evaluate(config)
        }

        Commands::Info => {
            println!("brats-eval information:");
            println!("  Backend: {BACKEND_NAME}");
            println!("  Device: {:?}", default_device());
            Ok(())
        }
    }
}

fn evaluate(config: EvaluationConfig) -> Result<()> {
    config.validate().context("invalid configuration")?;

    let device = default_device();
    tracing::info!(backend = BACKEND_NAME, ?device, "using backend");

    let manifest = Manifest::from_file(&config.manifest, config.manifest_delimiter)
        .context("failed to load manifest")?;
    tracing::info!(
        manifest = %config.manifest.display(),
        cases = manifest.len(),
        "manifest loaded",
    );

    let output = config.output.clone();
    let summary = evaluate_manifest::<EvalBackend, _, _, _>(
        config,
        NiftiVolumeSource,
        device,
        &manifest,
        |path| File::create(path).map(BufWriter::new),
    )
    .with_context(|| format!("evaluation into {} failed", output.display()))?;

    println!(
        "Evaluated {} case(s), skipped {}, failed {}; report written to {}",
        summary.evaluated,
        summary.skipped,
        summary.failed,
        output.display()
    );
    Ok(())
}
