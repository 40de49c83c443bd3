//! # Asset Baker - Main Entry Point
//!
//! ## Responsibilities:
//! - Parse the command line with `clap`
//! - Initialise `tracing` (warn by default, debug with `--verbose`, `RUST_LOG` wins)
//! - Resolve and validate the build configuration and external tools; an
//!   optional JSON file (`--config-file`) supplies the base settings and any
//!   flag given on the command line overrides it
//! - Create the destination root, install the Ctrl+C handler and run the scheduler
//! - Print the final summary (or a JSON report) and pick the exit code
//!
//! ## Exit codes:
//! - 0: build finished, even with per-file errors (see the error log)
//! - 1: fatal configuration or startup error, nothing was built
//! - 130: interrupted by the operator
//!
//! ## Example:
//! ```bash
//! asset-baker -i ./MyGame -c Release -t web -j 16 --normal-identifiers _n nrm
//! asset-baker -i ./MyGame --config-file bake.json --ci
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use asset_baker::progress::Glyphs;
use asset_baker::report::JsonMessage;
use asset_baker::{
    BuildConfig, BuildError, CliEncoder, Configuration, InterruptController, Scheduler, Target,
    TaskStatus, ToolPathResolver,
};

#[derive(Parser)]
#[command(name = "asset-baker")]
#[command(about = "Transcode textures to KTX2 and copy engine assets, rebuilding only what changed")]
struct Args {
    /// Project directory containing Assets/ and PostBuildCopy/
    #[arg(short, long)]
    input: PathBuf,

    /// JSON file with base build settings
    #[arg(long)]
    config_file: Option<PathBuf>,

    /// Write the resolved settings to this JSON file before building
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// Build configuration the output is placed under [default: Debug]
    #[arg(short, long, value_enum)]
    config: Option<Configuration>,

    /// Encoder quality, 0 = fastest, 1 = slowest [default: 0]
    #[arg(short, long)]
    quality: Option<f32>,

    /// Zstandard supercompression level (1-22) [default: 10]
    #[arg(short = 'l', long)]
    deflate_level: Option<u8>,

    /// Target platform for texture compression [default: desktop]
    #[arg(short, long, value_enum)]
    target: Option<Target>,

    /// Number of parallel jobs [default: 8]
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Do not generate mipmaps
    #[arg(long)]
    no_mips: bool,

    /// Keep the encoder's default format instead of a GPU block format
    #[arg(long)]
    no_transcode: bool,

    /// Skip Zstandard supercompression
    #[arg(long)]
    no_deflate: bool,

    /// Rebuild every texture regardless of timestamps
    #[arg(long)]
    force_textures: bool,

    /// Output folder name instead of the project directory name
    #[arg(long)]
    override_name: Option<String>,

    /// File-name substrings identifying normal maps (case-insensitive)
    #[arg(long, num_args = 1..)]
    normal_identifiers: Vec<String>,

    /// Non-interactive mode: no live display, ASCII output
    #[arg(long)]
    ci: bool,

    /// Path to compressonatorcli
    #[arg(long)]
    compressonator: Option<PathBuf>,

    /// Path to the ktx tool
    #[arg(long)]
    ktx: Option<PathBuf>,

    /// Print structured JSON messages on stdout
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Settings from `--config-file` (or the defaults), overridden by the flags given
    async fn build_config(&self) -> Result<BuildConfig> {
        let mut config = match &self.config_file {
            Some(path) => BuildConfig::from_file(path)
                .await
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
            None => BuildConfig::default(),
        };

        config.source_root = if self.input.is_absolute() {
            self.input.clone()
        } else {
            std::env::current_dir()
                .context("Cannot resolve the current directory")?
                .join(&self.input)
        };

        if let Some(configuration) = self.config {
            config.configuration = configuration;
        }
        if let Some(target) = self.target {
            config.target = target;
        }
        if let Some(quality) = self.quality {
            config.quality = quality;
        }
        if let Some(level) = self.deflate_level {
            config.deflate_level = level;
        }
        if let Some(jobs) = self.jobs {
            config.jobs = jobs;
        }
        if self.override_name.is_some() {
            config.override_name = self.override_name.clone();
        }
        if !self.normal_identifiers.is_empty() {
            config.normal_identifiers = self.normal_identifiers.clone();
        }

        config.generate_mips &= !self.no_mips;
        config.transcode &= !self.no_transcode;
        config.supercompress &= !self.no_deflate;
        config.force_rebuild |= self.force_textures;
        config.ci |= self.ci;

        Ok(config)
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(e) = run(args).await {
        let code = e
            .downcast_ref::<BuildError>()
            .map(BuildError::exit_code)
            .unwrap_or(1);
        if !matches!(e.downcast_ref::<BuildError>(), Some(BuildError::Interrupted)) {
            eprintln!("Error: {:#}", e);
        }
        // Blocking workers may still be inside an encoder call; do not wait for them
        std::process::exit(code);
    }
}

async fn run(args: Args) -> Result<()> {
    let mut config = args.build_config().await?;
    config.validate()?;
    if let Some(path) = &args.save_config {
        config
            .save_to_file(path)
            .await
            .with_context(|| format!("Failed to save configuration to {}", path.display()))?;
        debug!("Saved configuration to {}", path.display());
    }
    let glyphs = Glyphs::for_mode(config.ci);

    let encoder = CliEncoder::resolve(
        &ToolPathResolver::new(),
        args.compressonator.as_deref(),
        args.ktx.as_deref(),
    )?;
    if config.supercompress && !encoder.has_supercompressor() {
        warn!("ktx not found, supercompression disabled");
        eprintln!("{} ktx not found, supercompression disabled", glyphs.warn);
        config.supercompress = false;
    }

    let destination_root = config.destination_root();
    if !destination_root.exists() {
        eprintln!(
            "Output directory {} does not exist! Creating it now.",
            destination_root.display()
        );
        std::fs::create_dir_all(&destination_root).with_context(|| {
            format!("Failed to create output directory {}", destination_root.display())
        })?;
    }

    if let Ok(json) = serde_json::to_string(&config) {
        debug!("Resolved configuration: {}", json);
    }

    let interrupt = InterruptController::new();
    let stop = interrupt.subscribe();
    interrupt.install();

    let json_output = args.json;
    let scheduler = Scheduler::new(config, Arc::new(encoder));
    let tasks = scheduler.discover();
    let config = scheduler.config();

    if json_output {
        JsonMessage::Start {
            source_root: config.source_root.clone(),
            destination_root: destination_root.clone(),
            total_files: tasks.len(),
            jobs: config.jobs,
            target: config.target,
        }
        .emit();
    }
    eprintln!("Compressing textures using {} parallel jobs", config.jobs);
    eprintln!("Total files: {}\n", tasks.len());

    match scheduler.run(tasks, stop).await {
        Ok(report) => {
            debug!(
                "Outcome: {} transcoded, {} copied, {} skipped, {} failed",
                report.count(TaskStatus::Completed),
                report.count(TaskStatus::Copied),
                report.count(TaskStatus::Skipped),
                report.count(TaskStatus::Failed)
            );
            for line in report.summary_lines(&glyphs) {
                eprintln!("{}", line);
            }
            if json_output {
                JsonMessage::Complete(report).emit();
            }
            Ok(())
        }
        Err(BuildError::Interrupted) => {
            eprintln!(
                "\n{} Build interrupted! Log file saved to: {}",
                glyphs.warn,
                scheduler.log_path().display()
            );
            if json_output {
                JsonMessage::Interrupted {
                    log_file: scheduler.log_path().to_path_buf(),
                }
                .emit();
            }
            Err(BuildError::Interrupted.into())
        }
        Err(e) => Err(e.into()),
    }
}
