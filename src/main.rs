use clap::{Parser, Subcommand};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use sukashi::{
    Config,
    pipeline::Pipeline,
    startup_checks,
    store::{ArtifactIo, DynOutputSink, filesystem::FilesystemSink, filesystem::FilesystemSource},
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Global options that apply to all commands
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: PathBuf,

    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the pipeline once for a single input image
    Process {
        /// Path to the input image
        input: PathBuf,
    },

    /// Watch the input directory and run the pipeline for each new image
    /// (default if no command specified)
    Watch {
        /// Seconds between directory scans
        #[arg(long, default_value_t = 2)]
        interval: u64,

        /// Automatically quit after specified number of seconds (useful for testing)
        #[arg(long)]
        quit_after: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Set up logging first
    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = if cli.config.exists() {
        let config_content = std::fs::read_to_string(&cli.config)?;
        toml_edit::de::from_str::<Config>(&config_content)?
    } else {
        info!("Config file not found at {:?}, using defaults", cli.config);
        Config::default()
    };

    match cli.command {
        Some(Commands::Process { input }) => process_one(config, input).await,
        Some(Commands::Watch {
            interval,
            quit_after,
        }) => watch(config, interval, quit_after).await,
        None => watch(config, 2, None).await,
    }
}

/// Assemble the pipeline and its stores from configuration.
fn build_pipeline(config: &Config) -> Result<(Pipeline, ArtifactIo), Box<dyn std::error::Error>> {
    let pipeline = Pipeline::new(&config.pipeline)?;

    let watermark_dir = config
        .storage
        .watermark_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let watermark_key = config
        .storage
        .watermark_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or("watermark_path has no file name")?
        .to_string();

    let sinks: Vec<DynOutputSink> = config
        .pipeline
        .targets
        .iter()
        .map(|t| Arc::new(FilesystemSink::new(&t.output_directory)) as DynOutputSink)
        .collect();

    let io = ArtifactIo {
        input: Arc::new(FilesystemSource::new(&config.storage.input_directory)),
        watermark: Arc::new(FilesystemSource::new(watermark_dir)),
        watermark_key,
        sinks,
    };

    Ok((pipeline, io))
}

async fn process_one(config: Config, input: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let filename = input
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or("input path has no file name")?
        .to_string();

    // The file's own directory is the input store for a one-shot run.
    let mut config = config;
    if let Some(parent) = input.parent().filter(|p| !p.as_os_str().is_empty()) {
        config.storage.input_directory = parent.to_path_buf();
    }

    if let Err(errors) = startup_checks::perform_startup_checks(&config).await {
        for e in &errors {
            error!("Startup check failed: {}", e);
        }
        return Err("startup checks failed".into());
    }

    let (pipeline, io) = build_pipeline(&config)?;
    pipeline.process(&filename, &io).await?;
    Ok(())
}

async fn watch(
    config: Config,
    interval: u64,
    quit_after: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Err(errors) = startup_checks::perform_startup_checks(&config).await {
        for e in &errors {
            error!("Startup check failed: {}", e);
        }
        return Err("startup checks failed".into());
    }

    let (pipeline, io) = build_pipeline(&config)?;
    let input_dir = config.storage.input_directory.clone();
    info!(
        "Watching {:?} every {}s for new images (targets: {:?})",
        input_dir,
        interval,
        pipeline.target_widths()
    );

    if let Some(seconds) = quit_after {
        info!("Will automatically quit after {} seconds", seconds);
        tokio::select! {
            result = watch_loop(&pipeline, &io, &input_dir, interval) => result,
            _ = tokio::time::sleep(Duration::from_secs(seconds)) => {
                info!("Quit timer expired, shutting down");
                Ok(())
            }
        }
    } else {
        watch_loop(&pipeline, &io, &input_dir, interval).await
    }
}

async fn watch_loop(
    pipeline: &Pipeline,
    io: &ArtifactIo,
    input_dir: &Path,
    interval: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut ticker = tokio::time::interval(Duration::from_secs(interval.max(1)));

    loop {
        ticker.tick().await;

        let mut entries = match tokio::fs::read_dir(input_dir).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to scan input directory {:?}: {}", input_dir, e);
                continue;
            }
        };

        while let Some(entry) = entries.next_entry().await? {
            let Some(filename) = entry.file_name().to_str().map(String::from) else {
                continue;
            };
            if seen.contains(&filename) || !is_image(&filename) {
                continue;
            }
            // Mark before processing: a failed run is not retried, matching
            // the pipeline's no-internal-retry contract.
            seen.insert(filename.clone());

            if let Err(e) = pipeline.process(&filename, io).await {
                error!("Run failed for {}: {}", filename, e);
            }
        }
    }
}

fn is_image(file_name: &str) -> bool {
    let lower = file_name.to_lowercase();
    lower.ends_with(".jpg")
        || lower.ends_with(".jpeg")
        || lower.ends_with(".png")
        || lower.ends_with(".gif")
        || lower.ends_with(".webp")
        || lower.ends_with(".bmp")
}
