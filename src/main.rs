// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow, Context};
use log::{warn, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::path::{Path, PathBuf};
use std::io::Write;
use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;
use clap::{Parser, ValueEnum, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use sublayout::app_config::{self, Config};
use sublayout::app_controller::Controller;
use sublayout::file_utils::FileManager;
use sublayout::layout::LayoutContext;
use sublayout::providers::{FaceBox, StaticFaceSampler};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Lay out the cues of subtitle files (default command)
    Layout(LayoutArgs),

    /// Generate shell completions for sublayout
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct LayoutArgs {
    /// Input SRT file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    #[command(flatten)]
    options: LayoutOptions,
}

#[derive(clap::Args, Debug, Clone)]
struct LayoutOptions {
    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Frame width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Frame height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Background luma (0-255) of the sampled frames
    #[arg(long)]
    luma: Option<u8>,

    /// Face box present in every frame, as x,y,w,h (repeatable)
    #[arg(long = "face", value_name = "X,Y,W,H", value_parser = parse_face_box)]
    faces: Vec<FaceBox>,
}

/// sublayout - adaptive subtitle layout
///
/// Decides line breaks, screen placement and colours for every subtitle cue,
/// keeping captions off faces and legible against the background.
#[derive(Parser, Debug)]
#[command(name = "sublayout")]
#[command(version)]
#[command(about = "Adaptive subtitle layout engine")]
#[command(long_about = "sublayout wraps subtitle cues into balanced lines, places them away from faces and picks legible colours.

EXAMPLES:
    sublayout episode.srt                            # Lay out using default config
    sublayout -f episode.srt                         # Force overwrite existing layout
    sublayout --width 1920 --height 1080 ep.srt      # Landscape frames
    sublayout --luma 230 episode.srt                 # Bright background
    sublayout --face 300,1400,400,400 episode.srt    # Keep captions off a face
    sublayout --log-level debug /subtitles/          # Process entire directory
    sublayout completions bash > sublayout.bash      # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.

OUTPUT:
    For every input.srt, input.layout.json is written next to it.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input SRT file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    #[command(flatten)]
    options: LayoutOptions,
}

fn parse_face_box(value: &str) -> Result<FaceBox, String> {
    StaticFaceSampler::parse_box(value).map_err(|e| e.to_string())
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let color = Self::get_color_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {:<5} {}\x1B[0m",
                color, now, record.level(), record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The level is lowered or raised once the config is known
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "sublayout", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Layout(args)) => run_layout(args).await,
        None => {
            let input_path = cli.input_path.ok_or_else(|| {
                anyhow!("INPUT_PATH is required when no subcommand is specified")
            })?;

            run_layout(LayoutArgs {
                input_path,
                options: cli.options,
            })
            .await
        }
    }
}

fn load_config(options: &LayoutOptions) -> Result<Config> {
    let config_path = &options.config_path;
    let mut config = if Path::new(config_path).exists() {
        let file = File::open(config_path)
            .context(format!("Failed to open config file: {}", config_path))?;

        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .context(format!("Failed to parse config file: {}", config_path))?
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);

        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;

        std::fs::write(config_path, config_json)
            .context(format!("Failed to write default config to file: {}", config_path))?;

        config
    };

    // Command line options override the file
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }
    if let Some(width) = options.width {
        config.layout.frame_width = width;
    }
    if let Some(height) = options.height {
        config.layout.frame_height = height;
    }
    if let Some(luma) = options.luma {
        config.layout.background_luma = luma;
    }

    Ok(config)
}

async fn run_layout(args: LayoutArgs) -> Result<()> {
    let options = &args.options;

    if let Some(cmd_log_level) = &options.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let config = load_config(options)?;
    config.validate()
        .context("Configuration validation failed")?;

    log::set_max_level(config.log_level.to_level_filter());

    let mut context = LayoutContext::builder();
    if !options.faces.is_empty() {
        context = context.face_sampler(Arc::new(StaticFaceSampler::new(options.faces.clone())));
    }

    let controller = Controller::with_context(config, Arc::new(context.build()))?;

    if FileManager::file_exists(&args.input_path) {
        controller.run(
            args.input_path.clone(),
            args.input_path.parent().unwrap_or(Path::new(".")).to_path_buf(),
            options.force_overwrite
        ).await?;
    } else if FileManager::dir_exists(&args.input_path) {
        controller.run_folder(
            args.input_path.clone(),
            options.force_overwrite
        ).await?;
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", args.input_path));
    }

    Ok(())
}
