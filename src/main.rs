// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::fs::File;
use std::io::BufReader;
use std::io::Write;
use std::path::{Path, PathBuf};

use shadowreel::app_config::{self, Config, TtsConfig, TtsProvider};
use shadowreel::app_controller::Controller;
use shadowreel::file_utils::FileManager;
use shadowreel::pipeline::GenerationRequest;
use shadowreel::practice::TranslationLookup;
use shadowreel::subtitle_processor::ClipRange;

/// CLI Wrapper for TtsProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTtsProvider {
    EdgeTts,
    #[value(name = "openai")]
    OpenAI,
}

impl From<CliTtsProvider> for TtsProvider {
    fn from(cli_provider: CliTtsProvider) -> Self {
        match cli_provider {
            CliTtsProvider::EdgeTts => TtsProvider::EdgeTts,
            CliTtsProvider::OpenAI => TtsProvider::OpenAI,
        }
    }
}

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

/// Options shared by every command that runs the pipeline
#[derive(Args, Debug)]
struct CommonArgs {
    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Number of passes over the clip
    #[arg(short, long)]
    repeat: Option<usize>,

    /// Comma separated caption mode per pass (e.g. no_subtitle,en,en_ko)
    #[arg(short, long, value_delimiter = ',')]
    modes: Option<Vec<String>>,

    /// Source language code (e.g. 'en')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g. 'ko')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Speak the first pass with this speech provider
    #[arg(long, value_enum)]
    tts: Option<CliTtsProvider>,

    /// Voice name for the speech provider
    #[arg(long, requires = "tts")]
    voice: Option<String>,
}

#[derive(Parser, Debug)]
struct GenerateArgs {
    /// Source video clip
    #[arg(value_name = "CLIP")]
    clip: PathBuf,

    /// SRT or WebVTT captions for the clip
    #[arg(value_name = "CAPTIONS")]
    captions: PathBuf,

    /// Output video (default: <CLIP stem>.practice.mp4 next to the clip)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON object mapping caption text to its translation
    #[arg(long)]
    translation: Option<PathBuf>,

    /// Practice only from this time (HH:MM:SS.mmm or seconds)
    #[arg(long, requires = "end")]
    start: Option<String>,

    /// Practice only up to this time
    #[arg(long, requires = "start")]
    end: Option<String>,

    /// Force overwrite of an existing output file
    #[arg(short, long)]
    force_overwrite: bool,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Parser, Debug)]
struct BatchArgs {
    /// Directory of videos with sibling caption files
    #[arg(value_name = "DIR")]
    input_dir: PathBuf,

    /// Force overwrite of existing practice videos
    #[arg(short, long)]
    force_overwrite: bool,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a practice video from one clip
    Generate(GenerateArgs),

    /// Build practice videos for every captioned video in a directory
    Batch(BatchArgs),

    /// Generate shell completions for shadowreel
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Shadowreel - repeat practice videos for language shadowing
///
/// Plays a clip several times with different captions, focus messages in
/// between and an optional synthesized voice on the first pass.
#[derive(Parser, Debug)]
#[command(name = "shadowreel")]
#[command(version)]
#[command(about = "Repeat practice videos for language shadowing")]
#[command(long_about = "Shadowreel turns a short clip and its captions into a practice video.

EXAMPLES:
    shadowreel generate clip.mp4 clip.srt                      # Defaults from conf.json
    shadowreel generate clip.mp4 clip.srt -o out.mp4 -r 4      # Four passes
    shadowreel generate clip.mp4 clip.srt -m no_subtitle,en,en_ko --translation ko.json
    shadowreel generate movie.mkv movie.srt --start 00:01:00 --end 00:01:20
    shadowreel generate clip.mp4 clip.srt --tts edge-tts       # Speak the first pass
    shadowreel batch /videos/                                  # Every video with captions
    shadowreel completions bash > shadowreel.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
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

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
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
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {} {}\x1B[0m",
                Self::get_color_for_level(record.level()),
                now,
                Self::get_emoji_for_level(record.level()),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Trace lets set_max_level raise verbosity later
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "shadowreel", &mut std::io::stdout());
            Ok(())
        }
        Commands::Generate(args) => run_generate(args).await,
        Commands::Batch(args) => run_batch(args).await,
    }
}

/// Load the config file (creating it when absent) and apply CLI overrides
fn load_config(options: &CommonArgs) -> Result<Config> {
    if let Some(cmd_log_level) = &options.log_level {
        log::set_max_level(level_filter(&cmd_log_level.clone().into()));
    }

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

    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }
    if let Some(repeat) = options.repeat {
        config.repeat.repeat_count = repeat;
    }
    if let Some(modes) = &options.modes {
        config.repeat.subtitle_modes = modes.clone();
    }
    if let Some(source_lang) = &options.source_language {
        config.source_language = source_lang.clone();
    }
    if let Some(target_lang) = &options.target_language {
        config.target_language = target_lang.clone();
    }
    if let Some(provider) = &options.tts {
        let provider: TtsProvider = provider.clone().into();
        let tts = match config.tts.take() {
            Some(existing) if existing.provider == provider => existing,
            _ => TtsConfig::new(provider),
        };
        config.tts = Some(tts);
    }
    if let (Some(voice), Some(tts)) = (&options.voice, config.tts.as_mut()) {
        tts.voice = voice.clone();
    }

    config.validate().context("Configuration validation failed")?;

    if options.log_level.is_none() {
        log::set_max_level(level_filter(&config.log_level));
    }

    Ok(config)
}

async fn run_generate(args: GenerateArgs) -> Result<()> {
    let config = load_config(&args.common)?;

    if !FileManager::file_exists(&args.clip) {
        return Err(anyhow!("Input file does not exist: {:?}", args.clip));
    }

    let output = match &args.output {
        Some(output) => output.clone(),
        None => {
            let dir = args.clip.parent().unwrap_or(Path::new(".")).to_path_buf();
            FileManager::generate_output_path(&args.clip, dir)
        }
    };
    if output.exists() && !args.force_overwrite {
        warn!("Output file already exists: {:?}. Use -f to force overwrite.", output);
        return Ok(());
    }

    let mut request = GenerationRequest::new(&args.clip, &args.captions, output);
    if let Some(translation) = &args.translation {
        let lookup = TranslationLookup::from_json_file(translation)
            .with_context(|| format!("Failed to load translations: {:?}", translation))?;
        request = request.with_translation(lookup);
    }
    if let (Some(start), Some(end)) = (&args.start, &args.end) {
        let range = ClipRange::parse(start, end).context("Invalid --start/--end range")?;
        request = request.with_clip_range(range);
    }

    let controller = Controller::with_config(config)?;
    controller.run(request).await?;
    Ok(())
}

async fn run_batch(args: BatchArgs) -> Result<()> {
    let config = load_config(&args.common)?;
    let controller = Controller::with_config(config)?;
    let summary = controller.run_folder(args.input_dir, args.force_overwrite).await?;

    if summary.failed > 0 {
        return Err(anyhow!("{} video(s) failed", summary.failed));
    }
    Ok(())
}
