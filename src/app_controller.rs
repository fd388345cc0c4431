use anyhow::{anyhow, Context, Result};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::app_config::Config;
use crate::file_utils::FileManager;
use crate::pipeline::{GenerationRequest, GenerationResult, PipelineProgress, PracticePipeline};
use crate::practice::TranslationLookup;

// @module: Application controller for practice video generation

/// Name of the per-folder log written by batch runs
pub const BATCH_LOG_FILE: &str = "shadowreel.log";

/// Counts reported at the end of a folder run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FolderSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Pipeline shared by every run of this controller
    pipeline: Arc<PracticePipeline>,
}

impl Controller {
    // @method: Create a controller using ffmpeg and the configured speech provider
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        let pipeline = Arc::new(PracticePipeline::from_config(config.clone()));
        Ok(Self { config, pipeline })
    }

    /// Create a controller around an existing pipeline
    pub fn with_pipeline(pipeline: PracticePipeline) -> Self {
        Self {
            config: pipeline.config().clone(),
            pipeline: Arc::new(pipeline),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Generate one practice video
    pub async fn run(&self, request: GenerationRequest) -> Result<PathBuf> {
        let multi_progress = MultiProgress::new();
        self.run_with_progress(request, &multi_progress).await
    }

    /// Run the pipeline with a progress bar from the provided MultiProgress
    async fn run_with_progress(&self, request: GenerationRequest, multi_progress: &MultiProgress) -> Result<PathBuf> {
        let start_time = std::time::Instant::now();

        if !request.clip_path.exists() {
            return Err(anyhow!("Input file does not exist: {:?}", request.clip_path));
        }

        let progress_bar = multi_progress.add(ProgressBar::new(100));
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}% {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));

        let repeat = &self.config.repeat;
        info!(
            "Practice video: {} pass(es), {} -> {}",
            repeat.repeat_count,
            self.config.source_language,
            self.config.target_language
        );

        let pb = progress_bar.clone();
        let on_progress = move |progress: PipelineProgress| {
            pb.set_position(progress.percent as u64);
            pb.set_message(progress.message);
        };

        let result = self.pipeline.run(request, Some(&on_progress)).await;
        progress_bar.finish_and_clear();

        match result {
            GenerationResult::Success {
                output_path,
                total_duration_seconds,
                ..
            } => {
                info!(
                    "Success: {} ({:.1}s of video in {})",
                    output_path.display(),
                    total_duration_seconds,
                    Self::format_duration(start_time.elapsed())
                );
                Ok(output_path)
            }
            failure => Err(anyhow!("Generation failed: {}", failure.summary())),
        }
    }

    // Format duration in a human-readable format
    pub fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }

    /// Translation file picked up next to a video in folder mode
    ///
    /// `clip.mp4` uses `clip.translation.json` when present.
    pub fn translation_file_for(video: &Path) -> PathBuf {
        let stem = video.file_stem().unwrap_or_default().to_string_lossy();
        video.with_file_name(format!("{}.translation.json", stem))
    }

    /// Run the workflow in folder mode
    ///
    /// Every video with a sibling caption file gets a practice video next to
    /// it. Existing outputs are skipped unless `force_overwrite` is set.
    pub async fn run_folder(&self, input_dir: PathBuf, force_overwrite: bool) -> Result<FolderSummary> {
        let start_time = std::time::Instant::now();

        if !FileManager::dir_exists(&input_dir) {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let video_files = FileManager::find_videos(&input_dir)?;
        if video_files.is_empty() {
            return Err(anyhow!("No video files found in directory: {:?}", input_dir));
        }

        let multi_progress = MultiProgress::new();
        let folder_pb = multi_progress.add(ProgressBar::new(video_files.len() as u64));
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        folder_pb.set_style(template_result.progress_chars("█▓▒░"));
        folder_pb.set_message("Processing files");

        let mut summary = FolderSummary::default();

        for video_file in video_files.iter() {
            let file_name = video_file
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            folder_pb.set_message(format!("Processing: {}", file_name));

            let Some(caption_path) = FileManager::find_caption_for(video_file, Some(&self.config.source_language)) else {
                warn!("Skipping {}, no caption file next to it", file_name);
                summary.skipped += 1;
                folder_pb.inc(1);
                continue;
            };

            let output_dir = video_file.parent().map(Path::to_path_buf).unwrap_or_else(|| input_dir.clone());
            let output_path = FileManager::generate_output_path(video_file, &output_dir);
            if output_path.exists() && !force_overwrite {
                warn!("Skipping {}, practice video already exists (use -f to force overwrite)", file_name);
                summary.skipped += 1;
                folder_pb.inc(1);
                continue;
            }

            let outcome = match self.request_for(video_file, caption_path, output_path) {
                Ok(request) => self.run_with_progress(request, &multi_progress).await,
                Err(e) => Err(e),
            };
            match outcome {
                Ok(_) => summary.processed += 1,
                Err(e) => {
                    error!("Error processing file {}: {}", file_name, e);
                    summary.failed += 1;
                }
            }

            folder_pb.inc(1);
        }

        folder_pb.finish_with_message("Folder processing complete");

        let summary_message = format!(
            "Folder processing completed: {} processed, {} skipped, {} errors",
            summary.processed, summary.skipped, summary.failed
        );
        info!("{}", summary_message);

        let log_file_path = input_dir.join(BATCH_LOG_FILE);
        let entry = format!(
            "{} - {} - Duration: {}",
            input_dir.display(),
            summary_message,
            Self::format_duration(start_time.elapsed())
        );
        if let Err(e) = FileManager::append_to_log_file(&log_file_path, &entry) {
            warn!("Failed to write folder log: {}", e);
        }

        Ok(summary)
    }

    fn request_for(&self, video: &Path, caption_path: PathBuf, output_path: PathBuf) -> Result<GenerationRequest> {
        let mut request = GenerationRequest::new(video, caption_path, output_path);
        let translation_file = Self::translation_file_for(video);
        if translation_file.is_file() {
            let lookup = TranslationLookup::from_json_file(&translation_file)
                .with_context(|| format!("Failed to load translations: {:?}", translation_file))?;
            request = request.with_translation(lookup);
        }
        Ok(request)
    }
}
