/*!
 * In-process transcoder double.
 *
 * `MockTranscoder` behaves like a well-formed ffmpeg installation without
 * touching any media: every operation checks its inputs exist, writes a small
 * placeholder output file and remembers how long that file "plays", so
 * `probe_duration` and `concatenate` report consistent numbers. Individual
 * operations can be made to fail or to produce zero-byte output.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::errors::ToolError;
use crate::media::{DelayedClip, InterludeSpec, Transcoder};
use crate::subtitle_processor::ClipRange;

/// Operation names used to target failures and inspect calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOperation {
    StreamCopy,
    ExtractRange,
    BurnCaptions,
    RenderInterlude,
    ProbeDuration,
    RenderSilence,
    MixDelayed,
    ReplaceAudio,
    Concatenate,
}

impl MockOperation {
    fn tool(&self) -> &'static str {
        match self {
            MockOperation::ProbeDuration => "ffprobe",
            _ => "ffmpeg",
        }
    }
}

/// One recorded call
#[derive(Debug, Clone)]
pub struct MockCall {
    pub operation: MockOperation,
    pub inputs: Vec<PathBuf>,
    pub output: Option<PathBuf>,
    /// Caption or manifest contents, interlude message or mix delays
    pub detail: String,
}

#[derive(Debug)]
pub struct MockTranscoder {
    clip_duration: f64,
    failures: HashMap<MockOperation, String>,
    empty_outputs: HashSet<MockOperation>,
    calls: Mutex<Vec<MockCall>>,
    durations: Mutex<HashMap<PathBuf, f64>>,
}

impl MockTranscoder {
    /// Mock whose source clips play for `clip_duration` seconds
    pub fn new(clip_duration: f64) -> Self {
        Self {
            clip_duration,
            failures: HashMap::new(),
            empty_outputs: HashSet::new(),
            calls: Mutex::new(Vec::new()),
            durations: Mutex::new(HashMap::new()),
        }
    }

    /// Mock with two-second source clips
    pub fn working() -> Self {
        Self::new(2.0)
    }

    /// Make `operation` exit non-zero with `diagnostic` on stderr
    pub fn failing_on(mut self, operation: MockOperation, diagnostic: &str) -> Self {
        self.failures.insert(operation, diagnostic.to_string());
        self
    }

    /// Make `operation` succeed but leave a zero-byte output
    pub fn with_empty_output(mut self, operation: MockOperation) -> Self {
        self.empty_outputs.insert(operation);
        self
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    pub fn operations(&self) -> Vec<MockOperation> {
        self.calls.lock().iter().map(|c| c.operation).collect()
    }

    pub fn calls_of(&self, operation: MockOperation) -> Vec<MockCall> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.operation == operation)
            .cloned()
            .collect()
    }

    /// Every output path written so far
    pub fn outputs(&self) -> Vec<PathBuf> {
        self.calls.lock().iter().filter_map(|c| c.output.clone()).collect()
    }

    fn duration_of(&self, path: &Path) -> f64 {
        self.durations
            .lock()
            .get(path)
            .copied()
            .unwrap_or(self.clip_duration)
    }

    /// Shared bookkeeping: record, check inputs, inject failures, write output
    async fn perform(
        &self,
        operation: MockOperation,
        inputs: &[&Path],
        output: Option<(&Path, f64)>,
        detail: String,
    ) -> Result<(), ToolError> {
        self.calls.lock().push(MockCall {
            operation,
            inputs: inputs.iter().map(|p| p.to_path_buf()).collect(),
            output: output.map(|(p, _)| p.to_path_buf()),
            detail,
        });

        if let Some(missing) = inputs.iter().find(|p| !p.exists()) {
            return Err(ToolError::failed(
                operation.tool(),
                "exit status: 1",
                format!("{}: No such file or directory", missing.display()),
            ));
        }

        if let Some(diagnostic) = self.failures.get(&operation) {
            return Err(ToolError::failed(operation.tool(), "exit status: 1", diagnostic.clone()));
        }

        if let Some((path, duration)) = output {
            let body: &[u8] = if self.empty_outputs.contains(&operation) {
                b""
            } else {
                b"mock media"
            };
            tokio::fs::write(path, body).await?;
            self.durations.lock().insert(path.to_path_buf(), duration);
        }
        Ok(())
    }
}

/// Paths listed in a concat manifest
fn manifest_entries(manifest: &str) -> Vec<PathBuf> {
    manifest
        .lines()
        .filter_map(|line| line.trim().strip_prefix("file '")?.strip_suffix('\'').map(str::to_string))
        .map(|quoted| PathBuf::from(quoted.replace("'\\''", "'")))
        .collect()
}

#[async_trait]
impl Transcoder for MockTranscoder {
    async fn stream_copy(&self, input: &Path, output: &Path) -> Result<(), ToolError> {
        let duration = self.duration_of(input);
        self.perform(MockOperation::StreamCopy, &[input], Some((output, duration)), String::new())
            .await
    }

    async fn extract_range(&self, input: &Path, range: ClipRange, output: &Path) -> Result<(), ToolError> {
        let duration = range.end_seconds() - range.start_seconds();
        let detail = format!("{}-{}", range.start_ms, range.end_ms);
        self.perform(MockOperation::ExtractRange, &[input], Some((output, duration)), detail)
            .await
    }

    async fn burn_captions(
        &self,
        input: &Path,
        captions: &Path,
        _force_style: &str,
        output: &Path,
    ) -> Result<(), ToolError> {
        let detail = tokio::fs::read_to_string(captions).await.unwrap_or_default();
        let duration = self.duration_of(input);
        self.perform(
            MockOperation::BurnCaptions,
            &[input, captions],
            Some((output, duration)),
            detail,
        )
        .await
    }

    async fn render_interlude(&self, spec: &InterludeSpec, output: &Path) -> Result<(), ToolError> {
        self.perform(
            MockOperation::RenderInterlude,
            &[],
            Some((output, spec.duration_secs)),
            spec.message.clone(),
        )
        .await
    }

    async fn probe_duration(&self, input: &Path) -> Result<f64, ToolError> {
        self.perform(MockOperation::ProbeDuration, &[input], None, String::new())
            .await?;
        Ok(self.duration_of(input))
    }

    async fn render_silence(&self, duration_secs: f64, output: &Path) -> Result<(), ToolError> {
        self.perform(
            MockOperation::RenderSilence,
            &[],
            Some((output, duration_secs)),
            String::new(),
        )
        .await
    }

    async fn mix_delayed(&self, base: &Path, clips: &[DelayedClip], output: &Path) -> Result<(), ToolError> {
        let mut inputs: Vec<&Path> = vec![base];
        inputs.extend(clips.iter().map(|c| c.path.as_path()));
        let detail = clips
            .iter()
            .map(|c| c.delay_ms.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let duration = self.duration_of(base);
        self.perform(MockOperation::MixDelayed, &inputs, Some((output, duration)), detail)
            .await
    }

    async fn replace_audio(&self, video: &Path, audio: &Path, output: &Path) -> Result<(), ToolError> {
        let duration = self.duration_of(video);
        self.perform(
            MockOperation::ReplaceAudio,
            &[video, audio],
            Some((output, duration)),
            String::new(),
        )
        .await
    }

    async fn concatenate(&self, manifest: &Path, output: &Path) -> Result<(), ToolError> {
        let content = tokio::fs::read_to_string(manifest).await.unwrap_or_default();
        let entries = manifest_entries(&content);
        let duration: f64 = entries.iter().map(|p| self.duration_of(p)).sum();

        let mut inputs: Vec<&Path> = vec![manifest];
        inputs.extend(entries.iter().map(PathBuf::as_path));
        self.perform(MockOperation::Concatenate, &inputs, Some((output, duration)), content)
            .await
    }
}
