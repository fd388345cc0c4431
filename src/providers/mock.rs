/*!
 * Mock speech synthesizer for testing.
 *
 * - `MockSynthesizer::working()` - Always writes a small audio placeholder
 * - `MockSynthesizer::failing()` - Always fails with an error
 * - `MockSynthesizer::intermittent(n)` - Fails every nth request
 * - `MockSynthesizer::empty()` - Reports success but writes nothing
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::ToolError;
use crate::providers::{SpeechSynthesizer, VoiceSettings};

/// Behavior mode for the mock synthesizer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Fails every Nth request
    Intermittent { fail_every: usize },
    /// Always fails
    Failing,
    /// Succeeds without writing the output file
    Empty,
}

#[derive(Debug, Clone)]
pub struct MockSynthesizer {
    behavior: MockBehavior,
    request_count: Arc<AtomicUsize>,
    spoken: Arc<Mutex<Vec<String>>>,
}

impl MockSynthesizer {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            spoken: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Texts received so far, in request order
    pub fn spoken_texts(&self) -> Vec<String> {
        self.spoken.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSynthesizer {
    async fn synthesize(&self, text: &str, _voice: &VoiceSettings, output: &Path) -> Result<PathBuf, ToolError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.spoken.lock().push(text.to_string());

        let fail = match self.behavior {
            MockBehavior::Failing => true,
            MockBehavior::Intermittent { fail_every } => fail_every > 0 && count % fail_every == fail_every - 1,
            MockBehavior::Working | MockBehavior::Empty => false,
        };
        if fail {
            return Err(ToolError::ApiError {
                status_code: 503,
                message: "Simulated speech service outage".to_string(),
            });
        }

        if self.behavior != MockBehavior::Empty {
            tokio::fs::write(output, b"mock speech").await?;
        }
        Ok(output.to_path_buf())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
