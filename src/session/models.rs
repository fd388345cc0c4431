/*!
 * Task status records exposed to pollers.
 */

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::ErrorKind;
use crate::pipeline::{GenerationResult, PipelineState};

/// Lifecycle of a background generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    Pending,
    Running,
    Success,
    Failure,
}

impl TaskState {
    pub fn is_finished(&self) -> bool {
        matches!(self, TaskState::Success | TaskState::Failure)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskState::Pending => "PENDING",
            TaskState::Running => "RUNNING",
            TaskState::Success => "SUCCESS",
            TaskState::Failure => "FAILURE",
        };
        write!(f, "{}", name)
    }
}

/// Why a task failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskError {
    pub stage: PipelineState,
    pub kind: ErrorKind,
    pub message: String,
}

/// Snapshot of one task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatus {
    /// Task ID
    pub task_id: String,
    /// Current state
    pub state: TaskState,
    /// Last reported pipeline progress
    pub progress_percent: u8,
    /// Last reported pipeline message
    pub status_message: String,
    /// Set only on success
    pub result: Option<GenerationResult>,
    /// Set only on failure
    pub error: Option<TaskError>,
    /// Creation time (RFC 3339)
    pub created_at: String,
    /// Last update time (RFC 3339)
    pub updated_at: String,
}

impl TaskStatus {
    pub fn pending(task_id: String) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            task_id,
            state: TaskState::Pending,
            progress_percent: 0,
            status_message: "Queued".to_string(),
            result: None,
            error: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Record a progress report
    pub fn record_progress(&mut self, percent: u8, message: String) {
        self.state = TaskState::Running;
        self.progress_percent = self.progress_percent.max(percent);
        self.status_message = message;
        self.touch();
    }

    /// Mirror the final pipeline result
    pub fn finish(&mut self, result: GenerationResult) {
        match &result {
            GenerationResult::Success { .. } => {
                self.state = TaskState::Success;
                self.progress_percent = 100;
                self.status_message = result.summary();
                self.result = Some(result);
                self.error = None;
            }
            GenerationResult::Failure {
                stage,
                error_kind,
                message,
            } => {
                self.state = TaskState::Failure;
                self.status_message = message.clone();
                self.error = Some(TaskError {
                    stage: *stage,
                    kind: *error_kind,
                    message: message.clone(),
                });
                self.result = None;
            }
        }
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now().to_rfc3339();
    }
}
