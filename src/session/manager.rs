/*!
 * Background generation tasks.
 *
 * Each task runs on its own tokio task and writes only its own entry in
 * the shared status map.
 */

use log::{debug, info};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::app_config::Config;
use crate::pipeline::{GenerationRequest, PipelineProgress, PracticePipeline};

use super::models::TaskStatus;

/// Tracks generation tasks by id
#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    tasks: Arc<RwLock<HashMap<String, TaskStatus>>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a generation with ffmpeg and the configured speech provider
    ///
    /// Must be called inside a tokio runtime.
    pub fn start_generation(&self, request: GenerationRequest, config: Config) -> String {
        self.start_generation_with(Arc::new(PracticePipeline::from_config(config)), request)
    }

    /// Start a generation on an existing pipeline
    pub fn start_generation_with(&self, pipeline: Arc<PracticePipeline>, request: GenerationRequest) -> String {
        let task_id = Uuid::new_v4().to_string();
        self.tasks
            .write()
            .insert(task_id.clone(), TaskStatus::pending(task_id.clone()));
        info!(
            "Task {} started for {}",
            &task_id[..8],
            request.clip_path.display()
        );

        let tasks = Arc::clone(&self.tasks);
        let id = task_id.clone();
        tokio::spawn(async move {
            let progress_tasks = Arc::clone(&tasks);
            let progress_id = id.clone();
            let sink = move |progress: PipelineProgress| {
                if let Some(status) = progress_tasks.write().get_mut(&progress_id) {
                    status.record_progress(progress.percent, progress.message);
                }
            };

            let result = pipeline.run(request, Some(&sink)).await;
            debug!("Task {} finished: {}", &id[..8], result.summary());

            if let Some(status) = tasks.write().get_mut(&id) {
                status.finish(result);
            }
        });

        task_id
    }

    /// Snapshot of a task, `None` for unknown ids
    pub fn poll_status(&self, task_id: &str) -> Option<TaskStatus> {
        self.tasks.read().get(task_id).cloned()
    }

    /// Ids of every known task
    pub fn task_ids(&self) -> Vec<String> {
        self.tasks.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.read().is_empty()
    }
}
