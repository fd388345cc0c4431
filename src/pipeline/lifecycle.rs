use log::{debug, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::errors::GenerationError;

/// Handle to a scratch file owned by one run's registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TempResource {
    path: PathBuf,
}

impl TempResource {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AsRef<Path> for TempResource {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

/// Outcome of a cleanup pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: usize,
    pub failed: usize,
}

/// Tracks every scratch file of a single pipeline run
///
/// Files live in a private run directory. `cleanup` removes them all and
/// the directory itself; failures are logged, never returned. Dropping the
/// registry cleans up too, so every exit path of a run is covered.
#[derive(Debug)]
pub struct ResourceRegistry {
    run_dir: Option<TempDir>,
    root: PathBuf,
    resources: Vec<PathBuf>,
}

impl ResourceRegistry {
    /// Create a run directory under `parent`, or the system temp dir
    pub fn new(parent: Option<&Path>) -> io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("shadowreel_run_");
        let run_dir = match parent {
            Some(parent) => {
                fs::create_dir_all(parent)?;
                builder.tempdir_in(parent)?
            }
            None => builder.tempdir()?,
        };
        let root = run_dir.path().to_path_buf();
        debug!("Created run directory {}", root.display());

        Ok(Self {
            run_dir: Some(run_dir),
            root,
            resources: Vec::new(),
        })
    }

    /// Run directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reserve and register a uniquely named file in the run directory
    ///
    /// The file is not created; the tool writing it does that.
    pub fn allocate(&mut self, prefix: &str, extension: &str) -> TempResource {
        let file_name = format!("{}_{}.{}", prefix, uuid::Uuid::new_v4().simple(), extension);
        self.register(self.root.join(file_name))
    }

    /// Register a path created elsewhere
    pub fn register(&mut self, path: PathBuf) -> TempResource {
        if !self.resources.contains(&path) {
            self.resources.push(path.clone());
        }
        TempResource { path }
    }

    /// Every path registered so far, in registration order
    pub fn registered(&self) -> &[PathBuf] {
        &self.resources
    }

    /// Delete all registered files and the run directory
    pub fn cleanup(&mut self) -> CleanupReport {
        let mut report = CleanupReport::default();

        for path in self.resources.drain(..) {
            match fs::remove_file(&path) {
                Ok(()) => report.removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!("Failed to remove temporary file {}: {}", path.display(), e);
                    report.failed += 1;
                }
            }
        }

        if let Some(run_dir) = self.run_dir.take() {
            if let Err(e) = run_dir.close() {
                warn!("Failed to remove run directory {}: {}", self.root.display(), e);
                report.failed += 1;
            }
        }

        if report.removed > 0 || report.failed > 0 {
            debug!(
                "Cleanup removed {} file(s), {} failure(s)",
                report.removed, report.failed
            );
        }
        report
    }
}

impl Drop for ResourceRegistry {
    fn drop(&mut self) {
        if self.run_dir.is_some() || !self.resources.is_empty() {
            self.cleanup();
        }
    }
}

/// Fail unless a collaborator left a non-empty file at `path`
pub fn ensure_output(path: &Path) -> Result<(), GenerationError> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(()),
        Ok(_) => Err(GenerationError::EmptyOutput(format!(
            "{} is empty",
            path.display()
        ))),
        Err(_) => Err(GenerationError::EmptyOutput(format!(
            "{} was not created",
            path.display()
        ))),
    }
}
