//! FileSink - writes artifacts into the output directory
//!
//! Each artifact is staged as `<file_name>.partial` and renamed into place on
//! commit. A file being replaced is first moved to `<file_name>.bak`, so a
//! failed or rolled back commit restores the previous run's output.

use contracts::{Artifact, ArtifactSink, ContractError};
use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, instrument, warn};

const PARTIAL_SUFFIX: &str = "partial";
const BACKUP_SUFFIX: &str = "bak";

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Output directory, created on demand
    pub base_path: PathBuf,
}

/// Sink that writes artifacts to disk
pub struct FileSink {
    name: String,
    config: FileSinkConfig,
    /// `(staged, final)` paths awaiting commit
    staged: Vec<(PathBuf, PathBuf)>,
    /// `(final, backup)` of the last commit, until finished or rolled back
    committed: Vec<(PathBuf, Option<PathBuf>)>,
}

/// `path` with `.suffix` appended to its file name
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

impl FileSink {
    /// Create a new FileSink
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> io::Result<Self> {
        fs::create_dir_all(&config.base_path)?;

        Ok(Self {
            name: name.into(),
            config,
            staged: Vec::new(),
            committed: Vec::new(),
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.config.base_path
    }

    fn stage(&mut self, artifact: &Artifact) -> io::Result<()> {
        let target = self.config.base_path.join(&artifact.file_name);
        let partial = with_suffix(&target, PARTIAL_SUFFIX);

        let mut file = fs::File::create(&partial)?;
        file.write_all(artifact.contents.as_bytes())?;
        file.sync_all()?;

        self.staged.push((partial, target));
        Ok(())
    }

    /// Move `partial` onto `target`, keeping a regular file it replaces
    fn replace(&self, partial: &Path, target: &Path) -> io::Result<Option<PathBuf>> {
        let backup = if target.is_file() {
            let backup = with_suffix(target, BACKUP_SUFFIX);
            fs::rename(target, &backup)?;
            Some(backup)
        } else {
            None
        };

        if let Err(e) = fs::rename(partial, target) {
            if let Some(backup) = &backup {
                self.restore(backup, target);
            }
            return Err(e);
        }
        Ok(backup)
    }

    fn restore(&self, backup: &Path, target: &Path) {
        if let Err(e) = fs::rename(backup, target) {
            warn!(sink = %self.name, path = %target.display(), error = %e, "Failed to restore previous file");
        }
    }

    fn remove(&self, path: &Path, what: &str) {
        if let Err(e) = fs::remove_file(path) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(sink = %self.name, path = %path.display(), error = %e, "Failed to remove {what} file");
            }
        }
    }

    fn discard_staged(&mut self) {
        for (partial, _) in std::mem::take(&mut self.staged) {
            self.remove(&partial, "staged");
        }
    }

    /// Undo committed renames, newest first
    fn revert_committed(&mut self) {
        for (target, backup) in std::mem::take(&mut self.committed).into_iter().rev() {
            self.remove(&target, "committed");
            if let Some(backup) = backup {
                self.restore(&backup, &target);
            }
        }
    }

    fn drop_backups(&mut self) {
        for (_, backup) in std::mem::take(&mut self.committed) {
            if let Some(backup) = backup {
                self.remove(&backup, "backup");
            }
        }
    }
}

impl ArtifactSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_write",
        skip(self, artifact),
        fields(sink = %self.name, file = %artifact.file_name)
    )]
    fn write(&mut self, artifact: &Artifact) -> Result<(), ContractError> {
        self.stage(artifact).map_err(|e| {
            error!(sink = %self.name, file = %artifact.file_name, error = %e, "Write failed");
            ContractError::sink_write(&self.name, e.to_string())
        })
    }

    /// All staged files replace their targets, or none do
    #[instrument(name = "file_sink_commit", skip(self), fields(sink = %self.name, files = self.staged.len()))]
    fn commit(&mut self) -> Result<(), ContractError> {
        self.drop_backups();

        let mut pending = std::mem::take(&mut self.staged).into_iter();
        while let Some((partial, target)) = pending.next() {
            match self.replace(&partial, &target) {
                Ok(backup) => {
                    debug!(sink = %self.name, path = %target.display(), "Artifact committed");
                    self.committed.push((target, backup));
                }
                Err(e) => {
                    error!(sink = %self.name, path = %target.display(), error = %e, "Commit failed");
                    self.remove(&partial, "staged");
                    for (rest, _) in pending {
                        self.remove(&rest, "staged");
                    }
                    self.revert_committed();
                    return Err(ContractError::sink_write(&self.name, e.to_string()));
                }
            }
        }
        Ok(())
    }

    #[instrument(name = "file_sink_abort", skip(self), fields(sink = %self.name))]
    fn abort(&mut self) {
        self.discard_staged();
    }

    #[instrument(name = "file_sink_rollback", skip(self), fields(sink = %self.name))]
    fn rollback(&mut self) {
        self.revert_committed();
    }

    fn finish(&mut self) {
        self.drop_backups();
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        self.discard_staged();
        self.drop_backups();
    }
}
