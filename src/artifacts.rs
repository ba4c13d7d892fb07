/// On-disk artifacts for one channel's working directory
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::{PipelineError, Result};

const CRAWLER_DIR: &str = "crawler";
const VIDEO_LIST: &str = "video_list.json";
const VIDEO_DETAIL_LIST: &str = "video_detail_list.json";
const DATASET: &str = "dataset.tsv";
const TRAINING_DATA: &str = "train.csv";
const WORD_INDEX: &str = "words.json";
const LOCK_FILE: &str = ".lock";

/// Resolves artifact paths and performs atomic reads/writes
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    working_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
        }
    }

    /// Create the working and crawler directories
    pub fn initialize(&self) -> Result<()> {
        std::fs::create_dir_all(self.crawler_dir())?;
        debug!("📁 Working directory initialized: {}", self.working_dir.display());
        Ok(())
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn crawler_dir(&self) -> PathBuf {
        self.working_dir.join(CRAWLER_DIR)
    }

    pub fn video_list_path(&self) -> PathBuf {
        self.crawler_dir().join(VIDEO_LIST)
    }

    pub fn video_detail_list_path(&self) -> PathBuf {
        self.crawler_dir().join(VIDEO_DETAIL_LIST)
    }

    pub fn dataset_path(&self) -> PathBuf {
        self.working_dir.join(DATASET)
    }

    pub fn training_data_path(&self) -> PathBuf {
        self.working_dir.join(TRAINING_DATA)
    }

    pub fn word_index_path(&self) -> PathBuf {
        self.working_dir.join(WORD_INDEX)
    }

    /// Take the advisory lock for this working directory
    pub fn lock(&self) -> Result<WorkdirLock> {
        WorkdirLock::acquire(&self.working_dir)
    }

    /// Load a JSON artifact, `None` when the file does not exist
    pub fn load_json<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>> {
        if !path.exists() {
            debug!("Cache miss: {}", path.display());
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| PipelineError::InvalidArtifact {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }

    /// Load a JSON artifact that a previous stage must have produced
    pub fn require_json<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        self.load_json(path)?
            .ok_or_else(|| PipelineError::ArtifactNotFound(path.to_path_buf()))
    }

    pub fn save_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<()> {
        let mut json_content = serde_json::to_string_pretty(value)?;
        json_content.push('\n');
        write_atomic(path, json_content.as_bytes())
    }

    pub fn read_text(&self, path: &Path) -> Result<String> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(PipelineError::ArtifactNotFound(path.to_path_buf()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn write_text(&self, path: &Path, content: &str) -> Result<()> {
        write_atomic(path, content.as_bytes())
    }
}

/// Write to a temporary sibling file and rename it over `path`
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;

    debug!("💾 Wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}

/// Advisory lock held for the duration of a pipeline run.
///
/// A crashed run leaves the lock file behind; it must be removed by hand.
#[derive(Debug)]
pub struct WorkdirLock {
    path: PathBuf,
}

impl WorkdirLock {
    pub fn acquire(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(LOCK_FILE);

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                writeln!(file, "{}", std::process::id())?;
                debug!("🔒 Acquired lock {}", path.display());
                Ok(Self { path })
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                warn!(
                    "Lock file {} exists; remove it if no other run is active",
                    path.display()
                );
                Err(PipelineError::Locked(path))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WorkdirLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}
