use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use compartment_core::{parse, to_markdown, UploadResult};
use engine_logging::engine_info;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::filename::summary_filename;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    }
    Ok(())
}

/// Writes whole files into one directory through a temp file and a rename.
#[derive(Debug, Clone)]
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Replaces `{dir}/{filename}` with `content`; readers never see a partial file.
    pub fn write(&self, filename: &str, content: &str) -> Result<PathBuf, PersistError> {
        ensure_output_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;
        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}

/// Saves finished summaries as Markdown outlines.
#[derive(Debug, Clone)]
pub struct SummaryStore {
    writer: AtomicFileWriter,
}

impl SummaryStore {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            writer: AtomicFileWriter::new(dir),
        }
    }

    /// Writes the outline of `result` as `{title}--{hash}.md` and returns the path.
    pub fn save(&self, result: &UploadResult) -> Result<PathBuf, PersistError> {
        let filename = summary_filename(&result.title, &result.task_id);
        let content = to_markdown(&parse(&result.summary));
        engine_info!("Saving summary for task {} as {}", result.task_id, filename);
        self.writer.write(&filename, &content)
    }
}
