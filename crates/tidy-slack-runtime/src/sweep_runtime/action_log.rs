use std::{
    io::Write,
    path::PathBuf,
    sync::{Arc, Mutex},
};

use anyhow::{anyhow, Context, Result};
use serde_json::Value;

/// Append-only JSONL audit trail of every action a sweep executed or planned.
#[derive(Clone)]
pub(super) struct JsonlActionLog {
    path: PathBuf,
    file: Arc<Mutex<std::fs::File>>,
}

impl JsonlActionLog {
    pub(super) fn open(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        Ok(Self {
            path,
            file: Arc::new(Mutex::new(file)),
        })
    }

    pub(super) fn append(&self, value: &Value) -> Result<()> {
        let line = serde_json::to_string(value).context("failed to encode action log entry")?;
        let mut file = self
            .file
            .lock()
            .map_err(|_| anyhow!("action log mutex is poisoned"))?;
        writeln!(file, "{line}")
            .with_context(|| format!("failed to append to {}", self.path.display()))?;
        file.flush()
            .with_context(|| format!("failed to flush {}", self.path.display()))?;
        Ok(())
    }
}
