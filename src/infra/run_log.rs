// ============================================================
// Layer 6 — Run Log
// ============================================================
// The human-readable report of a run (epoch lines, evaluation
// summaries). Every line goes to stdout and, when a log file is
// configured, is also appended to that file and flushed right
// away so a broken pipe or a killed job still leaves a
// complete record up to that point.
//
// Diagnostics that are not part of the report go through
// `tracing` instead.

use anyhow::{Context, Result};
use std::{
    cell::RefCell,
    fs::{self, File},
    io::{LineWriter, Write},
    path::Path,
};

pub struct RunLog {
    file: Option<RefCell<LineWriter<File>>>,
}

impl RunLog {
    /// Report to stdout only.
    pub fn stdout() -> Self {
        Self { file: None }
    }

    /// Report to stdout and truncate/create `path` for a copy.
    pub fn with_file(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create '{}'", parent.display()))?;
        }
        let file = File::create(path)
            .with_context(|| format!("Cannot create log file '{}'", path.display()))?;
        tracing::info!("Writing run log to '{}'", path.display());
        Ok(Self { file: Some(RefCell::new(LineWriter::new(file))) })
    }

    pub fn open(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::with_file(p),
            None    => Ok(Self::stdout()),
        }
    }

    pub fn line(&self, msg: impl AsRef<str>) -> Result<()> {
        let msg = msg.as_ref();
        println!("{msg}");
        if let Some(file) = &self.file {
            writeln!(file.borrow_mut(), "{msg}").context("Cannot write to run log")?;
        }
        Ok(())
    }

    pub fn blank(&self) -> Result<()> {
        self.line("")
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_reach_the_file() {
        let tmp  = tempfile::tempdir().unwrap();
        let path = tmp.path().join("logs").join("run.txt");
        let log  = RunLog::with_file(&path).unwrap();
        log.line("Training...").unwrap();
        log.blank().unwrap();
        log.line(format!("Valence Test mae: {:.3}", 1.25)).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "Training...\n\nValence Test mae: 1.250\n");
    }

    #[test]
    fn test_stdout_only_never_fails() {
        assert!(RunLog::open(None).unwrap().line("hello").is_ok());
    }
}
