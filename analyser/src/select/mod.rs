//! Interactive choice of the input file.

use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::parser::SourceKind;

#[derive(Debug, Error)]
pub enum SelectError {
    #[error("No supported input files to choose from")]
    NoCandidates,

    #[error("No file selected")]
    NoSelection,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Supported input files directly inside `dir`, sorted by file name.
pub fn discover_inputs(dir: &Path) -> Result<Vec<PathBuf>, SelectError> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && SourceKind::from_path(path).is_some())
        .collect();
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Show a numbered menu and read lines until a valid choice is entered.
pub fn prompt_choice<R: BufRead, W: Write>(
    candidates: &[PathBuf],
    mut input: R,
    mut output: W,
) -> Result<PathBuf, SelectError> {
    if candidates.is_empty() {
        return Err(SelectError::NoCandidates);
    }

    writeln!(output, "Available input files:")?;
    for (idx, path) in candidates.iter().enumerate() {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        writeln!(output, "  {}. {}", idx + 1, name)?;
    }

    let mut line = String::new();
    loop {
        write!(output, "Select a file [1-{}]: ", candidates.len())?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Err(SelectError::NoSelection);
        }

        match line.trim().parse::<usize>() {
            Ok(n) if (1..=candidates.len()).contains(&n) => return Ok(candidates[n - 1].clone()),
            _ => writeln!(output, "Invalid choice: {}", line.trim())?,
        }
    }
}
