//! Loading of already-extracted plain text sources from disk.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::types::SourceText;

/// Reads every `*.txt` file under `root` (recursively, sorted by path).
///
/// A missing directory is an ingestion error. Files that cannot be read are
/// skipped with a warning; invalid UTF-8 is decoded lossily.
pub fn load_text_sources(root: &Path) -> Result<Vec<SourceText>> {
    if !root.is_dir() {
        return Err(Error::Ingestion {
            source_name: root.display().to_string(),
            reason: "not a directory".to_string(),
        });
    }
    let files = list_txt_files(root);
    let mut sources = Vec::with_capacity(files.len());
    for path in &files {
        match read_file_content(path) {
            Ok(text) => sources.push(SourceText::new(source_name(root, path), text)),
            Err(err) => warn!(path = %path.display(), %err, "skipping unreadable source"),
        }
    }
    info!(dir = %root.display(), found = files.len(), loaded = sources.len(), "loaded text sources");
    Ok(sources)
}

fn read_file_content(file_path: &Path) -> Result<String> {
    let ingestion = |e: std::io::Error| Error::Ingestion {
        source_name: file_path.display().to_string(),
        reason: e.to_string(),
    };
    match fs::read_to_string(file_path) {
        Ok(content) => Ok(content),
        Err(_) => Ok(String::from_utf8_lossy(&fs::read(file_path).map_err(ingestion)?).into_owned()),
    }
}

/// Path relative to `root`, so nested files keep distinct names.
fn source_name(root: &Path, path: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).to_string_lossy().into_owned()
}

fn list_txt_files(root: &Path) -> Vec<PathBuf> {
    let mut txt_files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("txt"))
        .collect();
    txt_files.sort();
    txt_files
}
