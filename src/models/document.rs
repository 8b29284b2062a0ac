// src/models/document.rs
//
// The current logo document: raw SVG markup plus a display name. The document
// is persisted wholesale to a single well-known JSON file on every load and
// restored once at startup.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("not an SVG file: {0}")]
    NotSvg(PathBuf),

    #[error("could not read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        source: io::Error,
    },

    #[error("document is empty")]
    Empty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorDocument {
    pub name: String,
    pub markup: String,
}

impl VectorDocument {
    pub fn from_markup(name: impl Into<String>, markup: impl Into<String>) -> Result<Self, DocumentError> {
        let markup = markup.into();
        if markup.trim().is_empty() {
            return Err(DocumentError::Empty);
        }
        Ok(Self {
            name: name.into(),
            markup,
        })
    }

    /// Load a dropped or selected file. Type and readability problems are
    /// reported here, at the upload boundary; nothing downstream sees them.
    pub fn from_file(path: &Path) -> Result<Self, DocumentError> {
        let is_svg = path
            .extension()
            .map_or(false, |e| e.eq_ignore_ascii_case("svg"));
        if !is_svg {
            return Err(DocumentError::NotSvg(path.to_path_buf()));
        }

        let markup = fs::read_to_string(path).map_err(|source| DocumentError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "logo".to_string());

        Self::from_markup(name, markup)
    }

    /// Load one of the bundled sample logos by file name.
    pub fn sample(samples_dir: &Path, file_name: &str) -> Result<Self, DocumentError> {
        Self::from_file(&samples_dir.join(file_name))
    }

    /// Overwrite the persisted document state. Best effort; a failed write is
    /// reported to the caller but never fatal.
    pub fn persist(&self, state_file: &Path) -> io::Result<()> {
        if let Some(dir) = state_file.parent() {
            fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string(self)?;
        fs::write(state_file, json)
    }

    /// Read back the persisted document, if any. Called once at startup.
    pub fn restore(state_file: &Path) -> Option<Self> {
        let content = fs::read_to_string(state_file).ok()?;
        serde_json::from_str(&content).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_markup_rejected() {
        assert!(matches!(
            VectorDocument::from_markup("x", "   \n"),
            Err(DocumentError::Empty)
        ));
    }

    #[test]
    fn test_non_svg_extension_rejected() {
        let err = VectorDocument::from_file(Path::new("logo.png")).unwrap_err();
        assert!(matches!(err, DocumentError::NotSvg(_)));
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let err = VectorDocument::from_file(Path::new("no_such_dir/missing.svg")).unwrap_err();
        assert!(matches!(err, DocumentError::Unreadable { .. }));
    }

    #[test]
    fn test_persist_restore_round_trip() {
        let state_file = std::env::temp_dir().join("glint_test_state.json");
        let doc = VectorDocument::from_markup("badge", "<svg></svg>").unwrap();
        doc.persist(&state_file).unwrap();

        let restored = VectorDocument::restore(&state_file).unwrap();
        assert_eq!(restored.name, "badge");
        assert_eq!(restored.markup, "<svg></svg>");

        // overwritten wholesale on the next persist
        let doc2 = VectorDocument::from_markup("ring", "<svg >2</svg>").unwrap();
        doc2.persist(&state_file).unwrap();
        assert_eq!(VectorDocument::restore(&state_file).unwrap().name, "ring");

        let _ = fs::remove_file(&state_file);
    }

    #[test]
    fn test_restore_missing_state_is_none() {
        assert!(VectorDocument::restore(Path::new("no_such_dir/state.json")).is_none());
    }
}
