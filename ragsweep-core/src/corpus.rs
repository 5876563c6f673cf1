//! Loading the pre-chunked document corpus a sweep runs against.

use crate::error::SweepError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// A single source document. Chunking splits `text` on whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub text: String,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// The immutable document set for one sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Corpus {
    pub source: Option<PathBuf>,
    pub documents: Vec<Document>,
}

impl Corpus {
    /// Build a corpus from in-memory texts, skipping blank ones.
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let documents = texts
            .into_iter()
            .map(Document::new)
            .filter(|d| !d.text.trim().is_empty())
            .collect();
        Self {
            source: None,
            documents,
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn total_words(&self) -> usize {
        self.documents.iter().map(Document::word_count).sum()
    }
}

/// One entry of a JSON corpus file: either a bare string or an object with
/// a `text` (or `content`) field.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Text(String),
    Object {
        #[serde(alias = "content")]
        text: String,
    },
}

impl RawEntry {
    fn into_text(self) -> String {
        match self {
            Self::Text(text) | Self::Object { text } => text,
        }
    }
}

/// Load a corpus from disk.
///
/// `.json` files hold an array of entries; any other extension is read as a
/// single plain-text document. Blank documents are skipped; a corpus with
/// no usable documents is an error.
pub fn load_corpus(path: &Path) -> Result<Corpus, SweepError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        SweepError::corpus(format!("failed to read {}: {e}", path.display()))
    })?;

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let texts: Vec<String> = if is_json {
        let entries: Vec<RawEntry> = serde_json::from_str(&content)?;
        entries.into_iter().map(RawEntry::into_text).collect()
    } else {
        vec![content]
    };

    let total = texts.len();
    let mut documents = Vec::with_capacity(total);
    for (idx, text) in texts.into_iter().enumerate() {
        if text.trim().is_empty() {
            warn!(idx, "Skipping empty document");
            continue;
        }
        documents.push(Document::new(text));
    }

    if documents.is_empty() {
        return Err(SweepError::corpus(format!(
            "{} contains no non-empty documents",
            path.display()
        )));
    }

    let corpus = Corpus {
        source: Some(path.to_path_buf()),
        documents,
    };
    info!(
        path = %path.display(),
        documents = corpus.len(),
        skipped = total - corpus.len(),
        words = corpus.total_words(),
        "Loaded corpus"
    );
    Ok(corpus)
}
