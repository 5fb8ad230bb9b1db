
use std::collections::{HashMap, VecDeque};

use tracing::debug;

use crate::config::ChunkingConfig;
use crate::{IngestError, Result};

/// A contiguous piece of the source text, possibly overlapping its neighbors
/// by the configured number of characters. Carries no identity beyond its
/// position in the output sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub content: String,
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Document {
    #[inline]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: HashMap::new(),
        }
    }

    #[inline]
    pub fn with_metadata(
        content: impl Into<String>,
        metadata: HashMap<String, serde_json::Value>,
    ) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }
}

/// Recursive character text splitter.
///
/// Splits text along a preference list of separators, coarsest first,
/// greedily merging the resulting segments into chunks of at most
/// `chunk_size` characters with `chunk_overlap` characters repeated between
/// adjacent chunks. Segments retain their trailing separator, so the splitter
/// only decides break points and never drops or trims characters.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl TextSplitter {
    #[inline]
    pub fn new(config: &ChunkingConfig) -> Result<Self> {
        if config.chunk_size == 0 {
            return Err(IngestError::InvalidArgument(
                "chunk size must be at least 1".to_string(),
            ));
        }

        if config.chunk_overlap >= config.chunk_size {
            return Err(IngestError::InvalidArgument(format!(
                "chunk overlap {} must be smaller than chunk size {}",
                config.chunk_overlap, config.chunk_size
            )));
        }

        Ok(Self {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
            separators: config.separators.clone(),
        })
    }

    /// Split `text` into ordered chunks. Pure and deterministic; an empty
    /// input yields an empty result.
    #[inline]
    pub fn split_text(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }

        let chunks = self.split_span(text, &self.separators);
        debug!(
            "Split {} characters into {} chunks",
            text.chars().count(),
            chunks.len()
        );
        chunks
    }

    /// Split `text` and wrap each chunk in a [`Document`].
    #[inline]
    pub fn create_documents(&self, text: &str) -> Vec<Document> {
        self.split_text(text).into_iter().map(Document::new).collect()
    }

    fn split_span(&self, span: &str, separators: &[String]) -> Vec<String> {
        let (separator, remaining) = pick_separator(span, separators);
        let segments = match separator {
            Some(sep) if !sep.is_empty() => split_keeping_separator(span, sep),
            // Empty-string separator, or no separator occurs in the span at
            // all: character-level splitting.
            _ => char_segments(span),
        };

        let mut chunks = Vec::new();
        let mut good_segments: Vec<&str> = Vec::new();

        for segment in segments {
            if char_len(segment) <= self.chunk_size {
                good_segments.push(segment);
                continue;
            }

            if !good_segments.is_empty() {
                chunks.extend(self.merge_segments(&good_segments));
                good_segments.clear();
            }

            if remaining.is_empty() {
                // Separator list exhausted: hard character slicing.
                chunks.extend(self.merge_segments(&char_segments(segment)));
            } else {
                chunks.extend(self.split_span(segment, remaining));
            }
        }

        if !good_segments.is_empty() {
            chunks.extend(self.merge_segments(&good_segments));
        }

        chunks
    }

    /// Greedily merge segments into chunks of at most `chunk_size`
    /// characters. On emitting a chunk, the trailing whole segments totalling
    /// at most `chunk_overlap` characters are retained as the seed of the
    /// next chunk.
    fn merge_segments(&self, segments: &[&str]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut window_len = 0usize;

        for segment in segments {
            let segment_len = char_len(segment);

            if window_len + segment_len > self.chunk_size && !window.is_empty() {
                chunks.push(window.iter().copied().collect());

                while window_len > self.chunk_overlap
                    || (window_len + segment_len > self.chunk_size && window_len > 0)
                {
                    match window.pop_front() {
                        Some(dropped) => window_len -= char_len(dropped),
                        None => break,
                    }
                }
            }

            window.push_back(segment);
            window_len += segment_len;
        }

        if !window.is_empty() {
            chunks.push(window.iter().copied().collect());
        }

        chunks
    }
}

/// Pick the first separator that occurs in the span. The empty string
/// matches everywhere. Returns the chosen separator and the finer separators
/// left for recursion.
fn pick_separator<'a>(span: &str, separators: &'a [String]) -> (Option<&'a str>, &'a [String]) {
    for (index, separator) in separators.iter().enumerate() {
        if separator.is_empty() || span.contains(separator.as_str()) {
            return (Some(separator.as_str()), &separators[index + 1..]);
        }
    }
    (None, &[])
}

/// Split on `separator`, each segment retaining its trailing separator so
/// concatenating the segments reproduces `text` exactly.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut segments = Vec::new();
    let mut start = 0;

    for (index, matched) in text.match_indices(separator) {
        let end = index + matched.len();
        segments.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        segments.push(&text[start..]);
    }

    segments
}

/// One segment per Unicode scalar value.
fn char_segments(text: &str) -> Vec<&str> {
    let mut segments = Vec::with_capacity(text.len());
    let mut indices = text.char_indices().peekable();

    while let Some((start, _)) = indices.next() {
        let end = indices.peek().map_or(text.len(), |&(next, _)| next);
        segments.push(&text[start..end]);
    }

    segments
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}
