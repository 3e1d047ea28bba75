#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for splitting document text into embedding-ready chunks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters
    pub max_chunk_size: usize,
    /// Number of characters carried over from the end of one chunk into the
    /// start of the next
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            max_chunk_size: 1000,
            chunk_overlap: 20,
        }
    }
}

/// Split document text into ordered chunks of at most
/// `config.max_chunk_size` characters.
///
/// Splitting prefers paragraph boundaries, then line boundaries, then word
/// boundaries, and falls back to hard character splits only when a single
/// unit exceeds the maximum size. Consecutive chunks share up to
/// `config.chunk_overlap` characters when the overlap fits within the size
/// bound. The same input always produces the same output; empty or
/// whitespace-only input produces no chunks, and no produced chunk is empty.
#[inline]
pub fn split_text(text: &str, config: &ChunkingConfig) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let units = split_into_units(text, config.max_chunk_size);
    let chunks = merge_units(units, config);

    debug!(
        "Split {} characters into {} chunks",
        text.chars().count(),
        chunks.len()
    );

    chunks
}

/// Decompose text into units no longer than `max_size` characters, each unit
/// retaining its trailing separator so that concatenating the units
/// reproduces the input exactly.
fn split_into_units(text: &str, max_size: usize) -> Vec<String> {
    let mut units = Vec::new();

    for paragraph in text.split_inclusive("\n\n") {
        if char_len(paragraph) <= max_size {
            units.push(paragraph.to_string());
            continue;
        }

        for line in paragraph.split_inclusive('\n') {
            if char_len(line) <= max_size {
                units.push(line.to_string());
                continue;
            }

            for word in line.split_inclusive(' ') {
                if char_len(word) <= max_size {
                    units.push(word.to_string());
                } else {
                    units.extend(hard_split(word, max_size));
                }
            }
        }
    }

    units
}

/// Merge units into chunks bounded by `max_chunk_size`, carrying an overlap
/// tail from the previous chunk when it fits.
fn merge_units(units: Vec<String>, config: &ChunkingConfig) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut current_len = 0;

    for unit in units {
        let unit_len = char_len(&unit);

        if current_len + unit_len > config.max_chunk_size && !current.is_empty() {
            push_chunk(&mut chunks, &current);

            let (mut tail, mut tail_len) = overlap_tail(&current, config.chunk_overlap);
            if tail_len + unit_len > config.max_chunk_size {
                // The overlap would push the next chunk past the bound;
                // start it clean instead.
                tail.clear();
                tail_len = 0;
            }
            current = tail;
            current_len = tail_len;
        }

        current.push(unit);
        current_len += unit_len;
    }

    push_chunk(&mut chunks, &current);
    chunks
}

/// Collect trailing units of the previous chunk whose combined length fits
/// within the overlap budget, preserving their order.
fn overlap_tail(units: &[String], overlap: usize) -> (Vec<String>, usize) {
    if overlap == 0 {
        return (Vec::new(), 0);
    }

    let mut tail = Vec::new();
    let mut tail_len = 0;

    for unit in units.iter().rev() {
        let len = char_len(unit);
        if tail_len + len > overlap {
            break;
        }
        tail.insert(0, unit.clone());
        tail_len += len;
    }

    (tail, tail_len)
}

fn push_chunk(chunks: &mut Vec<String>, units: &[String]) {
    let chunk = units.concat();
    let trimmed = chunk.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

/// Split a single oversized unit into consecutive windows of at most
/// `max_size` characters.
fn hard_split(text: &str, max_size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(max_size)
        .map(|window| window.iter().collect())
        .collect()
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}
