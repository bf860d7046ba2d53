use thiserror::Error;

use crate::document::PageRecord;

#[derive(Error, Debug)]
#[error("invalid chunk policy: max_size {max_size}, overlap {overlap} (need 0 < overlap < max_size)")]
pub struct InvalidChunkPolicy {
    pub max_size: usize,
    pub overlap: usize,
}

/// Window size and overlap for passage splitting. Validated at construction
/// so the splitter itself cannot fail.
#[derive(Debug, Clone, Copy)]
pub struct ChunkPolicy {
    max_size: usize,
    overlap: usize,
}

impl ChunkPolicy {
    pub fn new(max_size: usize, overlap: usize) -> Result<Self, InvalidChunkPolicy> {
        if overlap == 0 || overlap >= max_size {
            return Err(InvalidChunkPolicy { max_size, overlap });
        }
        Ok(Self { max_size, overlap })
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    fn stride(&self) -> usize {
        self.max_size - self.overlap
    }
}

/// A bounded-length piece of page text, the unit of embedding and retrieval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Passage {
    pub page: usize,
    pub text: String,
}

/// Splits page text into overlapping passages with a character-based sliding
/// window. One passage is emitted per window start inside the page; the final
/// window may be shorter than `max_size`. Page order is preserved: all of
/// page 1's passages precede page 2's.
///
/// Whitespace-only windows are dropped. Blank PDF pages extract as
/// whitespace text, and the embedder rejects empty input.
///
/// Splitting is purely textual, not sentence-aware. Keep it that way;
/// semantic splitting changes retrieval recall.
pub fn split_pages(pages: &[PageRecord], policy: ChunkPolicy) -> Vec<Passage> {
    let mut passages = Vec::new();
    for page in pages {
        let chars: Vec<char> = page.text.chars().collect();
        let mut start = 0;
        while start < chars.len() {
            let end = (start + policy.max_size()).min(chars.len());
            let text: String = chars[start..end].iter().collect();
            if !text.trim().is_empty() {
                passages.push(Passage {
                    page: page.page,
                    text,
                });
            }
            start += policy.stride();
        }
    }
    passages
}
