use super::ChunkDraft;

const DEFAULT_CHUNK_SIZE: usize = 500;

const TERMINATORS: &[char] = &['.', '!', '?', '。', '！', '？'];

/// Aggregates adjacent sentences until the target chunk size is reached.
/// A sentence is never split in the middle, even when it alone exceeds the
/// target.
pub struct SentenceSplitter {
    chunk_size: usize,
}

impl SentenceSplitter {
    pub fn new() -> Self {
        Self::with_config(DEFAULT_CHUNK_SIZE)
    }

    pub fn with_config(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    fn sentences(text: &str) -> Vec<String> {
        let mut sentences = Vec::new();
        let mut current = String::new();
        for c in text.chars() {
            current.push(c);
            if TERMINATORS.contains(&c) {
                sentences.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            sentences.push(current);
        }
        sentences
    }

    pub fn split(&self, content: &str) -> Vec<ChunkDraft> {
        let mut chunks: Vec<String> = Vec::new();
        let mut current = String::new();

        for sentence in Self::sentences(content) {
            if !current.is_empty()
                && current.chars().count() + sentence.chars().count() > self.chunk_size
            {
                chunks.push(std::mem::take(&mut current));
            }
            current.push_str(&sentence);
        }
        if !current.is_empty() {
            chunks.push(current);
        }

        chunks
            .into_iter()
            .filter(|chunk| !chunk.trim().is_empty())
            .map(ChunkDraft::unpositioned)
            .collect()
    }
}

impl Default for SentenceSplitter {
    fn default() -> Self {
        Self::new()
    }
}
