use super::ChunkDraft;

const DEFAULT_CHUNK_SIZE: usize = 2000;
const DEFAULT_MIN_CHUNK_SIZE: usize = 100;

/// Splits on approximate token count while respecting newline separators.
/// Separators are preserved in the output; line ranges default to `(1, 1)`.
pub struct TokenSplitter {
    chunk_size: usize,
    min_chunk_size: usize,
}

impl TokenSplitter {
    pub fn new() -> Self {
        Self::with_config(DEFAULT_CHUNK_SIZE, DEFAULT_MIN_CHUNK_SIZE)
    }

    pub fn with_config(chunk_size: usize, min_chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            min_chunk_size,
        }
    }

    /// Rough token estimate: ~4 characters per token.
    fn approx_tokens(text: &str) -> usize {
        text.chars().count().div_ceil(4)
    }

    pub fn split(&self, content: &str) -> Vec<ChunkDraft> {
        let mut pieces: Vec<String> = Vec::new();
        let mut current = String::new();

        for line in content.split_inclusive('\n') {
            let line_tokens = Self::approx_tokens(line);

            if !current.is_empty()
                && Self::approx_tokens(&current) + line_tokens > self.chunk_size
            {
                pieces.push(std::mem::take(&mut current));
            }

            if line_tokens > self.chunk_size {
                // A single line over the limit is hard-split by characters.
                if !current.is_empty() {
                    pieces.push(std::mem::take(&mut current));
                }
                let window = self.chunk_size * 4;
                let chars: Vec<char> = line.chars().collect();
                for slice in chars.chunks(window) {
                    pieces.push(slice.iter().collect());
                }
            } else {
                current.push_str(line);
            }
        }
        if !current.is_empty() {
            pieces.push(current);
        }

        // A trailing fragment below the minimum merges into its predecessor.
        if pieces.len() >= 2 && Self::approx_tokens(&pieces[pieces.len() - 1]) < self.min_chunk_size
        {
            if let Some(tail) = pieces.pop() {
                if let Some(previous) = pieces.last_mut() {
                    previous.push_str(&tail);
                }
            }
        }

        pieces
            .into_iter()
            .filter(|piece| !piece.trim().is_empty())
            .map(ChunkDraft::unpositioned)
            .collect()
    }
}

impl Default for TokenSplitter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_content_is_one_chunk() {
        let splitter = TokenSplitter::new();
        let drafts = splitter.split("fn main() {}\n");
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].content, "fn main() {}\n");
        assert_eq!((drafts[0].start_line, drafts[0].end_line), (1, 1));
    }

    #[test]
    fn test_splits_on_line_boundaries() {
        // chunk_size 10 tokens ≈ 40 chars; each line is ~20 chars.
        let splitter = TokenSplitter::with_config(10, 0);
        let line = "a".repeat(19) + "\n";
        let content = line.repeat(4);
        let drafts = splitter.split(&content);

        assert!(drafts.len() >= 2);
        // Separators preserved: concatenation reproduces the input.
        let rebuilt: String = drafts.iter().map(|d| d.content.as_str()).collect();
        assert_eq!(rebuilt, content);
        for draft in &drafts {
            assert!(draft.content.ends_with('\n'));
        }
    }

    #[test]
    fn test_small_tail_merges_into_previous() {
        let splitter = TokenSplitter::with_config(10, 5);
        let content = format!("{}\nxy\n", "a".repeat(39));
        let drafts = splitter.split(&content);
        assert_eq!(drafts.len(), 1);
        assert!(drafts[0].content.ends_with("xy\n"));
    }

    #[test]
    fn test_oversized_line_is_hard_split() {
        let splitter = TokenSplitter::with_config(10, 0);
        let content = "b".repeat(100);
        let drafts = splitter.split(&content);
        assert!(drafts.len() >= 2);
        let rebuilt: String = drafts.iter().map(|d| d.content.as_str()).collect();
        assert_eq!(rebuilt, content);
    }

    #[test]
    fn test_blank_content_yields_nothing() {
        let splitter = TokenSplitter::new();
        assert!(splitter.split("   \n \n").is_empty());
    }

    #[test]
    fn test_deterministic_boundaries() {
        let splitter = TokenSplitter::with_config(12, 3);
        let content = "alpha beta gamma\n".repeat(20);
        let first = splitter.split(&content);
        let second = splitter.split(&content);
        let firsts: Vec<_> = first.iter().map(|d| d.content.clone()).collect();
        let seconds: Vec<_> = second.iter().map(|d| d.content.clone()).collect();
        assert_eq!(firsts, seconds);
    }
}
