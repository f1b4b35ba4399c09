use super::ChunkDraft;

const DEFAULT_CHUNK_SIZE: usize = 500;
const DEFAULT_CHUNK_OVERLAP: usize = 50;

/// Hierarchical separator list, coarsest first: blank line, line, CJK
/// sentence terminators, comma, space.
const SEPARATORS: &[&str] = &["\n\n", "\n", "。", "！", "？", "，", ",", " "];

/// Splits prose by recursively descending a separator hierarchy, aiming for
/// `chunk_size` characters with `chunk_overlap` characters of continuity
/// between adjacent chunks. Whitespace-only chunks are dropped.
pub struct RecursiveCharacterSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveCharacterSplitter {
    pub fn new() -> Self {
        Self::with_config(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP)
    }

    pub fn with_config(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size / 2),
        }
    }

    pub fn split(&self, content: &str) -> Vec<ChunkDraft> {
        self.split_text(content, SEPARATORS)
            .into_iter()
            .filter(|chunk| !chunk.trim().is_empty())
            .map(ChunkDraft::unpositioned)
            .collect()
    }

    fn char_len(text: &str) -> usize {
        text.chars().count()
    }

    fn split_text(&self, text: &str, separators: &[&str]) -> Vec<String> {
        if Self::char_len(text) <= self.chunk_size {
            return vec![text.to_string()];
        }

        let Some((separator, rest)) = separators.split_first() else {
            // Out of separators: hard split by characters.
            let chars: Vec<char> = text.chars().collect();
            return chars
                .chunks(self.chunk_size)
                .map(|slice| slice.iter().collect())
                .collect();
        };

        if !text.contains(separator) {
            return self.split_text(text, rest);
        }

        // Separators stay attached to the piece they terminate.
        let mut units: Vec<String> = Vec::new();
        for piece in text.split_inclusive(separator) {
            if Self::char_len(piece) > self.chunk_size {
                units.extend(self.split_text(piece, rest));
            } else {
                units.push(piece.to_string());
            }
        }

        self.merge_units(units)
    }

    fn merge_units(&self, units: Vec<String>) -> Vec<String> {
        let mut chunks: Vec<String> = Vec::new();
        let mut current = String::new();

        for unit in units {
            if !current.is_empty()
                && Self::char_len(&current) + Self::char_len(&unit) > self.chunk_size
            {
                let tail = self.overlap_tail(&current);
                chunks.push(std::mem::take(&mut current));
                current = tail;
            }
            current.push_str(&unit);
        }
        if !current.is_empty() {
            chunks.push(current);
        }
        chunks
    }

    fn overlap_tail(&self, text: &str) -> String {
        if self.chunk_overlap == 0 {
            return String::new();
        }
        let chars: Vec<char> = text.chars().collect();
        let start = chars.len().saturating_sub(self.chunk_overlap);
        chars[start..].iter().collect()
    }
}

impl Default for RecursiveCharacterSplitter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_single_chunk() {
        let splitter = RecursiveCharacterSplitter::new();
        let drafts = splitter.split("# Title\n\nA short paragraph.");
        assert_eq!(drafts.len(), 1);
    }

    #[test]
    fn test_prefers_blank_line_boundaries() {
        let splitter = RecursiveCharacterSplitter::with_config(40, 0);
        let text = format!("{}\n\n{}", "first paragraph body here", "second paragraph body here");
        let drafts = splitter.split(&text);
        assert_eq!(drafts.len(), 2);
        assert!(drafts[0].content.starts_with("first paragraph"));
        assert!(drafts[1].content.starts_with("second paragraph"));
    }

    #[test]
    fn test_overlap_carries_tail_forward() {
        let splitter = RecursiveCharacterSplitter::with_config(30, 10);
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa";
        let drafts = splitter.split(&text);
        assert!(drafts.len() >= 2);

        let first: Vec<char> = drafts[0].content.chars().collect();
        let tail: String = first[first.len().saturating_sub(10)..].iter().collect();
        assert!(drafts[1].content.starts_with(&tail));
    }

    #[test]
    fn test_whitespace_only_chunks_are_dropped() {
        let splitter = RecursiveCharacterSplitter::with_config(10, 0);
        let drafts = splitter.split("word\n\n\n\n     \n\nother");
        assert!(drafts.iter().all(|d| !d.content.trim().is_empty()));
    }

    #[test]
    fn test_cjk_sentences_split_on_terminators() {
        let splitter = RecursiveCharacterSplitter::with_config(12, 0);
        let text = "这是第一句话。这是第二句话。这是第三句话。";
        let drafts = splitter.split(&text);
        assert!(drafts.len() >= 2);
        for draft in &drafts[..drafts.len() - 1] {
            assert!(draft.content.ends_with('。'));
        }
    }

    #[test]
    fn test_line_ranges_default_to_one() {
        let splitter = RecursiveCharacterSplitter::with_config(10, 0);
        for draft in splitter.split("one two three four five six seven") {
            assert_eq!((draft.start_line, draft.end_line), (1, 1));
        }
    }
}
