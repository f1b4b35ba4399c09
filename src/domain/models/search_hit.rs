use serde::{Deserialize, Serialize};

use super::Chunk;

/// Which retrieval channel produced a hit. The fuser keeps the first
/// occurrence of a duplicate, which biases toward vector hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalSource {
    Vector,
    Lexical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    chunk: Chunk,
    score: f32,
    source: RetrievalSource,
}

impl SearchHit {
    pub fn new(chunk: Chunk, score: f32, source: RetrievalSource) -> Self {
        Self {
            chunk,
            score,
            source,
        }
    }

    pub fn chunk(&self) -> &Chunk {
        &self.chunk
    }

    pub fn score(&self) -> f32 {
        self.score
    }

    pub fn source(&self) -> RetrievalSource {
        self.source
    }

    pub fn display_line(&self) -> String {
        format!("{} (score: {:.3})", self.chunk.location(), self.score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FileCategory;

    #[test]
    fn test_hit_accessors() {
        let chunk = Chunk::new(
            "u1".to_string(),
            "/ws/a.md".to_string(),
            FileCategory::Document,
            "markdown".to_string(),
            "# title".to_string(),
            1,
            1,
            "h".to_string(),
            0,
        );
        let hit = SearchHit::new(chunk, 0.87, RetrievalSource::Vector);

        assert_eq!(hit.source(), RetrievalSource::Vector);
        assert_eq!(hit.display_line(), "/ws/a.md:1-1 (score: 0.870)");
    }
}
