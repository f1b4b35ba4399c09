//! Fusion, degradation and agent-surface tests built on stub stores.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use codekb::{
    Chunk, ContextInjectionHook, FileCategory, HybridSearchUseCase, KnowledgeError, LexicalStore,
    NoopVectorStore, RetrievalSource, SearchHit, SearchKnowledgeTool, VectorStore,
};
use codekb::domain::ChatMessage;

fn chunk(user: &str, path: &str, start: u32, end: u32, content: &str) -> Chunk {
    Chunk::new(
        user.to_string(),
        path.to_string(),
        FileCategory::Code,
        "Java".to_string(),
        content.to_string(),
        start,
        end,
        "hash".to_string(),
        0,
    )
}

fn vector_hit(path: &str, start: u32, end: u32, score: f32) -> SearchHit {
    SearchHit::new(
        chunk("u1", path, start, end, "vector content"),
        score,
        RetrievalSource::Vector,
    )
}

fn lexical_hit(path: &str, start: u32, end: u32, score: f32) -> SearchHit {
    SearchHit::new(
        chunk("u1", path, start, end, "lexical content"),
        score,
        RetrievalSource::Lexical,
    )
}

/// Canned vector channel that records the requested quota.
struct StubVectorStore {
    hits: Vec<SearchHit>,
    requested_top_k: Mutex<Option<usize>>,
    fail: bool,
}

impl StubVectorStore {
    fn with_hits(hits: Vec<SearchHit>) -> Self {
        Self {
            hits,
            requested_top_k: Mutex::new(None),
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            hits: vec![],
            requested_top_k: Mutex::new(None),
            fail: true,
        }
    }
}

#[async_trait]
impl VectorStore for StubVectorStore {
    async fn add(&self, _chunks: &[Chunk]) -> Result<(), KnowledgeError> {
        Ok(())
    }

    async fn similarity_search(
        &self,
        _user_id: &str,
        _query: &str,
        top_k: usize,
        _category: Option<FileCategory>,
    ) -> Result<Vec<SearchHit>, KnowledgeError> {
        *self.requested_top_k.lock().unwrap() = Some(top_k);
        if self.fail {
            return Err(KnowledgeError::unavailable("vector backend down"));
        }
        Ok(self.hits.clone())
    }

    async fn delete(&self, _ids: &[String]) -> Result<(), KnowledgeError> {
        Ok(())
    }

    async fn delete_by_file_path(&self, _u: &str, _f: &str) -> Result<u64, KnowledgeError> {
        Ok(0)
    }

    async fn delete_by_user(&self, _u: &str) -> Result<u64, KnowledgeError> {
        Ok(0)
    }

    async fn count_by_user(&self, _u: &str) -> Result<u64, KnowledgeError> {
        Ok(self.hits.len() as u64)
    }
}

struct StubLexicalStore {
    hits: Vec<SearchHit>,
    requested_limit: Mutex<Option<usize>>,
}

impl StubLexicalStore {
    fn with_hits(hits: Vec<SearchHit>) -> Self {
        Self {
            hits,
            requested_limit: Mutex::new(None),
        }
    }
}

#[async_trait]
impl LexicalStore for StubLexicalStore {
    async fn batch_insert(&self, _chunks: &[Chunk]) -> Result<(), KnowledgeError> {
        Ok(())
    }

    async fn full_text_search(
        &self,
        _user_id: &str,
        _query: &str,
        limit: usize,
    ) -> Result<Vec<SearchHit>, KnowledgeError> {
        *self.requested_limit.lock().unwrap() = Some(limit);
        Ok(self.hits.clone())
    }

    async fn delete_by_file_path(&self, _u: &str, _f: &str) -> Result<u64, KnowledgeError> {
        Ok(0)
    }

    async fn delete_by_user(&self, _u: &str) -> Result<u64, KnowledgeError> {
        Ok(0)
    }

    async fn count_by_user(&self, _u: &str) -> Result<u64, KnowledgeError> {
        Ok(self.hits.len() as u64)
    }
}

#[tokio::test]
async fn test_fusion_dedups_and_keeps_vector_hit() {
    // Two vector hits, two lexical hits, one overlapping (path, start, end).
    let vector = Arc::new(StubVectorStore::with_hits(vec![
        vector_hit("/ws/A.java", 1, 10, 0.9),
        vector_hit("/ws/B.java", 5, 20, 0.8),
    ]));
    let lexical = Arc::new(StubLexicalStore::with_hits(vec![
        lexical_hit("/ws/B.java", 5, 20, 3.0),
        lexical_hit("/ws/C.java", 2, 4, 1.0),
    ]));
    let search = HybridSearchUseCase::new(vector, lexical);

    let hits = search.search("u1", "query", 4).await.unwrap();

    assert_eq!(hits.len(), 3);
    // Vector hits lead, and the duplicate retained is the vector one.
    let duplicate = hits
        .iter()
        .find(|h| h.chunk().file_path() == "/ws/B.java")
        .unwrap();
    assert_eq!(duplicate.source(), RetrievalSource::Vector);
}

#[tokio::test]
async fn test_quota_split_half_vector_quarter_lexical() {
    let vector = Arc::new(StubVectorStore::with_hits(vec![]));
    let lexical = Arc::new(StubLexicalStore::with_hits(vec![]));
    let search = HybridSearchUseCase::new(vector.clone(), lexical.clone());

    search.search("u1", "query", 8).await.unwrap();
    assert_eq!(*vector.requested_top_k.lock().unwrap(), Some(4));
    assert_eq!(*lexical.requested_limit.lock().unwrap(), Some(2));

    // Every channel gets at least one slot even for tiny quotas.
    search.search("u1", "query", 1).await.unwrap();
    assert_eq!(*vector.requested_top_k.lock().unwrap(), Some(1));
    assert_eq!(*lexical.requested_limit.lock().unwrap(), Some(1));
}

#[tokio::test]
async fn test_failing_vector_channel_contributes_empty() {
    let vector = Arc::new(StubVectorStore::failing());
    let lexical = Arc::new(StubLexicalStore::with_hits(vec![lexical_hit(
        "/ws/C.java",
        2,
        4,
        1.0,
    )]));
    let search = HybridSearchUseCase::new(vector, lexical);

    let hits = search.search("u1", "query", 4).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].source(), RetrievalSource::Lexical);
}

#[tokio::test]
async fn test_degraded_vector_store_means_lexical_only() {
    let vector = Arc::new(NoopVectorStore::new());
    let lexical = Arc::new(StubLexicalStore::with_hits(vec![lexical_hit(
        "/ws/C.java",
        2,
        4,
        1.0,
    )]));
    let search = HybridSearchUseCase::new(vector, lexical);

    assert!(!search.vector_available());
    let hits = search.search("u1", "query", 5).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].source(), RetrievalSource::Lexical);
}

#[tokio::test]
async fn test_category_search_bypasses_lexical_channel() {
    let vector = Arc::new(StubVectorStore::with_hits(vec![vector_hit(
        "/ws/A.java",
        1,
        10,
        0.9,
    )]));
    let lexical = Arc::new(StubLexicalStore::with_hits(vec![lexical_hit(
        "/ws/C.java",
        2,
        4,
        1.0,
    )]));
    let search = HybridSearchUseCase::new(vector.clone(), lexical.clone());

    let hits = search
        .search_by_category("u1", "query", 7, FileCategory::Code)
        .await
        .unwrap();

    assert_eq!(hits.len(), 1);
    // top_k honored verbatim, lexical never consulted.
    assert_eq!(*vector.requested_top_k.lock().unwrap(), Some(7));
    assert_eq!(*lexical.requested_limit.lock().unwrap(), None);
}

// ── Before-model hook ───────────────────────────────────────────────────────

fn hook_with_hits(hits: Vec<SearchHit>) -> ContextInjectionHook {
    let vector = Arc::new(StubVectorStore::with_hits(hits));
    let lexical = Arc::new(StubLexicalStore::with_hits(vec![]));
    ContextInjectionHook::new(Arc::new(HybridSearchUseCase::new(vector, lexical)))
}

#[tokio::test]
async fn test_hook_injects_after_first_system_message() {
    let hook = hook_with_hits(vec![vector_hit("/ws/A.java", 1, 10, 0.9)]);
    let mut messages = vec![
        ChatMessage::system("You are a coding assistant."),
        ChatMessage::user("How does the refresh pipeline work?"),
    ];

    hook.before_model(None, Some("u1"), &mut messages).await;

    assert_eq!(messages.len(), 3);
    assert!(messages[1].is_system());
    assert!(messages[1].content().contains("/ws/A.java"));
}

#[tokio::test]
async fn test_hook_injects_at_front_without_system_message() {
    let hook = hook_with_hits(vec![vector_hit("/ws/A.java", 1, 10, 0.9)]);
    let mut messages = vec![ChatMessage::user("How does the refresh pipeline work?")];

    hook.before_model(None, Some("u1"), &mut messages).await;

    assert_eq!(messages.len(), 2);
    assert!(messages[0].is_system());
}

#[tokio::test]
async fn test_hook_skips_later_tool_turns() {
    let hook = hook_with_hits(vec![vector_hit("/ws/A.java", 1, 10, 0.9)]);
    let mut messages = vec![
        ChatMessage::user("How does the refresh pipeline work?"),
        ChatMessage::assistant("Let me check."),
        ChatMessage::tool_response("{\"result\": 1}"),
    ];

    hook.before_model(None, Some("u1"), &mut messages).await;
    assert_eq!(messages.len(), 3);
}

#[tokio::test]
async fn test_hook_skips_short_queries() {
    let hook = hook_with_hits(vec![vector_hit("/ws/A.java", 1, 10, 0.9)]);
    let mut messages = vec![ChatMessage::user("hi")];

    hook.before_model(None, Some("u1"), &mut messages).await;
    assert_eq!(messages.len(), 1);
}

#[tokio::test]
async fn test_hook_skips_when_vector_degraded() {
    let vector = Arc::new(NoopVectorStore::new());
    let lexical = Arc::new(StubLexicalStore::with_hits(vec![lexical_hit(
        "/ws/C.java",
        2,
        4,
        1.0,
    )]));
    let hook = ContextInjectionHook::new(Arc::new(HybridSearchUseCase::new(vector, lexical)));
    let mut messages = vec![ChatMessage::user("How does the refresh pipeline work?")];

    hook.before_model(None, Some("u1"), &mut messages).await;
    assert_eq!(messages.len(), 1);
}

#[tokio::test]
async fn test_hook_skips_without_user() {
    let hook = hook_with_hits(vec![vector_hit("/ws/A.java", 1, 10, 0.9)]);
    let mut messages = vec![ChatMessage::user("How does the refresh pipeline work?")];

    hook.before_model(None, None, &mut messages).await;
    assert_eq!(messages.len(), 1);
}

// ── search_knowledge tool ───────────────────────────────────────────────────

fn tool_with_hits(hits: Vec<SearchHit>) -> SearchKnowledgeTool {
    let vector = Arc::new(StubVectorStore::with_hits(hits));
    let lexical = Arc::new(StubLexicalStore::with_hits(vec![]));
    SearchKnowledgeTool::new(Arc::new(HybridSearchUseCase::new(vector, lexical)))
}

#[tokio::test]
async fn test_tool_rejects_empty_query() {
    let tool = tool_with_hits(vec![]);
    let result = tool
        .execute(
            serde_json::json!({"query": "", "top_k": 5}),
            None,
            Some("u1"),
        )
        .await;
    assert_eq!(result, "Error: Query cannot be empty");
}

#[tokio::test]
async fn test_tool_rejects_out_of_range_top_k() {
    let tool = tool_with_hits(vec![]);
    for top_k in [0, 21] {
        let result = tool
            .execute(
                serde_json::json!({"query": "refresh", "top_k": top_k}),
                None,
                Some("u1"),
            )
            .await;
        assert!(result.starts_with("Error: top_k must be between"), "{}", result);
    }
}

#[tokio::test]
async fn test_tool_rejects_oversized_query() {
    let tool = tool_with_hits(vec![]);
    let long_query = "q".repeat(501);
    let result = tool
        .execute(serde_json::json!({"query": long_query}), None, Some("u1"))
        .await;
    assert!(result.starts_with("Error: Query too long"), "{}", result);
}

#[tokio::test]
async fn test_tool_rejects_unknown_file_type() {
    let tool = tool_with_hits(vec![]);
    let result = tool
        .execute(
            serde_json::json!({"query": "refresh", "file_type": "BINARY"}),
            None,
            Some("u1"),
        )
        .await;
    assert!(result.starts_with("Error: Unknown file_type"), "{}", result);
}

#[tokio::test]
async fn test_tool_requires_resolvable_user() {
    let tool = tool_with_hits(vec![]);
    let result = tool
        .execute(serde_json::json!({"query": "refresh"}), None, None)
        .await;
    assert_eq!(result, "Error: No user session available");
}

#[tokio::test]
async fn test_tool_reports_no_results() {
    let tool = tool_with_hits(vec![]);
    let result = tool
        .execute(serde_json::json!({"query": "nothing here"}), None, Some("u1"))
        .await;
    assert_eq!(result, "No relevant knowledge found for query: nothing here");
}

#[tokio::test]
async fn test_tool_formats_context_on_success() {
    let tool = tool_with_hits(vec![vector_hit("/ws/A.java", 1, 10, 0.9)]);
    let result = tool
        .execute(serde_json::json!({"query": "refresh"}), None, Some("u1"))
        .await;
    assert!(result.starts_with("文件: /ws/A.java\n内容:\n"), "{}", result);
}

#[tokio::test]
async fn test_tool_default_top_k_is_five() {
    let vector = Arc::new(StubVectorStore::with_hits(vec![]));
    let lexical = Arc::new(StubLexicalStore::with_hits(vec![]));
    let tool = SearchKnowledgeTool::new(Arc::new(HybridSearchUseCase::new(
        vector.clone(),
        lexical,
    )));

    tool.execute(serde_json::json!({"query": "refresh"}), None, Some("u1"))
        .await;
    // Hybrid quota for n=5: half to the vector channel.
    assert_eq!(*vector.requested_top_k.lock().unwrap(), Some(2));
}
