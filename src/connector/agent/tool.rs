use std::collections::HashMap;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::Deserialize;
use tracing::debug;

use super::resolve_user_id;
use crate::application::{format_context, HybridSearchUseCase};
use crate::domain::FileCategory;

pub const TOOL_NAME: &str = "search_knowledge";
pub const TOOL_DESCRIPTION: &str =
    "Search the user's indexed codebase knowledge and return relevant context snippets";

const MAX_QUERY_CHARS: usize = 500;
const DEFAULT_TOP_K: u32 = 5;
const MIN_TOP_K: u32 = 1;
const MAX_TOP_K: u32 = 20;

/// Parameters accepted by the `search_knowledge` tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchKnowledgeParams {
    /// The search query (required, at most 500 characters)
    pub query: String,

    /// Optional category filter: CODE, DOCUMENT or CONFIG
    #[serde(default)]
    pub file_type: Option<String>,

    /// Number of results to return, 1 to 20 (default 5)
    #[serde(default)]
    pub top_k: Option<u32>,
}

/// LLM-facing adaptor over the search pipeline. Every outcome is a plain
/// string: the formatted context, a "no results" notice, or an
/// `Error: …` message the model can read.
pub struct SearchKnowledgeTool {
    search: Arc<HybridSearchUseCase>,
}

impl SearchKnowledgeTool {
    pub fn new(search: Arc<HybridSearchUseCase>) -> Self {
        Self { search }
    }

    pub fn name(&self) -> &'static str {
        TOOL_NAME
    }

    pub fn description(&self) -> &'static str {
        TOOL_DESCRIPTION
    }

    pub fn parameters_schema(&self) -> serde_json::Value {
        serde_json::to_value(schemars::schema_for!(SearchKnowledgeParams))
            .unwrap_or_else(|_| serde_json::json!({}))
    }

    /// Execute one tool call. The user id is never a tool parameter; it is
    /// resolved from the invocation context with a fallback to the ambient
    /// session.
    pub async fn execute(
        &self,
        params: serde_json::Value,
        invocation_context: Option<&HashMap<String, String>>,
        session_user: Option<&str>,
    ) -> String {
        let params: SearchKnowledgeParams = match serde_json::from_value(params) {
            Ok(params) => params,
            Err(e) => return format!("Error: Invalid parameters: {}", e),
        };

        let query = params.query.trim();
        if query.is_empty() {
            return "Error: Query cannot be empty".to_string();
        }
        if query.chars().count() > MAX_QUERY_CHARS {
            return format!("Error: Query too long (max {} characters)", MAX_QUERY_CHARS);
        }

        let top_k = params.top_k.unwrap_or(DEFAULT_TOP_K);
        if !(MIN_TOP_K..=MAX_TOP_K).contains(&top_k) {
            return format!(
                "Error: top_k must be between {} and {}",
                MIN_TOP_K, MAX_TOP_K
            );
        }

        let category = match params.file_type.as_deref() {
            None => None,
            Some(raw) => match FileCategory::parse(raw) {
                Some(category) => Some(category),
                None => return format!("Error: Unknown file_type: {}", raw),
            },
        };

        let Some(user_id) = resolve_user_id(invocation_context, session_user) else {
            return "Error: No user session available".to_string();
        };

        debug!(
            "search_knowledge: user={} top_k={} file_type={:?}",
            user_id, top_k, category
        );

        let result = match category {
            Some(category) => {
                self.search
                    .search_by_category(&user_id, query, top_k as usize, category)
                    .await
            }
            None => self.search.search(&user_id, query, top_k as usize).await,
        };

        match result {
            Ok(hits) if hits.is_empty() => {
                format!("No relevant knowledge found for query: {}", query)
            }
            Ok(hits) => format_context(&hits),
            Err(e) => format!("Error: {}", e),
        }
    }
}
