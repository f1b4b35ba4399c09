use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use super::resolve_user_id;
use crate::application::{format_context, HybridSearchUseCase};
use crate::domain::ChatMessage;

/// Queries shorter than this carry too little signal to retrieve on.
const MIN_QUERY_CHARS: usize = 5;
/// Hits injected into the prompt on the first turn.
const HOOK_TOP_K: usize = 3;

/// Before-model hook: on the first user turn of a conversation, retrieves
/// knowledge for the latest user message and injects it as a single
/// system-role message.
///
/// Later turns of the same tool-calling loop (recognised by a trailing tool
/// response) are left untouched, as is everything when the vector store is
/// degraded or no tenant can be resolved.
pub struct ContextInjectionHook {
    search: Arc<HybridSearchUseCase>,
}

impl ContextInjectionHook {
    pub fn new(search: Arc<HybridSearchUseCase>) -> Self {
        Self { search }
    }

    pub async fn before_model(
        &self,
        invocation_context: Option<&HashMap<String, String>>,
        session_user: Option<&str>,
        messages: &mut Vec<ChatMessage>,
    ) {
        if messages.last().is_some_and(|message| message.is_tool_response()) {
            return;
        }
        if !self.search.vector_available() {
            debug!("Vector store degraded, skipping context injection");
            return;
        }
        let Some(user_id) = resolve_user_id(invocation_context, session_user) else {
            return;
        };

        let Some(query) = messages
            .iter()
            .rev()
            .find(|message| message.is_user())
            .map(|message| message.content().trim().to_string())
        else {
            return;
        };
        if query.chars().count() < MIN_QUERY_CHARS {
            return;
        }

        let hits = match self.search.search(&user_id, &query, HOOK_TOP_K).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!("Context retrieval failed, skipping injection: {}", e);
                return;
            }
        };
        if hits.is_empty() {
            return;
        }

        let context = format_context(&hits);
        let injected = ChatMessage::system(format!(
            "以下是与当前问题相关的代码库知识，可作为回答参考:\n\n{}",
            context
        ));

        // Right after the first system message, or at the front if none.
        let position = messages
            .iter()
            .position(|message| message.is_system())
            .map(|index| index + 1)
            .unwrap_or(0);
        messages.insert(position, injected);

        debug!("Injected {} knowledge snippets for {}", hits.len(), user_id);
    }
}
