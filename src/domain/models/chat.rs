use serde::{Deserialize, Serialize};

/// Minimal view of an agent-framework chat message, just enough for the
/// before-model hook to inspect turns and inject retrieved context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    System,
    User,
    Assistant,
    Tool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    role: ChatRole,
    content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ChatRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }

    pub fn tool_response(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Tool, content)
    }

    pub fn role(&self) -> ChatRole {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_tool_response(&self) -> bool {
        self.role == ChatRole::Tool
    }

    pub fn is_user(&self) -> bool {
        self.role == ChatRole::User
    }

    pub fn is_system(&self) -> bool {
        self.role == ChatRole::System
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_predicates() {
        assert!(ChatMessage::tool_response("{}").is_tool_response());
        assert!(ChatMessage::user("hi").is_user());
        assert!(ChatMessage::system("sys").is_system());
        assert!(!ChatMessage::assistant("ok").is_user());
    }
}
