use std::collections::HashMap;

use tracing::debug;

/// Candidate keys probed in the invocation-context bag, in priority order.
const CONTEXT_USER_KEYS: &[&str] = &["user_id", "userId", "uid"];

/// Resolve the tenant id at a boundary.
///
/// The user id arrives through disjoint channels: the agent-framework
/// invocation context (several candidate keys), then the ambient
/// authentication session. `None` means the caller should quietly skip.
pub fn resolve_user_id(
    invocation_context: Option<&HashMap<String, String>>,
    session_user: Option<&str>,
) -> Option<String> {
    if let Some(context) = invocation_context {
        for key in CONTEXT_USER_KEYS {
            if let Some(value) = context.get(*key) {
                if !value.is_empty() {
                    return Some(value.clone());
                }
            }
        }
    }

    match session_user {
        Some(user) if !user.is_empty() => Some(user.to_string()),
        _ => {
            debug!("No user id resolvable from context or session");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bag(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_context_wins_over_session() {
        let context = bag(&[("user_id", "ctx-user")]);
        assert_eq!(
            resolve_user_id(Some(&context), Some("session-user")),
            Some("ctx-user".to_string())
        );
    }

    #[test]
    fn test_key_priority_order() {
        let context = bag(&[("uid", "third"), ("userId", "second")]);
        assert_eq!(
            resolve_user_id(Some(&context), None),
            Some("second".to_string())
        );
    }

    #[test]
    fn test_session_fallback() {
        let context = bag(&[("unrelated", "x"), ("user_id", "")]);
        assert_eq!(
            resolve_user_id(Some(&context), Some("session-user")),
            Some("session-user".to_string())
        );
    }

    #[test]
    fn test_missing_everywhere() {
        assert_eq!(resolve_user_id(None, None), None);
        assert_eq!(resolve_user_id(None, Some("")), None);
    }
}
