use axum::http::HeaderMap;

/// Narrow view of the authentication layer: resolve the current user from
/// request headers, or `None` when no session exists.
pub trait SessionAuth: Send + Sync {
    fn resolve_user(&self, headers: &HeaderMap) -> Option<String>;
}

/// Session lookup backed by a trusted header, the shape an upstream gateway
/// or session middleware presents the authenticated user in.
pub struct HeaderSessionAuth {
    header_name: String,
}

impl HeaderSessionAuth {
    pub fn new() -> Self {
        Self {
            header_name: "x-session-user".to_string(),
        }
    }

    pub fn with_header(header_name: impl Into<String>) -> Self {
        Self {
            header_name: header_name.into(),
        }
    }
}

impl Default for HeaderSessionAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionAuth for HeaderSessionAuth {
    fn resolve_user(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get(self.header_name.as_str())
            .and_then(|value| value.to_str().ok())
            .filter(|user| !user.is_empty())
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_resolves_user_from_header() {
        let auth = HeaderSessionAuth::new();
        let mut headers = HeaderMap::new();
        headers.insert("x-session-user", HeaderValue::from_static("u42"));

        assert_eq!(auth.resolve_user(&headers), Some("u42".to_string()));
    }

    #[test]
    fn test_missing_or_empty_header_is_none() {
        let auth = HeaderSessionAuth::new();
        assert_eq!(auth.resolve_user(&HeaderMap::new()), None);

        let mut headers = HeaderMap::new();
        headers.insert("x-session-user", HeaderValue::from_static(""));
        assert_eq!(auth.resolve_user(&headers), None);
    }
}
