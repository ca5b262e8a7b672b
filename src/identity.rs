//! External identity provider: exchanges a third-party session id for
//! the signed-in person's profile.

use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// Provider answered but refused the session.
    #[error("Session rejected by identity provider (HTTP {0})")]
    Rejected(u16),

    #[error("Identity provider unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed identity response: {0}")]
    Malformed(String),
}

/// Profile returned by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExternalIdentity {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub picture: Option<String>,
}

/// Trait for session lookup (allows mocking in tests).
pub trait IdentityProvider: Send + Sync {
    fn fetch_session(&self, session_id: &str) -> Result<ExternalIdentity, IdentityError>;
}

/// HTTP identity provider. Sends the session id in the `X-Session-ID` header.
pub struct HttpIdentityProvider {
    session_url: String,
    client: reqwest::blocking::Client,
}

impl HttpIdentityProvider {
    /// Must be called outside the async runtime (blocking client).
    pub fn new(session_url: &str, timeout: Duration) -> Result<Self, IdentityError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;
        Ok(Self {
            session_url: session_url.to_string(),
            client,
        })
    }
}

impl IdentityProvider for HttpIdentityProvider {
    fn fetch_session(&self, session_id: &str) -> Result<ExternalIdentity, IdentityError> {
        let response = self
            .client
            .get(&self.session_url)
            .header("X-Session-ID", session_id)
            .send()
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IdentityError::Rejected(status.as_u16()));
        }

        response
            .json::<ExternalIdentity>()
            .map_err(|e| IdentityError::Malformed(e.to_string()))
    }
}

/// Mock identity provider for testing: one known session id.
pub struct MockIdentityProvider {
    session_id: String,
    identity: ExternalIdentity,
}

impl MockIdentityProvider {
    pub fn new(session_id: &str, identity: ExternalIdentity) -> Self {
        Self {
            session_id: session_id.to_string(),
            identity,
        }
    }

    /// Provider that rejects every session.
    pub fn rejecting() -> Self {
        Self::new(
            "",
            ExternalIdentity {
                email: String::new(),
                name: String::new(),
                picture: None,
            },
        )
    }
}

impl IdentityProvider for MockIdentityProvider {
    fn fetch_session(&self, session_id: &str) -> Result<ExternalIdentity, IdentityError> {
        if !self.session_id.is_empty() && session_id == self.session_id {
            Ok(self.identity.clone())
        } else {
            Err(IdentityError::Rejected(401))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::{Json, Router};

    async fn session_stub(headers: HeaderMap) -> Result<Json<serde_json::Value>, StatusCode> {
        match headers.get("X-Session-ID").and_then(|v| v.to_str().ok()) {
            Some("good-session") => Ok(Json(serde_json::json!({
                "id": "ext-1",
                "email": "ana@clinic.example",
                "name": "Ana Souza",
                "picture": "https://img.example/ana.png",
                "session_token": "opaque"
            }))),
            Some("broken-session") => Ok(Json(serde_json::json!({ "unexpected": true }))),
            _ => Err(StatusCode::UNAUTHORIZED),
        }
    }

    async fn spawn_stub() -> String {
        let app = Router::new().route("/session-data", get(session_stub));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/session-data")
    }

    fn fetch_blocking(url: String, session: &'static str) -> Result<ExternalIdentity, IdentityError> {
        let provider = HttpIdentityProvider::new(&url, Duration::from_secs(5))?;
        provider.fetch_session(session)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn http_provider_returns_profile() {
        let url = spawn_stub().await;
        let identity = tokio::task::spawn_blocking(move || fetch_blocking(url, "good-session"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(identity.email, "ana@clinic.example");
        assert_eq!(identity.name, "Ana Souza");
        assert_eq!(identity.picture.as_deref(), Some("https://img.example/ana.png"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn http_provider_maps_rejection_status() {
        let url = spawn_stub().await;
        let err = tokio::task::spawn_blocking(move || fetch_blocking(url, "stale"))
            .await
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, IdentityError::Rejected(401)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn http_provider_reports_malformed_body() {
        let url = spawn_stub().await;
        let err = tokio::task::spawn_blocking(move || fetch_blocking(url, "broken-session"))
            .await
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, IdentityError::Malformed(_)));
    }

    #[test]
    fn http_provider_reports_unreachable_host() {
        let provider =
            HttpIdentityProvider::new("http://127.0.0.1:9/session", Duration::from_secs(2)).unwrap();
        let err = provider.fetch_session("any").unwrap_err();
        assert!(matches!(err, IdentityError::Unavailable(_)));
    }

    #[test]
    fn mock_provider_accepts_only_known_session() {
        let identity = ExternalIdentity {
            email: "a@b.c".into(),
            name: "A".into(),
            picture: None,
        };
        let provider = MockIdentityProvider::new("sess-1", identity.clone());
        assert_eq!(provider.fetch_session("sess-1").unwrap(), identity);
        assert!(matches!(
            provider.fetch_session("sess-2"),
            Err(IdentityError::Rejected(401))
        ));
        assert!(MockIdentityProvider::rejecting().fetch_session("").is_err());
    }
}
