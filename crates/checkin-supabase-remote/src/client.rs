//! Supabase REST API client for check-ins.

use crate::error::{SupabaseRemoteError, SupabaseRemoteResult};
use async_trait::async_trait;
use checkin_outbox::{
    classify_message, Checkin, OperationKind, QueuedOperation, RemoteCheckinStore, RemoteError,
    RemoteErrorKind, RemoteResult,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Table holding synced check-ins.
pub const CHECKINS_TABLE: &str = "checkins";

/// Row payload for check-in writes.
#[derive(Debug, Serialize)]
struct CheckinRow<'a> {
    /// Queue operation id; the upsert conflict key for creates.
    #[serde(skip_serializing_if = "Option::is_none")]
    client_op_id: Option<&'a str>,
    thoughts: &'a str,
    emotions: &'a [String],
    body_sensations: &'a [String],
    energy_level: u8,
    behavior: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<&'a str>,
    created_at: DateTime<Utc>,
}

impl<'a> CheckinRow<'a> {
    fn new(checkin: &'a Checkin, client_op_id: Option<&'a str>) -> Self {
        Self {
            client_op_id,
            thoughts: &checkin.thoughts,
            emotions: &checkin.emotions,
            body_sensations: &checkin.body_sensations,
            energy_level: checkin.energy_level,
            behavior: &checkin.behavior,
            note: checkin.note.as_deref(),
            created_at: checkin.created_at,
        }
    }
}

/// Map a non-success PostgREST response onto a failure kind.
pub fn classify_status(status: u16, body: &str) -> RemoteErrorKind {
    match status {
        401 => {
            let lower = body.to_lowercase();
            if lower.contains("jwt") || lower.contains("token") {
                RemoteErrorKind::InvalidToken
            } else {
                RemoteErrorKind::Unauthenticated
            }
        }
        403 => RemoteErrorKind::PermissionDenied,
        400 | 422 => RemoteErrorKind::InvalidPayload,
        409 => RemoteErrorKind::ConstraintViolation,
        429 => RemoteErrorKind::RateLimited,
        500..=599 => RemoteErrorKind::Server,
        _ => classify_message(body),
    }
}

/// Supabase-backed [`RemoteCheckinStore`].
///
/// Creates are upserted on `client_op_id`, so replaying a create whose
/// response was lost does not insert a second row.
#[derive(Clone)]
pub struct SupabaseCheckinStore {
    http_client: reqwest::Client,
    api_url: String,
    anon_key: String,
    access_token: Option<String>,
}

impl SupabaseCheckinStore {
    /// Create a new store client.
    ///
    /// # Arguments
    /// * `api_url` - The Supabase project API URL (e.g., `https://xyz.supabase.co`)
    /// * `anon_key` - The Supabase anonymous API key
    /// * `access_token` - The signed-in user's access token, if any
    /// * `timeout` - Per-request timeout
    pub fn new(
        api_url: impl Into<String>,
        anon_key: impl Into<String>,
        access_token: Option<String>,
        timeout: Duration,
    ) -> SupabaseRemoteResult<Self> {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        if api_url.is_empty() {
            return Err(SupabaseRemoteError::Config("missing API URL".to_string()));
        }

        let http_client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_url,
            anon_key: anon_key.into(),
            access_token: access_token.filter(|token| !token.trim().is_empty()),
        })
    }

    /// Build the REST API URL for a table.
    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.api_url, table)
    }

    fn access_token(&self) -> SupabaseRemoteResult<&str> {
        self.access_token
            .as_deref()
            .ok_or(SupabaseRemoteError::NotLoggedIn)
    }

    /// Send one queued operation.
    async fn send(&self, op: &QueuedOperation) -> SupabaseRemoteResult<()> {
        let access_token = self.access_token()?;
        let url = self.rest_url(CHECKINS_TABLE);

        let request = match op.kind() {
            OperationKind::Create { payload } => {
                let row = CheckinRow::new(payload, Some(op.id()));
                self.http_client
                    .post(&url)
                    .query(&[("on_conflict", "client_op_id")])
                    .header("Prefer", "resolution=merge-duplicates")
                    .json(&row)
            }
            OperationKind::Update { target_id, payload } => {
                let row = CheckinRow::new(payload, None);
                self.http_client
                    .patch(&url)
                    .query(&[("id", format!("eq.{target_id}"))])
                    .json(&row)
            }
            OperationKind::Delete { target_id } => self
                .http_client
                .delete(&url)
                .query(&[("id", format!("eq.{target_id}"))]),
        };

        debug!(operation_id = %op.id(), kind = op.label(), target_id = ?op.target_id(), "Sending check-in operation to Supabase");

        let response = request
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await?;

        self.check_response(response).await
    }

    /// Check HTTP response for errors.
    async fn check_response(&self, response: reqwest::Response) -> SupabaseRemoteResult<()> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            debug!(status, body = %body, "Supabase request failed");
            return Err(SupabaseRemoteError::Supabase {
                status,
                message: body,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteCheckinStore for SupabaseCheckinStore {
    async fn apply(&self, op: &QueuedOperation) -> RemoteResult<()> {
        if let Some(payload) = op.payload() {
            if let Err(e) = payload.validate() {
                return Err(RemoteError::new(
                    RemoteErrorKind::InvalidPayload,
                    format!("invalid payload: {e}"),
                ));
            }
        }

        self.send(op).await.map_err(RemoteError::from)
    }

    /// Any HTTP response counts as reachable; only transport failures don't.
    async fn ping(&self) -> bool {
        let result = self
            .http_client
            .get(self.rest_url(""))
            .header("apikey", &self.anon_key)
            .send()
            .await;

        match result {
            Ok(response) => {
                debug!(status = response.status().as_u16(), "Supabase reachable");
                true
            }
            Err(e) => {
                debug!(error = %e, "Supabase unreachable");
                false
            }
        }
    }
}

impl std::fmt::Debug for SupabaseCheckinStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseCheckinStore")
            .field("api_url", &self.api_url)
            .field("authenticated", &self.access_token.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(token: Option<&str>) -> SupabaseCheckinStore {
        SupabaseCheckinStore::new(
            "https://test.supabase.co/",
            "test-key",
            token.map(str::to_string),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn checkin(energy_level: u8) -> Checkin {
        Checkin {
            thoughts: "long day".to_string(),
            emotions: vec!["tired".to_string()],
            body_sensations: Vec::new(),
            energy_level,
            behavior: String::new(),
            note: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_store_creation() {
        let store = store(Some("token"));
        assert_eq!(store.api_url, "https://test.supabase.co");
        assert_eq!(store.anon_key, "test-key");
        assert!(store.access_token().is_ok());
    }

    #[test]
    fn test_rest_url() {
        let store = store(None);
        assert_eq!(
            store.rest_url(CHECKINS_TABLE),
            "https://test.supabase.co/rest/v1/checkins"
        );
        assert_eq!(store.rest_url(""), "https://test.supabase.co/rest/v1/");
    }

    #[test]
    fn test_empty_url_rejected() {
        let err = SupabaseCheckinStore::new("/", "key", None, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, SupabaseRemoteError::Config(_)));
    }

    #[test]
    fn test_blank_token_is_signed_out() {
        let store = store(Some("  "));
        assert!(matches!(
            store.access_token(),
            Err(SupabaseRemoteError::NotLoggedIn)
        ));
    }

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(401, "{}"), RemoteErrorKind::Unauthenticated);
        assert_eq!(
            classify_status(401, r#"{"message":"JWT expired"}"#),
            RemoteErrorKind::InvalidToken
        );
        assert_eq!(classify_status(403, ""), RemoteErrorKind::PermissionDenied);
        assert_eq!(classify_status(400, ""), RemoteErrorKind::InvalidPayload);
        assert_eq!(classify_status(422, ""), RemoteErrorKind::InvalidPayload);
        assert_eq!(classify_status(409, ""), RemoteErrorKind::ConstraintViolation);
        assert_eq!(classify_status(429, ""), RemoteErrorKind::RateLimited);
        assert_eq!(classify_status(500, ""), RemoteErrorKind::Server);
        assert_eq!(classify_status(503, "upstream"), RemoteErrorKind::Server);
        assert_eq!(
            classify_status(404, "relation does not exist"),
            RemoteErrorKind::Unknown
        );
        assert_eq!(
            classify_status(404, "permission denied for table"),
            RemoteErrorKind::PermissionDenied
        );
    }

    #[test]
    fn test_create_row_carries_client_op_id() {
        let payload = checkin(4);
        let row = CheckinRow::new(&payload, Some("op-1"));
        let value = serde_json::to_value(&row).unwrap();

        assert_eq!(value["client_op_id"], "op-1");
        assert_eq!(value["energy_level"], 4);
        assert_eq!(value["emotions"][0], "tired");
        assert!(value.get("note").is_none());

        let row = CheckinRow::new(&payload, None);
        let value = serde_json::to_value(&row).unwrap();
        assert!(value.get("client_op_id").is_none());
    }

    #[tokio::test]
    async fn test_invalid_payload_rejected_before_sending() {
        let store = store(Some("token"));
        let op = QueuedOperation::new(OperationKind::Create {
            payload: checkin(0),
        });

        let err = store.apply(&op).await.unwrap_err();
        assert_eq!(err.kind, RemoteErrorKind::InvalidPayload);
        assert!(!err.is_retryable());
    }

    /// Answer a single request on a local port with `status` and `body`.
    async fn serve_once(status: &'static str, body: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
        });

        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_server_error_status_is_retryable() {
        let api_url = serve_once("503 Service Unavailable", "upstream unavailable").await;
        let store = SupabaseCheckinStore::new(
            api_url,
            "test-key",
            Some("token".to_string()),
            Duration::from_secs(5),
        )
        .unwrap();
        let op = QueuedOperation::new(OperationKind::Delete {
            target_id: "c-1".to_string(),
        });

        let err = store.apply(&op).await.unwrap_err();
        assert_eq!(err.kind, RemoteErrorKind::Server);
        assert!(err.is_retryable());
        assert!(err.message.contains("503"));
        assert!(err.message.contains("upstream unavailable"));
    }

    #[tokio::test]
    async fn test_signed_out_is_permanent() {
        let store = store(None);
        let op = QueuedOperation::new(OperationKind::Delete {
            target_id: "c-1".to_string(),
        });

        let err = store.apply(&op).await.unwrap_err();
        assert_eq!(err.kind, RemoteErrorKind::Unauthenticated);
        assert!(err.message.contains("not logged in"));
    }
}
