//! Async HTTP client for the directory's `/v1/submit` endpoints.

use std::time::Duration;

use mprdb_core::directory::{Directory, RawRecord};
use reqwest::{Client, Response, header::CONTENT_TYPE};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::{
  Error, Result,
  wire::{Ack, Reply, SubmitList},
};

/// Connection settings for the directory.
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
  pub base_url: String,
  /// Upper bound on each request, connect to last byte.
  pub timeout:  Duration,
}

/// Async HTTP client for the directory.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct DirectoryClient {
  client: Client,
  config: DirectoryConfig,
}

impl DirectoryClient {
  pub fn new(config: DirectoryConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(config.timeout)
      .user_agent(concat!("mprdb/", env!("CARGO_PKG_VERSION")))
      .build()?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/v1{}", self.config.base_url.trim_end_matches('/'), path)
  }

  /// `GET /v1/submit/server/{source_id}`
  pub async fn list_submissions(&self, source_id: Uuid) -> Result<Vec<RawRecord>> {
    let resp = self
      .client
      .get(self.url(&format!("/submit/server/{source_id}")))
      .send()
      .await?;

    let list: SubmitList = read_reply(resp, "submission list").await?;
    let records = list
      .submits
      .unwrap_or_default()
      .into_iter()
      .map(|s| s.into_record())
      .collect::<Result<Vec<_>>>()?;

    tracing::debug!(%source_id, records = records.len(), "fetched submissions");
    Ok(records)
  }

  /// `PUT /v1/submit/new` with a signed assertion block.
  ///
  /// Returns the operation id the directory filed it under, when it says.
  pub async fn submit(&self, signed_block: String) -> Result<Option<Uuid>> {
    let resp = self
      .client
      .put(self.url("/submit/new"))
      .header(CONTENT_TYPE, "text/plain")
      .body(signed_block)
      .send()
      .await?;

    let ack: Ack = read_reply(resp, "submit acknowledgement").await?;
    Ok(ack.uuid.as_deref().and_then(|s| Uuid::parse_str(s).ok()))
  }

  /// `DELETE /v1/submit/uuid/{operation_id}` with a signed retraction notice.
  pub async fn retract(&self, operation_id: Uuid, signed_notice: String) -> Result<()> {
    let resp = self
      .client
      .delete(self.url(&format!("/submit/uuid/{operation_id}")))
      .header(CONTENT_TYPE, "text/plain")
      .body(signed_notice)
      .send()
      .await?;

    let _: Ack = read_reply(resp, "retract acknowledgement").await?;
    Ok(())
  }
}

impl Directory for DirectoryClient {
  type Error = Error;

  async fn fetch_source_assertions(&self, source_id: Uuid) -> Result<Vec<RawRecord>> {
    self.list_submissions(source_id).await
  }
}

/// Decode a directory reply. An `NG` status wins over the HTTP status so the
/// directory's reason reaches the caller.
async fn read_reply<T: DeserializeOwned>(resp: Response, what: &'static str) -> Result<T> {
  let status = resp.status();
  let bytes = resp.bytes().await?;

  match serde_json::from_slice::<Reply<T>>(&bytes) {
    Ok(reply) => {
      let body = reply.into_body()?;
      if !status.is_success() {
        return Err(Error::Status { what, status });
      }
      Ok(body)
    }
    Err(_) if !status.is_success() => Err(Error::Status { what, status }),
    Err(source) => Err(Error::Decode { what, source }),
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use axum::{
    Json, Router,
    extract::Path,
    http::{HeaderMap, StatusCode},
    routing::{delete, get, put},
  };
  use serde_json::{Value, json};

  use super::*;

  async fn serve(router: Router) -> DirectoryClient {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });

    DirectoryClient::new(DirectoryConfig {
      base_url: format!("http://{addr}/"),
      timeout:  Duration::from_secs(5),
    })
    .unwrap()
  }

  // ─── Fetch ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn fetch_decodes_submissions() {
    let source = Uuid::new_v4();
    let op = Uuid::new_v4();
    let router = Router::new().route(
      "/v1/submit/server/{id}",
      get(move |Path(id): Path<String>| async move {
        Json(json!({
          "status": "OK",
          "reason": "",
          "submits": [{ "id": 7, "uuid": op, "server_uuid": id, "content": "signed" }],
        }))
      }),
    );
    let client = serve(router).await;

    let records = client.fetch_source_assertions(source).await.unwrap();
    assert_eq!(records, vec![RawRecord {
      operation_id: op,
      subject_id:   None,
      source_id:    source,
      content:      "signed".into(),
    }]);
  }

  #[tokio::test]
  async fn fetch_with_no_submissions_is_empty() {
    let router = Router::new().route(
      "/v1/submit/server/{id}",
      get(|| async { Json(json!({ "status": "OK", "reason": "", "submits": null })) }),
    );
    let client = serve(router).await;
    assert!(client.list_submissions(Uuid::new_v4()).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn ng_reply_is_rejected_even_with_error_status() {
    let router = Router::new().route(
      "/v1/submit/server/{id}",
      get(|| async {
        (
          StatusCode::NOT_FOUND,
          Json(json!({ "status": "NG", "reason": "no such server" })),
        )
      }),
    );
    let client = serve(router).await;

    match client.list_submissions(Uuid::new_v4()).await {
      Err(Error::Rejected(reason)) => assert_eq!(reason, "no such server"),
      other => panic!("expected rejection, got {other:?}"),
    }
  }

  #[tokio::test]
  async fn non_json_error_page_is_a_status_error() {
    let router = Router::new().route(
      "/v1/submit/server/{id}",
      get(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
    );
    let client = serve(router).await;

    let err = client.list_submissions(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, Error::Status { status, .. } if status == StatusCode::BAD_GATEWAY));
    assert!(!err.is_rejected());
  }

  #[tokio::test]
  async fn garbage_body_is_a_decode_error() {
    let router = Router::new().route(
      "/v1/submit/server/{id}",
      get(|| async { "<html>hello</html>" }),
    );
    let client = serve(router).await;

    let r = client.list_submissions(Uuid::new_v4()).await;
    assert!(matches!(r, Err(Error::Decode { .. })));
  }

  #[tokio::test]
  async fn slow_directory_times_out() {
    let router = Router::new().route(
      "/v1/submit/server/{id}",
      get(|| async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Json(json!({ "status": "OK" }))
      }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
    let client = DirectoryClient::new(DirectoryConfig {
      base_url: format!("http://{addr}"),
      timeout:  Duration::from_millis(100),
    })
    .unwrap();

    let r = client.list_submissions(Uuid::new_v4()).await;
    assert!(matches!(r, Err(Error::Network(e)) if e.is_timeout()));
  }

  #[tokio::test]
  async fn unreachable_directory_is_a_network_error() {
    let client = DirectoryClient::new(DirectoryConfig {
      base_url: "http://127.0.0.1:1".into(),
      timeout:  Duration::from_secs(2),
    })
    .unwrap();
    let r = client.list_submissions(Uuid::new_v4()).await;
    assert!(matches!(r, Err(Error::Network(_))));
  }

  // ─── Submit / retract ─────────────────────────────────────────────────────

  #[tokio::test]
  async fn submit_sends_plain_text_and_returns_uuid() {
    let seen = Arc::new(Mutex::new(None::<(String, String)>));
    let filed = Uuid::new_v4();
    let router = Router::new().route(
      "/v1/submit/new",
      put({
        let seen = seen.clone();
        move |headers: HeaderMap, body: String| async move {
          let ct = headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_owned();
          *seen.lock().unwrap() = Some((ct, body));
          Json(json!({ "status": "OK", "uuid": filed, "reason": "" }))
        }
      }),
    );
    let client = serve(router).await;

    let id = client.submit("-----BEGIN PGP SIGNED MESSAGE-----\n".into()).await.unwrap();
    assert_eq!(id, Some(filed));

    let (ct, body) = seen.lock().unwrap().clone().unwrap();
    assert_eq!(ct, "text/plain");
    assert!(body.starts_with("-----BEGIN PGP SIGNED MESSAGE-----"));
  }

  #[tokio::test]
  async fn submit_without_uuid_returns_none() {
    let router = Router::new().route(
      "/v1/submit/new",
      put(|| async { Json(json!({ "status": "OK", "uuid": "", "reason": "" })) }),
    );
    let client = serve(router).await;
    assert_eq!(client.submit("x".into()).await.unwrap(), None);
  }

  #[tokio::test]
  async fn retract_hits_operation_path() {
    let op = Uuid::new_v4();
    let hit = Arc::new(Mutex::new(None::<String>));
    let router = Router::new().route(
      "/v1/submit/uuid/{id}",
      delete({
        let hit = hit.clone();
        move |Path(id): Path<String>| async move {
          *hit.lock().unwrap() = Some(id);
          Json(json!({ "status": "OK", "uuid": "", "reason": "" }))
        }
      }),
    );
    let client = serve(router).await;

    client.retract(op, "notice".into()).await.unwrap();
    assert_eq!(hit.lock().unwrap().clone(), Some(op.to_string()));
  }

  #[tokio::test]
  async fn retract_rejection_carries_reason() {
    let router = Router::new().route(
      "/v1/submit/uuid/{id}",
      delete(|| async {
        Json::<Value>(json!({ "status": "NG", "reason": "not your submission" }))
      }),
    );
    let client = serve(router).await;

    let err = client.retract(Uuid::new_v4(), "notice".into()).await.unwrap_err();
    assert!(err.is_rejected());
    assert_eq!(err.to_string(), "directory rejected the request: not your submission");
  }
}
