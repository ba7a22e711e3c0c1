use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::config::{Config, CustomFields};
use crate::jira::api_types::{
  ApiBoardIssuesResponse, ApiBoardsResponse, ApiIssue, ApiVersion,
};
use crate::jira::types::{Board, IssuePage, RawIssue, Version};

/// Page size used when walking the paginated boards listing.
const BOARDS_PAGE_SIZE: u64 = 50;

/// Failure of a single remote call.
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
  /// The tracker answered with a non-success status
  #[error("HTTP {status}: {message}")]
  Status { status: u16, message: String },
  /// The request never produced a response
  #[error("transport error: {0}")]
  Transport(String),
  /// The response body did not have the expected shape
  #[error("unexpected response: {0}")]
  Decode(String),
}

impl From<gouqi::Error> for RemoteError {
  fn from(e: gouqi::Error) -> Self {
    match e {
      gouqi::Error::Fault { code, .. } => RemoteError::Status {
        status: code.as_u16(),
        message: code.canonical_reason().unwrap_or("request failed").to_string(),
      },
      gouqi::Error::Unauthorized => RemoteError::Status {
        status: 401,
        message: "unauthorized".to_string(),
      },
      gouqi::Error::NotFound => RemoteError::Status {
        status: 404,
        message: "not found".to_string(),
      },
      gouqi::Error::Serde(err) => RemoteError::Decode(err.to_string()),
      other => RemoteError::Transport(other.to_string()),
    }
  }
}

/// Read-only operations the aggregation needs from the tracker.
///
/// Every call is idempotent. Implementations must not retry; callers decide
/// how a failure is recovered.
#[async_trait]
pub trait EntityClient: Send + Sync {
  async fn list_boards(&self, project_key: &str) -> Result<Vec<Board>, RemoteError>;

  async fn list_issues(
    &self,
    board_id: u64,
    start_at: u64,
    max_results: u64,
  ) -> Result<IssuePage, RemoteError>;

  async fn list_versions(&self, project_key: &str) -> Result<Vec<Version>, RemoteError>;

  async fn get_issue(&self, issue_key: &str) -> Result<RawIssue, RemoteError>;
}

/// Jira API client wrapper
#[derive(Clone)]
pub struct JiraClient {
  client: gouqi::r#async::Jira,
  fields: CustomFields,
}

impl JiraClient {
  pub fn new(config: &Config) -> Result<Self> {
    let token = Config::get_api_token()?;
    let base_url = config.jira.base_url()?;

    let credentials = gouqi::Credentials::Basic(config.jira.email.clone(), token);

    let host = base_url.as_str().trim_end_matches('/');
    let client = gouqi::r#async::Jira::new(host, credentials)
      .map_err(|e| eyre!("Failed to create Jira client: {}", e))?;

    Ok(Self {
      client,
      fields: config.fields.clone(),
    })
  }

  async fn get<D>(&self, api: &str, endpoint: &str) -> Result<D, RemoteError>
  where
    D: DeserializeOwned + Send,
  {
    debug!(api, endpoint, "GET");
    Ok(self.client.get(api, endpoint).await?)
  }
}

#[async_trait]
impl EntityClient for JiraClient {
  async fn list_boards(&self, project_key: &str) -> Result<Vec<Board>, RemoteError> {
    let mut all_boards = Vec::new();
    let mut start_at = 0u64;

    loop {
      let endpoint = format!(
        "/board?projectKeyOrId={}&startAt={}&maxResults={}",
        project_key, start_at, BOARDS_PAGE_SIZE
      );

      let response: ApiBoardsResponse = self.get("agile", &endpoint).await?;

      let is_last = response.is_last || response.values.is_empty();
      all_boards.extend(response.values.into_iter().map(Board::from));

      if is_last {
        break;
      }
      start_at += BOARDS_PAGE_SIZE;
    }

    Ok(all_boards)
  }

  async fn list_issues(
    &self,
    board_id: u64,
    start_at: u64,
    max_results: u64,
  ) -> Result<IssuePage, RemoteError> {
    let endpoint = format!(
      "/board/{}/issue?startAt={}&maxResults={}",
      board_id, start_at, max_results
    );

    let response: ApiBoardIssuesResponse = self.get("agile", &endpoint).await?;
    Ok(response.into_page(&self.fields))
  }

  async fn list_versions(&self, project_key: &str) -> Result<Vec<Version>, RemoteError> {
    let endpoint = format!("/project/{}/versions", project_key);

    let response: Vec<ApiVersion> = self.get("api", &endpoint).await?;
    Ok(
      response
        .into_iter()
        .filter_map(ApiVersion::into_version)
        .collect(),
    )
  }

  async fn get_issue(&self, issue_key: &str) -> Result<RawIssue, RemoteError> {
    let endpoint = format!("/issue/{}", issue_key);

    let response: ApiIssue = self.get("api", &endpoint).await?;
    Ok(response.into_raw(&self.fields))
  }
}
