//! In-memory `EntityClient` for tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use super::client::{EntityClient, RemoteError};
use super::types::{Board, IssuePage, RawIssue, Version};

/// Scripted tracker: each board has a list of pages, and failures can be
/// injected per board, per issue key, or for the versions listing.
#[derive(Default)]
pub struct FakeClient {
  pub boards: Vec<Board>,
  pub pages: HashMap<u64, Vec<IssuePage>>,
  pub versions: Vec<Version>,
  pub issues: HashMap<String, RawIssue>,
  pub failing_boards: Vec<u64>,
  pub failing_issues: Vec<String>,
  pub versions_fail: bool,
  pub boards_fail: bool,
  /// Delay applied to every issue page fetch
  pub latency: Duration,
  issue_calls: Mutex<Vec<(u64, u64, u64)>>,
  get_issue_calls: Mutex<Vec<String>>,
}

impl FakeClient {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_board(mut self, id: u64, name: &str, pages: Vec<IssuePage>) -> Self {
    self.boards.push(Board {
      id,
      name: name.to_string(),
    });
    self.pages.insert(id, pages);
    self
  }

  pub fn with_issue(mut self, issue: RawIssue) -> Self {
    self.issues.insert(issue.key.clone(), issue);
    self
  }

  /// Recorded `(board_id, start_at, max_results)` of every page request.
  pub fn issue_calls(&self) -> Vec<(u64, u64, u64)> {
    self.issue_calls.lock().unwrap().clone()
  }

  /// Recorded keys of every single-issue request.
  pub fn get_issue_calls(&self) -> Vec<String> {
    self.get_issue_calls.lock().unwrap().clone()
  }
}

pub fn issue(key: &str) -> RawIssue {
  RawIssue {
    key: key.to_string(),
    ..RawIssue::default()
  }
}

pub fn page(issues: Vec<RawIssue>, total: u64) -> IssuePage {
  IssuePage { issues, total }
}

fn unavailable() -> RemoteError {
  RemoteError::Status {
    status: 503,
    message: "service unavailable".to_string(),
  }
}

#[async_trait]
impl EntityClient for FakeClient {
  async fn list_boards(&self, _project_key: &str) -> Result<Vec<Board>, RemoteError> {
    if self.boards_fail {
      return Err(RemoteError::Transport("connection refused".to_string()));
    }
    Ok(self.boards.clone())
  }

  async fn list_issues(
    &self,
    board_id: u64,
    start_at: u64,
    max_results: u64,
  ) -> Result<IssuePage, RemoteError> {
    self
      .issue_calls
      .lock()
      .unwrap()
      .push((board_id, start_at, max_results));
    if !self.latency.is_zero() {
      tokio::time::sleep(self.latency).await;
    }
    if self.failing_boards.contains(&board_id) {
      return Err(unavailable());
    }

    let pages = self.pages.get(&board_id).cloned().unwrap_or_default();
    let index = (start_at / max_results.max(1)) as usize;
    Ok(pages.get(index).cloned().unwrap_or_default())
  }

  async fn list_versions(&self, _project_key: &str) -> Result<Vec<Version>, RemoteError> {
    if self.versions_fail {
      return Err(unavailable());
    }
    Ok(self.versions.clone())
  }

  async fn get_issue(&self, issue_key: &str) -> Result<RawIssue, RemoteError> {
    self
      .get_issue_calls
      .lock()
      .unwrap()
      .push(issue_key.to_string());
    if self.failing_issues.iter().any(|k| k == issue_key) {
      return Err(unavailable());
    }
    self
      .issues
      .get(issue_key)
      .cloned()
      .ok_or_else(|| RemoteError::Status {
        status: 404,
        message: format!("issue {} does not exist", issue_key),
      })
  }
}
