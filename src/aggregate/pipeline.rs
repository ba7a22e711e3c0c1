use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::epic::EpicNames;
use super::row::{AggregationResult, EnrichedRow};
use super::versions::VersionIndex;
use crate::config::Config;
use crate::jira::client::{EntityClient, RemoteError};
use crate::jira::types::{Board, RawIssue};

/// Issues requested per page of a board
pub const PAGE_SIZE: u64 = 50;

#[derive(Debug, Error)]
pub enum PipelineError {
  #[error("failed to list boards for project {project}: {source}")]
  Boards {
    project: String,
    #[source]
    source: RemoteError,
  },
}

/// Which boards to aggregate and how to page through them.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
  pub project_key: String,
  pub excluded_boards: BTreeSet<String>,
  pub page_size: u64,
}

impl PipelineSettings {
  pub fn from_config(config: &Config) -> Self {
    Self {
      project_key: config.project_key.clone(),
      excluded_boards: config.excluded_boards.clone(),
      page_size: PAGE_SIZE,
    }
  }
}

/// Fetches every board of the project and flattens their issues into
/// enriched rows.
#[derive(Clone)]
pub struct Pipeline {
  client: Arc<dyn EntityClient>,
  settings: PipelineSettings,
}

impl Pipeline {
  pub fn new(client: Arc<dyn EntityClient>, settings: PipelineSettings) -> Self {
    Self { client, settings }
  }

  /// Run one full aggregation pass.
  ///
  /// Only a failure to list boards fails the pass. A board whose issues
  /// cannot be fetched is skipped, a failed versions fetch leaves version
  /// fields empty, and a failed epic lookup leaves the epic name empty.
  pub async fn run(&self) -> Result<AggregationResult, PipelineError> {
    let client = self.client.as_ref();
    let project = self.settings.project_key.as_str();

    let versions = VersionIndex::fetch(client, project).await;
    let boards = self.boards().await?;
    info!(project, boards = boards.len(), "Found boards");

    let mut epics = EpicNames::new();
    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for board in &boards {
      debug!(board = %board.name, id = board.id, "Fetching issues");

      let issues = match self.board_issues(board.id).await {
        Ok(issues) => issues,
        Err(RemoteError::Status { status, message }) => {
          warn!(
            board = %board.name,
            id = board.id,
            status,
            %message,
            "Tracker rejected issue fetch, skipping board"
          );
          skipped += 1;
          continue;
        }
        Err(e @ (RemoteError::Transport(_) | RemoteError::Decode(_))) => {
          warn!(
            board = %board.name,
            id = board.id,
            error = %e,
            "Error fetching issues, skipping board"
          );
          skipped += 1;
          continue;
        }
      };

      debug!(board = %board.name, issues = issues.len(), "Enriching issues");
      for issue in issues {
        let epic_name = epics.resolve(client, issue.epic_link.as_deref()).await;
        rows.push(EnrichedRow::build(&board.name, issue, &versions, epic_name));
      }
    }

    info!(
      rows = rows.len(),
      skipped_boards = skipped,
      epics = epics.len(),
      "Aggregation pass complete"
    );

    Ok(AggregationResult {
      rows,
      fetched_at: Utc::now(),
    })
  }

  async fn boards(&self) -> Result<Vec<Board>, PipelineError> {
    let project = &self.settings.project_key;
    let boards = self
      .client
      .list_boards(project)
      .await
      .map_err(|source| PipelineError::Boards {
        project: project.clone(),
        source,
      })?;

    Ok(
      boards
        .into_iter()
        .filter(|b| !self.settings.excluded_boards.contains(&b.name))
        .collect(),
    )
  }

  /// All issues of a board, page by page. Stops at the first empty page or
  /// once the offset reaches the reported total, whichever comes first.
  async fn board_issues(&self, board_id: u64) -> Result<Vec<RawIssue>, RemoteError> {
    let page_size = self.settings.page_size;
    let mut all_issues = Vec::new();
    let mut start_at = 0u64;

    loop {
      let page = self
        .client
        .list_issues(board_id, start_at, page_size)
        .await?;

      if page.issues.is_empty() {
        break;
      }
      all_issues.extend(page.issues);

      start_at += page_size;
      if start_at >= page.total {
        break;
      }
    }

    Ok(all_issues)
  }
}
