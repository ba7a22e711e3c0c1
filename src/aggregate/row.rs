use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;

use super::sprint::parse_sprints;
use super::versions::VersionIndex;
use crate::jira::types::RawIssue;

/// Assignee shown for issues nobody is assigned to
pub const UNASSIGNED: &str = "Unassigned";

/// Status shown for issues without one
pub const UNKNOWN_STATUS: &str = "Unknown";

const COMPLETED_STATUSES: &[&str] = &["done", "closed", "completed"];

/// Whether a status counts as finished work (case-insensitive).
pub fn is_completed_status(status: &str) -> bool {
  let status = status.to_lowercase();
  COMPLETED_STATUSES.contains(&status.as_str())
}

/// One enriched issue of one board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedRow {
  pub board_name: String,
  pub issue_key: String,
  pub summary: Option<String>,
  pub status: String,
  pub is_completed: bool,
  pub assignee: String,
  pub reporter: Option<String>,
  pub issue_type: Option<String>,
  pub priority: Option<String>,
  pub created: Option<String>,
  pub updated: Option<String>,
  pub due_date: Option<String>,
  pub story_points: f64,
  pub fix_versions: String,
  pub version_start_date: Option<String>,
  pub version_release_date: Option<String>,
  pub version_released: Option<bool>,
  pub epic_link: Option<String>,
  pub epic_name: Option<String>,
  pub current_sprint: Option<String>,
  pub sprint_spillover: Option<String>,
  pub is_spillover: u8,
}

impl EnrichedRow {
  /// Build the row for `issue`. The epic name is resolved by the caller,
  /// everything else is derived here without I/O.
  pub fn build(
    board_name: &str,
    issue: RawIssue,
    versions: &VersionIndex,
    epic_name: Option<String>,
  ) -> Self {
    let status = issue
      .status
      .unwrap_or_else(|| UNKNOWN_STATUS.to_string());
    let sprints = parse_sprints(issue.sprints.as_ref());
    let version = issue
      .fix_versions
      .first()
      .and_then(|name| versions.get(name));

    EnrichedRow {
      board_name: board_name.to_string(),
      issue_key: issue.key,
      summary: issue.summary,
      is_completed: is_completed_status(&status),
      status,
      assignee: issue.assignee.unwrap_or_else(|| UNASSIGNED.to_string()),
      reporter: issue.reporter,
      issue_type: issue.issue_type,
      priority: issue.priority,
      created: issue.created,
      updated: issue.updated,
      due_date: issue.due_date,
      story_points: issue.story_points.unwrap_or(0.0),
      fix_versions: issue.fix_versions.join(", "),
      version_start_date: version.and_then(|v| v.start_date.clone()),
      version_release_date: version.and_then(|v| v.release_date.clone()),
      version_released: version.map(|v| v.released),
      epic_link: issue.epic_link,
      epic_name,
      is_spillover: u8::from(sprints.is_spillover()),
      current_sprint: sprints.current,
      sprint_spillover: sprints.spillover,
    }
  }
}

/// Output of one complete aggregation pass.
#[derive(Debug, Clone, Serialize)]
pub struct AggregationResult {
  pub rows: Vec<EnrichedRow>,
  pub fetched_at: DateTime<Utc>,
}

impl AggregationResult {
  /// Number of distinct boards that contributed rows.
  pub fn board_count(&self) -> usize {
    self
      .rows
      .iter()
      .map(|r| r.board_name.as_str())
      .collect::<BTreeSet<_>>()
      .len()
  }
}
