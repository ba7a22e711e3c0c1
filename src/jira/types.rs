use serde_json::Value;

/// Agile board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
  pub id: u64,
  pub name: String,
}

/// Release version of a project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
  pub name: String,
  pub start_date: Option<String>,
  pub release_date: Option<String>,
  pub released: bool,
  pub archived: bool,
}

/// Issue as returned by the tracker, with the configured custom fields pulled
/// out into named fields.
#[derive(Debug, Clone, Default)]
pub struct RawIssue {
  pub key: String,
  pub summary: Option<String>,
  pub status: Option<String>,
  pub assignee: Option<String>,
  pub reporter: Option<String>,
  pub issue_type: Option<String>,
  pub priority: Option<String>,
  pub created: Option<String>,
  pub updated: Option<String>,
  pub due_date: Option<String>,
  pub fix_versions: Vec<String>,
  pub story_points: Option<f64>,
  pub epic_link: Option<String>,
  /// Undecoded sprint membership field; see `aggregate::sprint`.
  pub sprints: Option<Value>,
  /// Legacy epic title field, used when `summary` is empty.
  pub epic_name: Option<String>,
}

/// One page of a board's issues
#[derive(Debug, Clone, Default)]
pub struct IssuePage {
  pub issues: Vec<RawIssue>,
  pub total: u64,
}
