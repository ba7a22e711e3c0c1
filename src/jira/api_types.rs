//! Serde-deserializable types matching Jira API responses.
//!
//! These types are separate from domain types to allow clean deserialization
//! while keeping domain types focused on application needs.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use super::types::{Board, IssuePage, RawIssue, Version};
use crate::config::CustomFields;

// ============================================================================
// Common nested field types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiStatus {
  pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiIssueType {
  pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiUser {
  #[serde(rename = "displayName")]
  pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiPriority {
  pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiVersionRef {
  pub name: Option<String>,
}

// ============================================================================
// Issue fields - used by both board issues and single issue endpoints
// ============================================================================

#[derive(Debug, Deserialize, Default)]
pub struct ApiIssueFields {
  pub summary: Option<String>,
  pub status: Option<ApiStatus>,
  #[serde(rename = "issuetype")]
  pub issue_type: Option<ApiIssueType>,
  pub assignee: Option<ApiUser>,
  pub reporter: Option<ApiUser>,
  pub priority: Option<ApiPriority>,
  pub created: Option<String>,
  pub updated: Option<String>,
  #[serde(rename = "duedate")]
  pub due_date: Option<String>,
  #[serde(rename = "fixVersions", default, deserialize_with = "null_as_empty")]
  pub fix_versions: Vec<ApiVersionRef>,
  // Catch-all for custom fields
  #[serde(flatten)]
  pub extra: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct ApiIssue {
  pub key: String,
  #[serde(default)]
  pub fields: ApiIssueFields,
}

// ============================================================================
// Paginated endpoint responses
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiBoardIssuesResponse {
  #[serde(default)]
  pub issues: Vec<ApiIssue>,
  #[serde(default)]
  pub total: u64,
}

#[derive(Debug, Deserialize)]
pub struct ApiBoard {
  pub id: u64,
  pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiBoardsResponse {
  #[serde(default)]
  pub values: Vec<ApiBoard>,
  #[serde(rename = "isLast", default = "default_true")]
  pub is_last: bool,
}

// ============================================================================
// Project versions endpoint response
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiVersion {
  pub name: Option<String>,
  #[serde(rename = "startDate")]
  pub start_date: Option<String>,
  #[serde(rename = "releaseDate")]
  pub release_date: Option<String>,
  #[serde(default)]
  pub released: bool,
  #[serde(default)]
  pub archived: bool,
}

// ============================================================================
// Conversions to domain types
// ============================================================================

impl ApiIssue {
  /// Convert into a domain issue, resolving the configured custom fields.
  pub fn into_raw(self, custom: &CustomFields) -> RawIssue {
    let mut f = self.fields;
    let story_points = f
      .extra
      .get(&custom.story_points)
      .and_then(extract_number);
    let epic_link = extract_epic_value(f.extra.get(&custom.epic_link));
    let epic_name = f
      .extra
      .get(&custom.epic_name)
      .and_then(|v| v.as_str())
      .map(String::from);
    let sprints = f.extra.remove(&custom.sprint).filter(|v| !v.is_null());

    RawIssue {
      key: self.key,
      summary: f.summary,
      status: f.status.and_then(|s| s.name),
      assignee: f.assignee.and_then(|u| u.display_name),
      reporter: f.reporter.and_then(|u| u.display_name),
      issue_type: f.issue_type.and_then(|t| t.name),
      priority: f.priority.and_then(|p| p.name),
      created: f.created,
      updated: f.updated,
      due_date: f.due_date,
      fix_versions: f.fix_versions.into_iter().filter_map(|v| v.name).collect(),
      story_points,
      epic_link,
      sprints,
      epic_name,
    }
  }
}

impl ApiBoardIssuesResponse {
  pub fn into_page(self, custom: &CustomFields) -> IssuePage {
    IssuePage {
      issues: self
        .issues
        .into_iter()
        .map(|issue| issue.into_raw(custom))
        .collect(),
      total: self.total,
    }
  }
}

impl From<ApiBoard> for Board {
  fn from(board: ApiBoard) -> Self {
    Board {
      id: board.id,
      name: board.name,
    }
  }
}

impl ApiVersion {
  /// A version without a name cannot be matched against fix versions.
  pub fn into_version(self) -> Option<Version> {
    Some(Version {
      name: self.name?,
      start_date: self.start_date,
      release_date: self.release_date,
      released: self.released,
      archived: self.archived,
    })
  }
}

// ============================================================================
// Helpers
// ============================================================================

fn default_true() -> bool {
  true
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
  D: serde::Deserializer<'de>,
  T: Deserialize<'de>,
{
  Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Story points arrive as a number, occasionally as a numeric string.
fn extract_number(value: &Value) -> Option<f64> {
  value
    .as_f64()
    .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}

/// Extract epic value from a custom field
/// Epic fields can be:
/// - A string (epic key like "PROJ-123")
/// - An object with "key" or "name" field
/// - null
fn extract_epic_value(value: Option<&Value>) -> Option<String> {
  let value = value?;

  if let Some(s) = value.as_str() {
    return Some(s.to_string());
  }

  if let Some(obj) = value.as_object() {
    // Try "key" first (standard epic link format)
    if let Some(key) = obj.get("key").and_then(|v| v.as_str()) {
      return Some(key.to_string());
    }
    if let Some(name) = obj.get("name").and_then(|v| v.as_str()) {
      return Some(name.to_string());
    }
  }

  None
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn custom() -> CustomFields {
    CustomFields {
      story_points: "customfield_sp".to_string(),
      epic_link: "customfield_epic".to_string(),
      sprint: "customfield_sprint".to_string(),
      epic_name: "customfield_epic_name".to_string(),
    }
  }

  #[test]
  fn test_issue_resolves_custom_fields() {
    let issue: ApiIssue = serde_json::from_value(json!({
      "key": "AL-1",
      "fields": {
        "summary": "Do the thing",
        "status": {"name": "In Progress"},
        "assignee": {"displayName": "Ada"},
        "reporter": null,
        "fixVersions": [{"name": "1.0"}, {"name": "1.1"}],
        "duedate": "2024-03-01",
        "customfield_sp": 5.0,
        "customfield_epic": "AL-100",
        "customfield_sprint": [{"state": "active", "name": "Sprint 7"}]
      }
    }))
    .unwrap();

    let raw = issue.into_raw(&custom());
    assert_eq!(raw.key, "AL-1");
    assert_eq!(raw.status.as_deref(), Some("In Progress"));
    assert_eq!(raw.assignee.as_deref(), Some("Ada"));
    assert_eq!(raw.reporter, None);
    assert_eq!(raw.fix_versions, vec!["1.0", "1.1"]);
    assert_eq!(raw.due_date.as_deref(), Some("2024-03-01"));
    assert_eq!(raw.story_points, Some(5.0));
    assert_eq!(raw.epic_link.as_deref(), Some("AL-100"));
    assert!(raw.sprints.unwrap().is_array());
  }

  #[test]
  fn test_issue_with_missing_fields() {
    let issue: ApiIssue = serde_json::from_value(json!({
      "key": "AL-2",
      "fields": {"fixVersions": null, "customfield_sprint": null, "customfield_sp": null}
    }))
    .unwrap();

    let raw = issue.into_raw(&custom());
    assert!(raw.fix_versions.is_empty());
    assert!(raw.sprints.is_none());
    assert!(raw.story_points.is_none());
    assert!(raw.status.is_none());
  }

  #[test]
  fn test_nested_object_without_name_degrades() {
    let page: ApiBoardIssuesResponse = serde_json::from_value(json!({
      "total": 2,
      "issues": [
        {"key": "AL-1", "fields": {"priority": {"name": "High"}}},
        {"key": "AL-2", "fields": {"priority": {"id": "3"}, "status": {}, "issuetype": {"id": "1"}}}
      ]
    }))
    .unwrap();

    let page = page.into_page(&custom());
    assert_eq!(page.issues.len(), 2);
    assert_eq!(page.issues[0].priority.as_deref(), Some("High"));
    assert_eq!(page.issues[1].key, "AL-2");
    assert_eq!(page.issues[1].priority, None);
    assert_eq!(page.issues[1].status, None);
    assert_eq!(page.issues[1].issue_type, None);
  }

  #[test]
  fn test_nameless_version_is_dropped() {
    let versions: Vec<ApiVersion> = serde_json::from_value(json!([
      {"id": "10", "releaseDate": "2024-01-01"},
      {"name": "1.0", "released": true}
    ]))
    .unwrap();

    let versions: Vec<Version> = versions
      .into_iter()
      .filter_map(ApiVersion::into_version)
      .collect();
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].name, "1.0");
    assert!(versions[0].released);
  }

  #[test]
  fn test_epic_value_object_form() {
    let value = json!({"key": "AL-9", "name": "Ignored"});
    assert_eq!(extract_epic_value(Some(&value)).as_deref(), Some("AL-9"));
    assert_eq!(extract_epic_value(Some(&json!(42))), None);
    assert_eq!(extract_epic_value(None), None);
  }

  #[test]
  fn test_story_points_numeric_string() {
    assert_eq!(extract_number(&json!("3")), Some(3.0));
    assert_eq!(extract_number(&json!("n/a")), None);
  }

  #[test]
  fn test_boards_page_defaults_to_last() {
    let page: ApiBoardsResponse =
      serde_json::from_value(json!({"values": [{"id": 1, "name": "Alpha"}]})).unwrap();
    assert!(page.is_last);
    assert_eq!(Board::from(page.values.into_iter().next().unwrap()).name, "Alpha");
  }
}
