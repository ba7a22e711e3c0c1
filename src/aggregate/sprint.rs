//! Decoding of the sprint membership custom field.
//!
//! Jira returns the field either as a list of sprint objects, or (on older
//! instances) as a list of strings such as
//! `com.atlassian.greenhopper.service.sprint.Sprint@1f2[id=3,state=CLOSED,name=Sprint 2]`
//! or plain `state=closed,name=Sprint 2`.

use serde_json::Value;

/// Sprint membership of one issue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SprintMembership {
  /// Name of the active sprint (the last one listed, if several are active)
  pub current: Option<String>,
  /// Closed sprints joined with "; ", absent when there are none
  pub spillover: Option<String>,
}

impl SprintMembership {
  pub fn is_spillover(&self) -> bool {
    self.spillover.is_some()
  }
}

#[derive(Debug, Default)]
struct SprintEntry {
  state: Option<String>,
  name: Option<String>,
}

impl SprintEntry {
  fn from_value(value: &Value) -> Self {
    match value {
      Value::Object(obj) => SprintEntry {
        state: obj.get("state").and_then(Value::as_str).map(String::from),
        name: obj.get("name").and_then(Value::as_str).map(String::from),
      },
      Value::String(s) => Self::from_encoded(s),
      _ => SprintEntry::default(),
    }
  }

  /// Decompose `key=value,key=value`, optionally wrapped in `Prefix[...]`.
  /// Brackets after the first `=` belong to a value, not to a wrapper.
  fn from_encoded(raw: &str) -> Self {
    let body = match (raw.find('['), raw.rfind(']')) {
      (Some(open), Some(close)) if open < close && !raw[..open].contains('=') => {
        &raw[open + 1..close]
      }
      _ => raw,
    };

    let mut entry = SprintEntry::default();
    for part in body.split(',') {
      if let Some((key, val)) = part.split_once('=') {
        match key.trim() {
          "state" => entry.state = Some(val.trim().to_string()),
          "name" => entry.name = Some(val.trim().to_string()),
          _ => {}
        }
      }
    }
    entry
  }
}

/// Parse the raw sprint field into current sprint and spillover sprints.
///
/// Anything that is not a list degrades to "no sprint".
pub fn parse_sprints(field: Option<&Value>) -> SprintMembership {
  let entries = match field.and_then(Value::as_array) {
    Some(entries) => entries,
    None => return SprintMembership::default(),
  };

  let mut current = None;
  let mut closed = Vec::new();

  for entry in entries.iter().map(SprintEntry::from_value) {
    match entry.state.as_deref().map(str::to_ascii_lowercase).as_deref() {
      Some("active") => current = entry.name,
      Some("closed") => {
        if let Some(name) = entry.name {
          closed.push(name);
        }
      }
      _ => {}
    }
  }

  SprintMembership {
    current,
    spillover: (!closed.is_empty()).then(|| closed.join("; ")),
  }
}
