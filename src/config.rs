use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub jira: JiraConfig,
  #[serde(default = "default_project_key")]
  pub project_key: String,
  /// Board names to leave out of the aggregation (exact match)
  #[serde(default, deserialize_with = "deserialize_board_list")]
  pub excluded_boards: BTreeSet<String>,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub fields: CustomFields,
  #[serde(default)]
  pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JiraConfig {
  /// Tracker host, e.g. "example.atlassian.net"; a full URL is accepted too
  #[serde(default)]
  pub domain: String,
  #[serde(default)]
  pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// Interval between periodic refreshes, and the freshness window for
  /// refresh-if-stale requests
  #[serde(default = "default_ttl", with = "humantime_duration")]
  pub ttl: Duration,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self { ttl: default_ttl() }
  }
}

/// Identifiers of the custom fields read from every issue.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CustomFields {
  #[serde(default = "default_story_points_field")]
  pub story_points: String,
  #[serde(default = "default_epic_link_field")]
  pub epic_link: String,
  #[serde(default = "default_sprint_field")]
  pub sprint: String,
  /// Legacy epic title field, consulted when an epic has no summary
  #[serde(default = "default_epic_name_field")]
  pub epic_name: String,
}

impl Default for CustomFields {
  fn default() -> Self {
    Self {
      story_points: default_story_points_field(),
      epic_link: default_epic_link_field(),
      sprint: default_sprint_field(),
      epic_name: default_epic_name_field(),
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
  /// Directory for daily rotated log files; stderr only when unset
  pub dir: Option<PathBuf>,
}

fn default_project_key() -> String {
  "FEP".to_string()
}

fn default_ttl() -> Duration {
  Duration::from_secs(12 * 60 * 60)
}

fn default_story_points_field() -> String {
  "customfield_10024".to_string()
}

fn default_epic_link_field() -> String {
  "customfield_10014".to_string()
}

fn default_sprint_field() -> String {
  "customfield_10020".to_string()
}

fn default_epic_name_field() -> String {
  "customfield_10011".to_string()
}

/// Split a newline- or comma-delimited list of board names.
pub fn parse_board_list(raw: &str) -> BTreeSet<String> {
  raw
    .split(|c| c == ',' || c == '\n')
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(String::from)
    .collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BoardList {
  List(Vec<String>),
  Delimited(String),
}

fn deserialize_board_list<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(match BoardList::deserialize(deserializer)? {
    BoardList::List(names) => names
      .iter()
      .map(|s| s.trim())
      .filter(|s| !s.is_empty())
      .map(String::from)
      .collect(),
    BoardList::Delimited(raw) => parse_board_list(&raw),
  })
}

mod humantime_duration {
  use serde::{Deserialize, Deserializer};
  use std::time::Duration;

  pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
  where
    D: Deserializer<'de>,
  {
    let raw = String::deserialize(deserializer)?;
    humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
  }
}

impl JiraConfig {
  /// Base URL of the tracker. A bare domain is served over https.
  pub fn base_url(&self) -> Result<Url> {
    let domain = self.domain.trim().trim_end_matches('/');
    if domain.is_empty() {
      return Err(eyre!("Jira domain is not configured. Set jira.domain or JIRA_DOMAIN."));
    }

    let raw = if domain.contains("://") {
      domain.to_string()
    } else {
      format!("https://{}", domain)
    };

    Url::parse(&raw).map_err(|e| eyre!("Invalid Jira domain {}: {}", domain, e))
  }
}

impl Config {
  /// Load configuration from file, then apply environment overrides.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./jira-aggregator.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/jira-aggregator/config.yaml
  ///
  /// Without a file the defaults are used and the environment has to supply
  /// the tracker domain and email.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Self::from_yaml("{}")?,
    };

    config.apply_env(|name| std::env::var(name).ok())?;
    config.validate()?;
    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("jira-aggregator.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("jira-aggregator").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::from_yaml(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  pub fn from_yaml(contents: &str) -> Result<Self> {
    serde_yaml::from_str(contents).map_err(|e| eyre!("{}", e))
  }

  /// Apply environment overrides. `lookup` returns the value of a variable.
  pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
  where
    F: Fn(&str) -> Option<String>,
  {
    if let Some(domain) = lookup("JIRA_DOMAIN") {
      self.jira.domain = domain;
    }
    if let Some(email) = lookup("JIRA_EMAIL") {
      self.jira.email = email;
    }
    if let Some(project) = lookup("PROJECT_KEY") {
      self.project_key = project;
    }
    if let Some(boards) = lookup("EXCLUDED_BOARDS") {
      self.excluded_boards = parse_board_list(&boards);
    }
    if let Some(hours) = lookup("CACHE_EXPIRY_HOURS") {
      let hours: u64 = hours
        .trim()
        .parse()
        .map_err(|e| eyre!("Invalid CACHE_EXPIRY_HOURS {:?}: {}", hours, e))?;
      let secs = hours
        .checked_mul(60 * 60)
        .ok_or_else(|| eyre!("CACHE_EXPIRY_HOURS {} is too large", hours))?;
      self.cache.ttl = Duration::from_secs(secs);
    }
    Ok(())
  }

  fn validate(&self) -> Result<()> {
    self.jira.base_url()?;
    if self.jira.email.trim().is_empty() {
      return Err(eyre!("Jira email is not configured. Set jira.email or JIRA_EMAIL."));
    }
    if self.project_key.trim().is_empty() {
      return Err(eyre!("Project key must not be empty"));
    }
    if self.cache.ttl.is_zero() {
      return Err(eyre!("Cache TTL must be greater than zero"));
    }
    Ok(())
  }

  /// Get the Jira API token from environment variables.
  ///
  /// Checks JAGG_JIRA_TOKEN first, then JIRA_API_TOKEN as fallback.
  pub fn get_api_token() -> Result<String> {
    std::env::var("JAGG_JIRA_TOKEN")
      .or_else(|_| std::env::var("JIRA_API_TOKEN"))
      .map_err(|_| {
        eyre!(
          "Jira API token not found. Set JAGG_JIRA_TOKEN or JIRA_API_TOKEN environment variable."
        )
      })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  #[test]
  fn test_defaults_from_empty_document() {
    let config = Config::from_yaml("{}").unwrap();
    assert_eq!(config.project_key, "FEP");
    assert_eq!(config.cache.ttl, Duration::from_secs(43_200));
    assert_eq!(config.fields, CustomFields::default());
    assert!(config.excluded_boards.is_empty());
  }

  #[test]
  fn test_full_document() {
    let config = Config::from_yaml(
      r#"
jira:
  domain: example.atlassian.net
  email: me@example.com
project_key: AL
excluded_boards: "Archive, Sandbox\nOld Board"
cache:
  ttl: 30m
fields:
  sprint: customfield_20000
"#,
    )
    .unwrap();

    assert_eq!(config.project_key, "AL");
    assert_eq!(config.cache.ttl, Duration::from_secs(1800));
    assert_eq!(config.fields.sprint, "customfield_20000");
    assert_eq!(config.fields.story_points, "customfield_10024");
    let excluded: Vec<_> = config.excluded_boards.iter().cloned().collect();
    assert_eq!(excluded, vec!["Archive", "Old Board", "Sandbox"]);
    assert!(config.validate().is_ok());
  }

  #[test]
  fn test_example_config_parses() {
    let config = Config::from_yaml(include_str!("../config.example.yaml")).unwrap();
    assert_eq!(config.excluded_boards.len(), 2);
    assert!(config.validate().is_ok());
  }

  #[test]
  fn test_excluded_boards_as_sequence() {
    let config = Config::from_yaml("excluded_boards: [\"Archive\", \" \"]").unwrap();
    assert_eq!(config.excluded_boards.len(), 1);
    assert!(config.excluded_boards.contains("Archive"));
  }

  #[test]
  fn test_env_overrides() {
    let env: HashMap<&str, &str> = [
      ("JIRA_DOMAIN", "https://jira.internal"),
      ("JIRA_EMAIL", "bot@example.com"),
      ("EXCLUDED_BOARDS", "A,B"),
      ("CACHE_EXPIRY_HOURS", "2"),
    ]
    .into_iter()
    .collect();

    let mut config = Config::from_yaml("{}").unwrap();
    config
      .apply_env(|name| env.get(name).map(|v| v.to_string()))
      .unwrap();

    assert_eq!(config.cache.ttl, Duration::from_secs(7200));
    assert_eq!(config.excluded_boards.len(), 2);
    assert_eq!(
      config.jira.base_url().unwrap().as_str(),
      "https://jira.internal/"
    );
    assert!(config.validate().is_ok());
  }

  #[test]
  fn test_invalid_expiry_hours() {
    let mut config = Config::from_yaml("{}").unwrap();
    let result =
      config.apply_env(|name| (name == "CACHE_EXPIRY_HOURS").then(|| "soon".to_string()));
    assert!(result.is_err());
  }

  #[test]
  fn test_huge_expiry_hours_is_an_error() {
    let mut config = Config::from_yaml("{}").unwrap();
    let result = config.apply_env(|name| {
      (name == "CACHE_EXPIRY_HOURS").then(|| u64::MAX.to_string())
    });
    assert!(result.is_err());
    assert_eq!(config.cache.ttl, Duration::from_secs(43_200));
  }

  #[test]
  fn test_missing_domain_fails_validation() {
    let config = Config::from_yaml("jira:\n  email: me@example.com").unwrap();
    assert!(config.validate().is_err());
  }

  #[test]
  fn test_bare_domain_gets_https() {
    let jira = JiraConfig {
      domain: "example.atlassian.net/".to_string(),
      email: String::new(),
    };
    assert_eq!(
      jira.base_url().unwrap().as_str(),
      "https://example.atlassian.net/"
    );
  }
}
