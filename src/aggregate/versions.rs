use std::collections::HashMap;
use tracing::{info, warn};

use crate::jira::client::EntityClient;
use crate::jira::types::Version;

/// Project release versions keyed by name.
#[derive(Debug, Clone, Default)]
pub struct VersionIndex {
  by_name: HashMap<String, Version>,
}

impl VersionIndex {
  /// Fetch the project's versions. A failed fetch yields an empty index so
  /// the pass continues without version data.
  pub async fn fetch(client: &dyn EntityClient, project_key: &str) -> Self {
    match client.list_versions(project_key).await {
      Ok(versions) => {
        let archived = versions.iter().filter(|v| v.archived).count();
        let index = Self::from_versions(versions);
        info!(
          project = project_key,
          versions = index.len(),
          archived,
          "Loaded project versions"
        );
        index
      }
      Err(e) => {
        warn!(
          project = project_key,
          error = %e,
          "Could not fetch versions, continuing without them"
        );
        Self::default()
      }
    }
  }

  /// Later entries replace earlier ones with the same name.
  pub fn from_versions(versions: impl IntoIterator<Item = Version>) -> Self {
    let by_name = versions
      .into_iter()
      .map(|v| (v.name.clone(), v))
      .collect();
    Self { by_name }
  }

  pub fn get(&self, name: &str) -> Option<&Version> {
    self.by_name.get(name)
  }

  pub fn len(&self) -> usize {
    self.by_name.len()
  }
}
