use std::collections::HashMap;
use tracing::warn;

use crate::jira::client::EntityClient;

/// Epic key to display name, memoized for the lifetime of one aggregation
/// pass. Failed lookups are remembered as `None` and not retried until the
/// next pass builds a fresh resolver.
#[derive(Debug, Default)]
pub struct EpicNames {
  cache: HashMap<String, Option<String>>,
}

impl EpicNames {
  pub fn new() -> Self {
    Self::default()
  }

  pub async fn resolve(
    &mut self,
    client: &dyn EntityClient,
    epic_key: Option<&str>,
  ) -> Option<String> {
    let key = epic_key?;

    if let Some(cached) = self.cache.get(key) {
      return cached.clone();
    }

    let name = match client.get_issue(key).await {
      Ok(epic) => epic
        .summary
        .filter(|s| !s.is_empty())
        .or(epic.epic_name.filter(|s| !s.is_empty())),
      Err(e) => {
        warn!(epic = key, error = %e, "Could not fetch epic name");
        None
      }
    };

    self.cache.insert(key.to_string(), name.clone());
    name
  }

  /// Number of distinct epic keys looked up so far.
  pub fn len(&self) -> usize {
    self.cache.len()
  }
}
