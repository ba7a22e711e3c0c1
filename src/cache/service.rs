use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

use super::scheduler::{RefreshPolicy, RefreshScheduler};
use super::store::CacheStore;
use crate::aggregate::{AggregationResult, EnrichedRow, Pipeline, PipelineError};

/// What a reader gets from the cache. Before the first refresh this is the
/// "no data yet" shape: no rows and no timestamp.
#[derive(Debug, Clone)]
pub struct Snapshot {
  result: Option<Arc<AggregationResult>>,
  pub last_updated: Option<DateTime<Utc>>,
}

impl Snapshot {
  pub fn rows(&self) -> &[EnrichedRow] {
    self
      .result
      .as_ref()
      .map(|r| r.rows.as_slice())
      .unwrap_or_default()
  }

  pub fn board_count(&self) -> usize {
    self.result.as_ref().map_or(0, |r| r.board_count())
  }
}

#[derive(Serialize)]
struct SnapshotBody<'a> {
  rows: &'a [EnrichedRow],
  last_updated: Option<DateTime<Utc>>,
}

impl Serialize for Snapshot {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    SnapshotBody {
      rows: self.rows(),
      last_updated: self.last_updated,
    }
    .serialize(serializer)
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct Health {
  pub message: &'static str,
  pub last_updated: Option<DateTime<Utc>>,
  pub now: DateTime<Utc>,
  pub rows: usize,
  pub boards: usize,
}

/// Read and refresh operations offered to whatever serves the data.
pub struct CacheService {
  store: Arc<CacheStore>,
  scheduler: RefreshScheduler,
  periodic: JoinHandle<()>,
}

impl CacheService {
  /// Run the startup refresh, then start the periodic loop. An error here
  /// means the cache could not be filled and the service must not start.
  pub async fn start(pipeline: Pipeline, ttl: Duration) -> Result<Self, PipelineError> {
    let store = Arc::new(CacheStore::new());
    let scheduler = RefreshScheduler::new(pipeline, store.clone(), ttl);

    info!("Starting up, fetching initial cache");
    scheduler.refresh().await?;
    let periodic = scheduler.spawn_periodic();

    Ok(Self {
      store,
      scheduler,
      periodic,
    })
  }

  /// Current contents of the cache. Never fetches.
  pub fn snapshot(&self) -> Snapshot {
    let (result, last_updated) = self.store.get();
    Snapshot {
      result,
      last_updated,
    }
  }

  /// Start a refresh in the background. The outcome shows up in the next
  /// snapshot; the handle is only needed to wait for it.
  pub fn request_refresh(&self, policy: RefreshPolicy) -> JoinHandle<()> {
    info!(?policy, "Manual cache refresh requested");
    self.scheduler.spawn_on_demand(policy)
  }

  pub fn health(&self) -> Health {
    let snapshot = self.snapshot();
    Health {
      message: "Jira aggregation running",
      last_updated: snapshot.last_updated,
      now: Utc::now(),
      rows: snapshot.rows().len(),
      boards: snapshot.board_count(),
    }
  }

  /// Stop the periodic loop. In-flight on-demand refreshes run to completion.
  pub fn shutdown(self) {
    self.periodic.abort();
    info!("Jira aggregation shutting down");
  }
}
