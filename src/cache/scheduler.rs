use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::store::CacheStore;
use crate::aggregate::{Pipeline, PipelineError};

/// How an on-demand refresh treats a result that is still within the TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPolicy {
  /// Always run a new pass
  Always,
  /// Skip the pass while the stored result is younger than the TTL
  IfStale,
}

/// Runs the aggregation pipeline and swaps its result into the store.
#[derive(Clone)]
pub struct RefreshScheduler {
  pipeline: Pipeline,
  store: Arc<CacheStore>,
  interval: Duration,
}

impl RefreshScheduler {
  pub fn new(pipeline: Pipeline, store: Arc<CacheStore>, interval: Duration) -> Self {
    Self {
      pipeline,
      store,
      interval,
    }
  }

  /// Run one pass and store its result. Returns whether the result was kept;
  /// it is dropped when a refresh started later stored first.
  pub async fn refresh(&self) -> Result<bool, PipelineError> {
    let generation = self.store.next_generation();
    info!("Refreshing Jira data");

    let result = self.pipeline.run().await?;
    let rows = result.rows.len();
    let boards = result.board_count();

    let applied = self.store.set(generation, result);
    if applied {
      info!(rows, boards, "Cache updated");
    } else {
      info!(rows, "Discarding result superseded by a newer refresh");
    }
    Ok(applied)
  }

  /// Spawn the periodic refresh loop. Each refresh waits the full interval
  /// after the previous one completed; failures keep the previous result.
  pub fn spawn_periodic(&self) -> JoinHandle<()> {
    let this = self.clone();
    tokio::spawn(async move {
      loop {
        tokio::time::sleep(this.interval).await;
        info!("Auto-refreshing Jira cache");
        if let Err(e) = this.refresh().await {
          error!(error = %e, "Periodic refresh failed, keeping previous result");
        }
      }
    })
  }

  /// Spawn a single refresh in the background and return immediately.
  pub fn spawn_on_demand(&self, policy: RefreshPolicy) -> JoinHandle<()> {
    let this = self.clone();
    tokio::spawn(async move {
      if policy == RefreshPolicy::IfStale && this.store.is_fresh(this.interval) {
        debug!("Cached result is still fresh, skipping refresh");
        return;
      }
      if let Err(e) = this.refresh().await {
        error!(error = %e, "On-demand refresh failed, keeping previous result");
      }
    })
  }
}
