//! In-memory store holding the latest aggregation result.

use chrono::{DateTime, TimeDelta, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::aggregate::AggregationResult;

/// Ticket taken when a refresh starts. A result may only replace one that
/// was produced by a refresh started no later than its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Generation(u64);

#[derive(Default)]
struct State {
  result: Option<Arc<AggregationResult>>,
  updated_at: Option<DateTime<Utc>>,
  generation: u64,
}

/// Latest aggregation result and the time it was stored.
///
/// Both fields change together under one lock, so readers see either the
/// previous complete result or the new one. The store never fetches and
/// applies no staleness policy of its own.
#[derive(Default)]
pub struct CacheStore {
  state: Mutex<State>,
  generations: AtomicU64,
}

impl CacheStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn next_generation(&self) -> Generation {
    Generation(self.generations.fetch_add(1, Ordering::SeqCst) + 1)
  }

  /// The stored result and when it was stored; both `None` before the first
  /// successful refresh.
  pub fn get(&self) -> (Option<Arc<AggregationResult>>, Option<DateTime<Utc>>) {
    let state = self.lock();
    (state.result.clone(), state.updated_at)
  }

  /// Replace the stored result. Returns `false` and keeps the current
  /// contents when a refresh started later has already stored its result.
  pub fn set(&self, generation: Generation, result: AggregationResult) -> bool {
    let mut state = self.lock();
    if generation.0 < state.generation {
      return false;
    }
    state.result = Some(Arc::new(result));
    state.updated_at = Some(Utc::now());
    state.generation = generation.0;
    true
  }

  /// Whether the stored result is younger than `ttl`.
  pub fn is_fresh(&self, ttl: Duration) -> bool {
    let updated_at = match self.lock().updated_at {
      Some(at) => at,
      None => return false,
    };
    match TimeDelta::from_std(ttl) {
      Ok(ttl) => Utc::now() - updated_at < ttl,
      Err(_) => true,
    }
  }

  // Writers only ever swap in complete values, so a poisoned lock still
  // guards consistent state.
  fn lock(&self) -> MutexGuard<'_, State> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }
}
