//! [`AggregationEngine`] and the rebuild state machine.
//!
//! ```text
//! Idle ─▶ Resetting ─▶ Collecting ─▶ Finalizing ─▶ Idle
//!                          │              │
//!                          └──▶ Failed ◀──┘
//! ```
//!
//! `Resetting` empties the stored table. `Collecting` runs the local ledger
//! read and one fetcher per source into a single consumer. `Finalizing`
//! writes the finished totals in one transaction. A rebuild that fails, or
//! whose future is dropped before it finishes, leaves the table empty, never
//! partially filled, and the engine stays `Failed` until the next rebuild
//! starts.

use std::{collections::HashMap, sync::Arc, time::Duration};

use mprdb_core::{
  aggregate::{AggregateScore, ScoreQuery, ScoreTable},
  assertion::{Origin, WeightedAssertion},
  directory::Directory,
  store::{AggregateStore, LocalLedger, TrustRegistry},
};
use mprdb_sign::KeyStore;
use tokio::{
  sync::{Mutex, RwLock, mpsc, watch},
  task::JoinHandle,
};
use uuid::Uuid;

use crate::{
  Error, FetchError, Result,
  fetch::run_fetcher,
  report::{RebuildReport, SourceOutcome, SourceReport},
};

// ─── Config ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct EngineConfig {
  /// Upper bound on each source's directory read. A source that exceeds it
  /// is skipped for the cycle.
  pub fetch_timeout:    Duration,
  /// Capacity of the fan-in channel between producers and the consumer.
  pub channel_capacity: usize,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self { fetch_timeout: Duration::from_secs(30), channel_capacity: 2048 }
  }
}

// ─── State ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildState {
  Idle,
  Resetting,
  Collecting,
  Finalizing,
  Failed,
}

// ─── Engine ──────────────────────────────────────────────────────────────────

pub struct AggregationEngine<L, T, A, D, K> {
  ledger:     Arc<L>,
  registry:   Arc<T>,
  aggregate:  Arc<A>,
  directory:  Arc<D>,
  keys:       Arc<K>,
  config:     EngineConfig,
  /// Owned by the one running rebuild.
  rebuilding: Mutex<()>,
  /// Written for the whole of a rebuild; readers share it.
  table:      RwLock<()>,
  state:      watch::Sender<RebuildState>,
}

impl<L, T, A, D, K> AggregationEngine<L, T, A, D, K>
where
  L: LocalLedger,
  T: TrustRegistry,
  A: AggregateStore,
  D: Directory + 'static,
  K: KeyStore,
{
  pub fn new(
    ledger: Arc<L>,
    registry: Arc<T>,
    aggregate: Arc<A>,
    directory: Arc<D>,
    keys: Arc<K>,
    config: EngineConfig,
  ) -> Self {
    let (state, _) = watch::channel(RebuildState::Idle);
    Self {
      ledger,
      registry,
      aggregate,
      directory,
      keys,
      config,
      rebuilding: Mutex::new(()),
      table: RwLock::new(()),
      state,
    }
  }

  pub fn state(&self) -> RebuildState { *self.state.borrow() }

  /// Observe state transitions as they happen.
  pub fn subscribe(&self) -> watch::Receiver<RebuildState> { self.state.subscribe() }

  /// Read the aggregate table, waiting for any in-flight rebuild to finish
  /// first.
  pub async fn read_scores(&self, query: &ScoreQuery) -> Result<Vec<AggregateScore>> {
    let _table = self.table.read().await;
    self.aggregate.list_scores(query).await.map_err(Error::storage)
  }

  /// Recompute the aggregate from every visible assertion and replace the
  /// stored table with it.
  ///
  /// Returns [`Error::RebuildInProgress`] immediately if another rebuild is
  /// running; that rebuild is not disturbed. Readers already inside
  /// [`read_scores`](Self::read_scores) finish before the table is touched.
  pub async fn rebuild(&self) -> Result<RebuildReport> {
    let _running = self.rebuilding.try_lock().map_err(|_| Error::RebuildInProgress)?;
    let _table = self.table.write().await;

    let pending = Pending { state: &self.state, settled: false };
    let result = self.run().await;
    pending.settle();

    match result {
      Ok(report) => {
        self.transition(RebuildState::Idle);
        tracing::info!(
          subjects = report.scores.len(),
          local = report.local_assertions,
          remote = report.remote_assertions(),
          skipped = report.warnings().count(),
          "aggregate rebuilt"
        );
        Ok(report)
      }
      Err(e) => {
        self.transition(RebuildState::Failed);
        tracing::error!(error = %e, "aggregate rebuild failed");
        Err(e)
      }
    }
  }

  fn transition(&self, next: RebuildState) {
    tracing::debug!(state = ?next, "rebuild state");
    self.state.send_replace(next);
  }

  async fn run(&self) -> Result<RebuildReport> {
    self.transition(RebuildState::Resetting);
    self.aggregate.clear_aggregate().await.map_err(Error::storage)?;

    self.transition(RebuildState::Collecting);
    let key = self.keys.load_public_key().map_err(Error::KeyUnavailable)?;
    let sources = self.registry.list_sources().await.map_err(Error::storage)?;
    tracing::info!(sources = sources.len(), "rebuilding aggregate");

    let (tx, mut rx) = mpsc::channel(self.config.channel_capacity.max(1));

    let mut fetchers = Fetchers(
      sources
        .iter()
        .map(|source| {
          let task = run_fetcher(
            self.directory.clone(),
            source.clone(),
            self.config.fetch_timeout,
            tx.clone(),
          );
          (source.source_id, tokio::spawn(task))
        })
        .collect(),
    );

    // The local reader owns the last sender, so the channel closes once it
    // and every fetcher are done.
    let local = {
      let fetchers = &fetchers;
      async move {
        let assertions = match self.ledger.read_all().await {
          Ok(assertions) => assertions,
          Err(e) => {
            fetchers.abort_all();
            return Err(Error::storage(e));
          }
        };
        let count = assertions.len();
        for assertion in assertions {
          if tx.send(WeightedAssertion::local(assertion)).await.is_err() {
            break;
          }
        }
        Ok(count)
      }
    };

    // Contributions are staged per origin so a source that fails after
    // sending part of its batch can be dropped as a whole.
    let consume = async move {
      let mut staged: HashMap<Origin, ScoreTable> = HashMap::new();
      while let Some(weighted) = rx.recv().await {
        *staged
          .entry(weighted.origin)
          .or_default()
          .entry(weighted.assertion.subject_id)
          .or_insert(0.0) += weighted.contribution();
      }
      staged
    };

    let (local, mut staged) = tokio::join!(local, consume);
    let local_assertions = local?;

    let mut scores = staged.remove(&Origin::Local).unwrap_or_default();
    let mut reports = Vec::with_capacity(sources.len());

    for (source, (source_id, handle)) in sources.into_iter().zip(fetchers.0.iter_mut()) {
      let source_id = *source_id;
      let outcome = match handle.await {
        Ok(Ok(accepted)) => SourceOutcome::Accepted(accepted),
        Ok(Err(e)) => SourceOutcome::Failed(e),
        Err(_) => SourceOutcome::Failed(FetchError::Aborted),
      };

      match &outcome {
        SourceOutcome::Accepted(_) => {
          let totals = staged.remove(&Origin::Remote(source_id)).unwrap_or_default();
          for (subject_id, amount) in totals {
            *scores.entry(subject_id).or_insert(0.0) += amount;
          }
        }
        SourceOutcome::Failed(e) => {
          tracing::warn!(
            %source_id,
            name = %source.display_name,
            error = %e,
            "skipping source for this rebuild"
          );
        }
      }

      reports.push(SourceReport {
        source_id,
        display_name: source.display_name,
        trust_level: source.trust_level,
        outcome,
      });
    }

    self.transition(RebuildState::Finalizing);
    self
      .aggregate
      .replace_aggregate(scores.clone())
      .await
      .map_err(Error::storage)?;

    Ok(RebuildReport {
      scores,
      local_assertions,
      sources: reports,
      key_fingerprint: key.fingerprint(),
    })
  }
}

// ─── Cancellation ────────────────────────────────────────────────────────────

/// Spawned fetchers of one rebuild. Any still running when this is dropped
/// are aborted, so a cancelled rebuild leaves no detached tasks behind.
struct Fetchers(Vec<(Uuid, JoinHandle<Result<usize, FetchError>>)>);

impl Fetchers {
  fn abort_all(&self) {
    for (_, handle) in &self.0 {
      handle.abort();
    }
  }
}

impl Drop for Fetchers {
  fn drop(&mut self) { self.abort_all(); }
}

/// Marks the engine `Failed` if a rebuild is dropped before it settles.
struct Pending<'a> {
  state:   &'a watch::Sender<RebuildState>,
  settled: bool,
}

impl Pending<'_> {
  fn settle(mut self) { self.settled = true; }
}

impl Drop for Pending<'_> {
  fn drop(&mut self) {
    if !self.settled {
      tracing::warn!("aggregate rebuild cancelled");
      self.state.send_replace(RebuildState::Failed);
    }
  }
}
