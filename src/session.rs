//! # Generation session and sampling driver
//!
//! A [`GenerationSession`] owns every piece of state a dataset build mutates: the
//! [`FilePool`], the [`AssignmentLedger`], one [`SplitQuota`] per split and the sampling
//! RNG. Split generators borrow the session mutably, so the three splits share one pool
//! and one ledger while the borrow checker rules out running two of them at once.
//!
//! ## Sampling loop
//! -----------------
//! [`SplitGenerator`] is a pull-based iterator. Each call to `next` resumes the loop
//! below where the previous call left it:
//!
//! ```text
//!            ┌──────────────────────────────────────────────────────────┐
//!            ▼                                                          │
//!   drain pending records ── record accepted ──► yield Example ─────────┘
//!            │ file drained
//!            ▼
//!   evict file if hits ≥ extensions_per_file
//!            │
//!            ▼
//!   quota met? ── yes ──► Done (QuotaMet)
//!   pool empty? ─ yes ──► Done (PoolExhausted, warning)
//!   visits ≥ budget? yes ► Done (VisitBudgetExhausted, warning)
//!            │ no
//!            ▼
//!   pick a file uniformly at random, read its records ──► drain
//! ```
//!
//! The quota is only checked between files: once a file is opened all of its records are
//! drained, so a split may overshoot its target by up to one file.
//!
//! ## Termination
//! -----------------
//! A generator opens at most `initial files × extensions_per_file` files. Under
//! [`EvictionPolicy::OnConsumed`] a file holding `extensions_per_file` records is evicted
//! after a single visit, so a well-formed pool is exhausted long before this budget.
//!
//! ## Errors
//! -----------------
//! * A file that cannot be read yields its error once, then the generator is done.
//! * A malformed record follows [`MalformedPolicy`]: skipped with a warning, or yielded
//!   as an error that ends the generator.
use std::fmt;

use camino::Utf8Path;
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::{
    dataset::Example,
    file_pool::FilePool,
    ledger::{AssignmentLedger, Resolution},
    params::{BuildParams, EvictionPolicy, MalformedPolicy},
    record::{FileRecords, RecordSource, TngRecord},
    split::{Split, SplitProportions, SplitQuota},
    tng_errors::TngError,
};

type PendingRecords = <FileRecords as IntoIterator>::IntoIter;

/// Shared state of one dataset build.
#[derive(Debug)]
pub struct GenerationSession<S: RecordSource> {
    pool: FilePool,
    ledger: AssignmentLedger,
    quotas: [SplitQuota; 3],
    proportions: SplitProportions,
    params: BuildParams,
    source: S,
    rng: StdRng,
}

impl<S: RecordSource> GenerationSession<S> {
    /// Start a session over an already populated pool.
    ///
    /// Quota targets are fixed here from `pool.expected_records()`.
    ///
    /// Return
    /// ----------
    /// * `Err` if `params` fail validation or disagree with the pool on
    ///   `extensions_per_file`.
    pub fn new(pool: FilePool, source: S, params: BuildParams) -> Result<Self, TngError> {
        params.validate()?;
        if pool.extensions_per_file() != params.extensions_per_file {
            return Err(TngError::InvalidBuildParameter(format!(
                "file pool expects {} extensions per file, parameters say {}",
                pool.extensions_per_file(),
                params.extensions_per_file
            )));
        }

        let proportions = params.proportions()?;
        let expected = pool.expected_records();
        let quotas = Split::ALL.map(|split| SplitQuota::new(expected, proportions.get(split)));

        let rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        info!(
            files = pool.initial_len(),
            expected_records = expected,
            "generation session started"
        );

        Ok(GenerationSession {
            pool,
            ledger: AssignmentLedger::new(),
            quotas,
            proportions,
            params,
            source,
            rng,
        })
    }

    /// Discover the files below `root` and start a session over them.
    pub fn discover(root: &Utf8Path, source: S, params: BuildParams) -> Result<Self, TngError> {
        params.validate()?;
        let pool = FilePool::discover(root, params.extensions_per_file)?;
        Self::new(pool, source, params)
    }

    /// Lazy, forward-only generator of the examples of `split`.
    ///
    /// Calling it again for a split that already finished resumes from the current shared
    /// state: it yields nothing if the quota is met or the pool is empty.
    pub fn generate(&mut self, split: Split) -> SplitGenerator<'_, S> {
        SplitGenerator::new(self, split)
    }

    pub fn pool(&self) -> &FilePool {
        &self.pool
    }

    pub fn ledger(&self) -> &AssignmentLedger {
        &self.ledger
    }

    pub fn quota(&self, split: Split) -> &SplitQuota {
        &self.quotas[split_index(split)]
    }

    pub fn proportions(&self) -> &SplitProportions {
        &self.proportions
    }

    pub fn params(&self) -> &BuildParams {
        &self.params
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

#[inline]
fn split_index(split: Split) -> usize {
    match split {
        Split::Train => 0,
        Split::Validation => 1,
        Split::Test => 2,
    }
}

/// Why a split generator stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SplitOutcome {
    QuotaMet,
    /// Every file was evicted before the quota was reached.
    PoolExhausted,
    /// The generator opened `initial files × extensions_per_file` files without reaching
    /// its quota or emptying the pool.
    VisitBudgetExhausted,
    /// A file or record error was yielded.
    Failed,
}

/// Counters of one split generator run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitReport {
    pub split: Split,
    pub target: f64,
    pub accepted: u64,
    /// Records whose object belongs to another split
    pub rejected: u64,
    /// Malformed records skipped
    pub skipped: u64,
    /// Accepted records whose `(object, camera)` pair was already accepted before
    pub duplicates: u64,
    pub files_visited: u64,
    pub files_evicted: u64,
    /// `None` while the generator is still running
    pub outcome: Option<SplitOutcome>,
}

impl SplitReport {
    fn new(split: Split, target: f64) -> Self {
        SplitReport {
            split,
            target,
            accepted: 0,
            rejected: 0,
            skipped: 0,
            duplicates: 0,
            files_visited: 0,
            files_evicted: 0,
            outcome: None,
        }
    }

    /// Whether the generator stopped before its quota was met.
    pub fn is_short(&self) -> bool {
        matches!(
            self.outcome,
            Some(SplitOutcome::PoolExhausted | SplitOutcome::VisitBudgetExhausted)
        )
    }
}

impl fmt::Display for SplitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = self
            .outcome
            .map_or_else(|| "running".to_string(), |o| format!("{o:?}"));
        write!(
            f,
            "{}: accepted={} / target={:.1}, rejected={}, skipped={}, duplicates={}, files visited={}, evicted={} [{}]",
            self.split,
            self.accepted,
            self.target,
            self.rejected,
            self.skipped,
            self.duplicates,
            self.files_visited,
            self.files_evicted,
            outcome
        )
    }
}

/// Sampling driver of one split. See the module documentation for the loop.
pub struct SplitGenerator<'a, S: RecordSource> {
    session: &'a mut GenerationSession<S>,
    split: Split,
    pending: Option<PendingRecords>,
    slot: usize,
    visits: u64,
    budget: u64,
    done: bool,
    report: SplitReport,
}

impl<'a, S: RecordSource> SplitGenerator<'a, S> {
    fn new(session: &'a mut GenerationSession<S>, split: Split) -> Self {
        let quota = session.quotas[split_index(split)];
        let budget = session.pool.expected_records();

        info!(
            %split,
            target = quota.target(),
            already = quota.count(),
            files_left = session.pool.len(),
            "generating split"
        );

        SplitGenerator {
            session,
            split,
            pending: None,
            slot: 0,
            visits: 0,
            budget,
            done: false,
            report: SplitReport::new(split, quota.target()),
        }
    }

    pub fn split(&self) -> Split {
        self.split
    }

    pub fn report(&self) -> &SplitReport {
        &self.report
    }

    pub fn into_report(self) -> SplitReport {
        self.report
    }

    /// Number of files opened so far.
    pub fn visits(&self) -> u64 {
        self.visits
    }

    /// Maximum number of files this generator may open.
    pub fn visit_budget(&self) -> u64 {
        self.budget
    }

    fn quota(&self) -> &SplitQuota {
        &self.session.quotas[split_index(self.split)]
    }

    fn finish(&mut self, outcome: SplitOutcome) {
        self.done = true;
        self.pending = None;
        self.report.outcome = Some(outcome);

        let quota = *self.quota();
        match outcome {
            SplitOutcome::QuotaMet => info!(
                split = %self.split,
                count = quota.count(),
                target = quota.target(),
                "split quota met"
            ),
            SplitOutcome::PoolExhausted => warn!(
                split = %self.split,
                count = quota.count(),
                target = quota.target(),
                shortfall = quota.shortfall(),
                "file pool exhausted before the split quota was met"
            ),
            SplitOutcome::VisitBudgetExhausted => warn!(
                split = %self.split,
                count = quota.count(),
                target = quota.target(),
                shortfall = quota.shortfall(),
                visits = self.visits,
                "file visit budget exhausted before the split quota was met"
            ),
            SplitOutcome::Failed => warn!(split = %self.split, "split generation aborted"),
        }
    }

    fn count_consumed(&mut self) {
        if self.session.params.eviction_policy == EvictionPolicy::OnConsumed {
            self.session.pool.record_hit(self.slot);
        }
    }

    /// Route one drained record. `None` means "nothing to yield, keep draining".
    fn consume(
        &mut self,
        record: Result<TngRecord, TngError>,
    ) -> Option<Result<Example, TngError>> {
        let record = match record {
            Ok(record) => record,
            Err(err) => match self.session.params.malformed_policy {
                MalformedPolicy::Fail => {
                    self.finish(SplitOutcome::Failed);
                    return Some(Err(err));
                }
                MalformedPolicy::Skip => {
                    warn!(
                        file = %self.session.pool.path(self.slot),
                        error = %err,
                        "malformed record skipped"
                    );
                    self.report.skipped += 1;
                    self.count_consumed();
                    return None;
                }
            },
        };

        let identity = record.identity();
        match self
            .session
            .ledger
            .resolve(&identity, &record.camera, self.split)
        {
            Resolution::Rejected { .. } => {
                self.report.rejected += 1;
                self.count_consumed();
                None
            }
            Resolution::Accepted { duplicate } => {
                self.session.pool.record_hit(self.slot);
                if duplicate {
                    self.report.duplicates += 1;
                    debug!(object = %identity, camera = %record.camera, "duplicate camera view accepted");
                }
                let index = self.session.quotas[split_index(self.split)].increment();
                self.report.accepted += 1;

                Some(Ok(Example::new(
                    format!("{}-{index:06}", self.split),
                    record,
                )))
            }
        }
    }

    /// Open the next file. `Some` carries a file-level error to yield.
    fn open_next_file(&mut self) -> Option<TngError> {
        let session = &mut *self.session;
        let Some(slot) = session.pool.pick(&mut session.rng) else {
            self.finish(SplitOutcome::PoolExhausted);
            return None;
        };

        self.visits += 1;
        self.report.files_visited += 1;
        let path = session.pool.path(slot).to_owned();
        debug!(file = %path, hits = session.pool.hits(slot), visit = self.visits, "file selected");

        match session.source.read_records(&path) {
            Ok(records) => {
                trace!(file = %path, records = records.len(), "file read");
                self.slot = slot;
                self.pending = Some(records.into_iter());
                None
            }
            Err(err) => {
                self.finish(SplitOutcome::Failed);
                Some(err)
            }
        }
    }
}

impl<S: RecordSource> Iterator for SplitGenerator<'_, S> {
    type Item = Result<Example, TngError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            if let Some(records) = self.pending.as_mut() {
                match records.next() {
                    Some(record) => {
                        if let Some(item) = self.consume(record) {
                            return Some(item);
                        }
                        continue;
                    }
                    None => {
                        self.pending = None;
                        if self.session.pool.evict_if_exhausted(self.slot).is_some() {
                            self.report.files_evicted += 1;
                        }
                    }
                }
            }

            if self.quota().is_met() {
                self.finish(SplitOutcome::QuotaMet);
            } else if self.session.pool.is_empty() {
                self.finish(SplitOutcome::PoolExhausted);
            } else if self.visits >= self.budget {
                self.finish(SplitOutcome::VisitBudgetExhausted);
            } else if let Some(err) = self.open_next_file() {
                return Some(Err(err));
            }
        }
        None
    }
}

impl<S: RecordSource> std::iter::FusedIterator for SplitGenerator<'_, S> {}
