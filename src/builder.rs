//! # Dataset builder
//!
//! [`TngDatasetBuilder`] is the entry point of the crate. It ties a dataset root, a
//! [`RecordSource`] and [`BuildParams`] together and exposes the three split generators.
//!
//! The file pool is populated on first use, not at construction: building a
//! `TngDatasetBuilder` only validates the parameters, and an empty dataset root surfaces
//! as [`TngError::EmptyFilePool`] from the first [`generate`](TngDatasetBuilder::generate)
//! or [`build_into`](TngDatasetBuilder::build_into) call.
//!
//! ## Example
//!
//! ```rust,no_run
//! use camino::Utf8Path;
//! use tng_dataset::{builder::TngDatasetBuilder, dataset::DirectoryWriter, params::BuildParams};
//!
//! let params = BuildParams::builder().proportions(0.8, 0.1, 0.1).seed(7).build().unwrap();
//! let mut builder = TngDatasetBuilder::new("/data/tng", params).unwrap();
//!
//! let mut sink = DirectoryWriter::create(Utf8Path::new("/data/tng_ds"), 500).unwrap();
//! let report = builder.build_into(&mut sink).unwrap();
//! println!("{report:#}");
//! ```
use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use itertools::Itertools;
use serde::Serialize;
use tracing::info;

#[cfg(feature = "progress")]
use crate::progress::{fmt_dur, split_progress_bar, IterTimer};
use crate::{
    dataset::{DatasetInfo, DatasetSink},
    file_pool::FilePool,
    params::BuildParams,
    record::{FitsRecordSource, RecordSource},
    session::{GenerationSession, SplitGenerator, SplitReport},
    split::Split,
    tng_errors::TngError,
};

/// Builder of the TNG dataset over one directory tree.
#[derive(Debug)]
pub struct TngDatasetBuilder<S: RecordSource = FitsRecordSource> {
    root: Utf8PathBuf,
    params: BuildParams,
    source: Option<S>,
    session: Option<GenerationSession<S>>,
}

impl TngDatasetBuilder<FitsRecordSource> {
    /// Builder reading FITS files below `root`.
    ///
    /// Return
    /// ----------
    /// * `Err(TngError::InvalidProportions)` / `Err(TngError::InvalidBuildParameter)` if
    ///   `params` fail validation.
    pub fn new(root: impl Into<Utf8PathBuf>, params: BuildParams) -> Result<Self, TngError> {
        let source = FitsRecordSource::new(params.image_side);
        Self::with_source(root, params, source)
    }
}

impl<S: RecordSource> TngDatasetBuilder<S> {
    /// Builder reading records through a custom [`RecordSource`].
    pub fn with_source(
        root: impl Into<Utf8PathBuf>,
        params: BuildParams,
        source: S,
    ) -> Result<Self, TngError> {
        params.validate()?;
        Ok(TngDatasetBuilder {
            root: root.into(),
            params,
            source: Some(source),
            session: None,
        })
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn params(&self) -> &BuildParams {
        &self.params
    }

    pub fn info(&self) -> DatasetInfo {
        DatasetInfo::new(self.params.image_side)
    }

    /// The session, once the pool has been populated.
    pub fn session_state(&self) -> Option<&GenerationSession<S>> {
        self.session.as_ref()
    }

    /// Populate the file pool on first call, then return the shared session.
    pub fn session(&mut self) -> Result<&mut GenerationSession<S>, TngError> {
        if let Some(session) = self.session.take() {
            return Ok(self.session.insert(session));
        }

        let pool = FilePool::discover(&self.root, self.params.extensions_per_file)?;
        let source = self
            .source
            .take()
            .ok_or_else(|| TngError::InvalidBuildParameter("record source already consumed".into()))?;
        let session = GenerationSession::new(pool, source, self.params.clone())?;
        Ok(self.session.insert(session))
    }

    /// Lazy generator of the examples of `split`.
    pub fn generate(&mut self, split: Split) -> Result<SplitGenerator<'_, S>, TngError> {
        Ok(self.session()?.generate(split))
    }

    /// Generate the train, validation and test splits in that order into `sink`.
    ///
    /// The first error (file-level, or record-level under
    /// [`MalformedPolicy::Fail`](crate::params::MalformedPolicy::Fail)) aborts the build;
    /// the sink is not finished in that case.
    pub fn build_into(&mut self, sink: &mut impl DatasetSink) -> Result<BuildReport, TngError> {
        let session = self.session()?;
        let mut splits = Vec::with_capacity(Split::ALL.len());

        for split in Split::ALL {
            #[cfg(feature = "progress")]
            let (pb, mut timer) = (
                split_progress_bar(split, session.quota(split).target()),
                IterTimer::new(0.2),
            );

            let mut generator = session.generate(split);
            for example in generator.by_ref() {
                sink.write_example(split, example?)?;

                #[cfg(feature = "progress")]
                {
                    let last = timer.tick();
                    pb.set_message(format!("last: {}, avg: {}", fmt_dur(last), fmt_dur(timer.avg())));
                    pb.inc(1);
                }
            }

            #[cfg(feature = "progress")]
            pb.finish_and_clear();

            let report = generator.into_report();
            info!(report = %report, "split done");
            splits.push(report);
        }

        sink.finish()?;

        Ok(BuildReport {
            files: session.pool().initial_len(),
            files_left: session.pool().len(),
            objects: session.ledger().len(),
            splits,
        })
    }
}

/// Summary of a full [`TngDatasetBuilder::build_into`] run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildReport {
    /// Files found at population time
    pub files: usize,
    /// Files still in the pool after the last split
    pub files_left: usize,
    /// Distinct objects assigned to a split
    pub objects: usize,
    pub splits: Vec<SplitReport>,
}

impl BuildReport {
    pub fn split(&self, split: Split) -> Option<&SplitReport> {
        self.splits.iter().find(|r| r.split == split)
    }

    pub fn total_examples(&self) -> u64 {
        self.splits.iter().map(|r| r.accepted).sum()
    }
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "TNG dataset build")?;
            writeln!(f, "-----------------")?;
            writeln!(f, "  files          : {} ({} left in pool)", self.files, self.files_left)?;
            writeln!(f, "  objects        : {}", self.objects)?;
            writeln!(f, "  examples       : {}", self.total_examples())?;
            for report in &self.splits {
                writeln!(f, "  {report}")?;
            }
            Ok(())
        } else {
            let per_split = self
                .splits
                .iter()
                .map(|r| format!("{}={}", r.split, r.accepted))
                .join(", ");
            write!(
                f,
                "BuildReport(files={}, objects={}, {})",
                self.files, self.objects, per_split
            )
        }
    }
}
