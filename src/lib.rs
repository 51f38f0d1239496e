//! Builds leak-free train/validation/test splits from TNG50/100/300 FITS galaxy imagery.
//!
//! Start with [`TngDatasetBuilder`]; the sampling core lives in [`session`], the split
//! exclusivity rule in [`ledger`].
pub mod builder;
pub mod constants;
pub mod dataset;
pub mod file_pool;
pub mod fits;
pub mod identity;
pub mod ledger;
pub mod logging;
pub mod params;
#[cfg(feature = "progress")]
pub mod progress;
pub mod record;
pub mod session;
pub mod split;
pub mod tng_errors;

pub use builder::{BuildReport, TngDatasetBuilder};
pub use dataset::{DatasetSink, DirectoryWriter, Example, MemorySink};
pub use params::{BuildParams, EvictionPolicy, MalformedPolicy};
pub use record::{FitsRecordSource, RecordSource, TngRecord};
pub use session::{GenerationSession, SplitGenerator, SplitOutcome, SplitReport};
pub use split::Split;
pub use tng_errors::TngError;
