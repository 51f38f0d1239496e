//! # Build parameters
//!
//! [`BuildParams`] gathers every knob of a dataset build: split proportions, the expected
//! number of extensions per FITS file, the crop side, and the policies the sampling driver
//! applies to file eviction and malformed records.
//!
//! ## Example
//!
//! ```rust,no_run
//! use tng_dataset::params::{BuildParams, EvictionPolicy};
//!
//! let params = BuildParams::builder()
//!     .proportions(0.8, 0.1, 0.1)
//!     .extensions_per_file(7)
//!     .eviction_policy(EvictionPolicy::OnAccepted)
//!     .seed(42)
//!     .build()
//!     .unwrap();
//!
//! println!("{params:#}");
//! ```
use std::fmt;

use serde::Serialize;

use crate::{
    constants::{
        DEFAULT_EXTENSIONS_PER_FILE, DEFAULT_TEST, DEFAULT_TRAIN, DEFAULT_VALIDATION, IMAGE_SIDE,
    },
    split::SplitProportions,
    tng_errors::TngError,
};

/// Which drained records advance a file's hit counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum EvictionPolicy {
    /// Only records accepted by the ledger count. A file whose objects all belong to
    /// other splits is then revisited until the visit budget runs out.
    OnAccepted,
    /// Every drained record counts, accepted, rejected or skipped.
    #[default]
    OnConsumed,
}

/// What the sampling driver does with a record it cannot build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum MalformedPolicy {
    /// Log a warning and continue with the next record.
    #[default]
    Skip,
    /// Yield the error and end the split generator.
    Fail,
}

/// Configuration of a dataset build.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildParams {
    pub train: f64,
    pub validation: f64,
    pub test: f64,
    /// Expected number of extensions in one file; a file is evicted after this many hits.
    pub extensions_per_file: u32,
    /// Side of the square top-left crop.
    pub image_side: usize,
    pub eviction_policy: EvictionPolicy,
    pub malformed_policy: MalformedPolicy,
    /// Seed of the file sampling RNG. `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl BuildParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fluent builder over the defaults.
    ///
    /// See also
    /// ------------
    /// * [`BuildParamsBuilder::build`] – Validation rules.
    pub fn builder() -> BuildParamsBuilder {
        BuildParamsBuilder::new()
    }

    /// Re-run the validation rules on an existing value.
    ///
    /// Fields are public, so a value built with struct syntax may be invalid.
    pub fn validate(&self) -> Result<(), TngError> {
        self.proportions()?;

        if self.extensions_per_file == 0 {
            return Err(TngError::InvalidBuildParameter(
                "extensions_per_file must be >= 1".into(),
            ));
        }
        if self.image_side == 0 {
            return Err(TngError::InvalidBuildParameter(
                "image_side must be >= 1".into(),
            ));
        }
        Ok(())
    }

    /// Validated proportions.
    pub fn proportions(&self) -> Result<SplitProportions, TngError> {
        SplitProportions::new(self.train, self.validation, self.test)
    }
}

impl Default for BuildParams {
    fn default() -> Self {
        BuildParams {
            train: DEFAULT_TRAIN,
            validation: DEFAULT_VALIDATION,
            test: DEFAULT_TEST,
            extensions_per_file: DEFAULT_EXTENSIONS_PER_FILE,
            image_side: IMAGE_SIDE,
            eviction_policy: EvictionPolicy::default(),
            malformed_policy: MalformedPolicy::default(),
            seed: None,
        }
    }
}

/// Builder for [`BuildParams`], with validation.
#[derive(Debug, Clone)]
pub struct BuildParamsBuilder {
    params: BuildParams,
}

impl Default for BuildParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildParamsBuilder {
    pub fn new() -> Self {
        Self {
            params: BuildParams::default(),
        }
    }

    pub fn proportions(mut self, train: f64, validation: f64, test: f64) -> Self {
        self.params.train = train;
        self.params.validation = validation;
        self.params.test = test;
        self
    }
    pub fn train(mut self, v: f64) -> Self {
        self.params.train = v;
        self
    }
    pub fn validation(mut self, v: f64) -> Self {
        self.params.validation = v;
        self
    }
    pub fn test(mut self, v: f64) -> Self {
        self.params.test = v;
        self
    }
    pub fn extensions_per_file(mut self, v: u32) -> Self {
        self.params.extensions_per_file = v;
        self
    }
    pub fn image_side(mut self, v: usize) -> Self {
        self.params.image_side = v;
        self
    }
    pub fn eviction_policy(mut self, v: EvictionPolicy) -> Self {
        self.params.eviction_policy = v;
        self
    }
    pub fn malformed_policy(mut self, v: MalformedPolicy) -> Self {
        self.params.malformed_policy = v;
        self
    }
    pub fn seed(mut self, v: u64) -> Self {
        self.params.seed = Some(v);
        self
    }

    /// Finalize the builder.
    ///
    /// Validation rules
    /// -----------------
    /// * every proportion lies in `[0, 1]` and `train + validation + test == 1.0` exactly,
    /// * `extensions_per_file >= 1`,
    /// * `image_side >= 1`.
    ///
    /// Return
    /// ----------
    /// * `Err(TngError::InvalidProportions)` or `Err(TngError::InvalidBuildParameter)` on
    ///   the first failing rule.
    pub fn build(self) -> Result<BuildParams, TngError> {
        self.params.validate()?;
        Ok(self.params)
    }
}

impl fmt::Display for BuildParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let seed = self
            .seed
            .map_or_else(|| "entropy".to_string(), |s| s.to_string());

        if f.alternate() {
            const PARAM_COL: usize = 40;
            writeln!(f, "Dataset Build Parameters")?;
            writeln!(f, "------------------------")?;

            macro_rules! line {
                ($fmt:expr, $val:expr, $comment:expr) => {{
                    let s = format!($fmt, $val);
                    let pad = if s.len() < PARAM_COL {
                        " ".repeat(PARAM_COL - s.len())
                    } else {
                        " ".to_string()
                    };
                    writeln!(f, "  {}{}# {}", s, pad, $comment)
                }};
            }

            writeln!(f, "[Splits]")?;
            line!("train               = {:.3}", self.train, "Train proportion")?;
            line!(
                "validation          = {:.3}",
                self.validation,
                "Validation proportion"
            )?;
            line!("test                = {:.3}", self.test, "Test proportion")?;

            writeln!(f, "\n[Sampling]")?;
            line!(
                "extensions_per_file = {}",
                self.extensions_per_file,
                "Hits before a file is evicted"
            )?;
            line!(
                "eviction_policy     = {:?}",
                self.eviction_policy,
                "Records advancing the hit counter"
            )?;
            line!(
                "malformed_policy    = {:?}",
                self.malformed_policy,
                "Handling of unreadable records"
            )?;
            line!("seed                = {}", seed, "File sampling RNG seed")?;

            writeln!(f, "\n[Images]")?;
            line!(
                "image_side          = {} px",
                self.image_side,
                "Top-left crop side"
            )?;

            Ok(())
        } else {
            write!(
                f,
                "BuildParams(train={:.3}, validation={:.3}, test={:.3}, extensions_per_file={}, image_side={}, eviction={:?}, malformed={:?}, seed={})",
                self.train,
                self.validation,
                self.test,
                self.extensions_per_file,
                self.image_side,
                self.eviction_policy,
                self.malformed_policy,
                seed,
            )
        }
    }
}
