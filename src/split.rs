//! # Dataset splits, proportions and quotas
//!
//! A dataset is partitioned into three [`Split`]s. The caller fixes how large each
//! partition should be with [`SplitProportions`], and every split generator tracks its
//! progress toward that size with a [`SplitQuota`].
//!
//! ## Quota arithmetic
//! -----------------
//! The quota target of a split is computed once the file pool is known:
//!
//! ```text
//! target(split) = files × extensions_per_file × proportion(split)
//! ```
//!
//! The target stays a floating-point value and a quota is met as soon as
//! `count as f64 >= target`. A split with a proportion of `0.0` is met immediately.
//!
//! ## Exact-sum rule
//! -----------------
//! Proportions are validated with an **exact** comparison of
//! `train + validation + test` (summed left to right in `f64`) against `1.0`.
//! `(0.7, 0.2, 0.1)` is therefore rejected (it sums to `0.9999999999999999`), while
//! `(0.8, 0.1, 0.1)` and `(0.34, 0.33, 0.33)` are accepted.
use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::tng_errors::TngError;

/// One of the three dataset partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Validation,
    Test,
}

impl Split {
    /// All splits, in the order the builder generates them.
    pub const ALL: [Split; 3] = [Split::Train, Split::Validation, Split::Test];

    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Validation => "validation",
            Split::Test => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Split {
    type Err = TngError;

    /// Accepts the usual short aliases (`valid`, `val`) on top of the canonical names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "train" => Ok(Split::Train),
            "validation" | "valid" | "val" => Ok(Split::Validation),
            "test" => Ok(Split::Test),
            other => Err(TngError::InvalidBuildParameter(format!(
                "unknown split name: {other}"
            ))),
        }
    }
}

/// Validated train/validation/test proportions.
///
/// Construct with [`SplitProportions::new`]; the only way to obtain a value is through
/// the exact-sum check, so holding a `SplitProportions` guarantees the invariant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SplitProportions {
    train: f64,
    validation: f64,
    test: f64,
}

impl SplitProportions {
    /// Validate and build a set of proportions.
    ///
    /// Arguments
    /// -----------------
    /// * `train`, `validation`, `test`: fractions of the expected record count.
    ///
    /// Return
    /// ----------
    /// * `Ok(SplitProportions)` when each value lies in `[0, 1]` and their `f64` sum is exactly `1.0`.
    /// * `Err(TngError::InvalidProportions)` otherwise (NaN included).
    pub fn new(train: f64, validation: f64, test: f64) -> Result<Self, TngError> {
        let sum = train + validation + test;
        let in_range = |v: f64| (0.0..=1.0).contains(&v);

        if !(in_range(train) && in_range(validation) && in_range(test)) || sum != 1.0 {
            return Err(TngError::InvalidProportions {
                train,
                validation,
                test,
                sum,
            });
        }

        Ok(SplitProportions {
            train,
            validation,
            test,
        })
    }

    pub fn get(&self, split: Split) -> f64 {
        match split {
            Split::Train => self.train,
            Split::Validation => self.validation,
            Split::Test => self.test,
        }
    }
}

/// Target size and running count of one split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SplitQuota {
    target: f64,
    count: u64,
}

impl SplitQuota {
    pub fn new(expected_records: u64, proportion: f64) -> Self {
        SplitQuota {
            target: expected_records as f64 * proportion,
            count: 0,
        }
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    #[inline]
    pub fn is_met(&self) -> bool {
        self.count as f64 >= self.target
    }

    /// Register one accepted record and return the new count.
    #[inline]
    pub(crate) fn increment(&mut self) -> u64 {
        self.count += 1;
        self.count
    }

    /// Number of records still missing, rounded up.
    pub fn shortfall(&self) -> u64 {
        let missing = self.target - self.count as f64;
        if missing > 0.0 {
            missing.ceil() as u64
        } else {
            0
        }
    }
}
