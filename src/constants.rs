//! # Constants and type definitions for tng-dataset
//!
//! This module centralizes the **fixed sizes**, **FITS keyword names**, **dataset
//! metadata** and **type aliases** shared by the sampling core and its I/O layers.
//!
//! ## Overview
//!
//! - FITS structural constants (block and card sizes)
//! - Defaults of the build configuration (crop side, extensions per file, proportions)
//! - Header keywords read from every TNG extension
//! - Dataset description strings used by [`DatasetInfo`](crate::dataset::DatasetInfo)

// -------------------------------------------------------------------------------------------------
// FITS layout
// -------------------------------------------------------------------------------------------------

/// Size in bytes of a FITS logical record (headers and data units are padded to it)
pub const FITS_BLOCK: usize = 2880;

/// Size in bytes of one header card
pub const FITS_CARD: usize = 80;

/// Number of cards in one header block
pub const CARDS_PER_BLOCK: usize = FITS_BLOCK / FITS_CARD;

/// Largest `NAXIS` allowed by the FITS standard
pub const MAX_NAXIS: i64 = 999;

// -------------------------------------------------------------------------------------------------
// Build defaults
// -------------------------------------------------------------------------------------------------

/// Side of the square top-left crop applied to every image
pub const IMAGE_SIDE: usize = 500;

/// Expected number of extensions in one TNG FITS file (one per camera/filter product)
pub const DEFAULT_EXTENSIONS_PER_FILE: u32 = 7;

/// Default train proportion
pub const DEFAULT_TRAIN: f64 = 0.8;
/// Default validation proportion
pub const DEFAULT_VALIDATION: f64 = 0.1;
/// Default test proportion
pub const DEFAULT_TEST: f64 = 0.1;

// -------------------------------------------------------------------------------------------------
// Header keywords
// -------------------------------------------------------------------------------------------------

pub const KW_EXTNAME: &str = "EXTNAME";
pub const KW_ORIGIN: &str = "ORIGIN";
pub const KW_SIMTAG: &str = "SIMTAG";
pub const KW_SNAPNUM: &str = "SNAPNUM";
pub const KW_SUBHALO: &str = "SUBHALO";
pub const KW_CAMERA: &str = "CAMERA";
pub const KW_REDSHIFT: &str = "REDSHIFT";
pub const KW_FILTER: &str = "FILTER";
pub const KW_FOVSIZE: &str = "FOVSIZE";
pub const KW_BUNIT: &str = "BUNIT";
pub const KW_NAXIS1: &str = "NAXIS1";
pub const KW_NAXIS2: &str = "NAXIS2";

// -------------------------------------------------------------------------------------------------
// Dataset metadata
// -------------------------------------------------------------------------------------------------

pub const DATASET_NAME: &str = "tng_dataset";
pub const DATASET_VERSION: &str = "1.0.0";
pub const DATASET_DESCRIPTION: &str =
    "Data representing the TNG50, TNG100, and TNG300 Simulations";
pub const DATASET_HOMEPAGE: &str = "https://github.com/astroinfo-hacks/2023-imgen-diffusion";
pub const DATASET_CITATION: &str = "";

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Simulation snapshot number
pub type SnapNum = i32;
/// Subhalo (galaxy) index inside a snapshot
pub type SubhaloId = i32;
/// Square image cropped from one extension, row-major semantics (row = NAXIS2 axis)
pub type Image = nalgebra::DMatrix<f32>;
