use thiserror::Error;

use crate::fits::FitsError;

#[derive(Error, Debug)]
pub enum TngError {
    #[error(
        "Split proportions must sum exactly to 1 (train={train}, validation={validation}, test={test}, sum={sum})"
    )]
    InvalidProportions {
        train: f64,
        validation: f64,
        test: f64,
        sum: f64,
    },

    #[error("Invalid build parameter: {0}")]
    InvalidBuildParameter(String),

    #[error("No file found under the dataset root: {0}")]
    EmptyFilePool(String),

    #[error("Unable to walk the dataset root: {0}")]
    DirectoryWalkError(String),

    #[error("UTF-8 Path error: {0}")]
    Utf8PathError(String),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid FITS file {path}: {source}")]
    FitsFile {
        path: String,
        #[source]
        source: FitsError,
    },

    #[error("Missing required header keyword: {0}")]
    MissingKeyword(String),

    #[error("Header keyword {keyword} has an unexpected value: {value}")]
    InvalidKeywordValue { keyword: String, value: String },

    #[error("Extension {extname} has no 2D image data")]
    MissingImage { extname: String },

    #[error("Image of {extname} is {naxis1}x{naxis2}, smaller than the {side}x{side} crop")]
    ImageTooSmall {
        extname: String,
        naxis1: usize,
        naxis2: usize,
        side: usize,
    },

    #[error("CSV write error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl PartialEq for TngError {
    fn eq(&self, other: &Self) -> bool {
        use TngError::*;
        match (self, other) {
            (
                InvalidProportions {
                    train: a1,
                    validation: b1,
                    test: c1,
                    sum: s1,
                },
                InvalidProportions {
                    train: a2,
                    validation: b2,
                    test: c2,
                    sum: s2,
                },
            ) => a1 == a2 && b1 == b2 && c1 == c2 && s1 == s2,
            (InvalidBuildParameter(a), InvalidBuildParameter(b)) => a == b,
            (EmptyFilePool(a), EmptyFilePool(b)) => a == b,
            (DirectoryWalkError(a), DirectoryWalkError(b)) => a == b,
            (Utf8PathError(a), Utf8PathError(b)) => a == b,
            (
                FitsFile {
                    path: p1,
                    source: s1,
                },
                FitsFile {
                    path: p2,
                    source: s2,
                },
            ) => p1 == p2 && s1 == s2,
            (MissingKeyword(a), MissingKeyword(b)) => a == b,
            (
                InvalidKeywordValue {
                    keyword: k1,
                    value: v1,
                },
                InvalidKeywordValue {
                    keyword: k2,
                    value: v2,
                },
            ) => k1 == k2 && v1 == v2,
            (MissingImage { extname: a }, MissingImage { extname: b }) => a == b,
            (
                ImageTooSmall {
                    extname: e1,
                    naxis1: x1,
                    naxis2: y1,
                    side: s1,
                },
                ImageTooSmall {
                    extname: e2,
                    naxis1: x2,
                    naxis2: y2,
                    side: s2,
                },
            ) => e1 == e2 && x1 == x2 && y1 == y2 && s1 == s2,

            // Payloads without PartialEq: equal when the variant matches
            (IoError(_), IoError(_)) => true,
            (CsvError(_), CsvError(_)) => true,
            (JsonError(_), JsonError(_)) => true,

            _ => false,
        }
    }
}
