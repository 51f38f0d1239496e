//! # Records and record sources
//!
//! A [`TngRecord`] is one extension of a TNG FITS file turned into an example: the twelve
//! header features plus the cropped image. The sampling driver never reads files
//! directly; it asks a [`RecordSource`] for the ordered records of a path.
//!
//! ## Error granularity
//! -----------------
//! [`RecordSource::read_records`] distinguishes two levels of failure:
//!
//! * the outer `Result` fails when the file itself cannot be read (I/O, broken FITS
//!   structure). The driver always propagates it;
//! * each inner `Result` fails when one extension cannot become a record (missing
//!   keyword, wrong value type, image too small). The driver applies its
//!   [`MalformedPolicy`](crate::params::MalformedPolicy).
use camino::Utf8Path;
use serde::Serialize;
use smallvec::SmallVec;

use crate::{
    constants::{
        Image, SnapNum, SubhaloId, IMAGE_SIDE, KW_BUNIT, KW_CAMERA, KW_EXTNAME, KW_FILTER,
        KW_FOVSIZE, KW_NAXIS1, KW_NAXIS2, KW_ORIGIN, KW_REDSHIFT, KW_SIMTAG, KW_SNAPNUM,
        KW_SUBHALO,
    },
    fits::{read_fits_file, FitsHdu, FitsHeader, FitsValue},
    identity::ObjectIdentity,
    tng_errors::TngError,
};

/// Records of one file, in extension order. Sized for the usual seven extensions.
pub type FileRecords = SmallVec<[Result<TngRecord, TngError>; 7]>;

/// One extension of a TNG file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TngRecord {
    pub extname: String,
    pub origin: String,
    pub simtag: String,
    pub snapnum: SnapNum,
    pub subhalo: SubhaloId,
    pub camera: String,
    pub redshift: f32,
    pub filter: String,
    pub fovsize: f32,
    pub bunit: String,
    pub naxis1: i32,
    pub naxis2: i32,
    #[serde(skip)]
    pub image: Image,
}

impl TngRecord {
    /// Object identity of this record, camera excluded.
    pub fn identity(&self) -> ObjectIdentity {
        ObjectIdentity::new(
            self.extname.as_str(),
            self.origin.as_str(),
            self.simtag.as_str(),
            self.snapnum,
            self.subhalo,
        )
    }

    /// Build a record from one image HDU.
    ///
    /// Arguments
    /// -----------------
    /// * `hdu`: a header/data unit of a TNG file.
    /// * `side`: side of the top-left crop.
    ///
    /// Return
    /// ----------
    /// * `Err(TngError::MissingKeyword)` / `Err(TngError::InvalidKeywordValue)` for header problems.
    /// * `Err(TngError::MissingImage)` when the HDU carries no 2D image.
    /// * `Err(TngError::ImageTooSmall)` when the image is smaller than `side` along an axis.
    pub fn from_hdu(hdu: &FitsHdu, side: usize) -> Result<Self, TngError> {
        let h = &hdu.header;
        let extname = text(h, KW_EXTNAME)?;

        let image = hdu
            .image
            .as_ref()
            .ok_or_else(|| TngError::MissingImage {
                extname: extname.clone(),
            })?;
        let cropped = image
            .crop_top_left(side)
            .ok_or_else(|| TngError::ImageTooSmall {
                extname: extname.clone(),
                naxis1: image.naxis1,
                naxis2: image.naxis2,
                side,
            })?;

        Ok(TngRecord {
            origin: text(h, KW_ORIGIN)?,
            simtag: text(h, KW_SIMTAG)?,
            snapnum: int32(h, KW_SNAPNUM)?,
            subhalo: int32(h, KW_SUBHALO)?,
            camera: text(h, KW_CAMERA)?,
            redshift: float32(h, KW_REDSHIFT)?,
            filter: text(h, KW_FILTER)?,
            fovsize: float32(h, KW_FOVSIZE)?,
            bunit: text(h, KW_BUNIT)?,
            naxis1: int32(h, KW_NAXIS1)?,
            naxis2: int32(h, KW_NAXIS2)?,
            extname,
            image: cropped,
        })
    }
}

fn required<'a>(header: &'a FitsHeader, keyword: &str) -> Result<&'a FitsValue, TngError> {
    header
        .get(keyword)
        .ok_or_else(|| TngError::MissingKeyword(keyword.to_string()))
}

fn invalid(keyword: &str, value: &FitsValue) -> TngError {
    TngError::InvalidKeywordValue {
        keyword: keyword.to_string(),
        value: format!("{value:?}"),
    }
}

fn text(header: &FitsHeader, keyword: &str) -> Result<String, TngError> {
    let value = required(header, keyword)?;
    value.to_text().ok_or_else(|| invalid(keyword, value))
}

fn int32(header: &FitsHeader, keyword: &str) -> Result<i32, TngError> {
    let value = required(header, keyword)?;
    value
        .as_i64()
        .and_then(|v| i32::try_from(v).ok())
        .ok_or_else(|| invalid(keyword, value))
}

fn float32(header: &FitsHeader, keyword: &str) -> Result<f32, TngError> {
    let value = required(header, keyword)?;
    value
        .as_f64()
        .map(|v| v as f32)
        .ok_or_else(|| invalid(keyword, value))
}

/// Turns a file path into the ordered records it contains.
pub trait RecordSource {
    fn read_records(&self, path: &Utf8Path) -> Result<FileRecords, TngError>;
}

/// [`RecordSource`] reading TNG FITS files from disk.
///
/// Every image unit is one record, including units whose data cannot be used as a 2D
/// image (cubes, zero-length axes), which become [`TngError::MissingImage`]. Header-only
/// HDUs (an empty primary) and table extensions are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitsRecordSource {
    side: usize,
}

impl FitsRecordSource {
    pub fn new(side: usize) -> Self {
        FitsRecordSource { side }
    }

    pub fn side(&self) -> usize {
        self.side
    }
}

impl Default for FitsRecordSource {
    fn default() -> Self {
        FitsRecordSource::new(IMAGE_SIDE)
    }
}

impl RecordSource for FitsRecordSource {
    fn read_records(&self, path: &Utf8Path) -> Result<FileRecords, TngError> {
        let hdus = read_fits_file(path)?;
        Ok(hdus
            .iter()
            .filter(|hdu| hdu.is_image_unit())
            .map(|hdu| TngRecord::from_hdu(hdu, self.side))
            .collect())
    }
}
