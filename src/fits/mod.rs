//! # Minimal multi-HDU FITS reader
//!
//! Just enough of the FITS standard to turn a TNG mock-observation file into a list of
//! header/data units (HDUs).
//!
//! ## Layout handled
//! -----------------
//! ```text
//! ┌──────────── HDU 0 (primary) ────────────┐┌──────── HDU 1 (XTENSION='IMAGE') ───────┐
//! │ header: 80-char cards … END, padded    ││ header …                                 │ …
//! │ data:   |BITPIX|/8 × ΠNAXISn, padded   ││ data …                                   │
//! └─────────────────────────────────────────┘└──────────────────────────────────────────┘
//! ```
//! Every header and data unit is padded to a multiple of 2880 bytes. The data size of an
//! HDU is `|BITPIX|/8 × GCOUNT × (PCOUNT + NAXIS1 × … × NAXISn)`, which also covers
//! binary-table extensions so they can be skipped.
//!
//! ## Image decoding
//! -----------------
//! Only 2D image HDUs (primary or `XTENSION = 'IMAGE'`) keep their data, as a
//! [`FitsImage`] holding the big-endian bytes. Pixels are decoded on demand by
//! [`FitsImage::crop_top_left`], which applies `BSCALE`/`BZERO` and casts to `f32`.
//! Supported `BITPIX`: `8`, `16`, `32`, `64`, `-32`, `-64`.
//!
//! ## Errors
//! -----------------
//! Structural problems are reported as [`FitsError`] and wrapped with the file path into
//! [`TngError::FitsFile`](crate::tng_errors::TngError::FitsFile) by [`read_fits_file`].
pub mod header;

use camino::Utf8Path;
use nalgebra::DMatrix;
use thiserror::Error;

use crate::{
    constants::{Image, CARDS_PER_BLOCK, FITS_BLOCK, FITS_CARD, MAX_NAXIS},
    tng_errors::TngError,
};

pub use header::{FitsHeader, FitsValue};
use header::{parse_card, Card};

/// Structural errors found while walking a FITS byte stream.
#[derive(Error, Debug, PartialEq)]
pub enum FitsError {
    #[error("The file ends in the middle of a header or data unit")]
    Truncated,
    #[error("The file is empty")]
    Empty,
    #[error("A header card contains non-ASCII bytes")]
    NonAsciiCard,
    #[error("Unparsable header card: {0}")]
    InvalidCard(String),
    #[error("Mandatory structural keyword missing: {0}")]
    MissingStructuralKeyword(String),
    #[error("Unsupported BITPIX value: {0}")]
    UnsupportedBitpix(i64),
    #[error("Invalid axis length for {0}")]
    InvalidAxis(String),
}

/// Pixel encoding of an image HDU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bitpix {
    U8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl Bitpix {
    pub fn from_header_value(value: i64) -> Result<Self, FitsError> {
        match value {
            8 => Ok(Bitpix::U8),
            16 => Ok(Bitpix::I16),
            32 => Ok(Bitpix::I32),
            64 => Ok(Bitpix::I64),
            -32 => Ok(Bitpix::F32),
            -64 => Ok(Bitpix::F64),
            other => Err(FitsError::UnsupportedBitpix(other)),
        }
    }

    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            Bitpix::U8 => 1,
            Bitpix::I16 => 2,
            Bitpix::I32 | Bitpix::F32 => 4,
            Bitpix::I64 | Bitpix::F64 => 8,
        }
    }

    #[inline]
    fn decode(&self, raw: &[u8]) -> f64 {
        match self {
            Bitpix::U8 => raw[0] as f64,
            Bitpix::I16 => i16::from_be_bytes([raw[0], raw[1]]) as f64,
            Bitpix::I32 => i32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]) as f64,
            Bitpix::I64 => i64::from_be_bytes([
                raw[0], raw[1], raw[2], raw[3], raw[4], raw[5], raw[6], raw[7],
            ]) as f64,
            Bitpix::F32 => f32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]) as f64,
            Bitpix::F64 => f64::from_be_bytes([
                raw[0], raw[1], raw[2], raw[3], raw[4], raw[5], raw[6], raw[7],
            ]),
        }
    }
}

/// Raw 2D image of one HDU, still big-endian.
#[derive(Debug, Clone, PartialEq)]
pub struct FitsImage {
    /// Fastest-varying axis (columns)
    pub naxis1: usize,
    /// Slowest-varying axis (rows)
    pub naxis2: usize,
    pub bitpix: Bitpix,
    pub bscale: f64,
    pub bzero: f64,
    data: Vec<u8>,
}

impl FitsImage {
    /// Physical value of pixel `(row, col)`, `row < naxis2`, `col < naxis1`.
    pub fn pixel(&self, row: usize, col: usize) -> f64 {
        let bpp = self.bitpix.bytes_per_pixel();
        let offset = (row * self.naxis1 + col) * bpp;
        self.bzero + self.bscale * self.bitpix.decode(&self.data[offset..offset + bpp])
    }

    /// Copy the top-left `side × side` window as `f32`.
    ///
    /// Return
    /// ----------
    /// * `None` if the image is smaller than `side` along either axis.
    pub fn crop_top_left(&self, side: usize) -> Option<Image> {
        if self.naxis1 < side || self.naxis2 < side {
            return None;
        }
        Some(DMatrix::from_fn(side, side, |row, col| {
            self.pixel(row, col) as f32
        }))
    }
}

/// One header/data unit.
#[derive(Debug, Clone, PartialEq)]
pub struct FitsHdu {
    pub header: FitsHeader,
    /// `Some` only for 2D image HDUs with data
    pub image: Option<FitsImage>,
}

impl FitsHdu {
    /// Primary or `XTENSION = 'IMAGE'` unit declaring at least one axis.
    ///
    /// True even when [`image`](Self::image) is `None` (cubes, zero-length axes): such
    /// units were meant to hold an image and are not simply header-only.
    pub fn is_image_unit(&self) -> bool {
        let image_kind = match self.header.get_str("XTENSION") {
            None => true,
            Some(kind) => kind == "IMAGE",
        };
        image_kind && self.header.get_i64("NAXIS").is_some_and(|naxis| naxis > 0)
    }
}

fn pad_to_block(len: usize) -> usize {
    len.div_ceil(FITS_BLOCK) * FITS_BLOCK
}

fn structural_i64(header: &FitsHeader, keyword: &str) -> Result<i64, FitsError> {
    header
        .get_i64(keyword)
        .ok_or_else(|| FitsError::MissingStructuralKeyword(keyword.to_string()))
}

fn optional_count(header: &FitsHeader, keyword: &str, default: usize) -> Result<usize, FitsError> {
    match header.get_i64(keyword) {
        None => Ok(default),
        Some(value) => usize::try_from(value).map_err(|_| FitsError::InvalidAxis(keyword.to_string())),
    }
}

/// `|BITPIX|/8 × GCOUNT × (PCOUNT + NAXIS1 × … × NAXISn)`, `None` on overflow.
fn data_unit_len(bitpix: i64, pcount: usize, gcount: usize, axes: &[usize]) -> Option<usize> {
    if axes.is_empty() {
        return Some(0);
    }
    let values = axes.iter().try_fold(1usize, |acc, &len| acc.checked_mul(len))?;
    let bytes_per_value = usize::try_from(bitpix.unsigned_abs() / 8).ok()?;
    values
        .checked_add(pcount)?
        .checked_mul(gcount)?
        .checked_mul(bytes_per_value)
}

/// Parse the header starting at `offset`; return it with the offset of the data unit.
fn read_header(bytes: &[u8], mut offset: usize) -> Result<(FitsHeader, usize), FitsError> {
    let mut header = FitsHeader::new();
    loop {
        let block = bytes
            .get(offset..offset + FITS_BLOCK)
            .ok_or(FitsError::Truncated)?;
        offset += FITS_BLOCK;

        for i in 0..CARDS_PER_BLOCK {
            match parse_card(&block[i * FITS_CARD..(i + 1) * FITS_CARD])? {
                Card::End => return Ok((header, offset)),
                Card::Value(keyword, value) => header.insert(&keyword, value),
                Card::Commentary => {}
            }
        }
    }
}

/// Walk every HDU of an in-memory FITS file.
///
/// Arguments
/// -----------------
/// * `bytes`: the complete file content.
///
/// Return
/// ----------
/// * The HDUs in file order, primary first.
/// * A [`FitsError`] on truncated units, unparsable cards or unsupported encodings.
pub fn read_hdus(bytes: &[u8]) -> Result<Vec<FitsHdu>, FitsError> {
    if bytes.is_empty() {
        return Err(FitsError::Empty);
    }

    let mut hdus = Vec::new();
    let mut offset = 0;

    while offset < bytes.len() {
        let (header, data_start) = read_header(bytes, offset)?;

        let bitpix_value = structural_i64(&header, "BITPIX")?;
        let naxis = structural_i64(&header, "NAXIS")?;
        if !(0..=MAX_NAXIS).contains(&naxis) {
            return Err(FitsError::InvalidAxis("NAXIS".into()));
        }

        let mut axes = Vec::with_capacity(naxis as usize);
        for n in 1..=naxis {
            let keyword = format!("NAXIS{n}");
            let len = structural_i64(&header, &keyword)?;
            let len = usize::try_from(len).map_err(|_| FitsError::InvalidAxis(keyword))?;
            axes.push(len);
        }

        let pcount = optional_count(&header, "PCOUNT", 0)?;
        let gcount = optional_count(&header, "GCOUNT", 1)?.max(1);
        let data_len = data_unit_len(bitpix_value, pcount, gcount, &axes)
            .ok_or_else(|| FitsError::InvalidAxis("data unit size".into()))?;

        let data = data_start
            .checked_add(data_len)
            .and_then(|data_end| bytes.get(data_start..data_end))
            .ok_or(FitsError::Truncated)?;

        let is_image = match header.get_str("XTENSION") {
            None => offset == 0,
            Some(kind) => kind == "IMAGE",
        };

        let image = if is_image && axes.len() == 2 && data_len > 0 {
            Some(FitsImage {
                naxis1: axes[0],
                naxis2: axes[1],
                bitpix: Bitpix::from_header_value(bitpix_value)?,
                bscale: header.get_f64("BSCALE").unwrap_or(1.0),
                bzero: header.get_f64("BZERO").unwrap_or(0.0),
                data: data.to_vec(),
            })
        } else {
            None
        };

        hdus.push(FitsHdu { header, image });
        offset = data_start + pad_to_block(data_len);
    }

    Ok(hdus)
}

/// Read and walk a FITS file from disk.
pub fn read_fits_file(path: &Utf8Path) -> Result<Vec<FitsHdu>, TngError> {
    let bytes = std::fs::read(path)?;
    read_hdus(&bytes).map_err(|source| TngError::FitsFile {
        path: path.to_string(),
        source,
    })
}
