#![allow(dead_code)]

use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
    fs,
};

use camino::{Utf8Path, Utf8PathBuf};
use nalgebra::DMatrix;

use tng_dataset::{
    file_pool::FilePool,
    params::BuildParams,
    record::{FileRecords, RecordSource, TngRecord},
    session::GenerationSession,
    tng_errors::TngError,
};

/// Record with a 2×2 image whose pixels all equal `subhalo`.
pub fn record(subhalo: i32, camera: &str) -> TngRecord {
    TngRecord {
        extname: "SUBARU_HSC.G".into(),
        origin: "IllustrisTNG".into(),
        simtag: "TNG50".into(),
        snapnum: 91,
        subhalo,
        camera: camera.into(),
        redshift: 0.05,
        filter: "g".into(),
        fovsize: 100.0,
        bunit: "nJy".into(),
        naxis1: 2,
        naxis2: 2,
        image: DMatrix::from_element(2, 2, subhalo as f32),
    }
}

#[derive(Debug, Clone)]
pub enum MockRecord {
    Good(TngRecord),
    /// Yields `TngError::MissingKeyword(keyword)`
    Malformed(&'static str),
}

/// In-memory [`RecordSource`] counting how often each file is read.
#[derive(Debug, Default)]
pub struct MockSource {
    files: HashMap<Utf8PathBuf, Vec<MockRecord>>,
    unreadable: HashSet<Utf8PathBuf>,
    reads: RefCell<HashMap<Utf8PathBuf, u32>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: &str, records: Vec<MockRecord>) -> Self {
        self.files.insert(Utf8PathBuf::from(path), records);
        self
    }

    pub fn with_unreadable(mut self, path: &str) -> Self {
        self.unreadable.insert(Utf8PathBuf::from(path));
        self
    }

    pub fn paths(&self) -> Vec<Utf8PathBuf> {
        let mut paths: Vec<_> = self.files.keys().chain(&self.unreadable).cloned().collect();
        paths.sort();
        paths
    }

    pub fn reads(&self, path: &str) -> u32 {
        self.reads.borrow().get(Utf8Path::new(path)).copied().unwrap_or(0)
    }

    pub fn total_reads(&self) -> u32 {
        self.reads.borrow().values().sum()
    }
}

impl RecordSource for MockSource {
    fn read_records(&self, path: &Utf8Path) -> Result<FileRecords, TngError> {
        *self.reads.borrow_mut().entry(path.to_owned()).or_insert(0) += 1;

        if self.unreadable.contains(path) {
            return Err(TngError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                path.to_string(),
            )));
        }

        Ok(self
            .files
            .get(path)
            .map(|records| {
                records
                    .iter()
                    .map(|r| match r {
                        MockRecord::Good(record) => Ok(record.clone()),
                        MockRecord::Malformed(keyword) => {
                            Err(TngError::MissingKeyword(keyword.to_string()))
                        }
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Seven good records of one object, cameras cycling through `cameras`.
pub fn same_object_file(subhalo: i32, cameras: &[&str]) -> Vec<MockRecord> {
    (0..7)
        .map(|i| MockRecord::Good(record(subhalo, cameras[i % cameras.len()])))
        .collect()
}

/// Seven good records of seven distinct objects `first..first + 7`.
pub fn distinct_objects_file(first: i32) -> Vec<MockRecord> {
    (first..first + 7)
        .map(|subhalo| MockRecord::Good(record(subhalo, "v0")))
        .collect()
}

pub fn mock_session(source: MockSource, params: BuildParams) -> GenerationSession<MockSource> {
    let pool = FilePool::from_paths(source.paths(), params.extensions_per_file).unwrap();
    GenerationSession::new(pool, source, params).unwrap()
}

// -------------------------------------------------------------------------------------------------
// Synthetic FITS files
// -------------------------------------------------------------------------------------------------

fn push_card(buf: &mut Vec<u8>, text: &str) {
    buf.extend_from_slice(format!("{text:<80}").as_bytes());
}

fn pad(buf: &mut Vec<u8>, fill: u8) {
    let target = buf.len().div_ceil(2880) * 2880;
    buf.resize(target, fill);
}

/// One TNG extension to write: the object and the camera it is seen from.
#[derive(Debug, Clone, Copy)]
pub struct FitsExtension {
    pub subhalo: i32,
    pub camera: &'static str,
    pub side: usize,
}

/// Write a TNG-like FITS file: a header-only primary HDU followed by one `-32` image
/// extension per entry of `extensions`. Pixel `(row, col)` holds `row * side + col`.
pub fn write_tng_fits(dir: &Utf8Path, name: &str, extensions: &[FitsExtension]) -> Utf8PathBuf {
    let mut buf = Vec::new();
    push_card(&mut buf, "SIMPLE  =                    T / conforms to FITS");
    push_card(&mut buf, "BITPIX  =                    8");
    push_card(&mut buf, "NAXIS   =                    0");
    push_card(&mut buf, "EXTEND  =                    T");
    push_card(&mut buf, "END");
    pad(&mut buf, b' ');

    for ext in extensions {
        let side = ext.side;
        push_card(&mut buf, "XTENSION= 'IMAGE   '           / image extension");
        push_card(&mut buf, "BITPIX  =                  -32");
        push_card(&mut buf, "NAXIS   =                    2");
        push_card(&mut buf, &format!("NAXIS1  = {side:>20}"));
        push_card(&mut buf, &format!("NAXIS2  = {side:>20}"));
        push_card(&mut buf, "PCOUNT  =                    0");
        push_card(&mut buf, "GCOUNT  =                    1");
        push_card(&mut buf, "EXTNAME = 'SUBARU_HSC.G'");
        push_card(&mut buf, "ORIGIN  = 'IllustrisTNG'");
        push_card(&mut buf, "SIMTAG  = 'TNG100  '");
        push_card(&mut buf, "SNAPNUM =                   72");
        push_card(&mut buf, &format!("SUBHALO = {:>20}", ext.subhalo));
        push_card(&mut buf, &format!("CAMERA  = '{:<8}'", ext.camera));
        push_card(&mut buf, "REDSHIFT=   0.4004638046511744");
        push_card(&mut buf, "FILTER  = 'SUBARU_HSC.G'");
        push_card(&mut buf, "FOVSIZE =              50000.0");
        push_card(&mut buf, "BUNIT   = 'nanomaggy'");
        push_card(&mut buf, "HISTORY synthetic test image");
        push_card(&mut buf, "END");
        pad(&mut buf, b' ');

        for i in 0..side * side {
            buf.extend_from_slice(&(i as f32).to_be_bytes());
        }
        pad(&mut buf, 0);
    }

    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, buf).unwrap();
    path
}

/// Seven extensions of one object, cameras `v0..v6`.
pub fn seven_views(subhalo: i32, side: usize) -> Vec<FitsExtension> {
    const CAMERAS: [&str; 7] = ["v0", "v1", "v2", "v3", "v4", "v5", "v6"];
    CAMERAS
        .iter()
        .map(|&camera| FitsExtension {
            subhalo,
            camera,
            side,
        })
        .collect()
}

pub fn utf8_tempdir() -> (tempfile::TempDir, Utf8PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
    (dir, path)
}
