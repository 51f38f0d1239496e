//! # Dataset description and materialization
//!
//! Accepted records leave the sampling driver as [`Example`]s (a unique key plus the
//! record) and are handed to a [`DatasetSink`].
//!
//! Two sinks are provided:
//!
//! * [`MemorySink`] keeps the examples in memory, grouped by split.
//! * [`DirectoryWriter`] lays the dataset out on disk:
//!
//! ```text
//! <root>/
//! ├── dataset_info.json            name, version, feature schema, split sizes
//! ├── train/
//! │   ├── metadata.csv             one row per example: key + header features
//! │   └── images/<key>.f32         side × side little-endian f32, row-major
//! ├── validation/ …
//! └── test/ …
//! ```
//!
//! The declared schema ([`DatasetInfo::features`]) is the contract consumers rely on:
//! the `img` tensor plus twelve scalar header features.
use std::{
    collections::{hash_map::Entry, BTreeMap, HashMap},
    fs::{self, File},
    io::{BufWriter, Write},
};

use ahash::RandomState;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    constants::{
        DATASET_CITATION, DATASET_DESCRIPTION, DATASET_HOMEPAGE, DATASET_NAME, DATASET_VERSION,
        KW_BUNIT, KW_CAMERA, KW_EXTNAME, KW_FILTER, KW_FOVSIZE, KW_NAXIS1, KW_NAXIS2, KW_ORIGIN,
        KW_REDSHIFT, KW_SIMTAG, KW_SNAPNUM, KW_SUBHALO,
    },
    record::TngRecord,
    split::Split,
    tng_errors::TngError,
};

/// One emitted example.
#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    /// Unique within a generation session, e.g. `train-000042`
    pub key: String,
    pub record: TngRecord,
}

impl Example {
    pub fn new(key: impl Into<String>, record: TngRecord) -> Self {
        Example {
            key: key.into(),
            record,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureDType {
    Float32,
    Int32,
    #[serde(rename = "string")]
    Text,
}

/// Declared feature of the dataset schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Feature {
    pub name: &'static str,
    pub dtype: FeatureDType,
    /// Tensor shape, `None` for scalars
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<[usize; 2]>,
}

impl Feature {
    const fn scalar(name: &'static str, dtype: FeatureDType) -> Self {
        Feature {
            name,
            dtype,
            shape: None,
        }
    }
}

/// Dataset-level metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    pub homepage: &'static str,
    pub citation: &'static str,
    pub features: Vec<Feature>,
    /// Number of examples written per split, filled when a build completes
    pub splits: BTreeMap<Split, u64>,
}

impl DatasetInfo {
    /// Metadata for images cropped to `image_side × image_side`.
    pub fn new(image_side: usize) -> Self {
        use FeatureDType::{Float32, Int32, Text};

        let features = vec![
            Feature {
                name: "img",
                dtype: Float32,
                shape: Some([image_side, image_side]),
            },
            Feature::scalar(KW_EXTNAME, Text),
            Feature::scalar(KW_ORIGIN, Text),
            Feature::scalar(KW_SIMTAG, Text),
            Feature::scalar(KW_SNAPNUM, Int32),
            Feature::scalar(KW_SUBHALO, Int32),
            Feature::scalar(KW_CAMERA, Text),
            Feature::scalar(KW_REDSHIFT, Float32),
            Feature::scalar(KW_FILTER, Text),
            Feature::scalar(KW_FOVSIZE, Float32),
            Feature::scalar(KW_BUNIT, Text),
            Feature::scalar(KW_NAXIS1, Int32),
            Feature::scalar(KW_NAXIS2, Int32),
        ];

        DatasetInfo {
            name: DATASET_NAME,
            version: DATASET_VERSION,
            description: DATASET_DESCRIPTION,
            homepage: DATASET_HOMEPAGE,
            citation: DATASET_CITATION,
            features,
            splits: BTreeMap::new(),
        }
    }

    pub fn feature(&self, name: &str) -> Option<&Feature> {
        self.features.iter().find(|f| f.name == name)
    }
}

/// Consumer of generated examples.
pub trait DatasetSink {
    fn write_example(&mut self, split: Split, example: Example) -> Result<(), TngError>;

    /// Called once after the last split.
    fn finish(&mut self) -> Result<(), TngError> {
        Ok(())
    }
}

/// Examples kept in memory, per split.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    examples: BTreeMap<Split, Vec<Example>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn examples(&self, split: Split) -> &[Example] {
        self.examples.get(&split).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.examples.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_examples(self) -> BTreeMap<Split, Vec<Example>> {
        self.examples
    }
}

impl DatasetSink for MemorySink {
    fn write_example(&mut self, split: Split, example: Example) -> Result<(), TngError> {
        self.examples.entry(split).or_default().push(example);
        Ok(())
    }
}

/// Row of `metadata.csv`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "UPPERCASE")]
struct MetadataRow<'a> {
    key: &'a str,
    extname: &'a str,
    origin: &'a str,
    simtag: &'a str,
    snapnum: i32,
    subhalo: i32,
    camera: &'a str,
    redshift: f32,
    filter: &'a str,
    fovsize: f32,
    bunit: &'a str,
    naxis1: i32,
    naxis2: i32,
    image: &'a str,
}

/// [`DatasetSink`] writing the on-disk layout described in the module documentation.
pub struct DirectoryWriter {
    root: Utf8PathBuf,
    info: DatasetInfo,
    writers: HashMap<Split, csv::Writer<File>, RandomState>,
}

impl DirectoryWriter {
    /// Create `root` (and parents) if needed.
    pub fn create(root: &Utf8Path, image_side: usize) -> Result<Self, TngError> {
        fs::create_dir_all(root)?;
        Ok(DirectoryWriter {
            root: root.to_owned(),
            info: DatasetInfo::new(image_side),
            writers: HashMap::default(),
        })
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn split_dir(&self, split: Split) -> Utf8PathBuf {
        self.root.join(split.as_str())
    }

    pub fn info(&self) -> &DatasetInfo {
        &self.info
    }

    fn metadata_writer(&mut self, split: Split) -> Result<&mut csv::Writer<File>, TngError> {
        match self.writers.entry(split) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let dir = self.root.join(split.as_str());
                fs::create_dir_all(dir.join("images"))?;
                let writer = csv::Writer::from_path(dir.join("metadata.csv"))?;
                debug!(%split, dir = %dir, "split directory created");
                Ok(entry.insert(writer))
            }
        }
    }
}

fn write_image(path: &Utf8Path, record: &TngRecord) -> Result<(), TngError> {
    let mut out = BufWriter::new(File::create(path)?);
    for row in record.image.row_iter() {
        for value in row.iter() {
            out.write_all(&value.to_le_bytes())?;
        }
    }
    out.flush()?;
    Ok(())
}

impl DatasetSink for DirectoryWriter {
    fn write_example(&mut self, split: Split, example: Example) -> Result<(), TngError> {
        let image_rel = format!("images/{}.f32", example.key);
        let image_path = self.split_dir(split).join(&image_rel);
        let r = &example.record;

        // the row only references images already on disk
        let writer = self.metadata_writer(split)?;
        write_image(&image_path, r)?;
        writer.serialize(MetadataRow {
            key: &example.key,
            extname: &r.extname,
            origin: &r.origin,
            simtag: &r.simtag,
            snapnum: r.snapnum,
            subhalo: r.subhalo,
            camera: &r.camera,
            redshift: r.redshift,
            filter: &r.filter,
            fovsize: r.fovsize,
            bunit: &r.bunit,
            naxis1: r.naxis1,
            naxis2: r.naxis2,
            image: &image_rel,
        })?;

        *self.info.splits.entry(split).or_insert(0) += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), TngError> {
        for writer in self.writers.values_mut() {
            writer.flush()?;
        }
        for split in Split::ALL {
            self.info.splits.entry(split).or_insert(0);
        }

        let info_path = self.root.join("dataset_info.json");
        let mut file = BufWriter::new(File::create(&info_path)?);
        serde_json::to_writer_pretty(&mut file, &self.info)?;
        file.flush()?;

        info!(root = %self.root, splits = ?self.info.splits, "dataset written");
        Ok(())
    }
}
