//! Ordered annotation list with CSV persistence
//!
//! Rows are `x,y,z,label` under a fixed header. Columns are looked up by
//! header name on load, so stores written by other tools with extra or
//! reordered columns still read.

use std::fmt;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};

use super::errors::{StoreError, StoreResult};

/// Header row of every store file
pub const STORE_HEADER: [&str; 4] = ["x", "y", "z", "label"];

/// Integer voxel coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl Point {
    pub fn new(x: i64, y: i64, z: i64) -> Self {
        Point { x, y, z }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// A labelled point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub point: Point,
    pub label: String,
}

/// Annotations of one volume in confirmation order
///
/// The last appended annotation is the first one removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationStore {
    annotations: Vec<Annotation>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_annotations(annotations: Vec<Annotation>) -> Self {
        AnnotationStore { annotations }
    }

    pub fn append(&mut self, point: Point, label: String) {
        self.annotations.push(Annotation { point, label });
    }

    pub fn pop_last(&mut self) -> Option<Annotation> {
        self.annotations.pop()
    }

    pub fn last(&self) -> Option<&Annotation> {
        self.annotations.last()
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn clear(&mut self) {
        self.annotations.clear();
    }

    /// Writes all annotations to `path`, replacing the file
    pub fn save(&self, path: &Path) -> StoreResult<()> {
        let writer = csv::Writer::from_path(path)?;
        self.write_rows(writer)?;
        info!("Saved {} annotations to {}", self.len(), path.display());
        Ok(())
    }

    /// Writes all annotations as CSV into `sink`
    pub fn save_to<W: Write>(&self, sink: W) -> StoreResult<()> {
        self.write_rows(csv::Writer::from_writer(sink))
    }

    fn write_rows<W: Write>(&self, mut writer: csv::Writer<W>) -> StoreResult<()> {
        writer.write_record(STORE_HEADER)?;
        for annotation in &self.annotations {
            let Point { x, y, z } = annotation.point;
            writer.write_record([
                x.to_string(),
                y.to_string(),
                z.to_string(),
                annotation.label.clone(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Reads a store file
    ///
    /// Any row whose x, y or z is not an integer aborts the whole load.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)?;
        let store = Self::read_rows(reader)?;
        info!("Loaded {} annotations from {}", store.len(), path.display());
        Ok(store)
    }

    /// Reads CSV rows from `source`
    pub fn load_from<R: Read>(source: R) -> StoreResult<Self> {
        let reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(source);
        Self::read_rows(reader)
    }

    fn read_rows<R: Read>(mut reader: csv::Reader<R>) -> StoreResult<Self> {
        let headers = reader.headers()?.clone();
        let column = |name: &'static str| {
            headers.iter()
                .position(|h| h.trim() == name)
                .ok_or(StoreError::MissingColumn(name))
        };
        let (x_col, y_col, z_col, label_col) = (column("x")?, column("y")?, column("z")?, column("label")?);
        debug!("Store columns: x={}, y={}, z={}, label={}", x_col, y_col, z_col, label_col);

        let mut annotations = Vec::new();
        for result in reader.records() {
            let record = result?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);

            let coordinate = |col: usize, name: &str| -> StoreResult<i64> {
                let text = record.get(col).ok_or_else(|| StoreError::Corrupt {
                    line,
                    reason: format!("missing {} value", name),
                })?;
                text.trim().parse::<i64>().map_err(|_| StoreError::Corrupt {
                    line,
                    reason: format!("{} value '{}' is not an integer", name, text),
                })
            };

            let point = Point::new(coordinate(x_col, "x")?, coordinate(y_col, "y")?, coordinate(z_col, "z")?);
            let label = record.get(label_col)
                .ok_or_else(|| StoreError::Corrupt { line, reason: "missing label".to_string() })?
                .to_string();

            annotations.push(Annotation { point, label });
        }

        Ok(AnnotationStore { annotations })
    }
}

/// Store path used by the interactive session
///
/// The volume's extension is replaced: `cube.tif` becomes `cube_labels.csv`
/// for the default suffix.
pub fn session_store_path(volume_path: &Path, suffix: &str) -> PathBuf {
    let stem = volume_path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    volume_path.with_file_name(format!("{}{}", stem, suffix))
}
