use std::fs::File;
use std::io::Read;
use std::path::Path;

use courtmap_geometry::{Correspondence, Point2d};
use serde::{Deserialize, Serialize};

use crate::cell::{column_index, parse_cell};
use crate::IoError;

/// Column names of the correspondence table.
///
/// The defaults match the court tagger output `Point,X,Y,GrX,GrY`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrespondenceColumns {
    /// Pixel x coordinate.
    pub pixel_x: String,
    /// Pixel y coordinate.
    pub pixel_y: String,
    /// World x coordinate.
    pub world_x: String,
    /// World y coordinate.
    pub world_y: String,
}

impl Default for CorrespondenceColumns {
    fn default() -> Self {
        Self {
            pixel_x: "X".to_string(),
            pixel_y: "Y".to_string(),
            world_x: "GrX".to_string(),
            world_y: "GrY".to_string(),
        }
    }
}

/// Read correspondences from a CSV file.
///
/// Rows with an empty coordinate (a point that was never tagged) are skipped.
pub fn read_correspondences(
    path: impl AsRef<Path>,
    columns: &CorrespondenceColumns,
) -> Result<Vec<Correspondence>, IoError> {
    let file = File::open(path.as_ref())?;
    let correspondences = read_correspondences_from(file, columns)?;
    log::info!(
        "read {} correspondences from {}",
        correspondences.len(),
        path.as_ref().display()
    );
    Ok(correspondences)
}

/// Read correspondences from any CSV source.
pub fn read_correspondences_from<R: Read>(
    reader: R,
    columns: &CorrespondenceColumns,
) -> Result<Vec<Correspondence>, IoError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let names = [
        columns.pixel_x.as_str(),
        columns.pixel_y.as_str(),
        columns.world_x.as_str(),
        columns.world_y.as_str(),
    ];
    let mut idx = [0usize; 4];
    for (slot, name) in idx.iter_mut().zip(names) {
        *slot = column_index(headers.iter(), name)?;
    }

    let mut out = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let row = i + 1;

        let mut values = [None; 4];
        for (k, (&col, name)) in idx.iter().zip(names).enumerate() {
            values[k] = parse_cell(record.get(col).unwrap_or(""), row, name)?;
        }

        match values {
            [Some(x), Some(y), Some(gx), Some(gy)] => out.push(Correspondence {
                source: Point2d::new(x, y),
                target: Point2d::new(gx, gy),
            }),
            _ => log::warn!("skipping incomplete correspondence at row {row}"),
        }
    }

    Ok(out)
}
