use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::cell::{column_index, parse_cell};
use crate::{IoError, TrajectoryTable};

const FRAME: &str = "frame";
const LABEL: &str = "label";
const X: &str = "x";
const Y: &str = "y";

/// Read a long-format tag file (`frame,label,x,y`) as a wide trajectory table.
pub fn read_tags(path: impl AsRef<Path>) -> Result<TrajectoryTable, IoError> {
    let file = File::open(path.as_ref())?;
    let table = read_tags_from(file)?;
    log::info!(
        "pivoted {} frames x {} labels from {}",
        table.num_rows(),
        table.stems().len(),
        path.as_ref().display()
    );
    Ok(table)
}

/// Pivot long-format tags into one row per frame and one `<label>_x`,
/// `<label>_y` column pair per label.
///
/// Frames are sorted ascending, labels keep their order of first appearance.
/// A later tag for the same frame and label replaces the earlier one.
pub fn read_tags_from<R: Read>(reader: R) -> Result<TrajectoryTable, IoError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let fi = column_index(headers.iter(), FRAME)?;
    let li = column_index(headers.iter(), LABEL)?;
    let xi = column_index(headers.iter(), X)?;
    let yi = column_index(headers.iter(), Y)?;

    let mut labels: Vec<String> = Vec::new();
    let mut frames: BTreeMap<u64, HashMap<String, (f64, f64)>> = BTreeMap::new();

    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let row = i + 1;

        let frame_cell = record.get(fi).unwrap_or("");
        let frame = frame_cell
            .parse::<u64>()
            .map_err(|_| IoError::InvalidNumber {
                row,
                column: FRAME.to_string(),
                value: frame_cell.to_string(),
            })?;
        let label = record.get(li).unwrap_or("");
        if label.is_empty() {
            log::warn!("skipping tag without label at row {row}");
            continue;
        }
        let x = parse_cell(record.get(xi).unwrap_or(""), row, X)?;
        let y = parse_cell(record.get(yi).unwrap_or(""), row, Y)?;
        let (Some(x), Some(y)) = (x, y) else {
            log::warn!("skipping tag without coordinates at row {row}");
            continue;
        };

        if !labels.iter().any(|l| l == label) {
            labels.push(label.to_string());
        }
        frames
            .entry(frame)
            .or_default()
            .insert(label.to_string(), (x, y));
    }

    let mut out_headers = vec![FRAME.to_string()];
    for label in &labels {
        out_headers.push(format!("{label}_x"));
        out_headers.push(format!("{label}_y"));
    }

    let rows = frames
        .into_iter()
        .map(|(frame, tags)| {
            let mut row = vec![frame.to_string()];
            for label in &labels {
                match tags.get(label) {
                    Some((x, y)) => {
                        row.push(x.to_string());
                        row.push(y.to_string());
                    }
                    None => {
                        row.push(String::new());
                        row.push(String::new());
                    }
                }
            }
            row
        })
        .collect();

    Ok(TrajectoryTable::new(out_headers, rows))
}
