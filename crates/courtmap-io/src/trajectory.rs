use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use courtmap_geometry::{CoordinateStream, CoordinateTable, Point2d, TransformedTable};

use crate::cell::parse_cell;
use crate::IoError;

const X_SUFFIX: &str = "_x";
const Y_SUFFIX: &str = "_y";

/// A wide trajectory CSV held verbatim.
///
/// Every pair of `<name>_x` / `<name>_y` columns is one coordinate stream.
/// Other columns (frame numbers, notes, ...) are kept as-is so that writing
/// the table back only adds the transformed companion columns.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrajectoryTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TrajectoryTable {
    /// Build a table from headers and rows. Short rows are padded with empty cells.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut r| {
                r.resize(width.max(r.len()), String::new());
                r
            })
            .collect();
        Self { headers, rows }
    }

    /// Read a trajectory CSV file.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let file = File::open(path.as_ref())?;
        let table = Self::read_from(file)?;
        log::info!(
            "read {} rows x {} columns from {}",
            table.rows.len(),
            table.headers.len(),
            path.as_ref().display()
        );
        Ok(table)
    }

    /// Read a trajectory CSV from any source.
    pub fn read_from<R: Read>(reader: R) -> Result<Self, IoError> {
        let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers = rdr.headers()?.iter().map(str::to_string).collect();
        let rows = rdr
            .records()
            .map(|r| r.map(|r| r.iter().map(str::to_string).collect()))
            .collect::<Result<Vec<Vec<String>>, _>>()?;
        Ok(Self::new(headers, rows))
    }

    /// Column names.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Raw cells, row by row.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows (frames).
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Sorted names of every `<name>_x` column that has a matching `<name>_y`.
    pub fn stems(&self) -> Vec<String> {
        let mut stems = self
            .headers
            .iter()
            .filter_map(|h| h.strip_suffix(X_SUFFIX))
            .filter(|stem| !stem.is_empty() && self.position(&format!("{stem}{Y_SUFFIX}")).is_some())
            .map(str::to_string)
            .collect::<Vec<_>>();
        stems.sort();
        stems.dedup();
        stems
    }

    /// Parse every column pair into a coordinate stream.
    ///
    /// A frame is missing for a stream when either of its cells is empty.
    pub fn coordinate_table(&self) -> Result<CoordinateTable, IoError> {
        let stems = self.stems();
        if stems.is_empty() {
            return Err(IoError::NoStreams);
        }

        let mut table = CoordinateTable::new();
        for stem in stems {
            let x_name = format!("{stem}{X_SUFFIX}");
            let y_name = format!("{stem}{Y_SUFFIX}");
            let (xi, yi) = match (self.position(&x_name), self.position(&y_name)) {
                (Some(xi), Some(yi)) => (xi, yi),
                _ => return Err(IoError::MissingColumn(x_name)),
            };

            let mut points = Vec::with_capacity(self.rows.len());
            for (i, row) in self.rows.iter().enumerate() {
                let x = parse_cell(&row[xi], i + 1, &x_name)?;
                let y = parse_cell(&row[yi], i + 1, &y_name)?;
                points.push(match (x, y) {
                    (Some(x), Some(y)) => Some(Point2d::new(x, y)),
                    _ => None,
                });
            }
            table.insert(CoordinateStream::new(stem, points));
        }
        Ok(table)
    }

    /// A copy of this table with `<name>_x_<suffix>` / `<name>_y_<suffix>`
    /// columns holding the transformed streams.
    ///
    /// Existing companion columns are overwritten in place, new ones are
    /// appended. Missing and invalid entries are written as empty cells.
    pub fn with_transformed(&self, transformed: &TransformedTable, suffix: &str) -> Self {
        let mut out = self.clone();
        for stream in transformed.iter() {
            let xi = out.ensure_column(format!("{}{X_SUFFIX}_{suffix}", stream.name));
            let yi = out.ensure_column(format!("{}{Y_SUFFIX}_{suffix}", stream.name));

            let points = stream.valid_points();
            for (row, point) in out.rows.iter_mut().zip(points.iter().chain(std::iter::repeat(&None))) {
                let (x, y) = match point {
                    Some(p) => (p.x.to_string(), p.y.to_string()),
                    None => (String::new(), String::new()),
                };
                row[xi] = x;
                row[yi] = y;
            }
        }
        out
    }

    /// Write the table to a CSV file.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        let file = File::create(path.as_ref())?;
        self.write_to(file)?;
        log::info!("wrote {} rows to {}", self.rows.len(), path.as_ref().display());
        Ok(())
    }

    /// Write the table as CSV to any sink.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), IoError> {
        let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(writer);
        wtr.write_record(&self.headers)?;
        for row in &self.rows {
            wtr.write_record(row)?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    fn ensure_column(&mut self, name: String) -> usize {
        if let Some(i) = self.position(&name) {
            return i;
        }
        self.headers.push(name);
        for row in &mut self.rows {
            row.push(String::new());
        }
        self.headers.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courtmap_geometry::{transform_table, Homography};

    const SAMPLE: &str = "frame,left_knee_x,left_knee_y,ball_x,ball_y,note\n\
                          0,10,20,5,5,serve\n\
                          1,,,6,7,\n\
                          2,12,24,,,out\n";

    #[test]
    fn test_stems_sorted() -> Result<(), IoError> {
        let table = TrajectoryTable::read_from(SAMPLE.as_bytes())?;
        assert_eq!(table.stems(), vec!["ball".to_string(), "left_knee".to_string()]);
        assert_eq!(table.num_rows(), 3);
        Ok(())
    }

    #[test]
    fn test_coordinate_table() -> Result<(), IoError> {
        let table = TrajectoryTable::read_from(SAMPLE.as_bytes())?.coordinate_table()?;
        let knee = table.get("left_knee").ok_or(IoError::NoStreams)?;
        assert_eq!(
            knee.points,
            vec![Some(Point2d::new(10.0, 20.0)), None, Some(Point2d::new(12.0, 24.0))]
        );
        let ball = table.get("ball").ok_or(IoError::NoStreams)?;
        assert_eq!(ball.points[2], None);
        Ok(())
    }

    #[test]
    fn test_no_streams() -> Result<(), IoError> {
        let table = TrajectoryTable::read_from("frame,x,y\n0,1,2\n".as_bytes())?;
        assert!(matches!(table.coordinate_table(), Err(IoError::NoStreams)));
        Ok(())
    }

    #[test]
    fn test_with_transformed_keeps_unrelated_columns() -> Result<(), Box<dyn std::error::Error>> {
        let table = TrajectoryTable::read_from(SAMPLE.as_bytes())?;
        let h = Homography::try_from_array([[0.5, 0.0, 0.0], [0.0, 0.5, 0.0], [0.0, 0.0, 1.0]])?;
        let transformed = transform_table(&h, &table.coordinate_table()?);
        let out = table.with_transformed(&transformed, "meters");

        assert_eq!(&out.headers()[..6], table.headers());
        assert_eq!(
            &out.headers()[6..],
            ["ball_x_meters", "ball_y_meters", "left_knee_x_meters", "left_knee_y_meters"]
        );
        assert_eq!(out.rows()[0][5], "serve");
        assert_eq!(out.rows()[0][6..], ["2.5", "2.5", "5", "10"]);
        assert_eq!(out.rows()[1][8..], ["", ""]);
        assert_eq!(out.rows()[2][6..8], ["", ""]);

        // applying twice overwrites rather than duplicating
        let again = out.with_transformed(&transformed, "meters");
        assert_eq!(again.headers().len(), out.headers().len());
        assert_eq!(again, out);
        Ok(())
    }
}
