use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use courtmap_geometry::Homography;

use crate::IoError;

/// Save a homography as a row-major JSON matrix.
pub fn save_homography(path: impl AsRef<Path>, homography: &Homography) -> Result<(), IoError> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    serde_json::to_writer_pretty(&mut writer, homography)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    log::info!("saved homography to {}", path.as_ref().display());
    Ok(())
}

/// Load a homography saved by [`save_homography`].
///
/// The matrix is validated on load; a singular matrix is rejected.
pub fn load_homography(path: impl AsRef<Path>) -> Result<Homography, IoError> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    let matrix: [[f64; 3]; 3] = serde_json::from_reader(reader)?;
    Ok(Homography::try_from_array(matrix)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use courtmap_geometry::HomographyError;

    #[test]
    fn test_save_load() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("court.json");

        let h = Homography::try_from_array([
            [0.0213, -0.0041, -8.31],
            [0.0009, 0.0517, -17.2],
            [0.00002, 0.00131, 1.0],
        ])?;
        save_homography(&path, &h)?;
        assert_eq!(load_homography(&path)?, h);
        Ok(())
    }

    #[test]
    fn test_load_singular() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "[[1, 2, 3], [2, 4, 6], [0, 0, 1]]")?;
        assert!(matches!(
            load_homography(&path),
            Err(IoError::Homography(HomographyError::SingularResult { .. }))
        ));
        Ok(())
    }
}
