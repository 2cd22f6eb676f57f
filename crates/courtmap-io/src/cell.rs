use crate::IoError;

/// Parse a numeric cell. Empty and NaN cells are missing values.
pub(crate) fn parse_cell(value: &str, row: usize, column: &str) -> Result<Option<f64>, IoError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_nan() => Ok(None),
        Ok(v) => Ok(Some(v)),
        Err(_) => Err(IoError::InvalidNumber {
            row,
            column: column.to_string(),
            value: trimmed.to_string(),
        }),
    }
}

/// Position of `name` in `headers`.
pub(crate) fn column_index<'a, I>(headers: I, name: &str) -> Result<usize, IoError>
where
    I: IntoIterator<Item = &'a str>,
{
    headers
        .into_iter()
        .position(|h| h == name)
        .ok_or_else(|| IoError::MissingColumn(name.to_string()))
}
