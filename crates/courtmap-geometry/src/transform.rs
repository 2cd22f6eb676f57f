use rayon::prelude::*;

use crate::{Homography, Point2d, TransformError};

/// Outcome of transforming one point.
pub type TransformedPoint = Result<Point2d, TransformError>;

/// A named trajectory in pixel space: one optional detection per frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CoordinateStream {
    /// Name of the tracked entity (e.g. a joint or tag label).
    pub name: String,
    /// Per-frame points, `None` where the entity was not detected.
    pub points: Vec<Option<Point2d>>,
}

impl CoordinateStream {
    /// Create a stream.
    pub fn new(name: impl Into<String>, points: Vec<Option<Point2d>>) -> Self {
        Self {
            name: name.into(),
            points,
        }
    }

    /// Number of frames in the stream.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the stream has no frames.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// A set of streams over the same frame domain, in insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CoordinateTable {
    streams: Vec<CoordinateStream>,
}

impl CoordinateTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stream, replacing any stream with the same name in place.
    pub fn insert(&mut self, stream: CoordinateStream) {
        match self.streams.iter_mut().find(|s| s.name == stream.name) {
            Some(existing) => *existing = stream,
            None => self.streams.push(stream),
        }
    }

    /// Look up a stream by name.
    pub fn get(&self, name: &str) -> Option<&CoordinateStream> {
        self.streams.iter().find(|s| s.name == name)
    }

    /// Iterate the streams in order.
    pub fn iter(&self) -> std::slice::Iter<'_, CoordinateStream> {
        self.streams.iter()
    }

    /// Number of streams.
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    /// Whether the table has no streams.
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}

impl FromIterator<CoordinateStream> for CoordinateTable {
    fn from_iter<I: IntoIterator<Item = CoordinateStream>>(iter: I) -> Self {
        let mut table = Self::new();
        for stream in iter {
            table.insert(stream);
        }
        table
    }
}

/// A stream after transformation. Missing entries stay `None`; entries that
/// could not be mapped carry their error.
#[derive(Clone, Debug, PartialEq)]
pub struct TransformedStream {
    /// Name of the source stream.
    pub name: String,
    /// Per-frame results aligned with the source stream.
    pub points: Vec<Option<TransformedPoint>>,
}

impl TransformedStream {
    /// Number of entries that failed to transform.
    pub fn invalid_count(&self) -> usize {
        self.points
            .iter()
            .filter(|p| matches!(p, Some(Err(_))))
            .count()
    }

    /// Per-frame valid points; missing and failed entries become `None`.
    pub fn valid_points(&self) -> Vec<Option<Point2d>> {
        self.points
            .iter()
            .map(|p| p.as_ref().and_then(|r| r.as_ref().ok().copied()))
            .collect()
    }
}

/// All streams of a [`CoordinateTable`] after transformation, in the same order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransformedTable {
    streams: Vec<TransformedStream>,
}

impl TransformedTable {
    /// Look up a stream by name.
    pub fn get(&self, name: &str) -> Option<&TransformedStream> {
        self.streams.iter().find(|s| s.name == name)
    }

    /// Iterate the streams in order.
    pub fn iter(&self) -> std::slice::Iter<'_, TransformedStream> {
        self.streams.iter()
    }

    /// Number of streams.
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    /// Whether the table has no streams.
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Total number of failed entries across all streams.
    pub fn invalid_count(&self) -> usize {
        self.streams.iter().map(TransformedStream::invalid_count).sum()
    }
}

/// Map every point through `h`. A point at infinity is reported in place and
/// does not affect the others.
pub fn transform(h: &Homography, points: &[Point2d]) -> Vec<TransformedPoint> {
    points.iter().map(|&p| h.transform_point(p)).collect()
}

/// Map a stream with missing entries. Missing entries are passed through
/// without being transformed.
pub fn transform_stream(h: &Homography, points: &[Option<Point2d>]) -> Vec<Option<TransformedPoint>> {
    points
        .iter()
        .map(|p| p.map(|p| h.transform_point(p)))
        .collect()
}

/// Transform every stream of `table`, in parallel across streams.
///
/// Stream names and order are preserved.
pub fn transform_table(h: &Homography, table: &CoordinateTable) -> TransformedTable {
    let streams = table
        .streams
        .par_iter()
        .map(|s| TransformedStream {
            name: s.name.clone(),
            points: transform_stream(h, &s.points),
        })
        .collect::<Vec<_>>();

    let out = TransformedTable { streams };
    let invalid = out.invalid_count();
    if invalid > 0 {
        log::warn!("{invalid} points mapped to infinity and were left invalid");
    }
    log::debug!("transformed {} streams", out.len());
    out
}
