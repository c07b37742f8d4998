use std::{num::NonZeroU64, ops::Range};

use zarrs::array::{Array, ArraySubset};

/// Axis-aligned index ranges covering one chunk of an array.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChunkCoordinate {
    ranges: Vec<Range<u64>>,
}

impl ChunkCoordinate {
    pub fn ranges(&self) -> &[Range<u64>] {
        &self.ranges
    }

    pub fn start(&self) -> Vec<u64> {
        self.ranges.iter().map(|r| r.start).collect()
    }

    /// Extent along each axis; smaller than the chunk shape at clipped boundaries.
    pub fn shape(&self) -> Vec<u64> {
        self.ranges.iter().map(|r| r.end - r.start).collect()
    }

    pub fn num_elements(&self) -> u64 {
        self.ranges.iter().map(|r| r.end - r.start).product()
    }

    pub fn to_subset(&self) -> ArraySubset {
        ArraySubset::new_with_ranges(&self.ranges)
    }
}

/// A regular tiling of an array's index space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkGrid {
    shape: Vec<u64>,
    chunk_shape: Vec<NonZeroU64>,
}

impl ChunkGrid {
    pub fn new(shape: &[u64], chunk_shape: &[NonZeroU64]) -> crate::Result<Self> {
        if shape.len() != chunk_shape.len() {
            return Err(crate::Error::ChunkShapeMismatch {
                shape: shape.to_vec(),
                chunk_shape: chunk_shape.to_vec(),
            });
        }
        Ok(Self {
            shape: shape.to_vec(),
            chunk_shape: chunk_shape.to_vec(),
        })
    }

    /// The regular chunk grid of a stored array.
    pub fn from_array<TStorage: ?Sized>(array: &Array<TStorage>) -> crate::Result<Self> {
        let origin = vec![0; array.dimensionality()];
        let chunk_shape = match array.chunk_shape(&origin) {
            Ok(chunk_shape) => chunk_shape.as_slice().to_vec(),
            // An empty array has no chunks to take the shape from.
            Err(_) if array.shape().contains(&0) => vec![NonZeroU64::MIN; origin.len()],
            Err(e) => return Err(crate::Error::read(e)),
        };
        Self::new(array.shape(), &chunk_shape)
    }

    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    pub fn chunk_shape(&self) -> &[NonZeroU64] {
        &self.chunk_shape
    }

    /// Number of chunks along each axis.
    pub fn grid_shape(&self) -> Vec<u64> {
        self.shape
            .iter()
            .zip(&self.chunk_shape)
            .map(|(&n, c)| n.div_ceil(c.get()))
            .collect()
    }

    pub fn num_chunks(&self) -> u64 {
        self.grid_shape().iter().product()
    }

    /// Iterate over the chunk coordinates, first axis varying slowest.
    ///
    /// Each call starts a fresh, identical traversal.
    pub fn iter(&self) -> ChunkCoordinates<'_> {
        let grid_shape = self.grid_shape();
        let remaining = grid_shape.iter().product();
        ChunkCoordinates {
            grid: self,
            indices: vec![0; grid_shape.len()],
            grid_shape,
            remaining,
        }
    }
}

impl<'a> IntoIterator for &'a ChunkGrid {
    type Item = ChunkCoordinate;
    type IntoIter = ChunkCoordinates<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy iterator over a [ChunkGrid].
#[derive(Debug, Clone)]
pub struct ChunkCoordinates<'a> {
    grid: &'a ChunkGrid,
    grid_shape: Vec<u64>,
    /// Grid indices of the next chunk.
    indices: Vec<u64>,
    remaining: u64,
}

impl ChunkCoordinates<'_> {
    fn current(&self) -> ChunkCoordinate {
        let ranges = self
            .indices
            .iter()
            .zip(&self.grid.shape)
            .zip(&self.grid.chunk_shape)
            .map(|((&idx, &len), c)| {
                let start = idx * c.get();
                start..(start + c.get()).min(len)
            })
            .collect();
        ChunkCoordinate { ranges }
    }

    /// Odometer increment, last axis fastest.
    fn advance(&mut self) {
        for (idx, &n) in self.indices.iter_mut().zip(&self.grid_shape).rev() {
            *idx += 1;
            if *idx < n {
                return;
            }
            *idx = 0;
        }
    }
}

impl Iterator for ChunkCoordinates<'_> {
    type Item = ChunkCoordinate;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let out = self.current();
        self.remaining -= 1;
        self.advance();
        Some(out)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match usize::try_from(self.remaining) {
            Ok(n) => (n, Some(n)),
            Err(_) => (usize::MAX, None),
        }
    }
}

impl ExactSizeIterator for ChunkCoordinates<'_> {}
