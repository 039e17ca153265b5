
use serde::{Deserialize, Serialize};

use crate::{RagError, Result};

/// Exhaustive nearest-neighbor index over squared Euclidean distance.
///
/// Vectors are stored row-major in one buffer and addressed by insertion
/// position. Every search scans every vector, so results are exact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlatL2Index {
    dimension: usize,
    vectors: Vec<f32>,
}

/// A search hit: insertion position and squared L2 distance to the query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub position: usize,
    pub distance: f32,
}

impl FlatL2Index {
    #[inline]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: Vec::new(),
        }
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.vectors.len() / self.dimension
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Append a vector; it is found again at position `len() - 1`
    #[inline]
    pub fn add(&mut self, vector: &[f32]) -> Result<()> {
        if self.dimension == 0 {
            return Err(RagError::Validation(
                "index dimension must be greater than 0".to_string(),
            ));
        }
        if vector.len() != self.dimension {
            return Err(RagError::Validation(format!(
                "vector has {} dimensions, index expects {}",
                vector.len(),
                self.dimension
            )));
        }

        self.vectors.extend_from_slice(vector);
        Ok(())
    }

    #[inline]
    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        let start = position.checked_mul(self.dimension)?;
        let end = start.checked_add(self.dimension)?;
        self.vectors.get(start..end)
    }

    /// The `k` nearest vectors to `query`, nearest first.
    ///
    /// Equal distances keep insertion order.
    #[inline]
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if query.len() != self.dimension {
            return Err(RagError::Validation(format!(
                "query has {} dimensions, index expects {}",
                query.len(),
                self.dimension
            )));
        }

        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let mut neighbors = self
            .vectors
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(position, vector)| Neighbor {
                position,
                distance: squared_l2(query, vector),
            })
            .collect::<Vec<_>>();

        // Stable sort, so ties stay in insertion order
        neighbors.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        neighbors.truncate(k);

        Ok(neighbors)
    }

    /// Check the invariants a deserialized index must satisfy
    pub(crate) fn check_shape(&self) -> std::result::Result<(), String> {
        if self.dimension == 0 {
            return Err("index dimension is 0".to_string());
        }
        if self.vectors.len() % self.dimension != 0 {
            return Err(format!(
                "vector buffer of {} values is not a multiple of dimension {}",
                self.vectors.len(),
                self.dimension
            ));
        }
        Ok(())
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let diff = x - y;
            diff * diff
        })
        .sum()
}
