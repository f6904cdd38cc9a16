use cubefield_common::{Placement, STRIDE};
use cubefield_packer::Batch;
use serde::{Deserialize, Serialize};

/// Batch payload as sent from the worker: running totals plus placements
/// flattened to `[x, y, z, r]` groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchMessage {
    pub n: usize,
    pub tests_n: u64,
    pub data: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WireError {
    #[error("batch data length {len} is not a multiple of 4")]
    BadStride { len: usize },
}

impl BatchMessage {
    pub fn from_placements(n: usize, tests_n: u64, placements: &[Placement]) -> Self {
        let data = placements.iter().flat_map(|p| p.to_array()).collect();
        Self { n, tests_n, data }
    }

    /// Number of placements carried, assuming a well-formed payload.
    pub fn len(&self) -> usize {
        self.data.len() / STRIDE
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Decode `data` in stride-4 groups.
    pub fn placements(&self) -> Result<Vec<Placement>, WireError> {
        if self.data.len() % STRIDE != 0 {
            return Err(WireError::BadStride {
                len: self.data.len(),
            });
        }
        Ok(self
            .data
            .chunks_exact(STRIDE)
            .map(|c| Placement::new(c[0], c[1], c[2], c[3]))
            .collect())
    }
}

impl From<&Batch> for BatchMessage {
    fn from(batch: &Batch) -> Self {
        Self::from_placements(batch.n, batch.tests_n, &batch.placements)
    }
}
