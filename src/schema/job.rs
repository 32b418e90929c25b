//! Job configuration for the batch driver.

use serde::{Deserialize, Serialize};

use crate::compute::DEFAULT_MAX_ELEMENTS;

fn default_max_elements() -> usize {
    DEFAULT_MAX_ELEMENTS
}

fn default_workers() -> usize {
    1
}

/// A batch job: how many chunks to convolve, at what size, against which
/// kernel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Complex samples per chunk.
    pub elements: usize,
    /// Number of chunks in the batch.
    pub chunks: usize,
    /// Plan-cache capacity for each worker.
    #[serde(default = "default_max_elements")]
    pub max_elements: usize,
    /// Worker count; each worker owns an independent convolver and buffer
    /// and processes a contiguous range of chunks.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Filter kernel shared by every chunk.
    pub kernel: KernelSpec,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            elements: 1024,
            chunks: 64,
            max_elements: DEFAULT_MAX_ELEMENTS,
            workers: 1,
            kernel: KernelSpec::default(),
        }
    }
}

/// Time-domain filter kernel description.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KernelSpec {
    /// Unit impulse: convolution passes the input through unchanged.
    Impulse,
    /// Moving average over `taps` samples, normalized to unit gain.
    Boxcar { taps: usize },
    /// Explicit complex taps, zero-padded to the chunk length.
    Taps { re: Vec<f32>, im: Vec<f32> },
}

impl Default for KernelSpec {
    fn default() -> Self {
        KernelSpec::Boxcar { taps: 4 }
    }
}

impl KernelSpec {
    /// Materialize the kernel as split time-domain planes of length
    /// `elements`.
    pub fn planes(&self, elements: usize) -> (Vec<f32>, Vec<f32>) {
        let mut re = vec![0.0f32; elements];
        let mut im = vec![0.0f32; elements];
        match self {
            KernelSpec::Impulse => {
                re[0] = 1.0;
            }
            KernelSpec::Boxcar { taps } => {
                let gain = 1.0 / *taps as f32;
                for v in re.iter_mut().take(*taps) {
                    *v = gain;
                }
            }
            KernelSpec::Taps { re: tr, im: ti } => {
                re[..tr.len()].copy_from_slice(tr);
                im[..ti.len()].copy_from_slice(ti);
            }
        }
        (re, im)
    }

    fn taps_len(&self) -> usize {
        match self {
            KernelSpec::Impulse => 1,
            KernelSpec::Boxcar { taps } => *taps,
            KernelSpec::Taps { re, im } => re.len().max(im.len()),
        }
    }
}

/// Job validation errors.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Chunk element count must be non-zero")]
    InvalidElements,
    #[error("Chunk count must be non-zero")]
    InvalidChunks,
    #[error("Worker count must be non-zero")]
    InvalidWorkers,
    #[error("Chunk element count {elements} exceeds max_elements {max}")]
    ElementsExceedMax { elements: usize, max: usize },
    #[error("Kernel has {taps} taps but chunks hold only {elements} elements")]
    KernelTooLong { taps: usize, elements: usize },
}

impl JobConfig {
    /// Validate job parameters before any allocation.
    pub fn validate(&self) -> Result<(), JobError> {
        if self.elements == 0 {
            return Err(JobError::InvalidElements);
        }
        if self.chunks == 0 {
            return Err(JobError::InvalidChunks);
        }
        if self.workers == 0 {
            return Err(JobError::InvalidWorkers);
        }
        if self.elements > self.max_elements {
            return Err(JobError::ElementsExceedMax {
                elements: self.elements,
                max: self.max_elements,
            });
        }
        let taps = self.kernel.taps_len();
        if taps == 0 || taps > self.elements {
            return Err(JobError::KernelTooLong {
                taps,
                elements: self.elements,
            });
        }
        Ok(())
    }
}
