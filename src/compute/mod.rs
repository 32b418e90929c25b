//! Compute module - the fast-convolution stage and its collaborators.

mod buffer;
mod convolve;
mod plan;
mod stage;
mod staging;

pub use buffer::*;
pub use convolve::*;
pub use plan::*;
pub use stage::*;
pub use staging::*;

/// Errors from the convolution core.
///
/// All of these are deterministic precondition or configuration failures:
/// given the same inputs they recur, so there is no retry path. Each one is
/// validated and rejected before any computation touches the buffer.
#[derive(Debug, thiserror::Error)]
pub enum ConvolveError {
    #[error("transform length must be non-zero")]
    EmptyRequest,

    #[error("transform length {requested} exceeds plan cache capacity {capacity}")]
    CapacityExceeded { requested: usize, capacity: usize },

    #[error(
        "transform length changed mid-batch at iteration {iteration}: \
         plan is sized for {planned:?}, request wants {requested}"
    )]
    SizeChangedMidBatch {
        planned: Option<usize>,
        requested: usize,
        iteration: usize,
    },

    #[error("no FFT plan prepared for length {requested}")]
    PlanNotReady { requested: usize },

    #[error("working buffer capacity {capacity} is too small for {requested} elements")]
    BufferTooSmall { requested: usize, capacity: usize },
}
