//! Per-invocation parameter block for the convolution stage.

use serde::{Deserialize, Serialize};

/// Parameters for one batch of fast-convolution iterations.
///
/// The driver supplies one request per batch; the stage adapter derives each
/// iteration's transfer regions from the base addresses and strides, and the
/// kernel itself reads only `elements` and `transform_kernel`. Addresses are
/// byte offsets into the staging store. A `kernel_stride` of zero shares one
/// kernel across every chunk; a non-zero stride gives each chunk its own
/// kernel row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConvolutionRequest {
    /// Complex samples per chunk. Must not exceed the convolver's capacity.
    pub elements: usize,
    /// Elements between successive input chunks, per plane.
    pub input_stride: usize,
    /// Elements between successive kernel rows, per plane. Zero shares one
    /// kernel across all chunks.
    pub kernel_stride: usize,
    /// Elements between successive output chunks, per plane.
    pub output_stride: usize,
    /// Forward-transform the kernel planes in place before use. Set exactly
    /// once per distinct time-domain kernel; see
    /// [`FastConvolver::convolve`](crate::compute::FastConvolver::convolve)
    /// for the discipline this requires.
    pub transform_kernel: bool,
    /// Base byte address of the input real plane.
    pub input_re_addr: u64,
    /// Base byte address of the input imaginary plane.
    pub input_im_addr: u64,
    /// Base byte address of the kernel real plane.
    pub kernel_re_addr: u64,
    /// Base byte address of the kernel imaginary plane.
    pub kernel_im_addr: u64,
    /// Base byte address of the output real plane.
    pub output_re_addr: u64,
    /// Base byte address of the output imaginary plane.
    pub output_im_addr: u64,
}
