//! Stage adapter: transfer declarations for the staging layer.
//!
//! The driver asks, once per iteration, which regions of the bulk store make
//! up that iteration's input and output. These functions only describe the
//! transfers; executing them is the staging layer's job (see
//! [`staging`](super::staging) for the in-memory realization).

use crate::schema::ConvolutionRequest;

/// Bytes per stored sample (one plane element).
pub const ELEMENT_SIZE: u64 = size_of::<f32>() as u64;

/// One region of the bulk store to gather or scatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferDescriptor {
    /// Byte address of the first element.
    pub addr: u64,
    /// Number of contiguous elements.
    pub elements: usize,
    /// Elements between successive chunks of this plane.
    pub stride: usize,
}

#[inline]
fn descriptor(base: u64, stride: usize, request: &ConvolutionRequest, iteration: usize) -> TransferDescriptor {
    TransferDescriptor {
        addr: base + iteration as u64 * stride as u64 * ELEMENT_SIZE,
        elements: request.elements,
        stride,
    }
}

/// Declare the four source regions (input re/im, kernel re/im) for one
/// iteration, in the order the working buffer's gather planes expect.
///
/// Pure function of `(request, iteration)`.
pub fn describe_input(request: &ConvolutionRequest, iteration: usize) -> [TransferDescriptor; 4] {
    [
        descriptor(request.input_re_addr, request.input_stride, request, iteration),
        descriptor(request.input_im_addr, request.input_stride, request, iteration),
        descriptor(request.kernel_re_addr, request.kernel_stride, request, iteration),
        descriptor(request.kernel_im_addr, request.kernel_stride, request, iteration),
    ]
}

/// Declare the two destination regions (output re/im) for one iteration.
///
/// Pure function of `(request, iteration)`.
pub fn describe_output(request: &ConvolutionRequest, iteration: usize) -> [TransferDescriptor; 2] {
    [
        descriptor(request.output_re_addr, request.output_stride, request, iteration),
        descriptor(request.output_im_addr, request.output_stride, request, iteration),
    ]
}
