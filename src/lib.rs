//! Fast convolution - split-complex FFT convolution for chunked pipelines.
//!
//! This crate implements one compute stage of a chunked processing pipeline:
//! circular convolution of each chunk against a filter kernel, computed in
//! the frequency domain (forward FFT, pointwise complex multiply, inverse
//! FFT, 1/n scale) over split real/imaginary planes. The FFT plan is cached
//! and rebuilt only when the transform length changes, which makes the
//! repeated same-size case - the intended workload - cheap.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Request and job configuration types
//! - `compute`: The plan cache, working buffer, convolution kernel, and the
//!   stage adapter that declares each iteration's transfers
//!
//! # Concurrency
//!
//! The core is synchronous and lock-free. [`FastConvolver`] and
//! [`WorkingBuffer`] are plain owned values holding all mutable state; run
//! several workers by giving each its own pair, never by sharing one.
//!
//! # Example
//!
//! ```rust
//! use fastconv::{
//!     compute::{FastConvolver, Plane, WorkingBuffer},
//!     schema::ConvolutionRequest,
//! };
//!
//! let n = 8;
//! let mut convolver = FastConvolver::with_capacity(n);
//! let mut buffer = WorkingBuffer::with_capacity(n);
//!
//! // Impulse input against a two-tap kernel.
//! buffer.plane_mut(Plane::InputRe, n).unwrap()[0] = 1.0;
//! let kernel_re = buffer.plane_mut(Plane::KernelRe, n).unwrap();
//! kernel_re[0] = 1.0;
//! kernel_re[1] = 1.0;
//!
//! let request = ConvolutionRequest {
//!     elements: n,
//!     transform_kernel: true, // kernel is still in the time domain
//!     ..ConvolutionRequest::default()
//! };
//! convolver.convolve(&mut buffer, &request, 0).unwrap();
//!
//! let out = buffer.plane(Plane::InputRe, n).unwrap();
//! assert!((out[0] - 1.0).abs() < 1e-5 && (out[1] - 1.0).abs() < 1e-5);
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::{ConvolveError, FastConvolver, PlanCache, WorkingBuffer};
pub use schema::{ConvolutionRequest, JobConfig};
