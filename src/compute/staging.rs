//! In-memory staging store.
//!
//! Executes the transfer declarations from [`stage`](super::stage) against a
//! flat host-memory store. This is the simplest realization of the staging
//! contract: gather the declared source regions into the working buffer
//! before the kernel runs, scatter the declared destination regions out of
//! it afterwards. Double-buffering and transfer/compute overlap belong to
//! whatever driver replaces this in a real deployment.

use crate::schema::ConvolutionRequest;

use super::buffer::GATHER_PLANES;
use super::stage::{ELEMENT_SIZE, TransferDescriptor, describe_input, describe_output};
use super::{ConvolveError, Plane, WorkingBuffer};

/// Staging transfer failures. These are driver-side address bugs, never
/// produced by a well-formed job layout.
#[derive(Debug, thiserror::Error)]
pub enum StagingError {
    #[error("transfer address {addr:#x} is not element-aligned")]
    Unaligned { addr: u64 },

    #[error("transfer of {elements} elements at {addr:#x} exceeds store size {store_len}")]
    OutOfBounds {
        addr: u64,
        elements: usize,
        store_len: usize,
    },

    #[error(transparent)]
    Buffer(#[from] ConvolveError),
}

/// Flat `f32` store addressed in bytes, standing in for the bulk memory the
/// staging layer moves data against.
pub struct HostStore {
    data: Vec<f32>,
}

impl HostStore {
    /// Create a zero-filled store of `len` elements.
    pub fn new(len: usize) -> Self {
        Self {
            data: vec![0.0; len],
        }
    }

    /// Number of elements in the store.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Read `len` elements starting at the element `index`.
    pub fn slice(&self, index: usize, len: usize) -> &[f32] {
        &self.data[index..index + len]
    }

    /// Write into the store starting at the element `index`.
    pub fn write(&mut self, index: usize, values: &[f32]) {
        self.data[index..index + values.len()].copy_from_slice(values);
    }

    fn index_of(&self, desc: &TransferDescriptor) -> Result<usize, StagingError> {
        if desc.addr % ELEMENT_SIZE != 0 {
            return Err(StagingError::Unaligned { addr: desc.addr });
        }
        let index = (desc.addr / ELEMENT_SIZE) as usize;
        if index + desc.elements > self.data.len() {
            return Err(StagingError::OutOfBounds {
                addr: desc.addr,
                elements: desc.elements,
                store_len: self.data.len(),
            });
        }
        Ok(index)
    }

    /// Copy one declared region out of the store.
    pub fn gather(&self, desc: &TransferDescriptor, dst: &mut [f32]) -> Result<(), StagingError> {
        let index = self.index_of(desc)?;
        dst.copy_from_slice(&self.data[index..index + desc.elements]);
        Ok(())
    }

    /// Copy one declared region into the store.
    pub fn scatter(&mut self, desc: &TransferDescriptor, src: &[f32]) -> Result<(), StagingError> {
        let index = self.index_of(desc)?;
        self.data[index..index + desc.elements].copy_from_slice(src);
        Ok(())
    }
}

/// Gather this iteration's four input planes into the working buffer.
pub fn stage_in(
    store: &HostStore,
    buffer: &mut WorkingBuffer,
    request: &ConvolutionRequest,
    iteration: usize,
) -> Result<(), StagingError> {
    let descs = describe_input(request, iteration);
    for (desc, plane) in descs.iter().zip(GATHER_PLANES) {
        store.gather(desc, buffer.plane_mut(plane, desc.elements)?)?;
    }
    Ok(())
}

/// Scatter this iteration's result out of the working buffer.
///
/// The convolution leaves its result in the input planes; those are what get
/// written to the declared output regions.
pub fn stage_out(
    store: &mut HostStore,
    buffer: &WorkingBuffer,
    request: &ConvolutionRequest,
    iteration: usize,
) -> Result<(), StagingError> {
    let descs = describe_output(request, iteration);
    store.scatter(&descs[0], buffer.plane(Plane::InputRe, descs[0].elements)?)?;
    store.scatter(&descs[1], buffer.plane(Plane::InputIm, descs[1].elements)?)?;
    Ok(())
}
