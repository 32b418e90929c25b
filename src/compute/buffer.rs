//! Working buffer for one convolution iteration.
//!
//! The staging layer gathers the four source planes (input re/im, kernel
//! re/im) into this buffer before the kernel runs; the kernel works in place
//! and leaves the convolution result in the input planes, which is what the
//! staging layer scatters back out. The buffer is allocated once with a
//! fixed capacity and reused for every iteration of a run.

use super::ConvolveError;

/// Identifies one of the four split-complex planes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plane {
    InputRe,
    InputIm,
    KernelRe,
    KernelIm,
}

/// Planes gathered for one iteration, ordered as the stage adapter declares
/// them.
pub const GATHER_PLANES: [Plane; 4] = [
    Plane::InputRe,
    Plane::InputIm,
    Plane::KernelRe,
    Plane::KernelIm,
];

/// Mutable views over all four planes at once, for in-place processing.
pub struct SplitPlanes<'a> {
    pub input_re: &'a mut [f32],
    pub input_im: &'a mut [f32],
    pub kernel_re: &'a mut [f32],
    pub kernel_im: &'a mut [f32],
}

/// Four contiguous equal-length plane regions backed by a single allocation.
///
/// Planes live at capacity-strided offsets, so changing the per-iteration
/// element count never moves data between planes.
pub struct WorkingBuffer {
    data: Vec<f32>,
    capacity: usize,
}

impl WorkingBuffer {
    /// Allocate a buffer able to hold planes of up to `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![0.0; capacity * 4],
            capacity,
        }
    }

    /// Per-plane capacity in elements.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn check(&self, elements: usize) -> Result<(), ConvolveError> {
        if elements > self.capacity {
            return Err(ConvolveError::BufferTooSmall {
                requested: elements,
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    #[inline]
    fn offset(&self, plane: Plane) -> usize {
        match plane {
            Plane::InputRe => 0,
            Plane::InputIm => self.capacity,
            Plane::KernelRe => self.capacity * 2,
            Plane::KernelIm => self.capacity * 3,
        }
    }

    /// Borrow the first `elements` of one plane.
    pub fn plane(&self, plane: Plane, elements: usize) -> Result<&[f32], ConvolveError> {
        self.check(elements)?;
        let off = self.offset(plane);
        Ok(&self.data[off..off + elements])
    }

    /// Mutably borrow the first `elements` of one plane.
    pub fn plane_mut(&mut self, plane: Plane, elements: usize) -> Result<&mut [f32], ConvolveError> {
        self.check(elements)?;
        let off = self.offset(plane);
        Ok(&mut self.data[off..off + elements])
    }

    /// Borrow all four planes mutably at once.
    pub fn planes_mut(&mut self, elements: usize) -> Result<SplitPlanes<'_>, ConvolveError> {
        self.check(elements)?;
        let cap = self.capacity;
        let (input, kernel) = self.data.split_at_mut(cap * 2);
        let (input_re, input_im) = input.split_at_mut(cap);
        let (kernel_re, kernel_im) = kernel.split_at_mut(cap);
        Ok(SplitPlanes {
            input_re: &mut input_re[..elements],
            input_im: &mut input_im[..elements],
            kernel_re: &mut kernel_re[..elements],
            kernel_im: &mut kernel_im[..elements],
        })
    }
}
