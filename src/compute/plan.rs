//! FFT plan cache.
//!
//! Planning an FFT (twiddle factors, algorithm selection) is expensive
//! relative to executing one, and the intended workload applies the same-size
//! transform to every chunk of a batch. The cache keeps exactly one
//! forward/inverse plan pair, sized to the most recent request, and rebuilds
//! it only when the requested length changes.

use std::sync::Arc;

use log::debug;
use num_complex::Complex;
use rustfft::{Fft, FftDirection, FftPlanner};

use super::ConvolveError;

/// Largest transform length supported by default.
///
/// Callers running on constrained workers can construct the cache with a
/// smaller capacity; the capacity bounds every buffer the cache owns, so no
/// allocation happens after construction except on a plan rebuild.
pub const DEFAULT_MAX_ELEMENTS: usize = 32 * 1024;

struct CachedPlan {
    size: usize,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
}

/// One reusable forward/inverse FFT plan pair plus transform working memory.
///
/// Each concurrent worker must own an independent `PlanCache`; nothing here
/// is shared or locked.
pub struct PlanCache {
    capacity: usize,
    plan: Option<CachedPlan>,
    /// Interleave staging between split re/im planes and the transform.
    packed: Vec<Complex<f32>>,
    /// rustfft in-place scratch, grown only at rebuild time.
    scratch: Vec<Complex<f32>>,
}

impl PlanCache {
    /// Create an empty cache supporting transforms up to `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            plan: None,
            packed: vec![Complex::default(); capacity],
            scratch: Vec::new(),
        }
    }

    /// Maximum transform length this cache supports.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Length of the currently cached plan, if any.
    #[inline]
    pub fn current_size(&self) -> Option<usize> {
        self.plan.as_ref().map(|p| p.size)
    }

    /// Make sure a plan for exactly `size` elements is ready.
    ///
    /// Reuses the cached plan when the size matches (the hot path); otherwise
    /// plans a new forward/inverse pair and records the new size.
    pub fn ensure(&mut self, size: usize) -> Result<(), ConvolveError> {
        if size == 0 {
            return Err(ConvolveError::EmptyRequest);
        }
        if size > self.capacity {
            return Err(ConvolveError::CapacityExceeded {
                requested: size,
                capacity: self.capacity,
            });
        }

        if self.current_size() != Some(size) {
            debug!(
                "rebuilding FFT plan: {:?} -> {}",
                self.current_size(),
                size
            );
            let mut planner = FftPlanner::new();
            let forward = planner.plan_fft_forward(size);
            let inverse = planner.plan_fft_inverse(size);

            let scratch_len = forward
                .get_inplace_scratch_len()
                .max(inverse.get_inplace_scratch_len());
            if scratch_len > self.scratch.len() {
                self.scratch.resize(scratch_len, Complex::default());
            }

            self.plan = Some(CachedPlan {
                size,
                forward,
                inverse,
            });
        }

        Ok(())
    }

    /// Forward-transform a split re/im plane pair in place.
    pub fn forward_split(&mut self, re: &mut [f32], im: &mut [f32]) -> Result<(), ConvolveError> {
        self.transform_split(re, im, FftDirection::Forward)
    }

    /// Inverse-transform a split re/im plane pair in place (unnormalized).
    pub fn inverse_split(&mut self, re: &mut [f32], im: &mut [f32]) -> Result<(), ConvolveError> {
        self.transform_split(re, im, FftDirection::Inverse)
    }

    fn transform_split(
        &mut self,
        re: &mut [f32],
        im: &mut [f32],
        direction: FftDirection,
    ) -> Result<(), ConvolveError> {
        let n = re.len();
        debug_assert_eq!(n, im.len());

        let plan = self
            .plan
            .as_ref()
            .filter(|p| p.size == n)
            .ok_or(ConvolveError::PlanNotReady { requested: n })?;
        let fft = match direction {
            FftDirection::Forward => &plan.forward,
            FftDirection::Inverse => &plan.inverse,
        };

        let packed = &mut self.packed[..n];
        for (dst, (&r, &i)) in packed.iter_mut().zip(re.iter().zip(im.iter())) {
            *dst = Complex::new(r, i);
        }

        fft.process_with_scratch(packed, &mut self.scratch);

        for (src, (r, i)) in packed.iter().zip(re.iter_mut().zip(im.iter_mut())) {
            *r = src.re;
            *i = src.im;
        }

        Ok(())
    }
}
