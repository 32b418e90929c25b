//! Fast convolution via FFT.
//!
//! Circular convolution of one chunk against a filter kernel, computed as
//! forward FFT, pointwise complex multiply, inverse FFT, scale by 1/n:
//! O(n log n) instead of the O(n^2) direct sum. Operates in place on the
//! split-complex planes of a [`WorkingBuffer`], reusing the FFT plan across
//! chunks through a [`PlanCache`].

use crate::schema::ConvolutionRequest;

use super::{ConvolveError, PlanCache, WorkingBuffer};

/// The fast-convolution compute stage.
///
/// Owns the plan cache and its scratch memory. One instance per worker:
/// nothing here may be shared across concurrent workers (see the crate docs
/// on the isolation model).
pub struct FastConvolver {
    plans: PlanCache,
}

impl FastConvolver {
    /// Create a convolver supporting transforms up to `max_elements`.
    pub fn with_capacity(max_elements: usize) -> Self {
        Self {
            plans: PlanCache::with_capacity(max_elements),
        }
    }

    /// Maximum transform length this convolver supports.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.plans.capacity()
    }

    /// Convolve one chunk in place.
    ///
    /// On entry the buffer's input and kernel planes hold this iteration's
    /// samples; on return the input planes hold the circular convolution
    /// result, ready for output staging. The kernel planes are untouched
    /// unless `request.transform_kernel` is set, in which case they are
    /// forward-transformed in place first.
    ///
    /// `transform_kernel` must be set exactly once per distinct time-domain
    /// kernel (typically on the first iteration that uses it) and cleared on
    /// subsequent iterations that reuse the already-transformed planes.
    /// There is no internal tracking of kernel state: setting the flag again
    /// on a kernel that is already in frequency domain transforms it a second
    /// time and silently produces wrong results. Callers that restage a fresh
    /// time-domain kernel on every iteration may instead leave the flag set
    /// every time, at the cost of one extra forward transform per chunk.
    ///
    /// The plan rebuild check runs only at `iteration == 0`; within a batch
    /// the transform length must stay constant, and a mid-batch change is
    /// rejected as [`ConvolveError::SizeChangedMidBatch`].
    pub fn convolve(
        &mut self,
        buffer: &mut WorkingBuffer,
        request: &ConvolutionRequest,
        iteration: usize,
    ) -> Result<(), ConvolveError> {
        let n = request.elements;
        if n == 0 {
            return Err(ConvolveError::EmptyRequest);
        }

        if iteration == 0 {
            self.plans.ensure(n)?;
        } else if self.plans.current_size() != Some(n) {
            return Err(ConvolveError::SizeChangedMidBatch {
                planned: self.plans.current_size(),
                requested: n,
                iteration,
            });
        }

        let planes = buffer.planes_mut(n)?;

        // One-time forward transform of the kernel, in place. Subsequent
        // iterations reuse the frequency-domain planes as-is.
        if request.transform_kernel {
            self.plans.forward_split(planes.kernel_re, planes.kernel_im)?;
        }

        // Switch the input to frequency space.
        self.plans.forward_split(planes.input_re, planes.input_im)?;

        // Convolution is now a pointwise multiplication.
        multiply_split(
            planes.input_re,
            planes.input_im,
            planes.kernel_re,
            planes.kernel_im,
        );

        // Back to the time domain; the inverse is unnormalized.
        self.plans.inverse_split(planes.input_re, planes.input_im)?;

        let scale = 1.0 / n as f32;
        for v in planes.input_re.iter_mut() {
            *v *= scale;
        }
        for v in planes.input_im.iter_mut() {
            *v *= scale;
        }

        Ok(())
    }
}

/// Pointwise split-complex multiply: `data *= coeff`, elementwise.
#[inline]
fn multiply_split(data_re: &mut [f32], data_im: &mut [f32], coeff_re: &[f32], coeff_im: &[f32]) {
    for i in 0..data_re.len() {
        let (a, b) = (data_re[i], data_im[i]);
        let (c, d) = (coeff_re[i], coeff_im[i]);
        data_re[i] = a * c - b * d;
        data_im[i] = a * d + b * c;
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::compute::Plane;

    use super::*;

    /// Request with only the fields the kernel itself reads.
    fn request(elements: usize, transform_kernel: bool) -> ConvolutionRequest {
        ConvolutionRequest {
            elements,
            transform_kernel,
            ..ConvolutionRequest::default()
        }
    }

    fn load(buf: &mut WorkingBuffer, plane: Plane, data: &[f32]) {
        buf.plane_mut(plane, data.len()).unwrap().copy_from_slice(data);
    }

    /// Direct O(n^2) circular convolution reference, f64 accumulation.
    fn reference_convolution(
        in_re: &[f32],
        in_im: &[f32],
        k_re: &[f32],
        k_im: &[f32],
    ) -> (Vec<f32>, Vec<f32>) {
        let n = in_re.len();
        let mut out_re = vec![0.0f32; n];
        let mut out_im = vec![0.0f32; n];
        for i in 0..n {
            let mut acc_re = 0.0f64;
            let mut acc_im = 0.0f64;
            for m in 0..n {
                let j = (i + n - m) % n;
                let (a, b) = (in_re[m] as f64, in_im[m] as f64);
                let (c, d) = (k_re[j] as f64, k_im[j] as f64);
                acc_re += a * c - b * d;
                acc_im += a * d + b * c;
            }
            out_re[i] = acc_re as f32;
            out_im[i] = acc_im as f32;
        }
        (out_re, out_im)
    }

    /// Deterministic pseudo-random samples in [-1, 1).
    fn noise(len: usize, seed: u32) -> Vec<f32> {
        let mut state = seed.wrapping_mul(2654435761).max(1);
        (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state as f32 / u32::MAX as f32) * 2.0 - 1.0
            })
            .collect()
    }

    /// Run one standalone convolution: stage, convolve with
    /// `transform_kernel = true`, return the result planes.
    fn convolve_once(
        conv: &mut FastConvolver,
        in_re: &[f32],
        in_im: &[f32],
        k_re: &[f32],
        k_im: &[f32],
    ) -> (Vec<f32>, Vec<f32>) {
        let n = in_re.len();
        let mut buf = WorkingBuffer::with_capacity(conv.capacity());
        load(&mut buf, Plane::InputRe, in_re);
        load(&mut buf, Plane::InputIm, in_im);
        load(&mut buf, Plane::KernelRe, k_re);
        load(&mut buf, Plane::KernelIm, k_im);

        conv.convolve(&mut buf, &request(n, true), 0).unwrap();

        (
            buf.plane(Plane::InputRe, n).unwrap().to_vec(),
            buf.plane(Plane::InputIm, n).unwrap().to_vec(),
        )
    }

    fn assert_close(got: &[f32], want: &[f32], tol: f32, what: &str) {
        for (i, (g, w)) in got.iter().zip(want.iter()).enumerate() {
            assert!(
                (g - w).abs() < tol,
                "{} mismatch at {}: got {}, want {}",
                what,
                i,
                g,
                w
            );
        }
    }

    #[test]
    fn test_matches_direct_convolution() {
        // Assorted lengths, including a non-power-of-2.
        for &n in &[4usize, 8, 33, 64, 256] {
            let in_re = noise(n, 1);
            let in_im = noise(n, 2);
            let k_re = noise(n, 3);
            let k_im = noise(n, 4);

            let (want_re, want_im) = reference_convolution(&in_re, &in_im, &k_re, &k_im);

            let mut conv = FastConvolver::with_capacity(256);
            let (got_re, got_im) = convolve_once(&mut conv, &in_re, &in_im, &k_re, &k_im);

            // Absolute tolerance scaled to the result magnitude (~sqrt(n)).
            let peak = want_re
                .iter()
                .chain(want_im.iter())
                .fold(0.0f32, |m, v| m.max(v.abs()))
                .max(1.0);
            let tol = peak * 1e-4;
            assert_close(&got_re, &want_re, tol, &format!("re n={}", n));
            assert_close(&got_im, &want_im, tol, &format!("im n={}", n));
        }
    }

    #[test]
    fn test_impulse_kernel_is_identity() {
        let n = 64;
        let in_re = noise(n, 5);
        let in_im = noise(n, 6);
        // Time-domain impulse transforms to an all-ones spectrum.
        let mut k_re = vec![0.0f32; n];
        let k_im = vec![0.0f32; n];
        k_re[0] = 1.0;

        let mut conv = FastConvolver::with_capacity(n);
        let (got_re, got_im) = convolve_once(&mut conv, &in_re, &in_im, &k_re, &k_im);

        assert_close(&got_re, &in_re, 1e-4, "identity re");
        assert_close(&got_im, &in_im, 1e-4, "identity im");
    }

    #[test]
    fn test_impulse_input_passes_kernel_through() {
        // elements=4, impulse input, kernel [1,1,0,0]: the result is the
        // kernel shape itself.
        let in_re = [1.0f32, 0.0, 0.0, 0.0];
        let in_im = [0.0f32; 4];
        let k_re = [1.0f32, 1.0, 0.0, 0.0];
        let k_im = [0.0f32; 4];

        let mut conv = FastConvolver::with_capacity(4);
        let (got_re, got_im) = convolve_once(&mut conv, &in_re, &in_im, &k_re, &k_im);

        assert_close(&got_re, &[1.0, 1.0, 0.0, 0.0], 1e-5, "scenario re");
        assert_close(&got_im, &[0.0; 4], 1e-5, "scenario im");
    }

    #[test]
    fn test_repeated_same_size_is_bit_identical() {
        let n = 32;
        let in_re = noise(n, 7);
        let in_im = noise(n, 8);
        let k_re = noise(n, 9);
        let k_im = noise(n, 10);

        let mut conv = FastConvolver::with_capacity(n);
        let first = convolve_once(&mut conv, &in_re, &in_im, &k_re, &k_im);
        for _ in 0..3 {
            let again = convolve_once(&mut conv, &in_re, &in_im, &k_re, &k_im);
            // Same plan, same inputs: no drift of any kind.
            assert_eq!(first, again);
        }
    }

    #[test]
    fn test_plan_rebuild_across_size_changes() {
        let mut conv = FastConvolver::with_capacity(64);

        for &n in &[32usize, 16, 32] {
            let in_re = noise(n, 11);
            let in_im = vec![0.0f32; n];
            let k_re = noise(n, 12);
            let k_im = vec![0.0f32; n];

            let (want_re, want_im) = reference_convolution(&in_re, &in_im, &k_re, &k_im);
            let (got_re, got_im) = convolve_once(&mut conv, &in_re, &in_im, &k_re, &k_im);

            assert_close(&got_re, &want_re, 1e-3, &format!("rebuild re n={}", n));
            assert_close(&got_im, &want_im, 1e-3, &format!("rebuild im n={}", n));
        }
    }

    #[test]
    fn test_kernel_transform_once_over_resident_kernel() {
        // Batch pattern: kernel staged once, transform_kernel true on
        // iteration 0 only, input restaged every iteration.
        let n = 16;
        let k_re = noise(n, 13);
        let k_im = noise(n, 14);

        let mut conv = FastConvolver::with_capacity(n);
        let mut buf = WorkingBuffer::with_capacity(n);
        load(&mut buf, Plane::KernelRe, &k_re);
        load(&mut buf, Plane::KernelIm, &k_im);

        for iter in 0..4 {
            let in_re = noise(n, 20 + iter as u32);
            let in_im = noise(n, 30 + iter as u32);
            load(&mut buf, Plane::InputRe, &in_re);
            load(&mut buf, Plane::InputIm, &in_im);

            conv.convolve(&mut buf, &request(n, iter == 0), iter).unwrap();

            let (want_re, _) = reference_convolution(&in_re, &in_im, &k_re, &k_im);
            let got_re = buf.plane(Plane::InputRe, n).unwrap();
            assert_close(got_re, &want_re, 1e-3, &format!("iter {}", iter));
        }
    }

    #[test]
    fn test_retransforming_kernel_is_a_misuse() {
        // Documented misuse: leaving transform_kernel set while the kernel
        // planes stay resident transforms an already-frequency-domain kernel
        // again and corrupts the result. This is the caller's contract to
        // uphold; the kernel does not detect it.
        let n = 16;
        let in_re = noise(n, 15);
        let in_im = vec![0.0f32; n];
        let k_re = noise(n, 16);
        let k_im = vec![0.0f32; n];

        let (want_re, _) = reference_convolution(&in_re, &in_im, &k_re, &k_im);

        let mut conv = FastConvolver::with_capacity(n);
        let mut buf = WorkingBuffer::with_capacity(n);
        load(&mut buf, Plane::KernelRe, &k_re);
        load(&mut buf, Plane::KernelIm, &k_im);

        // Iteration 0: correct.
        load(&mut buf, Plane::InputRe, &in_re);
        load(&mut buf, Plane::InputIm, &in_im);
        conv.convolve(&mut buf, &request(n, true), 0).unwrap();
        assert_close(
            buf.plane(Plane::InputRe, n).unwrap(),
            &want_re,
            1e-3,
            "first use",
        );

        // Iteration 1 with the flag still set: wrong.
        load(&mut buf, Plane::InputRe, &in_re);
        load(&mut buf, Plane::InputIm, &in_im);
        conv.convolve(&mut buf, &request(n, true), 1).unwrap();
        let got_re = buf.plane(Plane::InputRe, n).unwrap();
        let max_err = got_re
            .iter()
            .zip(want_re.iter())
            .fold(0.0f32, |m, (g, w)| m.max((g - w).abs()));
        assert!(
            max_err > 1e-2,
            "double transform should corrupt the result, max_err={}",
            max_err
        );
    }

    #[test]
    fn test_preconditions_rejected_before_compute() {
        let mut conv = FastConvolver::with_capacity(64);
        let mut buf = WorkingBuffer::with_capacity(64);

        assert!(matches!(
            conv.convolve(&mut buf, &request(0, false), 0),
            Err(ConvolveError::EmptyRequest)
        ));
        assert!(matches!(
            conv.convolve(&mut buf, &request(65, false), 0),
            Err(ConvolveError::CapacityExceeded { .. })
        ));

        // Mid-batch size change.
        conv.convolve(&mut buf, &request(32, true), 0).unwrap();
        assert!(matches!(
            conv.convolve(&mut buf, &request(16, false), 1),
            Err(ConvolveError::SizeChangedMidBatch {
                planned: Some(32),
                requested: 16,
                iteration: 1
            })
        ));
        // Back at iteration 0 the new size is fine.
        conv.convolve(&mut buf, &request(16, true), 0).unwrap();
    }

    proptest! {
        #[test]
        fn prop_convolution_is_linear(
            a in prop::collection::vec(-1.0f32..1.0, 64),
            b in prop::collection::vec(-1.0f32..1.0, 64),
            k in prop::collection::vec(-1.0f32..1.0, 64),
        ) {
            let n = 64;
            let zeros = vec![0.0f32; n];
            let sum: Vec<f32> = a.iter().zip(b.iter()).map(|(x, y)| x + y).collect();

            let mut conv = FastConvolver::with_capacity(n);
            let (ra, _) = convolve_once(&mut conv, &a, &zeros, &k, &zeros);
            let (rb, _) = convolve_once(&mut conv, &b, &zeros, &k, &zeros);
            let (rsum, _) = convolve_once(&mut conv, &sum, &zeros, &k, &zeros);

            for i in 0..n {
                let expect = ra[i] + rb[i];
                prop_assert!(
                    (rsum[i] - expect).abs() < 1e-2,
                    "linearity at {}: {} vs {}", i, rsum[i], expect
                );
            }
        }
    }
}
