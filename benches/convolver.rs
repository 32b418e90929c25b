//! Benchmarks for the fast-convolution stage.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rand::{Rng, SeedableRng, rngs::StdRng};

use fastconv::{
    compute::{FastConvolver, Plane, WorkingBuffer},
    schema::ConvolutionRequest,
};

fn bench_convolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("convolve");

    for size in [256usize, 1024, 4096, 16384] {
        let mut rng = StdRng::seed_from_u64(42);
        let mut convolver = FastConvolver::with_capacity(size);
        let mut buffer = WorkingBuffer::with_capacity(size);

        for plane in [Plane::InputRe, Plane::InputIm, Plane::KernelRe, Plane::KernelIm] {
            for v in buffer.plane_mut(plane, size).unwrap() {
                *v = rng.gen_range(-1.0..1.0);
            }
        }

        // Transform the kernel once up front; the measured loop reuses it
        // along with the cached plan, which is the steady-state workload.
        let warmup = ConvolutionRequest {
            elements: size,
            transform_kernel: true,
            ..ConvolutionRequest::default()
        };
        convolver.convolve(&mut buffer, &warmup, 0).unwrap();

        let request = ConvolutionRequest {
            elements: size,
            transform_kernel: false,
            ..ConvolutionRequest::default()
        };

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            let mut iteration = 1usize;
            b.iter(|| {
                convolver
                    .convolve(black_box(&mut buffer), &request, iteration)
                    .unwrap();
                iteration += 1;
            });
        });
    }

    group.finish();
}

fn bench_plan_rebuild(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan_rebuild");

    for size in [1024usize, 16384] {
        let mut convolver = FastConvolver::with_capacity(16384);
        let mut buffer = WorkingBuffer::with_capacity(16384);
        buffer.plane_mut(Plane::InputRe, size).unwrap()[0] = 1.0;
        buffer.plane_mut(Plane::KernelRe, size).unwrap()[0] = 1.0;

        let request = ConvolutionRequest {
            elements: size,
            transform_kernel: false,
            ..ConvolutionRequest::default()
        };
        let other = ConvolutionRequest {
            elements: size / 2,
            transform_kernel: false,
            ..ConvolutionRequest::default()
        };

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                // Alternate sizes so every call pays the rebuild.
                convolver
                    .convolve(black_box(&mut buffer), &other, 0)
                    .unwrap();
                convolver
                    .convolve(black_box(&mut buffer), &request, 0)
                    .unwrap();
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_convolve, bench_plan_rebuild);
criterion_main!(benches);
