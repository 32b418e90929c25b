//! Fast-convolution CLI - Run a batch job from JSON configuration.
//!
//! Builds an in-memory staging store holding a synthetic chunked signal and
//! the job's kernel, then drives the convolution stage over every chunk:
//! gather via the stage adapter's input declarations, convolve in place,
//! scatter via the output declarations. Chunks are partitioned into
//! contiguous per-worker batches; each worker owns an independent convolver
//! and working buffer.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use log::info;
use rayon::prelude::*;

use fastconv::{
    compute::{
        ELEMENT_SIZE, FastConvolver, HostStore, Plane, StagingError, WorkingBuffer,
        describe_output, stage_in,
    },
    schema::{ConvolutionRequest, JobConfig},
};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <job.json> [chunks]", args[0]);
        eprintln!();
        eprintln!("Run a fast-convolution batch job from JSON configuration.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  job.json  Path to job configuration file");
        eprintln!("  chunks    Override the job's chunk count");
        eprintln!();
        eprintln!("Example configuration is printed with --example.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        println!(
            "{}",
            serde_json::to_string_pretty(&JobConfig::default()).unwrap()
        );
        return;
    }

    let job_path = PathBuf::from(&args[1]);
    let job_str = fs::read_to_string(&job_path).unwrap_or_else(|e| {
        eprintln!("Error reading job file: {}", e);
        std::process::exit(1);
    });
    let mut job: JobConfig = serde_json::from_str(&job_str).unwrap_or_else(|e| {
        eprintln!("Error parsing job: {}", e);
        std::process::exit(1);
    });
    if let Some(chunks) = args.get(2).and_then(|s| s.parse().ok()) {
        job.chunks = chunks;
    }
    if let Err(e) = job.validate() {
        eprintln!("Invalid job: {}", e);
        std::process::exit(1);
    }

    println!("Fast Convolution Batch");
    println!("======================");
    println!("Chunk size: {} complex samples", job.elements);
    println!("Chunks: {}", job.chunks);
    println!("Workers: {}", job.workers);
    println!();

    let start = Instant::now();
    match run_job(&job) {
        Ok(store) => {
            let elapsed = start.elapsed();
            let samples = job.elements as u64 * job.chunks as u64;
            let checksum: f64 = store
                .slice(output_re_base(&job), job.elements * job.chunks)
                .iter()
                .map(|&v| v as f64)
                .sum();

            println!("Done.");
            println!("  Output checksum (re): {:.6}", checksum);
            println!(
                "  Time: {:.3}s ({:.1} chunks/s, {:.2} Msamples/s)",
                elapsed.as_secs_f32(),
                job.chunks as f32 / elapsed.as_secs_f32(),
                samples as f32 / elapsed.as_secs_f32() / 1e6
            );
        }
        Err(e) => {
            eprintln!("Job failed: {}", e);
            std::process::exit(1);
        }
    }
}

/// Element index of the output real plane within the store.
fn output_re_base(job: &JobConfig) -> usize {
    // Layout: input re, input im (chunks * elements each), kernel re, kernel
    // im (elements each), output re, output im.
    2 * job.chunks * job.elements + 2 * job.elements
}

fn build_request(job: &JobConfig) -> ConvolutionRequest {
    let n = job.elements as u64;
    let plane = job.chunks as u64 * n;
    ConvolutionRequest {
        elements: job.elements,
        input_stride: job.elements,
        // One kernel shared by every chunk.
        kernel_stride: 0,
        output_stride: job.elements,
        // The kernel is restaged in time domain on every iteration, so it is
        // transformed on every iteration too.
        transform_kernel: true,
        input_re_addr: 0,
        input_im_addr: plane * ELEMENT_SIZE,
        kernel_re_addr: 2 * plane * ELEMENT_SIZE,
        kernel_im_addr: (2 * plane + n) * ELEMENT_SIZE,
        output_re_addr: (2 * plane + 2 * n) * ELEMENT_SIZE,
        output_im_addr: (3 * plane + 2 * n) * ELEMENT_SIZE,
    }
}

/// Populate the store, run every chunk through the stage, scatter results.
fn run_job(job: &JobConfig) -> Result<HostStore, StagingError> {
    let n = job.elements;
    let plane = n * job.chunks;
    let mut store = HostStore::new(4 * plane + 2 * n);

    // Synthetic input: each chunk gets a distinct two-tone waveform.
    for chunk in 0..job.chunks {
        let freq = (chunk % 7 + 1) as f32;
        let wave: Vec<f32> = (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                (std::f32::consts::TAU * freq * t).sin()
                    + 0.25 * (std::f32::consts::TAU * 3.0 * freq * t).cos()
            })
            .collect();
        store.write(chunk * n, &wave);
    }
    let (kernel_re, kernel_im) = job.kernel.planes(n);
    store.write(2 * plane, &kernel_re);
    store.write(2 * plane + n, &kernel_im);

    let request = build_request(job);

    // Contiguous chunk range per worker; each range is one batch with its
    // own convolver and buffer.
    let per_worker = job.chunks.div_ceil(job.workers);
    let ranges: Vec<std::ops::Range<usize>> = (0..job.workers)
        .map(|w| w * per_worker..((w + 1) * per_worker).min(job.chunks))
        .filter(|r| !r.is_empty())
        .collect();

    let results: Vec<Vec<(usize, Vec<f32>, Vec<f32>)>> = ranges
        .into_par_iter()
        .map(|range| -> Result<_, StagingError> {
            let mut convolver = FastConvolver::with_capacity(job.max_elements);
            let mut buffer = WorkingBuffer::with_capacity(job.max_elements);
            let mut outputs = Vec::with_capacity(range.len());

            for (local_iter, chunk) in range.enumerate() {
                stage_in(&store, &mut buffer, &request, chunk)?;
                convolver.convolve(&mut buffer, &request, local_iter)?;
                outputs.push((
                    chunk,
                    buffer.plane(Plane::InputRe, n)?.to_vec(),
                    buffer.plane(Plane::InputIm, n)?.to_vec(),
                ));
            }
            info!("worker batch complete: {} chunks", outputs.len());
            Ok(outputs)
        })
        .collect::<Result<_, _>>()?;

    for (chunk, out_re, out_im) in results.into_iter().flatten() {
        let descs = describe_output(&request, chunk);
        store.scatter(&descs[0], &out_re)?;
        store.scatter(&descs[1], &out_im)?;
    }

    Ok(store)
}
