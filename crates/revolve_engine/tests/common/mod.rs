//! Shared fixtures for revolve_engine integration tests.

#![allow(dead_code)]

use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use revolve_core::StepRange;
use revolve_engine::compression::{
    Codec, CompressionParams, CompressionResult, NoCompression, Payload,
};
use revolve_engine::{Field, FieldCheckpoint, Revolver};

/// Plain function step, so that revolver types can be named.
pub type Step = fn(&mut Field, StepRange) -> Result<(), Infallible>;

/// Revolver over a `Field` with increment/decrement operators.
pub type IncrementRevolver = Revolver<Field, FieldCheckpoint, Step, Step>;

/// Adds the number of steps to every element.
pub fn increment(state: &mut Field, range: StepRange) -> Result<(), Infallible> {
    state.add_scalar(range.len() as f64);
    Ok(())
}

/// Subtracts the number of steps from every element.
pub fn decrement(state: &mut Field, range: StepRange) -> Result<(), Infallible> {
    state.add_scalar(-(range.len() as f64));
    Ok(())
}

/// Builds an increment/decrement revolver over a zero field of `shape`.
pub fn increment_revolver(
    checkpoints: usize,
    steps: usize,
    shape: Vec<usize>,
    compression: CompressionParams,
) -> IncrementRevolver {
    Revolver::new(
        FieldCheckpoint::new(),
        increment as Step,
        decrement as Step,
        Field::zeros(shape),
        checkpoints,
        steps,
        compression,
    )
    .unwrap()
}

/// Asserts that every element of `field` equals `expected` within `tolerance`.
pub fn assert_all_close(field: &Field, expected: f64, tolerance: f64) {
    for (i, &value) in field.values().iter().enumerate() {
        assert!(
            (value - expected).abs() <= tolerance,
            "element {i}: {value} != {expected} (tolerance {tolerance})"
        );
    }
}

/// Identity codec counting its calls.
#[derive(Clone, Default)]
pub struct CountingCodec {
    pub compressed: Arc<AtomicUsize>,
    pub decompressed: Arc<AtomicUsize>,
}

impl CountingCodec {
    pub fn compress_calls(&self) -> usize {
        self.compressed.load(Ordering::SeqCst)
    }

    pub fn decompress_calls(&self) -> usize {
        self.decompressed.load(Ordering::SeqCst)
    }
}

impl Codec for CountingCodec {
    fn name(&self) -> &str {
        "counting"
    }

    fn compress(&self, params: &CompressionParams, field: &Field) -> CompressionResult<Payload> {
        self.compressed.fetch_add(1, Ordering::SeqCst);
        NoCompression.compress(params, field)
    }

    fn decompress(&self, params: &CompressionParams, payload: &Payload) -> CompressionResult<Field> {
        self.decompressed.fetch_add(1, Ordering::SeqCst);
        NoCompression.decompress(params, payload)
    }
}
