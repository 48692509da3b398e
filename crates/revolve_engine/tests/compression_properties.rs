//! Property tests for the built-in codecs.
//!
//! Every built-in scheme must round-trip any field of any shape within its
//! error bound: exactly for `none` and `zstd`, within `tolerance` for
//! `quantize` at any magnitude.

use approx::assert_abs_diff_eq;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use revolve_engine::compression::{Codec, CompressionParams, Scheme};
use revolve_engine::Field;

fn field_strategy(magnitude: f64) -> impl Strategy<Value = Field> {
    prop::collection::vec(1usize..8, 0..4).prop_flat_map(move |shape| {
        let len: usize = shape.iter().product();
        prop::collection::vec(-magnitude..magnitude, len)
            .prop_map(move |values| Field::new(shape.clone(), values).unwrap())
    })
}

fn roundtrip(params: &CompressionParams, field: &Field) -> Field {
    let codec = params.resolve().unwrap();
    let payload = codec.compress(params, field).unwrap();
    codec.decompress(params, &payload).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_lossless_schemes_are_exact(field in field_strategy(1e12)) {
        for scheme in [Scheme::None, Scheme::Zstd] {
            let params = CompressionParams::new(scheme);
            prop_assert_eq!(&roundtrip(&params, &field), &field);
        }
    }

    #[test]
    fn prop_quantize_within_tolerance(
        field in field_strategy(1e12),
        exponent in 2i32..9,
    ) {
        let tolerance = 10f64.powi(-exponent);
        let params = CompressionParams::new(Scheme::Quantize).with_tolerance(tolerance);
        let restored = roundtrip(&params, &field);
        prop_assert_eq!(restored.shape(), field.shape());
        for (a, b) in field.values().iter().zip(restored.values()) {
            prop_assert!(
                (a - b).abs() <= tolerance,
                "{} vs {} at tolerance {}", a, b, tolerance
            );
        }
    }

    #[test]
    fn prop_zstd_level_does_not_change_content(
        field in field_strategy(1e3),
        level in 1i32..10,
    ) {
        let params = CompressionParams::new(Scheme::Zstd).with_level(level);
        prop_assert_eq!(&roundtrip(&params, &field), &field);
    }
}

#[test]
fn quantize_random_walk_roundtrip() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut value = 0.0;
    let values: Vec<f64> = (0..4096)
        .map(|_| {
            value += rng.gen_range(-0.01..0.01);
            value
        })
        .collect();
    let field = Field::new(vec![64, 64], values).unwrap();
    let params = CompressionParams::new(Scheme::Quantize).with_tolerance(1e-6);

    let restored = roundtrip(&params, &field);
    for (a, b) in field.values().iter().zip(restored.values()) {
        assert_abs_diff_eq!(*a, *b, epsilon = 1e-6);
    }

    // Smooth data compresses well below the raw size.
    let codec = params.resolve().unwrap();
    let payload = codec.compress(&params, &field).unwrap();
    assert!(payload.size_bytes() * 2 < field.memory_size());
}

#[test]
fn quantize_bound_holds_at_large_magnitude() {
    let values: Vec<f64> = (0..2000).map(|i| 1.0e9 + i as f64 * 0.123456789).collect();
    let field = Field::from_vec(values);
    let params = CompressionParams::new(Scheme::Quantize).with_tolerance(1e-7);

    let restored = roundtrip(&params, &field);
    for (a, b) in field.values().iter().zip(restored.values()) {
        assert!((a - b).abs() <= 1e-7, "{} vs {}", a, b);
    }
}

#[test]
fn non_finite_values_survive_every_builtin() {
    let field = Field::new(
        vec![2, 3],
        vec![f64::INFINITY, -0.0, 1.5, f64::NEG_INFINITY, f64::MIN_POSITIVE, 7.0],
    )
    .unwrap();
    for scheme in Scheme::BUILTIN {
        let restored = roundtrip(&CompressionParams::new(scheme), &field);
        assert_eq!(restored.values()[0], f64::INFINITY, "{scheme}");
        assert_eq!(restored.values()[3], f64::NEG_INFINITY, "{scheme}");
        assert_eq!(restored.values()[5], 7.0, "{scheme}");
    }
}
