use glam::{DVec2, IVec2};

use super::*;
use crate::buffer::Buffer;
use crate::testing::{cut, init_tracing, pattern_scene};

const SIZE: usize = 40;
const BASE: usize = 12;

fn scene() -> Buffer<u8> {
    pattern_scene(64, 64)
}

/// Reference window of the scene.
fn reference(scene: &Buffer<u8>) -> Buffer<u8> {
    cut(scene, BASE, BASE, SIZE, SIZE)
}

/// Window of the scene moved by `(dx, dy)` relative to the reference.
fn moved(scene: &Buffer<u8>, dx: i32, dy: i32) -> Buffer<u8> {
    let x = (BASE as i32 + dx) as usize;
    let y = (BASE as i32 + dy) as usize;
    cut(scene, x, y, SIZE, SIZE)
}

fn solid(value: u8) -> Buffer<u8> {
    Buffer::new_filled(8, 8, value)
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_default_config_is_valid() {
    let config = MatchConfig::default();
    config.validate();
    assert_eq!(config.movement, 0.75);
    assert_eq!(config.axis, AlignAxis::Both);
    assert_eq!(config.metric, DiffMetric::L2);
    assert_eq!((config.start_level, config.max_level), (1, 6));
}

#[test]
fn test_builders() {
    let config = MatchConfig::default()
        .with_movement(0.5)
        .with_axis(AlignAxis::Vertical)
        .with_metric(DiffMetric::L1)
        .with_levels(2, 4)
        .with_max_difference(0.0)
        .with_epsilon(0.02);
    config.validate();
    assert_eq!(config.movement_vector(), DVec2::new(0.0, 0.5));
    assert_eq!((config.start_level, config.max_level), (2, 4));
}

#[test]
#[should_panic(expected = "movement must be in [0, 1]")]
fn test_movement_out_of_range_panics() {
    MatchConfig {
        movement: 1.5,
        ..Default::default()
    }
    .validate();
}

#[test]
#[should_panic(expected = "must not be below start_level")]
fn test_inverted_levels_panic() {
    MatchConfig::default().with_levels(4, 2);
}

#[test]
#[should_panic(expected = "epsilon must be in [0, 1)")]
fn test_epsilon_of_one_panics() {
    MatchConfig::default().with_epsilon(1.0);
}

#[test]
fn test_config_serde_uses_defaults_for_missing_fields() {
    let config: MatchConfig =
        serde_json::from_str(r#"{"axis":"Horizontal","metric":"L1"}"#).unwrap();
    assert_eq!(config.axis, AlignAxis::Horizontal);
    assert_eq!(config.metric, DiffMetric::L1);
    assert_eq!(config.max_difference, 0.10);

    let json = serde_json::to_string(&config).unwrap();
    assert_eq!(serde_json::from_str::<MatchConfig>(&json).unwrap(), config);
}

// ============================================================================
// Match result
// ============================================================================

#[test]
fn test_unmatched_is_not_usable() {
    let result = MatchResult::unmatched();
    assert!(!result.is_usable());
    assert_eq!(result.error, f64::INFINITY);
    assert_eq!(result.overlap, 0.0);
}

#[test]
fn test_reverse_negates_offset_only() {
    let result = MatchResult {
        offset: DVec2::new(5.0, -3.0),
        error: 0.25,
        overlap: 0.5,
    };
    let reversed = result.reverse();
    assert_eq!(reversed.offset, DVec2::new(-5.0, 3.0));
    assert_eq!(reversed.error, 0.25);
    assert_eq!(reversed.reverse(), result);
}

// ============================================================================
// Difference score
// ============================================================================

#[test]
fn test_difference_metrics() {
    let (a, b) = (solid(100), solid(110));
    let pair = Pair::new(&a, &b, None, None);
    let unit = 10.0 / 255.0;

    let l2 = difference(&pair, IVec2::ZERO, 1, &MatchConfig::default());
    let l1 = difference(
        &pair,
        IVec2::ZERO,
        1,
        &MatchConfig::default().with_metric(DiffMetric::L1),
    );
    assert!((l2 - unit * unit).abs() < 1e-12);
    assert!((l1 - unit).abs() < 1e-12);
}

#[test]
fn test_difference_epsilon_ignores_small_deviations() {
    let (a, b) = (solid(100), solid(110));
    let matcher = Matcher::new(MatchConfig::default().with_epsilon(0.05));
    assert_eq!(matcher.error_at(&a, &b, None, None, IVec2::ZERO), 0.0);

    let matcher = Matcher::new(MatchConfig::default().with_epsilon(0.02));
    let expected = (10.0 / 255.0 - 0.02_f64).powi(2);
    let error = matcher.error_at(&a, &b, None, None, IVec2::ZERO);
    assert!((error - expected).abs() < 1e-12);
}

#[test]
fn test_difference_rejects_small_overlap() {
    let (a, b) = (solid(50), solid(50));
    let pair = Pair::new(&a, &b, None, None);
    let config = MatchConfig::default();

    // 1 of 64 pixels overlaps, below 10%.
    assert_eq!(difference(&pair, IVec2::new(7, 7), 1, &config), f64::INFINITY);
    assert_eq!(difference(&pair, IVec2::new(8, 8), 1, &config), f64::INFINITY);
    // 8 of 64 is enough.
    assert_eq!(difference(&pair, IVec2::new(7, 0), 1, &config), 0.0);

    let relaxed = MatchConfig {
        min_overlap: 1.0 / 64.0,
        ..Default::default()
    };
    assert_eq!(difference(&pair, IVec2::new(7, 7), 1, &relaxed), 0.0);
}

#[test]
fn test_difference_weighs_by_alpha() {
    // Left half differs, but its alpha is zero.
    let a = solid(100);
    let b = Buffer::from_fn(8, 8, |x, _| if x < 4 { 200u8 } else { 100 });
    let alpha = Buffer::from_fn(8, 8, |x, _| if x < 4 { 0u8 } else { 255 });
    let config = MatchConfig::default();

    let masked = Pair::new(&a, &b, None, Some(&alpha));
    assert_eq!(difference(&masked, IVec2::ZERO, 1, &config), 0.0);

    let unmasked = Pair::new(&a, &b, None, None);
    assert!(difference(&unmasked, IVec2::ZERO, 1, &config) > 0.0);
}

#[test]
fn test_difference_rejects_low_coverage() {
    let (a, b) = (solid(100), solid(100));
    let sparse = Buffer::from_fn(8, 8, |x, y| if x == 0 && y == 0 { 255u8 } else { 0 });
    let pair = Pair::new(&a, &b, Some(&sparse), None);
    assert_eq!(
        difference(&pair, IVec2::ZERO, 1, &MatchConfig::default()),
        f64::INFINITY
    );

    let relaxed = MatchConfig {
        min_coverage: 0.0,
        ..Default::default()
    };
    assert_eq!(difference(&pair, IVec2::ZERO, 1, &relaxed), 0.0);
}

#[test]
fn test_difference_stride_covers_all_columns() {
    // A single differing column must be seen at stride 2 because the sampled
    // column rotates per row.
    let a = solid(0);
    let b = Buffer::from_fn(8, 8, |x, _| if x == 3 { 255u8 } else { 0 });
    let pair = Pair::new(&a, &b, None, None);
    let config = MatchConfig::default();

    assert!(difference(&pair, IVec2::ZERO, 2, &config) > 0.0);
    assert!((difference(&pair, IVec2::ZERO, 1, &config) - 1.0 / 8.0).abs() < 1e-12);
}

#[test]
#[should_panic(expected = "alpha of the second buffer must match its extent")]
fn test_alpha_extent_mismatch_panics() {
    let (a, b) = (solid(0), solid(0));
    let alpha = Buffer::new_filled(4, 4, 255u8);
    Pair::new(&a, &b, None, Some(&alpha));
}

// ============================================================================
// Offset search
// ============================================================================

#[test]
fn test_identical_buffers() {
    let a = reference(&scene());
    let result = Matcher::default().find_offset(&a, &a, None, None);
    assert_eq!(result.offset, DVec2::ZERO);
    assert_eq!(result.error, 0.0);
    assert_eq!(result.overlap, 1.0);
}

#[test]
fn test_finds_known_shift() {
    init_tracing();
    let scene = scene();
    let a = reference(&scene);
    let b = moved(&scene, 5, -3);

    let result = Matcher::default().find_offset(&a, &b, None, None);
    assert_eq!(result.offset, DVec2::new(5.0, -3.0));
    assert_eq!(result.error, 0.0);
    assert!((result.overlap - 35.0 * 37.0 / 1600.0).abs() < 1e-12);

    let back = Matcher::default().find_offset(&b, &a, None, None);
    assert_eq!(back.offset, result.reverse().offset);
}

#[test]
fn test_recovers_shifts_across_the_window() {
    let scene = scene();
    let a = reference(&scene);
    let matcher = Matcher::default();

    for (dx, dy) in [(-10, -10), (-10, 10), (10, -10), (10, 10), (0, 7), (-3, 0), (7, 2)] {
        let result = matcher.find_offset(&a, &moved(&scene, dx, dy), None, None);
        assert_eq!(
            result.offset,
            DVec2::new(dx as f64, dy as f64),
            "shift ({dx}, {dy})"
        );
    }
}

#[test]
fn test_l1_metric() {
    let scene = scene();
    let matcher = Matcher::new(MatchConfig::default().with_metric(DiffMetric::L1));
    let result = matcher.find_offset(&reference(&scene), &moved(&scene, -7, 4), None, None);
    assert_eq!(result.offset, DVec2::new(-7.0, 4.0));
}

#[test]
fn test_higher_start_level() {
    let scene = scene();
    let matcher = Matcher::new(MatchConfig::default().with_levels(3, 6));
    let result = matcher.find_offset(&reference(&scene), &moved(&scene, -4, 8), None, None);
    assert_eq!(result.offset, DVec2::new(-4.0, 8.0));
}

#[test]
fn test_alpha_hides_corrupted_region() {
    let scene = scene();
    let a = reference(&scene);
    let clean = moved(&scene, 6, 2);
    let corrupt = |x: usize, y: usize| x >= 20 && y >= 20;
    let b = Buffer::from_fn(SIZE, SIZE, |x, y| {
        if corrupt(x, y) {
            255
        } else {
            clean[(x, y)]
        }
    });
    let alpha = Buffer::from_fn(SIZE, SIZE, |x, y| if corrupt(x, y) { 0u8 } else { 255 });

    let with_alpha = Matcher::default().find_offset(&a, &b, None, Some(&alpha));
    assert_eq!(with_alpha.offset, DVec2::new(6.0, 2.0));
    assert_eq!(with_alpha.error, 0.0);

    let without = Matcher::default().find_offset(&a, &b, None, None);
    assert_ne!(without.offset, DVec2::new(6.0, 2.0));
}

#[test]
fn test_fully_transparent_is_unmatched() {
    let scene = scene();
    let transparent = Buffer::new_filled(SIZE, SIZE, 0u8);
    let result = Matcher::default().find_offset(
        &reference(&scene),
        &moved(&scene, 6, 2),
        None,
        Some(&transparent),
    );
    assert!(!result.is_usable());
    assert_eq!(result, MatchResult::unmatched());
}

#[test]
fn test_horizontal_axis() {
    let scene = scene();
    let a = reference(&scene);
    let matcher = Matcher::new(MatchConfig::default().with_axis(AlignAxis::Horizontal));

    let result = matcher.find_offset(&a, &moved(&scene, 9, 0), None, None);
    assert_eq!(result.offset, DVec2::new(9.0, 0.0));

    // Vertical movement cannot be expressed: the vertical offset stays pinned.
    let result = matcher.find_offset(&a, &moved(&scene, 0, 5), None, None);
    assert_eq!(result.offset.y, 0.0);
}

#[test]
fn test_vertical_axis() {
    let scene = scene();
    let matcher = Matcher::new(MatchConfig::default().with_axis(AlignAxis::Vertical));
    let result = matcher.find_offset(&reference(&scene), &moved(&scene, 0, -6), None, None);
    assert_eq!(result.offset, DVec2::new(0.0, -6.0));
}

#[test]
fn test_area_without_enough_overlap_is_unmatched() {
    let scene = scene();
    let (a, b) = (reference(&scene), moved(&scene, 5, 5));
    let matcher = Matcher::default();

    let outside = SearchArea::new(40, 45, 0, 3);
    assert!(!matcher.find_offset_in(&a, &b, None, None, outside).is_usable());

    let corner = SearchArea::new(37, 39, 37, 39);
    assert!(!matcher.find_offset_in(&a, &b, None, None, corner).is_usable());
}

#[test]
fn test_single_point_area() {
    let scene = scene();
    let (a, b) = (reference(&scene), moved(&scene, 3, 3));
    let area = SearchArea::point(IVec2::new(3, 3));
    let result = Matcher::default().find_offset_in(&a, &b, None, None, area);
    assert_eq!(result.offset, DVec2::new(3.0, 3.0));
    assert_eq!(result.error, 0.0);
}

#[test]
fn test_error_at() {
    let scene = scene();
    let (a, b) = (reference(&scene), moved(&scene, 3, 3));
    let matcher = Matcher::default();
    assert_eq!(matcher.error_at(&a, &b, None, None, IVec2::new(3, 3)), 0.0);
    assert!(matcher.error_at(&a, &b, None, None, IVec2::ZERO) > 0.0);
}

#[test]
fn test_search_area_follows_hint() {
    let matcher = Matcher::default();
    let (a, b) = (Buffer::new_filled(40, 40, 0u8), Buffer::new_filled(40, 40, 0u8));

    let centred = matcher.search_area(&a, &b, DVec2::ZERO);
    assert_eq!(centred, SearchArea::new(-29, 29, -29, 29));

    let hinted = matcher.search_area(&a, &b, DVec2::new(20.0, 0.0));
    assert_eq!(hinted, SearchArea::new(-9, 39, -29, 29));
}
