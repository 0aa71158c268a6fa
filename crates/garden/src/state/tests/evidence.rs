use proptest::prelude::*;

use super::common::*;
use crate::state::evidence::{confidence_score, EvidenceError, EvidenceWindow};

#[test]
fn window_spans_first_to_last_reading() {
    let readings = vec![
        soil_reading(0, 2100),
        soil_reading(60, 2100),
        soil_reading(180, 2000),
    ];

    let window = EvidenceWindow::from_readings(&readings).expect("ordered readings");

    assert_eq!(window.window_start, at(0));
    assert_eq!(window.window_end, at(180));
    assert_eq!(window.sample_count, 3);
    assert_eq!(window.span().num_seconds(), 180);
}

#[test]
fn single_reading_gives_zero_width_window() {
    let window =
        EvidenceWindow::from_readings(&[light_reading(42, 900)]).expect("one reading is enough");

    assert_eq!(window.window_start, window.window_end);
    assert_eq!(window.sample_count, 1);
}

#[test]
fn rejects_empty_and_unordered_input() {
    let empty: Vec<crate::readings::Reading> = Vec::new();
    assert_eq!(
        EvidenceWindow::from_readings(&empty),
        Err(EvidenceError::Empty)
    );

    let unordered = vec![
        light_reading(0, 900),
        light_reading(30, 900),
        light_reading(15, 900),
    ];
    assert_eq!(
        EvidenceWindow::from_readings(&unordered),
        Err(EvidenceError::OutOfOrder { index: 2 })
    );
}

#[test]
fn confidence_is_sample_sufficiency() {
    assert_eq!(confidence_score(0, 5), 0.0);
    assert!(approx_eq(confidence_score(3, 5), 0.6));
    assert_eq!(confidence_score(5, 5), 1.0);
    assert_eq!(confidence_score(12, 5), 1.0);
    assert_eq!(confidence_score(0, 0), 1.0);
}

proptest! {
    #[test]
    fn confidence_stays_in_unit_interval_and_never_drops_with_more_samples(
        count in 0usize..500,
        min_samples in 1usize..100,
    ) {
        let score = confidence_score(count, min_samples);
        prop_assert!((0.0..=1.0).contains(&score));
        prop_assert!(confidence_score(count + 1, min_samples) >= score);
    }
}
