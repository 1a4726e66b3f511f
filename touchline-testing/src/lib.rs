//! Assertions shared by the touchline test suites.

use assert_float_eq::*;

pub fn assert_slice_f64_near(expected: &[f64], actual: &[f64], distance: u32) {
    assert_same_len(expected, actual);
    for (index, &expected) in expected.iter().enumerate() {
        let actual = actual[index];
        if actual != expected {
            assert_f64_near!(expected, actual, distance);
        }
    }
}

pub fn assert_slice_f64_relative(expected: &[f64], actual: &[f64], epsilon: f64) {
    assert_same_len(expected, actual);
    for (index, &expected) in expected.iter().enumerate() {
        let actual = actual[index];
        if actual != expected {
            assert_float_relative_eq!(expected, actual, epsilon);
        }
    }
}

pub fn assert_slice_f64_absolute(expected: &[f64], actual: &[f64], epsilon: f64) {
    assert_same_len(expected, actual);
    for (index, &expected) in expected.iter().enumerate() {
        assert_float_absolute_eq!(expected, actual[index], epsilon);
    }
}

/// Asserts that the elements of `values` add up to `expected` within `epsilon`.
pub fn assert_sums_to(expected: f64, values: &[f64], epsilon: f64) {
    let sum: f64 = values.iter().sum();
    assert!(
        (sum - expected).abs() <= epsilon,
        "{values:?} sums to {sum}, expected {expected} ± {epsilon}"
    );
}

/// Asserts that every element lies in `[min, max]`.
pub fn assert_within(min: f64, max: f64, values: &[f64]) {
    for (index, &value) in values.iter().enumerate() {
        assert!(
            (min..=max).contains(&value),
            "element {index} ({value}) outside of [{min}, {max}]"
        );
    }
}

/// Asserts that the elements never increase from one index to the next.
pub fn assert_non_increasing(values: &[f64]) {
    for window in values.windows(2) {
        assert!(
            window[0] >= window[1],
            "{values:?} is not non-increasing at {} → {}",
            window[0],
            window[1]
        );
    }
}

fn assert_same_len(expected: &[f64], actual: &[f64]) {
    assert_eq!(
        expected.len(),
        actual.len(),
        "lengths do not match: {} ≠ {}",
        expected.len(),
        actual.len()
    );
}
