//! Poisson probability masses.

/// Natural logarithm of `k!`.
#[inline]
pub fn ln_factorial(k: u8) -> f64 {
    (2..=k as u32).map(|i| f64::ln(i as f64)).sum()
}

/// Probability of exactly `k` events given the mean rate `lambda`. Computed in log space, so
/// large `k` does not overflow. Non-positive rates place all mass on `k = 0`.
#[inline]
pub fn univariate(k: u8, lambda: f64) -> f64 {
    if lambda <= 0.0 {
        return if k == 0 { 1.0 } else { 0.0 };
    }
    f64::exp(k as f64 * lambda.ln() - lambda - ln_factorial(k))
}

/// Populates `masses[k]` with the probability of exactly `k` events, for `k` in `0..masses.len()`,
/// using the recurrence `P(k) = P(k - 1) · λ / k`.
pub fn fill_masses(lambda: f64, masses: &mut [f64]) {
    if masses.is_empty() {
        return;
    }
    let lambda = f64::max(0.0, lambda);
    masses[0] = f64::exp(-lambda);
    for k in 1..masses.len() {
        masses[k] = masses[k - 1] * lambda / k as f64;
    }
}
