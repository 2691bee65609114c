//! Standard normal distribution helpers
//!
//! Pure numeric functions used to turn a mean and a standard error into a
//! confidence half-width or a one-sided probability.
//!
//! - `erf_inv` is Winitzki's closed-form approximation: cheap, and accurate to
//!   a few parts in a thousand over the confidence levels used for reporting.
//! - `standard_normal_cdf` uses the exact `erf` from libm, so the approximation
//!   error of `erf_inv` is only paid once (on the quantile side).

use std::f64::consts::{PI, SQRT_2};

/// Shape constant of Winitzki's approximation, `8(π - 3) / (3π(4 - π))`
const WINITZKI_A: f64 = 8.0 * (PI - 3.0) / (3.0 * PI * (4.0 - PI));

/// Inverse of the error function
///
/// Defined on the open interval `(-1, 1)`. At the boundary the limit
/// (`±∞`) is returned, outside of it the result is NaN.
///
/// # Example
/// ```
/// use pairbench::gaussian::erf_inv;
///
/// assert_eq!(erf_inv(0.0), 0.0);
/// assert!(erf_inv(1.5).is_nan());
/// ```
pub fn erf_inv(x: f64) -> f64 {
    if x.is_nan() || x.abs() > 1.0 {
        return f64::NAN;
    }
    if x.abs() == 1.0 {
        return f64::INFINITY.copysign(x);
    }

    let y = (1.0 - x * x).ln();
    let z = 2.0 / (PI * WINITZKI_A) + y / 2.0;
    ((z * z - y / WINITZKI_A).sqrt() - z).sqrt().copysign(x)
}

/// Cumulative distribution function of the standard normal law
pub fn standard_normal_cdf(q: f64) -> f64 {
    0.5 * (1.0 + libm::erf(q / SQRT_2))
}

/// Quantile function of the standard normal law
///
/// # Panics
/// Panics if `p` is outside `[0, 1]`. Callers pass fixed confidence levels,
/// so a bad argument is a bug rather than a runtime condition.
pub fn standard_normal_quantile(p: f64) -> f64 {
    assert!(
        (0.0..=1.0).contains(&p),
        "quantile probability must be in [0, 1], got {}",
        p
    );
    SQRT_2 * erf_inv(2.0 * p - 1.0)
}

/// z-value for a two-sided interval at the given confidence (e.g. 0.95)
pub fn confidence_z(confidence: f64) -> f64 {
    standard_normal_quantile(0.5 + confidence / 2.0)
}
