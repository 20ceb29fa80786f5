//! Residual diagnostics shown under the regression summary.
//!
//! Omnibus is D'Agostino's K² (squared skew-test and kurtosis-test z-scores),
//! Jarque-Bera uses the biased sample moments, and both are referred to a
//! chi-squared distribution with 2 degrees of freedom.

use statrs::distribution::{ChiSquared, ContinuousCDF};

#[derive(Debug, Clone, Copy)]
pub struct ResidualDiagnostics {
    pub omnibus: f64,
    pub omnibus_pvalue: f64,
    pub skew: f64,
    /// Pearson kurtosis (3 for a normal distribution).
    pub kurtosis: f64,
    pub durbin_watson: f64,
    pub jarque_bera: f64,
    pub jarque_bera_pvalue: f64,
}

impl ResidualDiagnostics {
    pub fn from_residuals(resid: &[f64]) -> Self {
        let (omnibus, omnibus_pvalue) = omnibus(resid);
        let (jarque_bera, jarque_bera_pvalue) = jarque_bera(resid);
        Self {
            omnibus,
            omnibus_pvalue,
            skew: skewness(resid),
            kurtosis: kurtosis(resid),
            durbin_watson: durbin_watson(resid),
            jarque_bera,
            jarque_bera_pvalue,
        }
    }
}

/// Biased central moments m2, m3, m4.
fn central_moments(x: &[f64]) -> (f64, f64, f64) {
    let n = x.len() as f64;
    let mean = x.iter().sum::<f64>() / n;
    let (m2, m3, m4) = x.iter().fold((0.0, 0.0, 0.0), |(a, b, c), &v| {
        let d = v - mean;
        let d2 = d * d;
        (a + d2, b + d2 * d, c + d2 * d2)
    });
    (m2 / n, m3 / n, m4 / n)
}

pub fn skewness(x: &[f64]) -> f64 {
    if x.is_empty() {
        return f64::NAN;
    }
    let (m2, m3, _) = central_moments(x);
    m3 / m2.powf(1.5)
}

/// Pearson (non-excess) kurtosis.
pub fn kurtosis(x: &[f64]) -> f64 {
    if x.is_empty() {
        return f64::NAN;
    }
    let (m2, _, m4) = central_moments(x);
    m4 / (m2 * m2)
}

pub fn durbin_watson(resid: &[f64]) -> f64 {
    let ss: f64 = resid.iter().map(|e| e * e).sum();
    let diff: f64 = resid.windows(2).map(|w| (w[1] - w[0]).powi(2)).sum();
    diff / ss
}

fn chi2_2_sf(stat: f64) -> f64 {
    if stat.is_nan() {
        return f64::NAN;
    }
    if stat.is_infinite() {
        return 0.0;
    }
    match ChiSquared::new(2.0) {
        Ok(dist) => dist.sf(stat),
        Err(_) => f64::NAN,
    }
}

/// Jarque-Bera statistic and its p-value.
pub fn jarque_bera(resid: &[f64]) -> (f64, f64) {
    let n = resid.len() as f64;
    let s = skewness(resid);
    let k = kurtosis(resid);
    let jb = n / 6.0 * (s * s + (k - 3.0).powi(2) / 4.0);
    (jb, chi2_2_sf(jb))
}

/// z-score of the skewness test. Needs at least 8 observations.
pub fn skew_test(x: &[f64]) -> Option<f64> {
    if x.len() < 8 {
        return None;
    }
    let n = x.len() as f64;
    let b2 = skewness(x);
    let y = b2 * (((n + 1.0) * (n + 3.0)) / (6.0 * (n - 2.0))).sqrt();
    let beta2 = 3.0 * (n * n + 27.0 * n - 70.0) * (n + 1.0) * (n + 3.0)
        / ((n - 2.0) * (n + 5.0) * (n + 7.0) * (n + 9.0));
    let w2 = -1.0 + (2.0 * (beta2 - 1.0)).sqrt();
    let delta = 1.0 / (0.5 * w2.ln()).sqrt();
    let alpha = (2.0 / (w2 - 1.0)).sqrt();
    let y = if y == 0.0 { 1.0 } else { y };
    Some(delta * (y / alpha + ((y / alpha).powi(2) + 1.0).sqrt()).ln())
}

/// z-score of the kurtosis test. Needs at least 5 observations.
pub fn kurtosis_test(x: &[f64]) -> Option<f64> {
    if x.len() < 5 {
        return None;
    }
    let n = x.len() as f64;
    let b2 = kurtosis(x);
    let e = 3.0 * (n - 1.0) / (n + 1.0);
    let varb2 = 24.0 * n * (n - 2.0) * (n - 3.0) / ((n + 1.0).powi(2) * (n + 3.0) * (n + 5.0));
    let z = (b2 - e) / varb2.sqrt();
    let sqrtbeta1 = 6.0 * (n * n - 5.0 * n + 2.0) / ((n + 7.0) * (n + 9.0))
        * ((6.0 * (n + 3.0) * (n + 5.0)) / (n * (n - 2.0) * (n - 3.0))).sqrt();
    let a = 6.0 + 8.0 / sqrtbeta1 * (2.0 / sqrtbeta1 + (1.0 + 4.0 / sqrtbeta1.powi(2)).sqrt());
    let term1 = 1.0 - 2.0 / (9.0 * a);
    let denom = 1.0 + z * (2.0 / (a - 4.0)).sqrt();
    if denom == 0.0 {
        return Some(f64::NAN);
    }
    let term2 = denom.signum() * ((1.0 - 2.0 / a) / denom.abs()).powf(1.0 / 3.0);
    Some((term1 - term2) / (2.0 / (9.0 * a)).sqrt())
}

/// D'Agostino-Pearson omnibus statistic and its p-value.
pub fn omnibus(resid: &[f64]) -> (f64, f64) {
    match (skew_test(resid), kurtosis_test(resid)) {
        (Some(zs), Some(zk)) => {
            let k2 = zs * zs + zk * zk;
            (k2, chi2_2_sf(k2))
        }
        _ => (f64::NAN, f64::NAN),
    }
}
