//! Ordinary least squares with classical (nonrobust) standard errors.
//!
//! The coefficients come from a thin QR of the design; the covariance is
//! `scale * (X'X)^{-1}` with `scale = SSR / df_resid`. Inference uses
//! Student's t with `df_resid` degrees of freedom.

use anyhow::{bail, Context, Result};
use ate_linalg::decomposition::{condition_number, QrDecomp};
use ate_linalg::LinalgError;
use statrs::distribution::{ContinuousCDF, FisherSnedecor, StudentsT};
use tracing::{debug, info};

use crate::design::DesignMatrix;

/// Default significance level for confidence intervals.
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Estimate and inference for one design column.
#[derive(Debug, Clone, PartialEq)]
pub struct Coefficient {
    pub name: String,
    pub estimate: f64,
    pub std_err: f64,
    pub t_value: f64,
    pub p_value: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
}

/// A fitted OLS model.
#[derive(Debug, Clone)]
pub struct OlsResult {
    pub outcome: String,
    pub coefficients: Vec<Coefficient>,
    /// Significance level the confidence intervals were computed at.
    pub alpha: f64,
    pub nobs: usize,
    pub n_dropped: usize,
    pub df_model: f64,
    pub df_resid: f64,
    pub ssr: f64,
    pub centered_tss: f64,
    pub scale: f64,
    pub rsquared: f64,
    pub rsquared_adj: f64,
    pub fvalue: f64,
    pub f_pvalue: f64,
    pub llf: f64,
    pub aic: f64,
    pub bic: f64,
    pub cond_no: f64,
    pub fitted: Vec<f64>,
    pub residuals: Vec<f64>,
}

impl OlsResult {
    pub fn coefficient(&self, name: &str) -> Option<&Coefficient> {
        self.coefficients.iter().find(|c| c.name == name)
    }
}

/// Fit `y = X b + e` by least squares.
///
/// Fails if `alpha` is outside (0, 1), if there are no residual degrees of
/// freedom, if the response or a regressor holds an infinite value, or if the
/// design is rank deficient.
pub fn fit_ols(design: &DesignMatrix, alpha: f64) -> Result<OlsResult> {
    if !(alpha > 0.0 && alpha < 1.0) {
        bail!("alpha must lie in (0, 1), got {}", alpha);
    }
    let n = design.nobs();
    let p = design.x.ncols();
    if n <= p {
        bail!(
            "cannot fit {} parameters from {} observations (no residual degrees of freedom)",
            p,
            n
        );
    }

    if design.y.iter().any(|v| !v.is_finite()) {
        bail!("outcome column '{}' contains infinite values", design.outcome);
    }
    if let Some(j) = (0..p).find(|&j| design.x.col(j).iter().any(|v| !v.is_finite())) {
        bail!("regressor '{}' contains infinite values", design.column_names[j]);
    }

    let qr = QrDecomp::new(&design.x).map_err(|e| match e {
        LinalgError::SingularMatrix { column } => anyhow::anyhow!(
            "singular design matrix: column '{}' is linearly dependent on earlier columns",
            design.column_names[column]
        ),
        other => other.into(),
    })?;
    let beta = qr.solve(&design.y)?;

    let fitted = design.x.mat_vec(&beta);
    let residuals: Vec<f64> = design.y.iter().zip(&fitted).map(|(y, f)| y - f).collect();
    let ssr: f64 = residuals.iter().map(|r| r * r).sum();

    let nf = n as f64;
    let df_resid = (n - p) as f64;
    let df_model = (p - 1) as f64;
    let scale = ssr / df_resid;

    let cov_diag = qr.unscaled_covariance().diag();
    let t_dist = StudentsT::new(0.0, 1.0, df_resid).context("invalid t distribution")?;
    let q = t_dist.inverse_cdf(1.0 - alpha / 2.0);

    let coefficients = design
        .column_names
        .iter()
        .zip(beta.iter().zip(&cov_diag))
        .map(|(name, (&estimate, &v))| {
            let std_err = (scale * v).sqrt();
            let t_value = estimate / std_err;
            Coefficient {
                name: name.clone(),
                estimate,
                std_err,
                t_value,
                p_value: two_sided_pvalue(&t_dist, t_value),
                ci_lower: estimate - q * std_err,
                ci_upper: estimate + q * std_err,
            }
        })
        .collect();

    let mean_y = design.y.iter().sum::<f64>() / nf;
    let centered_tss: f64 = design.y.iter().map(|y| (y - mean_y).powi(2)).sum();
    let rsquared = 1.0 - ssr / centered_tss;
    let rsquared_adj = 1.0 - (nf - 1.0) / df_resid * (1.0 - rsquared);

    let (fvalue, f_pvalue) = if df_model > 0.0 {
        let f = ((centered_tss - ssr) / df_model) / scale;
        // 0/0 when the outcome is fitted exactly (e.g. constant zero)
        let pv = if f.is_nan() {
            f64::NAN
        } else if f.is_infinite() {
            0.0
        } else {
            FisherSnedecor::new(df_model, df_resid)
                .map(|d| d.sf(f))
                .unwrap_or(f64::NAN)
        };
        (f, pv)
    } else {
        (f64::NAN, f64::NAN)
    };

    let llf = -nf / 2.0 * ((2.0 * std::f64::consts::PI).ln() + (ssr / nf).ln() + 1.0);
    let k = df_model + 1.0;
    let aic = -2.0 * llf + 2.0 * k;
    let bic = -2.0 * llf + nf.ln() * k;

    let cond_no = condition_number(&design.x)?;
    debug!("Condition number: {:.3e}", cond_no);
    info!(
        "OLS fit: n={}, p={}, R²={:.4}, SSR={:.6e}",
        n, p, rsquared, ssr
    );

    Ok(OlsResult {
        outcome: design.outcome.clone(),
        coefficients,
        alpha,
        nobs: n,
        n_dropped: design.n_dropped,
        df_model,
        df_resid,
        ssr,
        centered_tss,
        scale,
        rsquared,
        rsquared_adj,
        fvalue,
        f_pvalue,
        llf,
        aic,
        bic,
        cond_no,
        fitted,
        residuals,
    })
}

fn two_sided_pvalue(dist: &StudentsT, t: f64) -> f64 {
    if t.is_nan() {
        f64::NAN
    } else if t.is_infinite() {
        0.0
    } else {
        (2.0 * dist.sf(t.abs())).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::Formula;
    use ate_io::{Column, ColumnData, Dataset};

    fn design(y: Vec<f64>, cols: Vec<(&str, Vec<f64>)>, formula: &str) -> DesignMatrix {
        let mut columns = vec![Column::new("y", ColumnData::Numeric(y))];
        for (name, values) in cols {
            columns.push(Column::new(name, ColumnData::Numeric(values)));
        }
        let ds = Dataset::new(columns).unwrap();
        let f: Formula = formula.parse().unwrap();
        crate::design::build_design_matrix(&f, &ds).unwrap()
    }

    #[test]
    fn test_simple_regression_known_values() {
        // y = 1 + 2x with residuals (0.1, -0.2, 0.1, 0.1, -0.1)
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let e = [0.1, -0.2, 0.1, 0.1, -0.1];
        let y: Vec<f64> = x.iter().zip(e).map(|(x, e)| 1.0 + 2.0 * x + e).collect();
        let d = design(y.clone(), vec![("x", x.clone())], "y ~ x");
        let fit = fit_ols(&d, DEFAULT_ALPHA).unwrap();

        // Closed form slope: Sxy / Sxx
        let xm = 3.0;
        let ym = y.iter().sum::<f64>() / 5.0;
        let sxx: f64 = x.iter().map(|v| (v - xm).powi(2)).sum();
        let sxy: f64 = x.iter().zip(&y).map(|(a, b)| (a - xm) * (b - ym)).sum();
        let slope = sxy / sxx;
        let intercept = ym - slope * xm;

        let b = fit.coefficient("x").unwrap();
        assert!((b.estimate - slope).abs() < 1e-10);
        assert!((fit.coefficient("Intercept").unwrap().estimate - intercept).abs() < 1e-10);

        // se(slope) = sqrt(s^2 / Sxx)
        let se = (fit.ssr / 3.0 / sxx).sqrt();
        assert!((b.std_err - se).abs() < 1e-10);
        assert!(b.ci_lower < b.estimate && b.estimate < b.ci_upper);
        assert!(b.p_value < 1e-4);

        assert_eq!(fit.nobs, 5);
        assert_eq!(fit.df_model, 1.0);
        assert_eq!(fit.df_resid, 3.0);
        assert!(fit.rsquared > 0.99 && fit.rsquared <= 1.0);
        // With one regressor F = t^2
        assert!((fit.fvalue - b.t_value.powi(2)).abs() / fit.fvalue < 1e-8);
    }

    #[test]
    fn test_ci_uses_t_quantile() {
        let x = vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let y = vec![0.3, 1.9, 4.2, 5.8, 8.1, 10.2];
        let d = design(y, vec![("x", x)], "y ~ x");
        let fit = fit_ols(&d, 0.05).unwrap();
        let b = fit.coefficient("x").unwrap();
        // t_{0.975, 4} = 2.776445...
        let half = (b.ci_upper - b.ci_lower) / 2.0;
        assert!((half / b.std_err - 2.7764451).abs() < 1e-5);

        let fit90 = fit_ols(&d, 0.10).unwrap();
        let b90 = fit90.coefficient("x").unwrap();
        assert!(b90.ci_upper - b90.ci_lower < b.ci_upper - b.ci_lower);
    }

    #[test]
    fn test_information_criteria() {
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let y = vec![2.1, 3.9, 6.2, 7.8, 10.1, 12.0];
        let d = design(y, vec![("x", x)], "y ~ x");
        let fit = fit_ols(&d, DEFAULT_ALPHA).unwrap();
        let n = 6.0_f64;
        let llf = -n / 2.0 * ((2.0 * std::f64::consts::PI).ln() + (fit.ssr / n).ln() + 1.0);
        assert!((fit.llf - llf).abs() < 1e-10);
        assert!((fit.aic - (-2.0 * llf + 4.0)).abs() < 1e-10);
        assert!((fit.bic - (-2.0 * llf + n.ln() * 2.0)).abs() < 1e-10);
    }

    #[test]
    fn test_collinear_design_is_an_error() {
        let x = vec![1.0, 2.0, 3.0, 4.0];
        let z: Vec<f64> = x.iter().map(|v| 3.0 * v).collect();
        let d = design(vec![1.0, 3.0, 2.0, 5.0], vec![("x", x), ("z", z)], "y ~ x + z");
        let err = fit_ols(&d, DEFAULT_ALPHA).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("singular"), "{}", msg);
        assert!(msg.contains("'z'"), "{}", msg);
    }

    #[test]
    fn test_too_few_observations() {
        let d = design(vec![1.0, 2.0], vec![("x", vec![0.0, 1.0])], "y ~ x");
        assert!(fit_ols(&d, DEFAULT_ALPHA).is_err());
    }

    #[test]
    fn test_alpha_validated() {
        let d = design(vec![1.0, 2.0, 4.0], vec![("x", vec![0.0, 1.0, 2.0])], "y ~ x");
        assert!(fit_ols(&d, 0.0).is_err());
        assert!(fit_ols(&d, 1.5).is_err());
    }

    #[test]
    fn test_constant_zero_outcome() {
        let t = vec![0.0, 1.0, 0.0, 1.0, 0.0, 1.0];
        let d = design(vec![0.0; 6], vec![("t", t)], "y ~ t");
        let fit = fit_ols(&d, DEFAULT_ALPHA).unwrap();
        assert!(fit.fvalue.is_nan());
        assert!(fit.f_pvalue.is_nan());
        let b = fit.coefficient("t").unwrap();
        assert_eq!(b.estimate, 0.0);
        assert!(b.p_value.is_nan());
        // the summary renders without touching a distribution on NaN
        let text = crate::summary::Summary::new(&fit).to_string();
        assert!(text.contains("F-statistic:"));
    }

    #[test]
    fn test_infinite_regressor_is_an_error() {
        let x = vec![1.0, 2.0, f64::INFINITY, 4.0, 5.0, 6.0];
        let d = design(vec![1.0, 2.0, 3.0, 4.0, 5.0, 7.0], vec![("x", x)], "y ~ x");
        let err = fit_ols(&d, DEFAULT_ALPHA).unwrap_err();
        assert!(err.to_string().contains("'x'"), "{}", err);

        let d = design(
            vec![1.0, f64::NEG_INFINITY, 3.0, 4.0],
            vec![("x", vec![0.0, 1.0, 2.0, 3.0])],
            "y ~ x",
        );
        assert!(fit_ols(&d, DEFAULT_ALPHA).unwrap_err().to_string().contains("outcome"));
    }

    #[test]
    fn test_intercept_only() {
        let ds = Dataset::new(vec![Column::new(
            "y",
            ColumnData::Numeric(vec![1.0, 2.0, 3.0, 6.0]),
        )])
        .unwrap();
        let f = Formula {
            outcome: "y".into(),
            terms: vec![],
        };
        let d = crate::design::build_design_matrix(&f, &ds).unwrap();
        let fit = fit_ols(&d, DEFAULT_ALPHA).unwrap();
        assert!((fit.coefficients[0].estimate - 3.0).abs() < 1e-12);
        assert!(fit.fvalue.is_nan());
    }
}
