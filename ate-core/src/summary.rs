//! Plain-text regression summary.
//!
//! Three blocks separated by rules: model statistics as label/value pairs,
//! the coefficient table, and the residual diagnostics, followed by notes.

use std::fmt;

use crate::diagnostics::ResidualDiagnostics;
use crate::ols::OlsResult;

const WIDTH: usize = 78;
const HALF_LEFT: usize = 37;
const HALF_RIGHT: usize = 38;
const GAP: &str = "   ";

/// Condition numbers above this get a multicollinearity note.
pub const COND_NO_WARNING: f64 = 1000.0;

/// A fitted model together with its residual diagnostics, ready to print.
pub struct Summary<'a> {
    fit: &'a OlsResult,
    diagnostics: ResidualDiagnostics,
}

impl<'a> Summary<'a> {
    pub fn new(fit: &'a OlsResult) -> Self {
        Self {
            fit,
            diagnostics: ResidualDiagnostics::from_residuals(&fit.residuals),
        }
    }
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fit = self.fit;
        let d = &self.diagnostics;

        let table = coefficient_table(fit);
        let width = table
            .iter()
            .map(|l| l.chars().count())
            .max()
            .unwrap_or(0)
            .max(WIDTH);
        let double = "=".repeat(width);
        let single = "-".repeat(width);

        writeln!(f, "{:^width$}", "OLS Regression Results", width = width)?;
        writeln!(f, "{}", double)?;
        let header = [
            (("Dep. Variable:", fit.outcome.clone()), ("R-squared:", num(fit.rsquared, 3))),
            (("Model:", "OLS".into()), ("Adj. R-squared:", num(fit.rsquared_adj, 3))),
            (("Method:", "Least Squares".into()), ("F-statistic:", forg(fit.fvalue, 4))),
            (
                ("No. Observations:", fit.nobs.to_string()),
                ("Prob (F-statistic):", forg(fit.f_pvalue, 3)),
            ),
            (
                ("Df Residuals:", format!("{}", fit.df_resid)),
                ("Log-Likelihood:", forg(fit.llf, 5)),
            ),
            (("Df Model:", format!("{}", fit.df_model)), ("AIC:", forg(fit.aic, 4))),
            (("Covariance Type:", "nonrobust".into()), ("BIC:", forg(fit.bic, 4))),
        ];
        for (left, right) in &header {
            writeln!(f, "{}", pair_row(left, right))?;
        }

        writeln!(f, "{}", double)?;
        let mut rows = table.into_iter();
        if let Some(head) = rows.next() {
            writeln!(f, "{}", head)?;
        }
        writeln!(f, "{}", single)?;
        for row in rows {
            writeln!(f, "{}", row)?;
        }

        writeln!(f, "{}", double)?;
        let footer = [
            (("Omnibus:", num(d.omnibus, 3)), ("Durbin-Watson:", num(d.durbin_watson, 3))),
            (
                ("Prob(Omnibus):", num(d.omnibus_pvalue, 3)),
                ("Jarque-Bera (JB):", num(d.jarque_bera, 3)),
            ),
            (("Skew:", num(d.skew, 3)), ("Prob(JB):", forg(d.jarque_bera_pvalue, 3))),
            (("Kurtosis:", num(d.kurtosis, 3)), ("Cond. No.", forg(fit.cond_no, 3))),
        ];
        for (left, right) in &footer {
            writeln!(f, "{}", pair_row(left, right))?;
        }
        writeln!(f, "{}", double)?;

        writeln!(f)?;
        writeln!(f, "Notes:")?;
        let mut notes = vec![
            "Standard Errors assume that the covariance matrix of the errors is correctly specified."
                .to_string(),
        ];
        if fit.n_dropped > 0 {
            notes.push(format!(
                "{} observations with missing values were dropped.",
                fit.n_dropped
            ));
        }
        if fit.cond_no > COND_NO_WARNING {
            notes.push(format!(
                "The condition number is large, {}. This might indicate that there are\n\
                 strong multicollinearity or other numerical problems.",
                forg(fit.cond_no, 3).trim()
            ));
        }
        for (i, note) in notes.iter().enumerate() {
            write!(f, "[{}] {}", i + 1, note)?;
            if i + 1 < notes.len() {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

fn pair_row(left: &(&str, String), right: &(&str, String)) -> String {
    let l = half(left.0, &left.1, HALF_LEFT);
    let r = half(right.0, &right.1, HALF_RIGHT);
    format!("{}{}{}", l, GAP, r)
}

fn half(label: &str, value: &str, width: usize) -> String {
    let value = value.trim();
    let used = label.chars().count() + value.chars().count();
    let pad = width.saturating_sub(used).max(1);
    format!("{}{}{}", label, " ".repeat(pad), value)
}

/// Header plus one row per coefficient, all right-aligned on a common name
/// column.
fn coefficient_table(fit: &OlsResult) -> Vec<String> {
    let name_width = fit
        .coefficients
        .iter()
        .map(|c| c.name.chars().count())
        .max()
        .unwrap_or(0)
        .max(10);

    let lo = format!("[{}", quantile_label(fit.alpha / 2.0));
    let hi = format!("{}]", quantile_label(1.0 - fit.alpha / 2.0));

    let mut lines = Vec::with_capacity(fit.coefficients.len() + 1);
    lines.push(format!(
        "{:name_width$} {:>10} {:>10} {:>10} {:>10} {:>11} {:>11}",
        "",
        "coef",
        "std err",
        "t",
        "P>|t|",
        lo,
        hi,
        name_width = name_width
    ));

    for c in &fit.coefficients {
        lines.push(format!(
            "{:<name_width$} {:>10} {:>10} {:>10} {:>10} {:>11} {:>11}",
            c.name,
            forg(c.estimate, 4),
            forg(c.std_err, 3),
            forg(c.t_value, 3),
            num(c.p_value, 3),
            forg(c.ci_lower, 3),
            forg(c.ci_upper, 3),
            name_width = name_width
        ));
    }
    lines
}

fn quantile_label(q: f64) -> String {
    let s = format!("{:.6}", q);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Fixed-point with `prec` decimals.
fn num(x: f64, prec: usize) -> String {
    if x.is_nan() {
        "nan".to_string()
    } else if x.is_infinite() {
        (if x > 0.0 { "inf" } else { "-inf" }).to_string()
    } else {
        format!("{:.prec$}", x, prec = prec)
    }
}

/// Fixed-point for moderate magnitudes, scientific (`1.234e+05`) otherwise.
pub fn forg(x: f64, prec: usize) -> String {
    let a = x.abs();
    if !x.is_finite() || a == 0.0 || (1e-4..1e4).contains(&a) {
        return num(x, prec);
    }
    let s = format!("{:.prec$e}", x, prec = prec);
    match s.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(d) => ('-', d),
                None => ('+', exp),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => s,
    }
}
