//! Treatment-effect extraction from a fitted model.

use std::fmt;

use anyhow::{Context, Result};

use crate::design::DesignMatrix;
use crate::ols::OlsResult;

/// Coefficient, p-value and confidence interval of one treatment column.
#[derive(Debug, Clone, PartialEq)]
pub struct TreatmentEffect {
    /// Design column name, e.g. `t` or `C(t)[T.treated]`.
    pub term: String,
    pub coefficient: f64,
    pub p_value: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    pub alpha: f64,
}

/// One effect per design column of the treatment term. A numeric treatment
/// has one column; a factor has one per non-reference level.
pub fn treatment_effects(
    fit: &OlsResult,
    design: &DesignMatrix,
    treatment: &str,
) -> Result<Vec<TreatmentEffect>> {
    let range = design
        .columns_for(treatment)
        .with_context(|| format!("treatment '{}' is not a term of the model", treatment))?;

    Ok(fit.coefficients[range]
        .iter()
        .map(|c| TreatmentEffect {
            term: c.name.clone(),
            coefficient: c.estimate,
            p_value: c.p_value,
            ci_lower: c.ci_lower,
            ci_upper: c.ci_upper,
            alpha: fit.alpha,
        })
        .collect())
}

impl TreatmentEffect {
    /// Confidence level as a percentage label, `95` for alpha = 0.05.
    pub fn confidence_label(&self) -> String {
        let pct = ((1.0 - self.alpha) * 100.0 * 1e6).round() / 1e6;
        format!("{}", pct)
    }
}

impl fmt::Display for TreatmentEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "Treatment variable: '{}'", self.term)?;
        writeln!(f, "Coefficient: {}", float_repr(self.coefficient))?;
        writeln!(f, "P-value: {}", float_repr(self.p_value))?;
        write!(
            f,
            "{}% Confidence Interval: {}, {}",
            self.confidence_label(),
            float_repr(self.ci_lower),
            float_repr(self.ci_upper)
        )
    }
}

/// Shortest round-trip text for `x` with a signed two-digit exponent
/// (`1e-05`, `2.5e+20`) and lowercase `nan`/`inf`.
pub fn float_repr(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return (if x > 0.0 { "inf" } else { "-inf" }).to_string();
    }
    let s = format!("{:?}", x);
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

#[cfg(test)]
mod tests {
    use super::*;

    fn effect(alpha: f64) -> TreatmentEffect {
        TreatmentEffect {
            term: "t".into(),
            coefficient: 2.0,
            p_value: 0.0123,
            ci_lower: 1.5,
            ci_upper: 2.5,
            alpha,
        }
    }

    #[test]
    fn test_render() {
        assert_eq!(
            effect(0.05).to_string(),
            "\nTreatment variable: 't'\nCoefficient: 2.0\nP-value: 0.0123\n\
             95% Confidence Interval: 1.5, 2.5"
        );
    }

    #[test]
    fn test_float_repr() {
        assert_eq!(float_repr(2.0), "2.0");
        assert_eq!(float_repr(0.0123), "0.0123");
        assert_eq!(float_repr(1e-5), "1e-05");
        assert_eq!(float_repr(3.2e-12), "3.2e-12");
        assert_eq!(float_repr(2.5e20), "2.5e+20");
        assert_eq!(float_repr(f64::NAN), "nan");
        assert_eq!(float_repr(f64::NEG_INFINITY), "-inf");
    }

    #[test]
    fn test_render_nan_and_tiny_pvalue() {
        let mut e = effect(0.05);
        e.p_value = 1e-5;
        e.ci_lower = f64::NAN;
        let text = e.to_string();
        assert!(text.contains("P-value: 1e-05\n"));
        assert!(text.ends_with("Confidence Interval: nan, 2.5"));
    }

    #[test]
    fn test_confidence_label() {
        assert_eq!(effect(0.05).confidence_label(), "95");
        assert_eq!(effect(0.1).confidence_label(), "90");
        assert_eq!(effect(0.025).confidence_label(), "97.5");
    }
}
