//! Categorical coercion of the regressors.
//!
//! Text ("object") columns among the treatment and controls are retyped as
//! categorical in place, so the formula builder wraps them in `C(..)`.

use ate_io::{Dataset, DatasetError};
use tracing::debug;

/// Retype every object column among `controls` and `treatment` as
/// categorical. Controls are visited first, then the treatment.
///
/// Returns the names of the columns that were converted. Fails on the first
/// name that is not a column of the dataset.
pub fn coerce_categorical(
    dataset: &mut Dataset,
    treatment: &str,
    controls: &[String],
) -> Result<Vec<String>, DatasetError> {
    let mut converted = Vec::new();
    for name in controls.iter().map(String::as_str).chain(std::iter::once(treatment)) {
        if dataset.to_categorical(name)? {
            debug!("Column '{}' retyped object -> category", name);
            converted.push(name.to_string());
        }
    }
    Ok(converted)
}
