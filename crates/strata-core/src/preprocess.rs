//! Cross-sectional cleaning of raw factor exposures.
//!
//! On each date, every factor column is clipped to `median ± n·MAD`,
//! standardized to z-scores and has its remaining gaps filled.

use crate::CrossSection;
use crate::stats::{mad_clip, standardize};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Configuration for factor preprocessing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Whether preprocessing runs at all.
    pub enabled: bool,
    /// Clipping width in multiples of the median absolute deviation.
    pub mad_multiple: f64,
    /// Value substituted for missing exposures after standardization.
    pub fill_value: f64,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            mad_multiple: 3.0,
            fill_value: 0.0,
        }
    }
}

/// Clip, standardize and fill one exposure vector.
pub fn clean_exposures(values: &Array1<f64>, config: &PreprocessConfig) -> Array1<f64> {
    let raw = values.to_vec();
    let clipped = mad_clip(&raw, config.mad_multiple);
    let (standardized, _) = standardize(&clipped);
    standardized
        .into_iter()
        .map(|z| if z.is_finite() { z } else { config.fill_value })
        .collect()
}

/// Return a copy of the cross-section with every factor column cleaned.
///
/// A disabled config returns an unchanged copy.
pub fn preprocess(section: &CrossSection, config: &PreprocessConfig) -> CrossSection {
    let mut cleaned = section.clone();
    if !config.enabled {
        return cleaned;
    }
    for values in cleaned.factors.values_mut() {
        *values = clean_exposures(values, config);
    }
    tracing::debug!(date = %section.date, factors = cleaned.factors.len(), "preprocessed factors");
    cleaned
}
