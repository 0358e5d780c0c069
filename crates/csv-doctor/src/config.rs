//! Configuration types for csv-doctor.
//!
//! Every threshold used by type inference, cleaning, validation and analysis
//! lives here so that callers can tune them without touching the algorithms.
//! Configurations are serde (de)serializable and can be loaded from a JSON
//! file; missing fields fall back to their defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Thresholds used by column type inference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Minimum share of non-missing values that must parse as numbers.
    /// Default: 0.9
    pub numeric_threshold: f64,

    /// Minimum share of non-missing values that must parse as dates.
    /// Default: 0.9
    pub datetime_threshold: f64,

    /// Distinct/non-missing ratio below which a column is categorical.
    /// Default: 0.05
    pub categorical_ratio: f64,

    /// Upper bound on distinct values for a categorical column.
    /// Default: 50
    pub max_categories: usize,

    /// Small vocabularies below this size are categorical when values repeat.
    /// Default: 20
    pub low_cardinality_floor: usize,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            numeric_threshold: 0.9,
            datetime_threshold: 0.9,
            categorical_ratio: 0.05,
            max_categories: 50,
            low_cardinality_floor: 20,
        }
    }
}

/// Parameters for cleaning operations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// IQR multiplier for outlier bounds.
    /// Default: 1.5
    pub iqr_multiplier: f64,

    /// Absolute z-score above which a value is an outlier.
    /// Default: 3.0
    pub zscore_threshold: f64,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            iqr_multiplier: 1.5,
            zscore_threshold: 3.0,
        }
    }
}

/// Weights of the composite quality score. Must sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub null: f64,
    pub duplicate: f64,
    pub type_consistency: f64,
    pub anomaly: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            null: 0.30,
            duplicate: 0.20,
            type_consistency: 0.20,
            anomaly: 0.30,
        }
    }
}

impl ScoreWeights {
    pub fn total(&self) -> f64 {
        self.null + self.duplicate + self.type_consistency + self.anomaly
    }
}

/// Thresholds for validation and quality scoring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Composite score weights.
    pub weights: ScoreWeights,

    /// Points deducted from the anomaly sub-score per anomaly.
    /// Default: 15.0
    pub anomaly_penalty: f64,

    /// Null percentage above which a column is flagged.
    /// Default: 50.0
    pub high_null_percentage: f64,

    /// Share of non-missing entries a single value must exceed to be flagged.
    /// Default: 0.9
    pub dominant_value_share: f64,

    /// Coefficient of variation below which variance counts as near zero.
    /// Default: 1e-3
    pub variance_epsilon: f64,

    /// Magnitude below which a mean is treated as zero.
    /// Default: 1e-9
    pub mean_epsilon: f64,

    /// Number of sample row indices kept in duplicate/malformed reports.
    /// Default: 10
    pub sample_rows: usize,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            anomaly_penalty: 15.0,
            high_null_percentage: 50.0,
            dominant_value_share: 0.9,
            variance_epsilon: 1e-3,
            mean_epsilon: 1e-9,
            sample_rows: 10,
        }
    }
}

/// Parameters for descriptive analysis and chart data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Minimum |r| for a pair to be reported as highly correlated.
    /// Default: 0.7
    pub correlation_threshold: f64,

    /// Number of top values kept in categorical insights.
    /// Default: 5
    pub top_values: usize,

    /// Rows included in the missing-value heatmap.
    /// Default: 100
    pub heatmap_rows: usize,

    /// Histogram bin count.
    /// Default: 30
    pub histogram_bins: usize,

    /// Bars kept for categorical bar charts.
    /// Default: 10
    pub bar_chart_top: usize,

    /// Leading rows included in load metadata.
    /// Default: 5
    pub sample_rows: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            correlation_threshold: 0.7,
            top_values: 5,
            heatmap_rows: 100,
            histogram_bins: 30,
            bar_chart_top: 10,
            sample_rows: 5,
        }
    }
}

/// Top-level configuration.
///
/// Use [`DoctorConfig::builder()`] for a fluent setup.
///
/// # Example
///
/// ```rust,ignore
/// use csv_doctor::config::DoctorConfig;
///
/// let config = DoctorConfig::builder()
///     .correlation_threshold(0.8)
///     .anomaly_penalty(10.0)
///     .build()?;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoctorConfig {
    pub inference: InferenceConfig,
    pub cleaning: CleaningConfig,
    pub quality: QualityConfig,
    pub analysis: AnalysisConfig,
}

impl DoctorConfig {
    /// Create a new configuration builder.
    pub fn builder() -> DoctorConfigBuilder {
        DoctorConfigBuilder::default()
    }

    /// Load a configuration from a JSON file and validate it.
    pub fn from_json_file(path: impl AsRef<Path>) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: DoctorConfig = serde_json::from_str(&content)?;
        config
            .validate()
            .map_err(|e| crate::error::DoctorError::InvalidConfig(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let ratios = [
            ("inference.numeric_threshold", self.inference.numeric_threshold),
            ("inference.datetime_threshold", self.inference.datetime_threshold),
            ("inference.categorical_ratio", self.inference.categorical_ratio),
            ("quality.dominant_value_share", self.quality.dominant_value_share),
        ];
        for (field, value) in ratios {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigValidationError::InvalidThreshold {
                    field: field.to_string(),
                    value,
                });
            }
        }

        if !(0.0..=100.0).contains(&self.quality.high_null_percentage) {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "quality.high_null_percentage".to_string(),
                value: self.quality.high_null_percentage,
            });
        }

        if !(0.0..=1.0).contains(&self.analysis.correlation_threshold) {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "analysis.correlation_threshold".to_string(),
                value: self.analysis.correlation_threshold,
            });
        }

        let weights = self.quality.weights;
        if [weights.null, weights.duplicate, weights.type_consistency, weights.anomaly]
            .iter()
            .any(|w| *w < 0.0)
            || (weights.total() - 1.0).abs() > 1e-9
        {
            return Err(ConfigValidationError::InvalidWeights(weights.total()));
        }

        if self.quality.anomaly_penalty < 0.0 {
            return Err(ConfigValidationError::NegativeValue {
                field: "quality.anomaly_penalty".to_string(),
                value: self.quality.anomaly_penalty,
            });
        }

        if self.cleaning.iqr_multiplier <= 0.0 {
            return Err(ConfigValidationError::NegativeValue {
                field: "cleaning.iqr_multiplier".to_string(),
                value: self.cleaning.iqr_multiplier,
            });
        }

        if self.cleaning.zscore_threshold <= 0.0 {
            return Err(ConfigValidationError::NegativeValue {
                field: "cleaning.zscore_threshold".to_string(),
                value: self.cleaning.zscore_threshold,
            });
        }

        if self.analysis.histogram_bins == 0 {
            return Err(ConfigValidationError::InvalidCount {
                field: "analysis.histogram_bins".to_string(),
            });
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid threshold for '{field}': {value}")]
    InvalidThreshold { field: String, value: f64 },

    #[error("Score weights must be non-negative and sum to 1.0 (got {0})")]
    InvalidWeights(f64),

    #[error("'{field}' must be positive (got {value})")]
    NegativeValue { field: String, value: f64 },

    #[error("'{field}' must be at least 1")]
    InvalidCount { field: String },
}

/// Builder for [`DoctorConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct DoctorConfigBuilder {
    config: DoctorConfig,
}

impl DoctorConfigBuilder {
    /// Set the share of values that must parse as numbers for a numeric column.
    pub fn numeric_threshold(mut self, threshold: f64) -> Self {
        self.config.inference.numeric_threshold = threshold;
        self
    }

    /// Set the share of values that must parse as dates for a datetime column.
    pub fn datetime_threshold(mut self, threshold: f64) -> Self {
        self.config.inference.datetime_threshold = threshold;
        self
    }

    /// Set the distinct ratio and category cap for categorical columns.
    pub fn categorical_limits(mut self, ratio: f64, max_categories: usize) -> Self {
        self.config.inference.categorical_ratio = ratio;
        self.config.inference.max_categories = max_categories;
        self
    }

    /// Set the IQR multiplier used by outlier removal.
    pub fn iqr_multiplier(mut self, multiplier: f64) -> Self {
        self.config.cleaning.iqr_multiplier = multiplier;
        self
    }

    /// Set the z-score threshold used by outlier removal.
    pub fn zscore_threshold(mut self, threshold: f64) -> Self {
        self.config.cleaning.zscore_threshold = threshold;
        self
    }

    /// Set the composite score weights.
    pub fn score_weights(mut self, weights: ScoreWeights) -> Self {
        self.config.quality.weights = weights;
        self
    }

    /// Set the per-anomaly deduction from the anomaly sub-score.
    pub fn anomaly_penalty(mut self, penalty: f64) -> Self {
        self.config.quality.anomaly_penalty = penalty;
        self
    }

    /// Set the null percentage above which a column is flagged.
    pub fn high_null_percentage(mut self, percentage: f64) -> Self {
        self.config.quality.high_null_percentage = percentage;
        self
    }

    /// Set the correlation threshold for high-correlation pairs.
    pub fn correlation_threshold(mut self, threshold: f64) -> Self {
        self.config.analysis.correlation_threshold = threshold;
        self
    }

    /// Set how many top values categorical insights keep.
    pub fn top_values(mut self, n: usize) -> Self {
        self.config.analysis.top_values = n;
        self
    }

    /// Set the number of rows sampled for the missing-value heatmap.
    pub fn heatmap_rows(mut self, rows: usize) -> Self {
        self.config.analysis.heatmap_rows = rows;
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any value is out of range.
    pub fn build(self) -> Result<DoctorConfig, ConfigValidationError> {
        self.config.validate()?;
        Ok(self.config)
    }

    /// Build the configuration without validation.
    pub fn build_unchecked(self) -> DoctorConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(DoctorConfig::default().validate().is_ok());
        assert!((DoctorConfig::default().quality.weights.total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_builder() {
        let config = DoctorConfig::builder()
            .correlation_threshold(0.8)
            .anomaly_penalty(10.0)
            .heatmap_rows(50)
            .build()
            .unwrap();

        assert_eq!(config.analysis.correlation_threshold, 0.8);
        assert_eq!(config.quality.anomaly_penalty, 10.0);
        assert_eq!(config.analysis.heatmap_rows, 50);
    }

    #[test]
    fn test_invalid_threshold() {
        let result = DoctorConfig::builder().numeric_threshold(1.5).build();
        assert!(matches!(
            result,
            Err(ConfigValidationError::InvalidThreshold { .. })
        ));
    }

    #[test]
    fn test_invalid_weights() {
        let result = DoctorConfig::builder()
            .score_weights(ScoreWeights {
                null: 0.5,
                duplicate: 0.5,
                type_consistency: 0.5,
                anomaly: 0.0,
            })
            .build();
        assert!(matches!(result, Err(ConfigValidationError::InvalidWeights(_))));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: DoctorConfig =
            serde_json::from_str(r#"{"analysis": {"correlation_threshold": 0.9}}"#).unwrap();
        assert_eq!(config.analysis.correlation_threshold, 0.9);
        assert_eq!(config.analysis.top_values, 5);
        assert_eq!(config.inference, InferenceConfig::default());
    }

    #[test]
    fn test_build_unchecked() {
        let config = DoctorConfig::builder().zscore_threshold(-1.0).build_unchecked();
        assert!(config.validate().is_err());
    }
}
