//! DataLens: deterministic profiling of tabular uploads
//!
//! Takes the raw bytes of a CSV/TSV, spreadsheet or JSON upload and produces
//! a [`DatasetProfile`]: per-column semantic types with confidence scores,
//! descriptive statistics, quality metrics, detected anomalies and ranked
//! improvement recommendations. Profiling the same bytes twice yields the
//! same profile; no score in the output is sampled or estimated.

pub mod errors;
pub mod inference;
pub mod logging;
pub mod materialize;
pub mod profile;
pub mod quality;
pub mod recommend;
pub mod source;
pub mod stats;
pub mod thread_config;

// Re-exports
pub use errors::{ProfileError, Result};
pub use inference::TypeInference;
pub use materialize::{ColumnValues, Materialized};
pub use profile::{
    Anomaly, AnomalyKind, CategorySuggestion, ColumnProfile, ColumnType, DatasetProfile,
    QualityMetrics, Recommendation, RecommendationCategory, Severity, SourceSummary,
    ValidationHints,
};
pub use source::{RawRow, RowReader, RowSource, SourceFormat};
pub use stats::{Percentiles, Statistics};
pub use thread_config::{initialize_thread_pools, ThreadPoolConfig};

use rayon::prelude::*;
use tracing::info;

/// Main configuration for profiling
#[derive(Debug, Clone)]
pub struct ProfilerConfig {
    /// Inputs larger than this many bytes are rejected up front
    pub max_bytes: usize,
    /// Rows materialized in memory; counting still covers the whole stream
    pub max_rows: usize,
    /// Rows included in the profile's preview
    pub preview_rows: usize,
    /// Non-null values sampled per column for type detection
    pub sample_size: usize,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            max_bytes: 50 * 1024 * 1024,
            max_rows: 100_000,
            preview_rows: 100,
            sample_size: 1000,
        }
    }
}

/// Main DataLens interface
pub struct Profiler {
    config: ProfilerConfig,
}

impl Profiler {
    /// Create a new profiler
    pub fn new(config: ProfilerConfig) -> Self {
        Self { config }
    }

    /// Profile an uploaded source into a [`DatasetProfile`].
    ///
    /// The request is synchronous from the caller's perspective: it returns
    /// once the full profile is assembled. The CPU-bound work runs on a
    /// blocking thread, with per-column profiling fanned out across the
    /// worker pool.
    pub async fn profile(&self, source: RowSource) -> Result<DatasetProfile> {
        if source.byte_len() > self.config.max_bytes {
            return Err(ProfileError::FileTooLarge {
                actual: source.byte_len(),
                limit: self.config.max_bytes,
            });
        }

        let config = self.config.clone();
        tokio::task::spawn_blocking(move || profile_source(&config, &source))
            .await
            .map_err(|e| ProfileError::Other(e.to_string()))?
    }

    /// Read a file from disk and profile it, resolving the format from the
    /// file extension
    pub async fn profile_path(&self, path: impl AsRef<std::path::Path>) -> Result<DatasetProfile> {
        let source = RowSource::from_path(path)?;
        self.profile(source).await
    }
}

fn profile_source(config: &ProfilerConfig, source: &RowSource) -> Result<DatasetProfile> {
    let reader = source.reader()?;
    let materialized = materialize::materialize(reader, config.max_rows, config.preview_rows)?;

    // Each column owns its values exclusively, so inference, statistics and
    // scoring run column-parallel with no shared state
    let columns: Vec<ColumnProfile> = materialized
        .columns
        .par_iter()
        .map(|column| quality::column_profile(column, config.sample_size))
        .collect();

    let quality_metrics = quality::dataset_quality(&columns);
    let anomalies = quality::detect_anomalies(
        &columns,
        materialized.total_rows,
        materialized.duplicate_rows,
    );
    let recommendations = recommend::recommend(&anomalies, &columns);
    let suggested_categories = recommend::suggest_categories(&columns);
    let type_histogram = recommend::type_histogram(&columns);

    info!(
        rows = materialized.total_rows,
        columns = columns.len(),
        anomalies = anomalies.len(),
        overall = quality_metrics.overall,
        "profile assembled"
    );

    Ok(DatasetProfile {
        source: SourceSummary {
            format: source.format(),
            byte_size: source.byte_len(),
            total_rows: materialized.total_rows,
            column_count: columns.len(),
        },
        columns,
        quality: quality_metrics,
        anomalies,
        recommendations,
        suggested_categories,
        type_histogram,
        duplicate_rows: materialized.duplicate_rows,
        preview: materialized.preview,
    })
}

impl Default for Profiler {
    fn default() -> Self {
        Self::new(ProfilerConfig::default())
    }
}
