//! Profile data model: column types, quality metrics, anomalies, recommendations

use crate::stats::Statistics;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Semantic types a column can be inferred as
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Uuid,
    Email,
    Ip,
    Url,
    Phone,
    Date,
    Timestamp,
    Currency,
    Percentage,
    Rating,
    Number,
    Json,
    Geo,
    String,
}

impl ColumnType {
    /// Types whose values are parsed as floats for descriptive statistics
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ColumnType::Number | ColumnType::Currency | ColumnType::Percentage | ColumnType::Rating
        )
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Uuid => "uuid",
            ColumnType::Email => "email",
            ColumnType::Ip => "ip",
            ColumnType::Url => "url",
            ColumnType::Phone => "phone",
            ColumnType::Date => "date",
            ColumnType::Timestamp => "timestamp",
            ColumnType::Currency => "currency",
            ColumnType::Percentage => "percentage",
            ColumnType::Rating => "rating",
            ColumnType::Number => "number",
            ColumnType::Json => "json",
            ColumnType::Geo => "geo",
            ColumnType::String => "string",
        };
        write!(f, "{}", name)
    }
}

/// Validation rules a record-creation step could enforce, derived from the data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationHints {
    /// No nulls observed
    pub required: bool,
    /// All non-null values were distinct
    pub unique: bool,
    /// Structured format the values conform to
    pub format: Option<ColumnType>,
    /// Observed numeric range, for numeric columns
    pub range: Option<(f64, f64)>,
    /// Observed value length range, for string columns
    pub length: Option<(usize, usize)>,
}

/// Per-column profiling result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub inferred_type: ColumnType,
    /// Match ratio of the winning detector, in [0, 1]
    pub confidence: f64,
    /// Up to five raw values, in row order
    pub sample_values: Vec<Value>,
    pub null_count: usize,
    pub unique_count: usize,
    pub total_count: usize,
    /// Present only for numeric-family columns
    pub statistics: Option<Statistics>,
    /// Percentage of non-null values that re-validate against the inferred type
    pub consistency: f64,
    /// Weighted combination of completeness, uniqueness, consistency and confidence
    pub quality_score: f64,
    pub validation: ValidationHints,
    pub issues: Vec<String>,
}

/// Dataset-level quality metrics, all percentages in [0, 100]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub completeness: f64,
    pub uniqueness: f64,
    pub consistency: f64,
    pub validity: f64,
    /// Fixed average of the other four, never independently assigned
    pub overall: f64,
}

/// Kinds of rule-triggered dataset defects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    DuplicateRows,
    HighMissingness,
    StatisticalOutliers,
    TypeAmbiguity,
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnomalyKind::DuplicateRows => "duplicate_rows",
            AnomalyKind::HighMissingness => "high_missingness",
            AnomalyKind::StatisticalOutliers => "statistical_outliers",
            AnomalyKind::TypeAmbiguity => "type_ambiguity",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// A rule-triggered flag describing a dataset defect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub kind: AnomalyKind,
    pub severity: Severity,
    pub description: String,
    pub affected_row_count: usize,
    /// Column the anomaly is scoped to, if not dataset-wide
    pub column: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationCategory {
    DataQuality,
    SchemaConsistency,
    Performance,
    Security,
}

/// An actionable improvement, ranked 1..N with 1 most urgent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub category: RecommendationCategory,
    pub priority: usize,
    pub action: String,
    pub expected_impact: String,
}

/// A record category the dataset appears to belong to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySuggestion {
    pub category: String,
    /// Supporting columns / total columns, in [0, 1]
    pub confidence: f64,
    pub source_columns: Vec<String>,
}

/// Shape of the ingested input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSummary {
    pub format: crate::source::SourceFormat,
    pub byte_size: usize,
    pub total_rows: usize,
    pub column_count: usize,
}

/// Aggregate profiling result for one upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetProfile {
    pub source: SourceSummary,
    pub columns: Vec<ColumnProfile>,
    pub quality: QualityMetrics,
    pub anomalies: Vec<Anomaly>,
    pub recommendations: Vec<Recommendation>,
    pub suggested_categories: Vec<CategorySuggestion>,
    /// Count of columns per inferred type
    pub type_histogram: BTreeMap<ColumnType, usize>,
    pub duplicate_rows: usize,
    /// First rows of the dataset, bounded by the configured preview size
    pub preview: Vec<serde_json::Map<String, Value>>,
}
