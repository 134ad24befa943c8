//! Quality scoring and anomaly rules

use crate::inference::{self, TypeInference};
use crate::materialize::ColumnValues;
use crate::profile::{
    Anomaly, AnomalyKind, ColumnProfile, ColumnType, QualityMetrics, Severity, ValidationHints,
};
use crate::stats;
use std::collections::HashSet;
use tracing::debug;

/// Completeness threshold below which a column is flagged as an anomaly
const MISSINGNESS_THRESHOLD: f64 = 80.0;

/// Confidence threshold below which an inferred type counts as ambiguous
const AMBIGUITY_THRESHOLD: f64 = 0.85;

/// Build the full profile of one column: inference, statistics, scoring,
/// validation hints and issues. Pure function of the column's values, safe to
/// run for different columns in parallel.
pub fn column_profile(column: &ColumnValues, sample_size: usize) -> ColumnProfile {
    let TypeInference {
        column_type,
        confidence,
    } = inference::infer(&column.values, sample_size);

    let non_null = column.values.len();
    let consistency_ratio = inference::consistency_ratio(column_type, &column.values);
    let consistency = consistency_ratio * 100.0;

    let unique_count = {
        let mut seen: HashSet<String> = HashSet::with_capacity(non_null.min(4096));
        for value in &column.values {
            seen.insert(inference::render(value).into_owned());
        }
        seen.len()
    };

    let completeness = completeness_pct(column.null_count, column.total_count);
    let uniqueness = if non_null == 0 {
        0.0
    } else {
        unique_count as f64 / non_null as f64 * 100.0
    };

    let statistics = if column_type.is_numeric() {
        stats::compute(&stats::numeric_values(&column.values))
    } else {
        None
    };

    let quality_score =
        0.3 * completeness + 0.3 * uniqueness + 0.2 * consistency + 0.2 * (confidence * 100.0);

    let validation = ValidationHints {
        required: column.null_count == 0 && column.total_count > 0,
        unique: non_null > 0 && unique_count == non_null,
        format: structured_format(column_type),
        range: statistics.as_ref().map(|s| (s.min, s.max)),
        length: if column_type == ColumnType::String && non_null > 0 {
            let lengths = column.values.iter().map(|v| inference::render(v).len());
            let min = lengths.clone().min().unwrap_or(0);
            let max = lengths.max().unwrap_or(0);
            Some((min, max))
        } else {
            None
        },
    };

    let mismatches = non_null - (consistency_ratio * non_null as f64).round() as usize;
    let mut issues = Vec::new();
    if column.null_count > 0 {
        issues.push(format!(
            "{} missing values ({:.1}% complete)",
            column.null_count, completeness
        ));
    }
    if non_null > 0 && unique_count < non_null {
        issues.push(format!("{} duplicated values", non_null - unique_count));
    }
    if mismatches > 0 {
        issues.push(format!(
            "{} values do not conform to inferred type {}",
            mismatches, column_type
        ));
    }

    debug!(
        column = %column.name,
        inferred = %column_type,
        confidence,
        quality_score,
        "column profiled"
    );

    ColumnProfile {
        name: column.name.clone(),
        inferred_type: column_type,
        confidence,
        sample_values: column.values.iter().take(5).cloned().collect(),
        null_count: column.null_count,
        unique_count,
        total_count: column.total_count,
        statistics,
        consistency,
        quality_score,
        validation,
        issues,
    }
}

/// Dataset-level metrics: the mean of the per-column values, with validity as
/// mean confidence and overall as their fixed average.
pub fn dataset_quality(columns: &[ColumnProfile]) -> QualityMetrics {
    if columns.is_empty() {
        return QualityMetrics {
            completeness: 0.0,
            uniqueness: 0.0,
            consistency: 0.0,
            validity: 0.0,
            overall: 0.0,
        };
    }

    let n = columns.len() as f64;
    let completeness = columns
        .iter()
        .map(|c| completeness_pct(c.null_count, c.total_count))
        .sum::<f64>()
        / n;
    let uniqueness = columns.iter().map(uniqueness_pct).sum::<f64>() / n;
    let consistency = columns.iter().map(|c| c.consistency).sum::<f64>() / n;
    let validity = columns.iter().map(|c| c.confidence * 100.0).sum::<f64>() / n;
    let overall = (completeness + uniqueness + consistency + validity) / 4.0;

    QualityMetrics {
        completeness: completeness.clamp(0.0, 100.0),
        uniqueness: uniqueness.clamp(0.0, 100.0),
        consistency: consistency.clamp(0.0, 100.0),
        validity: validity.clamp(0.0, 100.0),
        overall: overall.clamp(0.0, 100.0),
    }
}

/// Apply the fixed anomaly rules, in rule order then column order
pub fn detect_anomalies(
    columns: &[ColumnProfile],
    total_rows: usize,
    duplicate_rows: usize,
) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();

    if duplicate_rows > 0 {
        anomalies.push(Anomaly {
            kind: AnomalyKind::DuplicateRows,
            severity: severity_for(duplicate_rows, total_rows),
            description: format!("{} duplicate rows detected", duplicate_rows),
            affected_row_count: duplicate_rows,
            column: None,
        });
    }

    for column in columns {
        let completeness = completeness_pct(column.null_count, column.total_count);
        if completeness < MISSINGNESS_THRESHOLD {
            anomalies.push(Anomaly {
                kind: AnomalyKind::HighMissingness,
                severity: severity_for(column.null_count, column.total_count),
                description: format!(
                    "Column '{}' is only {:.1}% complete",
                    column.name, completeness
                ),
                affected_row_count: column.null_count,
                column: Some(column.name.clone()),
            });
        }
    }

    for column in columns {
        let outliers = column
            .statistics
            .as_ref()
            .map(|s| s.outlier_count)
            .unwrap_or(0);
        if outliers > 0 {
            anomalies.push(Anomaly {
                kind: AnomalyKind::StatisticalOutliers,
                severity: severity_for(outliers, column.total_count),
                description: format!(
                    "Column '{}' has {} values beyond three standard deviations from the mean",
                    column.name, outliers
                ),
                affected_row_count: outliers,
                column: Some(column.name.clone()),
            });
        }
    }

    for column in columns {
        if column.confidence < AMBIGUITY_THRESHOLD {
            let non_null = column.total_count - column.null_count;
            let matched = (column.consistency / 100.0 * non_null as f64).round() as usize;
            anomalies.push(Anomaly {
                kind: AnomalyKind::TypeAmbiguity,
                severity: severity_for(non_null - matched, column.total_count),
                description: format!(
                    "Column '{}' inferred as {} with only {:.0}% confidence",
                    column.name,
                    column.inferred_type,
                    column.confidence * 100.0
                ),
                affected_row_count: non_null - matched,
                column: Some(column.name.clone()),
            });
        }
    }

    anomalies
}

fn completeness_pct(null_count: usize, total_count: usize) -> f64 {
    if total_count == 0 {
        0.0
    } else {
        (total_count - null_count) as f64 / total_count as f64 * 100.0
    }
}

fn uniqueness_pct(column: &ColumnProfile) -> f64 {
    let non_null = column.total_count - column.null_count;
    if non_null == 0 {
        0.0
    } else {
        column.unique_count as f64 / non_null as f64 * 100.0
    }
}

fn structured_format(column_type: ColumnType) -> Option<ColumnType> {
    if column_type == ColumnType::String || column_type.is_numeric() {
        None
    } else {
        Some(column_type)
    }
}

fn severity_for(affected: usize, total: usize) -> Severity {
    if total == 0 {
        return Severity::Low;
    }
    let fraction = affected as f64 / total as f64;
    if fraction > 0.20 {
        Severity::High
    } else if fraction > 0.05 {
        Severity::Medium
    } else {
        Severity::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn column(name: &str, values: Vec<serde_json::Value>, null_count: usize) -> ColumnValues {
        let total_count = values.len() + null_count;
        ColumnValues {
            name: name.to_string(),
            values,
            null_count,
            total_count,
        }
    }

    #[test]
    fn test_column_profile_email() {
        let values = vec![json!("a@b.com"), json!("c@d.org"), json!("e@f.net")];
        let profile = column_profile(&column("email", values, 1), 1000);

        assert_eq!(profile.inferred_type, ColumnType::Email);
        assert_eq!(profile.null_count, 1);
        assert_eq!(profile.unique_count, 3);
        assert_eq!(profile.total_count, 4);
        assert_eq!(profile.consistency, 100.0);
        assert_eq!(profile.validation.format, Some(ColumnType::Email));
        assert!(profile.statistics.is_none());

        // 0.3*75 + 0.3*100 + 0.2*100 + 0.2*100
        assert!((profile.quality_score - 92.5).abs() < 1e-9);
    }

    #[test]
    fn test_invariant_unique_bounded_by_non_null() {
        let values = vec![json!("x"), json!("x"), json!("y")];
        let profile = column_profile(&column("c", values, 2), 1000);
        assert!(profile.unique_count <= profile.total_count - profile.null_count);
        assert_eq!(profile.unique_count, 2);
    }

    #[test]
    fn test_numeric_column_gets_statistics() {
        let values = vec![json!("10"), json!("20"), json!("30")];
        let profile = column_profile(&column("amount", values, 0), 1000);
        assert_eq!(profile.inferred_type, ColumnType::Number);
        let stats = profile.statistics.unwrap();
        assert_eq!(stats.min, 10.0);
        assert_eq!(stats.max, 30.0);
        assert_eq!(profile.validation.range, Some((10.0, 30.0)));
    }

    #[test]
    fn test_string_column_gets_length_hint() {
        let values = vec![json!("ab"), json!("abcd")];
        let profile = column_profile(&column("note", values, 0), 1000);
        assert_eq!(profile.inferred_type, ColumnType::String);
        assert_eq!(profile.validation.length, Some((2, 4)));
        assert_eq!(profile.validation.range, None);
    }

    #[test]
    fn test_uuid_column_validation_hints() {
        let values = vec![
            json!("550e8400-e29b-41d4-a716-446655440000"),
            json!("6ba7b810-9dad-11d1-80b4-00c04fd430c8"),
        ];
        let profile = column_profile(&column("id", values, 0), 1000);

        assert_eq!(profile.inferred_type, ColumnType::Uuid);
        assert!(profile.validation.required);
        assert!(profile.validation.unique);
        assert_eq!(profile.validation.format, Some(ColumnType::Uuid));
    }

    #[test]
    fn test_all_null_column() {
        let profile = column_profile(&column("empty", vec![], 5), 1000);
        assert_eq!(profile.inferred_type, ColumnType::String);
        assert_eq!(profile.unique_count, 0);
        assert!(!profile.validation.required);
        assert!(!profile.validation.unique);
        // Completeness 0, uniqueness 0, consistency 100, confidence 100
        assert!((profile.quality_score - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_issues_reported() {
        let values = vec![json!("a@b.com"), json!("a@b.com"), json!("bad")];
        let profile = column_profile(&column("email", values, 1), 1000);
        assert!(profile.issues.iter().any(|i| i.contains("missing")));
        assert!(profile.issues.iter().any(|i| i.contains("duplicated")));
    }

    #[test]
    fn test_dataset_quality_is_average() {
        let values = vec![json!("a@b.com"), json!("c@d.org")];
        let profile = column_profile(&column("email", values, 0), 1000);
        let metrics = dataset_quality(&[profile]);

        assert_eq!(metrics.completeness, 100.0);
        assert_eq!(metrics.uniqueness, 100.0);
        assert_eq!(metrics.consistency, 100.0);
        assert_eq!(metrics.validity, 100.0);
        assert_eq!(metrics.overall, 100.0);
    }

    #[test]
    fn test_severity_thresholds() {
        assert_eq!(severity_for(25, 100), Severity::High);
        assert_eq!(severity_for(10, 100), Severity::Medium);
        assert_eq!(severity_for(3, 100), Severity::Low);
        assert_eq!(severity_for(5, 100), Severity::Low); // boundary: > 5%, not >=
    }

    #[test]
    fn test_duplicate_anomaly() {
        let anomalies = detect_anomalies(&[], 10, 1);
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].kind, AnomalyKind::DuplicateRows);
        assert_eq!(anomalies[0].severity, Severity::Medium);
        assert_eq!(anomalies[0].affected_row_count, 1);
    }

    #[test]
    fn test_missingness_anomaly() {
        let values: Vec<_> = (0..7).map(|i| json!(format!("v{}", i))).collect();
        let profile = column_profile(&column("sparse", values, 3), 1000);
        let anomalies = detect_anomalies(std::slice::from_ref(&profile), 10, 0);

        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].kind, AnomalyKind::HighMissingness);
        assert_eq!(anomalies[0].affected_row_count, 3);
        assert_eq!(anomalies[0].column.as_deref(), Some("sparse"));
    }

    #[test]
    fn test_outlier_anomaly() {
        let mut values: Vec<_> = (0..99).map(|_| json!("10")).collect();
        values.push(json!("100000"));
        let profile = column_profile(&column("amount", values, 0), 1000);
        let anomalies = detect_anomalies(std::slice::from_ref(&profile), 100, 0);
        assert!(anomalies
            .iter()
            .any(|a| a.kind == AnomalyKind::StatisticalOutliers));
    }

    #[test]
    fn test_type_ambiguity_anomaly() {
        // Built directly: the default detector table never wins below its
        // threshold, so ambiguity only fires for externally supplied profiles
        let mut profile = column_profile(
            &column("c", vec![json!("x"), json!("y")], 0),
            1000,
        );
        profile.confidence = 0.5;
        profile.consistency = 50.0;
        let anomalies = detect_anomalies(std::slice::from_ref(&profile), 2, 0);
        assert!(anomalies.iter().any(|a| a.kind == AnomalyKind::TypeAmbiguity));
    }
}
