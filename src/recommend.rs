//! Deterministic recommendation rules and record-category suggestions

use crate::profile::{
    Anomaly, AnomalyKind, CategorySuggestion, ColumnProfile, ColumnType, Recommendation,
    RecommendationCategory, Severity,
};
use std::collections::BTreeMap;

/// Count of columns per inferred type
pub fn type_histogram(columns: &[ColumnProfile]) -> BTreeMap<ColumnType, usize> {
    let mut histogram = BTreeMap::new();
    for column in columns {
        *histogram.entry(column.inferred_type).or_insert(0) += 1;
    }
    histogram
}

/// Map anomalies and the inferred-type histogram to a ranked action list.
///
/// Anomaly-driven entries are bucketed by severity (high, medium, low), the
/// histogram-driven suggestions come after all of them; within a bucket the
/// discovery order is kept. The final priority is the 1..N rank.
pub fn recommend(anomalies: &[Anomaly], columns: &[ColumnProfile]) -> Vec<Recommendation> {
    let mut staged: Vec<(usize, RecommendationCategory, String, String)> = Vec::new();

    for anomaly in anomalies {
        let bucket = match anomaly.severity {
            Severity::High => 1,
            Severity::Medium => 2,
            Severity::Low => 3,
        };
        let column = anomaly.column.as_deref().unwrap_or("");
        let (category, action, impact) = match anomaly.kind {
            AnomalyKind::DuplicateRows => (
                RecommendationCategory::DataQuality,
                format!(
                    "Deduplicate {} repeated rows before creating records",
                    anomaly.affected_row_count
                ),
                "Prevents double-created records and inflated counts".to_string(),
            ),
            AnomalyKind::HighMissingness => (
                RecommendationCategory::DataQuality,
                format!(
                    "Backfill or drop column '{}' ({} empty cells)",
                    column, anomaly.affected_row_count
                ),
                format!("Raises completeness of '{}'", column),
            ),
            AnomalyKind::StatisticalOutliers => (
                RecommendationCategory::DataQuality,
                format!(
                    "Review {} outlier values in column '{}'",
                    anomaly.affected_row_count, column
                ),
                "Keeps aggregate statistics representative".to_string(),
            ),
            AnomalyKind::TypeAmbiguity => (
                RecommendationCategory::SchemaConsistency,
                format!("Declare an explicit type for column '{}'", column),
                "Stabilizes schema inference across uploads".to_string(),
            ),
        };
        staged.push((bucket, category, action, impact));
    }

    staged.extend(histogram_suggestions(columns));

    // Stable sort keeps discovery order within a bucket
    staged.sort_by_key(|(bucket, _, _, _)| *bucket);

    staged
        .into_iter()
        .enumerate()
        .map(|(i, (_, category, action, expected_impact))| Recommendation {
            category,
            priority: i + 1,
            action,
            expected_impact,
        })
        .collect()
}

/// Suggestions derived from the inferred-type histogram rather than anomalies
fn histogram_suggestions(
    columns: &[ColumnProfile],
) -> Vec<(usize, RecommendationCategory, String, String)> {
    const HISTOGRAM_BUCKET: usize = 4;
    let mut suggestions = Vec::new();

    let date_columns = columns_of(
        columns,
        &[ColumnType::Date, ColumnType::Timestamp],
    );
    if date_columns.len() >= 2 {
        suggestions.push((
            HISTOGRAM_BUCKET,
            RecommendationCategory::SchemaConsistency,
            format!(
                "Confirm a canonical date format across columns {}",
                quote_list(&date_columns)
            ),
            "Avoids mixed date interpretations at import".to_string(),
        ));
    }

    let id_columns = columns_of(columns, &[ColumnType::Uuid]);
    if !id_columns.is_empty() {
        suggestions.push((
            HISTOGRAM_BUCKET,
            RecommendationCategory::Performance,
            format!(
                "Index identifier column {} before bulk import",
                quote_list(&id_columns)
            ),
            "Speeds up lookups on imported records".to_string(),
        ));
    }

    let contact_columns = columns_of(columns, &[ColumnType::Email, ColumnType::Phone]);
    if !contact_columns.is_empty() {
        suggestions.push((
            HISTOGRAM_BUCKET,
            RecommendationCategory::Security,
            format!(
                "Protect contact column {} with encryption at rest",
                quote_list(&contact_columns)
            ),
            "Reduces exposure of personal data".to_string(),
        ));
    }

    suggestions
}

/// Rank the record categories the dataset appears to belong to.
///
/// Confidence is the fraction of columns supporting the category; ties are
/// broken by category name so the ordering is total.
pub fn suggest_categories(columns: &[ColumnProfile]) -> Vec<CategorySuggestion> {
    const GROUPS: [(&str, &[ColumnType]); 5] = [
        ("Contact Information", &[ColumnType::Email, ColumnType::Phone]),
        ("Temporal Records", &[ColumnType::Date, ColumnType::Timestamp]),
        ("Financial Records", &[ColumnType::Currency]),
        ("Location Data", &[ColumnType::Geo]),
        (
            "Technical Identifiers",
            &[ColumnType::Uuid, ColumnType::Ip, ColumnType::Url],
        ),
    ];

    if columns.is_empty() {
        return Vec::new();
    }

    let mut suggestions: Vec<CategorySuggestion> = GROUPS
        .iter()
        .filter_map(|(category, types)| {
            let source_columns = columns_of(columns, types);
            if source_columns.is_empty() {
                return None;
            }
            Some(CategorySuggestion {
                category: category.to_string(),
                confidence: source_columns.len() as f64 / columns.len() as f64,
                source_columns,
            })
        })
        .collect();

    suggestions.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| a.category.cmp(&b.category))
    });
    suggestions
}

fn columns_of(columns: &[ColumnProfile], types: &[ColumnType]) -> Vec<String> {
    columns
        .iter()
        .filter(|c| types.contains(&c.inferred_type))
        .map(|c| c.name.clone())
        .collect()
}

fn quote_list(names: &[String]) -> String {
    names
        .iter()
        .map(|n| format!("'{}'", n))
        .collect::<Vec<_>>()
        .join(", ")
}
