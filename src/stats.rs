//! Descriptive statistics for numeric-family columns

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Nearest-rank percentiles over the sorted sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    #[serde(rename = "1")]
    pub p1: f64,
    #[serde(rename = "5")]
    pub p5: f64,
    #[serde(rename = "10")]
    pub p10: f64,
    #[serde(rename = "25")]
    pub p25: f64,
    #[serde(rename = "50")]
    pub p50: f64,
    #[serde(rename = "75")]
    pub p75: f64,
    #[serde(rename = "90")]
    pub p90: f64,
    #[serde(rename = "95")]
    pub p95: f64,
    #[serde(rename = "99")]
    pub p99: f64,
}

/// Descriptive statistics of one numeric column.
///
/// Variance and standard deviation use the population formulas (divide by N,
/// not N-1). Kurtosis is excess kurtosis. `median` is the 50th percentile by
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub stddev: f64,
    pub variance: f64,
    pub skewness: f64,
    pub kurtosis: f64,
    /// Values more than three standard deviations from the mean
    pub outlier_count: usize,
    pub percentiles: Percentiles,
}

/// Parse a raw value as a float after stripping currency symbols, percent
/// signs and thousands separators.
pub fn parse_numeric(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Extract the parseable floats from a column's raw values
pub fn numeric_values(values: &[Value]) -> Vec<f64> {
    values
        .iter()
        .filter_map(|v| parse_numeric(&crate::inference::render(v)))
        .collect()
}

/// Compute descriptive statistics; `None` for an empty sample
pub fn compute(values: &[f64]) -> Option<Statistics> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len() as f64;
    let min = sorted[0];
    let max = sorted[sorted.len() - 1];
    let mean = sorted.iter().sum::<f64>() / n;
    let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    let (skewness, kurtosis) = if stddev > 0.0 {
        let skew = sorted.iter().map(|v| ((v - mean) / stddev).powi(3)).sum::<f64>() / n;
        let kurt = sorted.iter().map(|v| ((v - mean) / stddev).powi(4)).sum::<f64>() / n - 3.0;
        (skew, kurt)
    } else {
        (0.0, 0.0)
    };

    let outlier_count = sorted
        .iter()
        .filter(|v| (*v - mean).abs() > 3.0 * stddev)
        .count();

    let percentiles = Percentiles {
        p1: nearest_rank(&sorted, 1.0),
        p5: nearest_rank(&sorted, 5.0),
        p10: nearest_rank(&sorted, 10.0),
        p25: nearest_rank(&sorted, 25.0),
        p50: nearest_rank(&sorted, 50.0),
        p75: nearest_rank(&sorted, 75.0),
        p90: nearest_rank(&sorted, 90.0),
        p95: nearest_rank(&sorted, 95.0),
        p99: nearest_rank(&sorted, 99.0),
    };

    Some(Statistics {
        min,
        max,
        mean,
        median: percentiles.p50,
        stddev,
        variance,
        skewness,
        kurtosis,
        outlier_count,
        percentiles,
    })
}

/// `sorted[floor(p/100 * (N-1))]`, the same rule for every percentile key
fn nearest_rank(sorted: &[f64], p: f64) -> f64 {
    let index = ((p / 100.0) * (sorted.len() - 1) as f64).floor() as usize;
    sorted[index]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_known_sample() {
        let stats = compute(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 5.0);
        assert_eq!(stats.mean, 3.0);
        assert_eq!(stats.median, 3.0);
        // Population variance, not sample variance
        assert!((stats.variance - 2.0).abs() < 1e-12);
        assert!((stats.stddev - 2.0f64.sqrt()).abs() < 1e-12);
        assert_eq!(stats.outlier_count, 0);
    }

    #[test]
    fn test_nearest_rank_percentiles() {
        let sorted: Vec<f64> = (1..=10).map(|v| v as f64).collect();
        assert_eq!(nearest_rank(&sorted, 50.0), 5.0); // floor(0.5 * 9) = 4
        assert_eq!(nearest_rank(&sorted, 90.0), 9.0); // floor(0.9 * 9) = 8
        assert_eq!(nearest_rank(&sorted, 99.0), 9.0);
        assert_eq!(nearest_rank(&sorted, 1.0), 1.0);
    }

    #[test]
    fn test_single_value() {
        let stats = compute(&[42.0]).unwrap();
        assert_eq!(stats.min, 42.0);
        assert_eq!(stats.max, 42.0);
        assert_eq!(stats.median, 42.0);
        assert_eq!(stats.stddev, 0.0);
        assert_eq!(stats.skewness, 0.0);
        assert_eq!(stats.kurtosis, 0.0);
        assert_eq!(stats.outlier_count, 0);
    }

    #[test]
    fn test_constant_sample_has_no_nan() {
        let stats = compute(&[7.0; 20]).unwrap();
        assert_eq!(stats.variance, 0.0);
        assert_eq!(stats.skewness, 0.0);
        assert_eq!(stats.kurtosis, 0.0);
        assert!(serde_json::to_string(&stats).is_ok());
    }

    #[test]
    fn test_outliers_beyond_three_sigma() {
        let mut values = vec![10.0; 99];
        values.push(10_000.0);
        let stats = compute(&values).unwrap();
        assert_eq!(stats.outlier_count, 1);
    }

    #[test]
    fn test_empty_sample() {
        assert!(compute(&[]).is_none());
    }

    #[test]
    fn test_parse_numeric_strips_symbols() {
        assert_eq!(parse_numeric("$1,234.56"), Some(1234.56));
        assert_eq!(parse_numeric("12%"), Some(12.0));
        assert_eq!(parse_numeric("-5"), Some(-5.0));
        assert_eq!(parse_numeric("€30"), Some(30.0));
        assert_eq!(parse_numeric("abc"), None);
        assert_eq!(parse_numeric(""), None);
    }

    proptest! {
        #[test]
        fn prop_median_is_p50(values in prop::collection::vec(-1e6f64..1e6f64, 1..200)) {
            let stats = compute(&values).unwrap();
            prop_assert_eq!(stats.median, stats.percentiles.p50);
            prop_assert!(stats.min <= stats.median);
            prop_assert!(stats.median <= stats.max);
        }

        #[test]
        fn prop_percentiles_are_monotonic(values in prop::collection::vec(-1e3f64..1e3f64, 1..100)) {
            let p = compute(&values).unwrap().percentiles;
            let ordered = [p.p1, p.p5, p.p10, p.p25, p.p50, p.p75, p.p90, p.p95, p.p99];
            for pair in ordered.windows(2) {
                prop_assert!(pair[0] <= pair[1]);
            }
        }
    }
}
