//! CSV export and display formatting for result sets.
//!
//! Percentage metrics render as `NN.N%`, counts as formatted magnitudes
//! (`1.2K`, `3.4M`, `1.1B`), and the undefined sentinel as an empty field.
//! The same formatters back the panel adapters so tables and exports can
//! never disagree.

use crate::aggregate::ResultSet;
use crate::domain::{MetricKind, MetricValue};
use anyhow::{Context, Result};

/// Format a count magnitude: `987`, `1.2K`, `3.4M`, `1.1B`.
pub fn format_magnitude(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1e9 {
        format!("{:.1}B", value / 1e9)
    } else if abs >= 1e6 {
        format!("{:.1}M", value / 1e6)
    } else if abs >= 1e3 {
        format!("{:.1}K", value / 1e3)
    } else {
        format!("{}", value.round() as i64)
    }
}

/// Format a percentage with one decimal: `12.3%`.
pub fn format_percent(value: f64) -> String {
    format!("{value:.1}%")
}

/// Render a metric value for display: rate metrics as percentages, count
/// metrics as magnitudes, undefined as the empty string.
pub fn format_metric(value: MetricValue, kind: MetricKind) -> String {
    match value.as_f64() {
        None => String::new(),
        Some(v) => {
            if kind.is_rate() {
                format_percent(v)
            } else {
                format_magnitude(v)
            }
        }
    }
}

/// Serialize a result set as CSV: header, one row per AggregateRow in rank
/// order, Total row last.
pub fn export_csv(result_set: &ResultSet) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "rank",
        "account",
        "platform",
        "ownership",
        result_set.metric.label(),
        "% of total",
    ])
    .context("failed to write CSV header")?;

    for row in &result_set.rows {
        wtr.write_record([
            row.rank.to_string(),
            row.name.clone(),
            row.platform.to_string(),
            if row.owned { "own" } else { "competitor" }.to_string(),
            format_metric(row.value, result_set.metric),
            match row.percent_of_total.as_f64() {
                Some(p) => format_percent(p),
                None => String::new(),
            },
        ])
        .context("failed to write CSV row")?;
    }

    wtr.write_record([
        String::new(),
        "Total".to_string(),
        String::new(),
        String::new(),
        format_metric(result_set.total.value, result_set.metric),
        String::new(),
    ])
    .context("failed to write CSV total row")?;

    let bytes = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output was not valid UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::domain::SortDirection;
    use crate::metrics::test_support::entity_with;
    use crate::metrics::{compute_all, MetricConfig};

    #[test]
    fn magnitudes_use_suffixes() {
        assert_eq!(format_magnitude(987.0), "987");
        assert_eq!(format_magnitude(1_200.0), "1.2K");
        assert_eq!(format_magnitude(3_400_000.0), "3.4M");
        assert_eq!(format_magnitude(1_100_000_000.0), "1.1B");
    }

    #[test]
    fn percent_has_one_decimal() {
        assert_eq!(format_percent(12.34), "12.3%");
        assert_eq!(format_percent(8.0), "8.0%");
    }

    #[test]
    fn undefined_renders_empty() {
        assert_eq!(format_metric(MetricValue::Undefined, MetricKind::Views), "");
        assert_eq!(
            format_metric(MetricValue::Undefined, MetricKind::EngagementRate),
            ""
        );
    }

    #[test]
    fn csv_has_header_rows_and_total() {
        let entities = vec![
            entity_with("a", 100, 10, 0, 0),
            entity_with("b", 50, 5, 0, 0),
            entity_with("c", 25, 2, 0, 0),
        ];
        let derived = compute_all(&entities, &MetricConfig::default());
        let rs = aggregate(&entities, &derived, MetricKind::Views, SortDirection::Descending);
        let csv = export_csv(&rs).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 5); // header + 3 rows + total
        assert!(lines[0].starts_with("rank,account,platform,ownership,Views"));
        assert!(lines[1].starts_with("1,a,youtube,competitor,100,"));
        assert_eq!(lines[4], ",Total,,,175,");
    }

    #[test]
    fn rate_metric_rows_render_as_percentages() {
        let entities = vec![entity_with("a", 100, 10, 0, 0), entity_with("b", 50, 5, 0, 0)];
        let derived = compute_all(&entities, &MetricConfig::default());
        let rs = aggregate(
            &entities,
            &derived,
            MetricKind::EngagementRate,
            SortDirection::Descending,
        );
        let csv = export_csv(&rs).unwrap();
        assert!(csv.contains("10.0%"), "csv was: {csv}");
    }
}
