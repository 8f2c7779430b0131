//! Rendering and export of the comparison table.

use std::{fmt::Write as _, path::Path};

use anyhow::Context as _;
use rollsim_types::{Platform, ResultRow};
use serde::Serialize;

use crate::driver::ExperimentReport;

const HEADERS: [&str; 7] = [
    "Transaction Type",
    "Platform",
    "Avg. Gas Used",
    "Avg. Tx Cost (ETH)",
    "Avg. Tx Cost (USD)",
    "Oracle Cost (USD)",
    "Notes",
];

/// Row with all quantities formatted for display. Field names are the CSV headers.
#[derive(Debug, Clone, PartialEq, Serialize)]
struct FormattedRow {
    #[serde(rename = "Transaction Type")]
    scenario: String,
    #[serde(rename = "Platform")]
    platform: String,
    #[serde(rename = "Avg. Gas Used")]
    gas_used: String,
    #[serde(rename = "Avg. Tx Cost (ETH)")]
    fee: String,
    #[serde(rename = "Avg. Tx Cost (USD)")]
    fee_fiat: String,
    #[serde(rename = "Oracle Cost (USD)")]
    external_fee_fiat: String,
    #[serde(rename = "Notes")]
    notes: String,
}

impl From<&ResultRow> for FormattedRow {
    fn from(row: &ResultRow) -> Self {
        let gas_used = match row.platform {
            Platform::BaseLayer => format!("{:.0}", row.resource_units),
            Platform::ScaledLayer { .. } => format!("{:.0} (L2 OpGas)", row.resource_units),
        };
        Self {
            scenario: row.scenario.clone(),
            platform: row.platform.to_string(),
            gas_used,
            fee: format!("{:.8}", row.fee),
            fee_fiat: format!("{:.4}", row.fee_fiat),
            external_fee_fiat: row
                .external_fee_fiat
                .map_or_else(|| "N/A".to_owned(), |fee| format!("{fee:.4}")),
            notes: row.notes.clone(),
        }
    }
}

impl FormattedRow {
    fn cells(&self) -> [&str; 7] {
        [
            &self.scenario,
            &self.platform,
            &self.gas_used,
            &self.fee,
            &self.fee_fiat,
            &self.external_fee_fiat,
            &self.notes,
        ]
    }
}

/// Renders rows as an aligned text table.
fn render_table(rows: &[FormattedRow]) -> String {
    let mut widths = HEADERS.map(str::len);
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row.cells()) {
            *width = (*width).max(cell.len());
        }
    }

    let mut table = String::new();
    let lines = std::iter::once(HEADERS).chain(rows.iter().map(FormattedRow::cells));
    for (i, cells) in lines.enumerate() {
        let line: Vec<_> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect();
        writeln!(table, "{}", line.join(" | ").trim_end()).ok();
        if i == 0 {
            let separator: Vec<_> = widths.iter().map(|&width| "-".repeat(width)).collect();
            writeln!(table, "{}", separator.join("-+-")).ok();
        }
    }
    table
}

fn export_csv(rows: &[FormattedRow], path: &Path) -> anyhow::Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("cannot create {path:?}"))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Logs the comparison table and exports it to `csv_path` (if provided).
///
/// Export errors are logged; the table remains available in logs.
pub fn publish(report: &ExperimentReport, csv_path: Option<&Path>) {
    for skipped in &report.skipped {
        tracing::warn!("`{}` is absent from the report: {}", skipped.name, skipped.reason);
    }
    if report.rows.is_empty() {
        tracing::warn!("No scenario produced successful runs; nothing to report");
        return;
    }

    let rows: Vec<_> = report.rows.iter().map(FormattedRow::from).collect();
    tracing::info!(
        "Cost comparison (base-layer unit price: {}):\n{}",
        report.unit_price,
        render_table(&rows)
    );

    if let Some(path) = csv_path {
        match export_csv(&rows, path) {
            Ok(()) => tracing::info!("Results exported to {path:?}"),
            Err(err) => tracing::error!("Failed exporting results to {path:?}: {err:#}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use rollsim_types::ResourcePrice;
    use tempfile::TempDir;

    use super::*;
    use crate::driver::{SkipReason, SkippedScenario};

    fn sample_rows() -> Vec<ResultRow> {
        vec![
            ResultRow {
                scenario: "Oracle Update (Valuation)".into(),
                platform: Platform::BaseLayer,
                resource_units: 43_521.0,
                fee: 0.00087042,
                fee_fiat: 1.74084,
                external_fee_fiat: Some(0.1),
                notes: "L1 GasPrice: 20.00 Gwei".into(),
            },
            ResultRow {
                scenario: "Oracle Update (Valuation)".into(),
                platform: Platform::ScaledLayer { batch_size: 10 },
                resource_units: 4_352.1,
                fee: 0.00019302,
                fee_fiat: 0.38604,
                external_fee_fiat: None,
                notes: "BS=10".into(),
            },
        ]
    }

    fn sample_report() -> ExperimentReport {
        ExperimentReport {
            unit_price: ResourcePrice::from_gwei(20),
            rows: sample_rows(),
            skipped: vec![SkippedScenario {
                name: "Governance Vote".into(),
                reason: SkipReason::NoRunsExecuted,
            }],
        }
    }

    #[test]
    fn formatting_rows() {
        let rows = sample_rows();
        let base = FormattedRow::from(&rows[0]);
        assert_eq!(base.platform, "base-layer");
        assert_eq!(base.gas_used, "43521");
        assert_eq!(base.fee, "0.00087042");
        assert_eq!(base.fee_fiat, "1.7408");
        assert_eq!(base.external_fee_fiat, "0.1000");

        let scaled = FormattedRow::from(&rows[1]);
        assert_eq!(scaled.platform, "scaled-layer, batch=10");
        assert_eq!(scaled.gas_used, "4352 (L2 OpGas)");
        assert_eq!(scaled.external_fee_fiat, "N/A");
        assert_eq!(scaled.notes, "BS=10");
    }

    #[test]
    fn table_is_aligned() {
        let rows: Vec<_> = sample_rows().iter().map(FormattedRow::from).collect();
        let table = render_table(&rows);
        let lines: Vec<_> = table.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Transaction Type "));
        assert!(lines[1].chars().all(|ch| ch == '-' || ch == '+'));
        let separator_positions = |line: &str| -> Vec<usize> {
            line.match_indices(" | ").map(|(pos, _)| pos).collect()
        };
        assert_eq!(separator_positions(lines[2]), separator_positions(lines[3]));
        assert_eq!(separator_positions(lines[0]), separator_positions(lines[2]));
    }

    #[test]
    fn exporting_csv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.csv");
        publish(&sample_report(), Some(&path));

        let contents = fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Transaction Type,Platform,Avg. Gas Used,Avg. Tx Cost (ETH),Avg. Tx Cost (USD),\
             Oracle Cost (USD),Notes"
        );
        assert_eq!(
            lines.next().unwrap(),
            "Oracle Update (Valuation),base-layer,43521,0.00087042,1.7408,0.1000,L1 GasPrice: 20.00 Gwei"
        );
        assert_eq!(
            lines.next().unwrap(),
            "Oracle Update (Valuation),\"scaled-layer, batch=10\",4352 (L2 OpGas),0.00019302,\
             0.3860,N/A,BS=10"
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn export_failure_is_not_fatal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("results.csv");
        publish(&sample_report(), Some(&path));
        assert!(!path.exists());
    }

    #[test]
    fn empty_report_is_not_exported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.csv");
        let report = ExperimentReport {
            rows: vec![],
            ..sample_report()
        };
        publish(&report, Some(&path));
        assert!(!path.exists());
    }
}
