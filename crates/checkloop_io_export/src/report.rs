//! Export report models and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;

use crate::conf::N_LEN_REPORT_WARNINGS_MAX;

/// Counters and diagnostics for one `build_document` run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReportExport {
    /// Number of input records.
    pub cnt_records: u64,
    /// Number of body rows in the document.
    pub cnt_rows: u64,
    /// Number of document columns.
    pub cnt_columns: u64,
    /// Cells filled because the record lacked the column.
    pub cnt_cells_missing: u64,
    /// Record values dropped because the column is not in the header.
    pub cnt_cells_extra: u64,
    /// Records with at least one missing or extra column.
    pub cnt_records_malformed: u64,
    /// Non-fatal warnings (bounded).
    pub warnings: Vec<String>,
}

impl ReportExport {
    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Whether any record deviated from the header shape.
    pub fn has_anomalies(&self) -> bool {
        self.cnt_records_malformed > 0
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_records".to_string(), self.cnt_records);
        dict_counts.insert("cnt_rows".to_string(), self.cnt_rows);
        dict_counts.insert("cnt_columns".to_string(), self.cnt_columns);
        dict_counts.insert("cnt_cells_missing".to_string(), self.cnt_cells_missing);
        dict_counts.insert("cnt_cells_extra".to_string(), self.cnt_cells_extra);
        dict_counts.insert(
            "cnt_records_malformed".to_string(),
            self.cnt_records_malformed,
        );
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} records={} rows={} columns={} missing={} extra={} malformed={} warnings={}",
            self.cnt_records,
            self.cnt_rows,
            self.cnt_columns,
            self.cnt_cells_missing,
            self.cnt_cells_extra,
            self.cnt_records_malformed,
            self.warning_count()
        )
    }
}

impl fmt::Display for ReportExport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[EXPORT]"))
    }
}

/// Mutable accumulator for export statistics.
#[derive(Debug, Default, Clone)]
pub struct ReportExportBuilder {
    /// See [`ReportExport::cnt_records`].
    pub cnt_records: u64,
    /// See [`ReportExport::cnt_rows`].
    pub cnt_rows: u64,
    /// See [`ReportExport::cnt_columns`].
    pub cnt_columns: u64,
    /// See [`ReportExport::cnt_cells_missing`].
    pub cnt_cells_missing: u64,
    /// See [`ReportExport::cnt_cells_extra`].
    pub cnt_cells_extra: u64,
    /// See [`ReportExport::cnt_records_malformed`].
    pub cnt_records_malformed: u64,
    /// See [`ReportExport::warnings`].
    pub warnings: Vec<String>,
}

impl ReportExportBuilder {
    /// Count one input record.
    pub fn add_record(&mut self) {
        self.cnt_records += 1;
    }

    /// Count one emitted body row.
    pub fn add_row(&mut self) {
        self.cnt_rows += 1;
    }

    /// Record the shape anomalies of one record; no-op when both counts are zero.
    pub fn add_shape_anomaly(
        &mut self,
        idx_record: usize,
        cols_missing: &[&str],
        cols_extra: &[&str],
    ) {
        if cols_missing.is_empty() && cols_extra.is_empty() {
            return;
        }
        self.cnt_cells_missing += cols_missing.len() as u64;
        self.cnt_cells_extra += cols_extra.len() as u64;
        self.cnt_records_malformed += 1;

        let mut l_parts = Vec::with_capacity(2);
        if !cols_missing.is_empty() {
            l_parts.push(format!("missing {cols_missing:?}"));
        }
        if !cols_extra.is_empty() {
            l_parts.push(format!("extra {cols_extra:?}"));
        }
        self.add_warning(format!("Record {idx_record}: {}", l_parts.join(", ")));
    }

    /// Add warning message; messages beyond the cap are counted, not kept.
    pub fn add_warning(&mut self, warning: String) {
        if self.warnings.len() < N_LEN_REPORT_WARNINGS_MAX {
            self.warnings.push(warning);
        }
    }

    /// Finalize builder into immutable report.
    pub fn build(self) -> ReportExport {
        ReportExport {
            cnt_records: self.cnt_records,
            cnt_rows: self.cnt_rows,
            cnt_columns: self.cnt_columns,
            cnt_cells_missing: self.cnt_cells_missing,
            cnt_cells_extra: self.cnt_cells_extra,
            cnt_records_malformed: self.cnt_records_malformed,
            warnings: self.warnings,
        }
    }
}
