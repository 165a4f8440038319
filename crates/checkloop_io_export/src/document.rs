//! Record sequence to [`SpecExportDocument`] builder.

use std::collections::{BTreeSet, HashMap};

use crate::classify::CategoryClassifier;
use crate::conf::{derive_sheet_name, derive_theme};
use crate::report::ReportExportBuilder;
use crate::spec::{
    EnumCellValue, EnumExtraColumnRule, EnumMissingColumnRule, ExportError, SpecCellStyle,
    SpecColor, SpecDocumentRow, SpecExportDocument, SpecExportOptions, SpecHeaderCell, SpecRecord,
    SpecRecordShapePolicy,
};
use crate::util::{derive_column_widths, validate_policy_shape, validate_policy_width};

/// Build an export document from `records`.
///
/// The column list is taken from the first record's keys, in order, and stays
/// fixed for the whole document. Later records are projected onto it under
/// [`SpecExportOptions::policy_shape`]; anomalies are counted in the document
/// report instead of failing (unless the extra-column rule is `Reject`).
///
/// Returns `Ok(None)` for an empty `records` slice: there is nothing to export
/// and that is not an error.
pub fn build_document(
    records: &[SpecRecord],
    file_name: &str,
    options: &SpecExportOptions,
    classifier: &dyn CategoryClassifier,
) -> Result<Option<SpecExportDocument>, ExportError> {
    validate_policy_width(&options.policy_width)?;
    validate_policy_shape(&options.policy_shape)?;

    let Some(record_first) = records.first() else {
        tracing::debug!(file_name, "nothing to export: zero records");
        return Ok(None);
    };

    let l_columns: Vec<String> = record_first.keys().map(ToString::to_string).collect();
    let enum_category = options
        .category
        .unwrap_or_else(|| classifier.classify(file_name));
    let spec_theme = derive_theme(enum_category);
    let c_sheet_name = options
        .sheet_name
        .clone()
        .unwrap_or_else(|| derive_sheet_name(enum_category).to_string());

    let mut builder_report = ReportExportBuilder {
        cnt_columns: l_columns.len() as u64,
        ..Default::default()
    };

    let style_header = SpecCellStyle {
        background: Some(spec_theme.header_background),
        text_color: Some(spec_theme.header_text_color),
        bold: true,
    };
    let l_header: Vec<SpecHeaderCell> = l_columns
        .iter()
        .map(|c_name| SpecHeaderCell {
            text: c_name.clone(),
            style: style_header,
        })
        .collect();

    let mut l_cols_idx_numeric = Vec::new();
    for c_name in &options.cols_numeric {
        match l_columns.iter().position(|c| c == c_name) {
            Some(n_idx) => l_cols_idx_numeric.push(n_idx),
            None => builder_report.add_warning(format!(
                "Numeric column {c_name:?} not found in header; ignored."
            )),
        }
    }
    l_cols_idx_numeric.sort_unstable();
    l_cols_idx_numeric.dedup();

    let set_columns: BTreeSet<&str> = l_columns.iter().map(String::as_str).collect();
    let mut l_rows = Vec::with_capacity(records.len());
    for (n_idx_record, record) in records.iter().enumerate() {
        builder_report.add_record();
        l_rows.push(project_record(
            n_idx_record,
            record,
            &l_columns,
            &set_columns,
            &options.policy_shape,
            &mut builder_report,
        )?);
        builder_report.add_row();
    }

    if options.if_alternate_rows {
        apply_alternate_row_backgrounds(&mut l_rows, spec_theme.alternate_row_background);
    }

    let l_widths = if options.if_column_widths {
        Some(derive_column_widths(
            &l_columns.iter().map(String::as_str).collect::<Vec<_>>(),
            &l_rows,
            &options.policy_width,
        ))
    } else {
        None
    };

    let report = builder_report.build();
    if report.has_anomalies() {
        tracing::warn!(
            file_name,
            cnt_records_malformed = report.cnt_records_malformed,
            cnt_cells_missing = report.cnt_cells_missing,
            cnt_cells_extra = report.cnt_cells_extra,
            "records deviate from header shape; recovered"
        );
    }
    tracing::debug!(
        file_name,
        category = %enum_category,
        rows = l_rows.len(),
        columns = l_columns.len(),
        "export document built"
    );

    Ok(Some(SpecExportDocument {
        file_name: file_name.to_string(),
        category: enum_category,
        theme: spec_theme,
        sheet_name: c_sheet_name,
        columns: l_columns,
        header: l_header,
        rows: l_rows,
        widths: l_widths,
        cols_idx_numeric: l_cols_idx_numeric,
        if_autofilter: options.if_autofilter,
        if_freeze_header: options.if_freeze_header,
        if_alternate_rows: options.if_alternate_rows,
        policy_width: if options.if_column_widths {
            Some(options.policy_width.clone())
        } else {
            None
        },
        report,
    }))
}

impl SpecExportDocument {
    /// Keep only body rows matching `predicate`.
    ///
    /// Alternate shading and width hints are recomputed for the remaining rows.
    pub fn retain_rows<F>(&mut self, predicate: F)
    where
        F: FnMut(&SpecDocumentRow) -> bool,
    {
        self.rows.retain(predicate);
        if self.if_alternate_rows {
            apply_alternate_row_backgrounds(&mut self.rows, self.theme.alternate_row_background);
        }
        if let Some(policy) = &self.policy_width {
            let l_header_texts: Vec<&str> = self.header.iter().map(|h| h.text.as_str()).collect();
            self.widths = Some(derive_column_widths(&l_header_texts, &self.rows, policy));
        }
        self.report.cnt_rows = self.rows.len() as u64;
    }
}

fn project_record(
    n_idx_record: usize,
    record: &SpecRecord,
    columns: &[String],
    set_columns: &BTreeSet<&str>,
    policy_shape: &SpecRecordShapePolicy,
    builder_report: &mut ReportExportBuilder,
) -> Result<SpecDocumentRow, ExportError> {
    let dict_fields: HashMap<&str, &EnumCellValue> = record.iter().collect();

    let l_cols_extra: Vec<&str> = record
        .keys()
        .filter(|key| !set_columns.contains(key))
        .collect();
    if let Some(c_first_extra) = l_cols_extra.first()
        && policy_shape.rule_extra == EnumExtraColumnRule::Reject
    {
        return Err(ExportError::MalformedRecord {
            index: n_idx_record,
            column: (*c_first_extra).to_string(),
        });
    }

    let mut l_cols_missing = Vec::new();
    let mut l_cells = Vec::with_capacity(columns.len());
    for c_name in columns {
        match dict_fields.get(c_name.as_str()) {
            Some(value) => l_cells.push((*value).clone()),
            None => {
                l_cols_missing.push(c_name.as_str());
                l_cells.push(match policy_shape.rule_missing {
                    EnumMissingColumnRule::Blank => EnumCellValue::None,
                    EnumMissingColumnRule::Placeholder => {
                        EnumCellValue::String(policy_shape.missing_value_str.clone())
                    }
                });
            }
        }
    }

    builder_report.add_shape_anomaly(n_idx_record, &l_cols_missing, &l_cols_extra);

    Ok(SpecDocumentRow {
        cells: l_cells,
        background: None,
    })
}

/// Shade even 0-based body rows; clear the rest.
fn apply_alternate_row_backgrounds(rows: &mut [SpecDocumentRow], color: SpecColor) {
    for (n_idx_row, row) in rows.iter_mut().enumerate() {
        row.background = if n_idx_row % 2 == 0 { Some(color) } else { None };
    }
}
