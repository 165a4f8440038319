//! Stateless helper utilities shared by the document builder and serializers.

use std::collections::{BTreeMap, BTreeSet};

use crate::conf::{
    C_SHEET_NAME_RESERVED, N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX,
    N_WIDTH_EXCEL_COLUMN_MAX, TUP_EXCEL_ILLEGAL, TUP_EXTENSIONS_REPLACEABLE,
};
use crate::spec::{
    EnumMissingColumnRule, ExportError, SpecDocumentRow, SpecRecordShapePolicy, SpecWidthPolicy,
};

////////////////////////////////////////////////////////////////////////////////
// #region TextEscaping

/// Escape `&`, `<`, `>`, `"` and `'` for HTML text and attribute positions.
pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for chr in value.chars() {
        match chr {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(chr),
        }
    }
    out
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ColumnWidths

/// Estimated display width of `s`; non-ASCII characters count as 1.6 units.
pub fn estimate_unicode_string_width(s: &str) -> usize {
    let n_ascii = s.chars().filter(|chr| chr.is_ascii()).count();
    let n_non_ascii = s.chars().count().saturating_sub(n_ascii);
    n_ascii + (n_non_ascii as f64 * 1.6).round() as usize
}

/// Apply padding and `[min, max]` clamping to a recorded width.
pub fn clamp_column_width(n_width_recorded: usize, policy: &SpecWidthPolicy) -> usize {
    let n_min = usize::max(1, policy.width_cell_min);
    let n_max = usize::min(
        N_WIDTH_EXCEL_COLUMN_MAX,
        usize::max(n_min, policy.width_cell_max),
    );
    usize::min(
        n_max,
        usize::max(n_min, n_width_recorded + policy.width_cell_padding),
    )
}

/// Width hint per column from header texts and (up to the policy limit) body rows.
pub fn derive_column_widths(
    header_texts: &[&str],
    rows: &[SpecDocumentRow],
    policy: &SpecWidthPolicy,
) -> Vec<usize> {
    let mut l_width_by_col: Vec<usize> = header_texts
        .iter()
        .map(|text| estimate_unicode_string_width(text))
        .collect();

    let n_rows_inspected = policy
        .height_body_inferred_max
        .map_or(rows.len(), |n_max| usize::min(rows.len(), n_max));

    for row in rows.iter().take(n_rows_inspected) {
        for (n_width, cell) in l_width_by_col.iter_mut().zip(&row.cells) {
            *n_width = usize::max(
                *n_width,
                estimate_unicode_string_width(&cell.to_display_text()),
            );
        }
    }

    l_width_by_col
        .into_iter()
        .map(|n_width| clamp_column_width(n_width, policy))
        .collect()
}

/// Validate width policy bounds.
pub fn validate_policy_width(policy: &SpecWidthPolicy) -> Result<(), ExportError> {
    if policy.width_cell_min == 0 {
        return Err(ExportError::InvalidOption(
            "policy_width.width_cell_min must be >= 1.".to_string(),
        ));
    }
    if policy.width_cell_max < policy.width_cell_min {
        return Err(ExportError::InvalidOption(
            "policy_width.width_cell_max must be >= policy_width.width_cell_min.".to_string(),
        ));
    }
    Ok(())
}

/// Reject a placeholder rule with nothing to place.
pub fn validate_policy_shape(policy: &SpecRecordShapePolicy) -> Result<(), ExportError> {
    if policy.rule_missing == EnumMissingColumnRule::Placeholder
        && policy.missing_value_str.is_empty()
    {
        return Err(ExportError::InvalidOption(
            "policy_shape.missing_value_str must be non-empty with the placeholder rule."
                .to_string(),
        ));
    }
    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ColumnNames

/// Validate that `columns` has no duplicated names.
pub fn validate_unique_columns(columns: &[String]) -> Result<(), ExportError> {
    if columns.len() == columns.iter().collect::<BTreeSet<_>>().len() {
        return Ok(());
    }

    let mut dict_pos: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (n_idx, c_name) in columns.iter().enumerate() {
        dict_pos.entry(c_name).or_default().push(n_idx);
    }

    let c_msg = dict_pos
        .iter()
        .filter_map(|(c_name, l_pos)| {
            if l_pos.len() > 1 {
                Some(format!(
                    "{c_name:?} x{} at indices {:?}",
                    l_pos.len(),
                    l_pos
                ))
            } else {
                None
            }
        })
        .collect::<Vec<_>>()
        .join("; ");

    Err(ExportError::InvalidInput(format!(
        "Duplicate column names detected: {c_msg}"
    )))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetAndFileNames

/// Replace invalid chars and trim to a valid Excel sheet name.
///
/// Length is capped before the outer whitespace and `'` trim. `History` is
/// reserved by Excel and gets a `_` suffix.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    let c_capped: String = c_name
        .trim()
        .chars()
        .take(N_LEN_EXCEL_SHEET_NAME_MAX)
        .collect();
    let c_name = c_capped.trim_matches(|chr: char| chr == '\'' || chr.is_whitespace());

    if c_name.is_empty() {
        return "Sheet".to_string();
    }
    if c_name.eq_ignore_ascii_case(C_SHEET_NAME_RESERVED) {
        return format!("{c_name}_");
    }
    c_name.to_string()
}

/// Give `file_name` the `.{extension}` suffix.
///
/// A name already ending with it (case-insensitive) is kept; another known
/// spreadsheet suffix (`.xls`, `.xlsx`, `.htm`, `.html`) is replaced.
pub fn derive_file_name_with_extension(file_name: &str, extension: &str) -> String {
    let c_file_name = file_name.trim();
    let c_suffix = format!(".{extension}");
    if c_file_name.to_ascii_lowercase().ends_with(&c_suffix.to_ascii_lowercase()) {
        return c_file_name.to_string();
    }

    let c_stem = match c_file_name.rsplit_once('.') {
        Some((c_head, c_ext))
            if !c_head.is_empty()
                && TUP_EXTENSIONS_REPLACEABLE
                    .iter()
                    .any(|c_known| c_ext.eq_ignore_ascii_case(c_known)) =>
        {
            c_head
        }
        _ => c_file_name,
    };
    let c_stem = if c_stem.is_empty() { "export" } else { c_stem };
    format!("{c_stem}{c_suffix}")
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ExcelLimits

/// Reject grids that do not fit one worksheet (header row included).
pub fn validate_excel_limits(n_rows_body: usize, n_cols: usize) -> Result<(), ExportError> {
    if n_rows_body + 1 > N_NROWS_EXCEL_MAX {
        return Err(ExportError::ExcelLimit(format!(
            "{n_rows_body} body rows + header exceed {N_NROWS_EXCEL_MAX} rows."
        )));
    }
    if n_cols > N_NCOLS_EXCEL_MAX {
        return Err(ExportError::ExcelLimit(format!(
            "{n_cols} columns exceed {N_NCOLS_EXCEL_MAX} columns."
        )));
    }
    Ok(())
}

pub fn cast_row_num(value: usize) -> Result<u32, ExportError> {
    u32::try_from(value).map_err(|_| ExportError::ExcelLimit(format!("row index overflow: {value}")))
}

pub fn cast_col_num(value: usize) -> Result<u16, ExportError> {
    u16::try_from(value)
        .map_err(|_| ExportError::ExcelLimit(format!("column index overflow: {value}")))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
