use checkloop_io_export::conf::derive_default_export_options;
use checkloop_io_export::ingest::records_from_ipc_bytes;
use checkloop_io_export::spec::{
    EnumCellValue, EnumExportCategory, EnumExtraColumnRule, EnumMissingColumnRule,
    EnumSpreadsheetFormat, ExportError, SpecExportArtifact, SpecExportOptions, SpecRecord,
};
use checkloop_io_export::util::validate_policy_shape;
use checkloop_io_export::TableExporter;
use pyo3::exceptions::{PyOSError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyAny, PyBool, PyBytes, PyDict, PyFloat, PyInt, PyString};

const N_BRIDGE_ABI_VERSION: u64 = 1;
const C_BRIDGE_CONTRACT_VERSION: &str = "checkloop.io.export.v1";
const C_BRIDGE_TRANSPORT: &str = "records_or_ipc_bytes";

#[pyclass(name = "ExportArtifact", frozen)]
struct PyExportArtifact {
    inner: SpecExportArtifact,
}

#[pymethods]
impl PyExportArtifact {
    #[getter]
    fn data<'py>(&self, py: Python<'py>) -> Bound<'py, PyBytes> {
        PyBytes::new(py, &self.inner.data)
    }

    #[getter]
    fn file_name(&self) -> &str {
        &self.inner.file_name
    }

    #[getter]
    fn mime_type(&self) -> &str {
        &self.inner.mime_type
    }

    #[getter]
    fn format(&self) -> &'static str {
        self.inner.format.as_str()
    }

    #[getter]
    fn report<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let dict_report = PyDict::new(py);
        for (c_key, n_value) in self.inner.report.to_dict() {
            dict_report.set_item(c_key, n_value)?;
        }
        dict_report.set_item("warnings", self.inner.report.warnings.clone())?;
        Ok(dict_report)
    }

    /// Write the artifact into `dir`; returns the written path.
    fn save(&self, py: Python<'_>, dir: String) -> PyResult<String> {
        let path_out = py
            .allow_threads(|| self.inner.save_into(&dir))
            .map_err(derive_py_err)?;
        Ok(path_out.to_string_lossy().to_string())
    }

    fn __repr__(&self) -> String {
        format!(
            "ExportArtifact(file_name={:?}, mime_type={:?}, bytes={})",
            self.inner.file_name,
            self.inner.mime_type,
            self.inner.data.len()
        )
    }
}

#[pyfunction]
#[pyo3(signature = (
    records,
    file_name,
    format = None,
    category = None,
    if_alternate_rows = true,
    if_autofilter = true,
    if_column_widths = true,
    cols_numeric = None,
    rule_missing = "blank",
    rule_extra = "drop",
    missing_value_str = "",
    sheet_name = None,
    if_freeze_header = true
))]
#[allow(clippy::too_many_arguments)]
fn export_records(
    py: Python<'_>,
    records: &Bound<'_, PyAny>,
    file_name: &str,
    format: Option<&str>,
    category: Option<&str>,
    if_alternate_rows: bool,
    if_autofilter: bool,
    if_column_widths: bool,
    cols_numeric: Option<Vec<String>>,
    rule_missing: &str,
    rule_extra: &str,
    missing_value_str: &str,
    sheet_name: Option<String>,
    if_freeze_header: bool,
) -> PyResult<Option<PyExportArtifact>> {
    let l_records = parse_records(records)?;
    let cfg_options = parse_export_options(
        file_name,
        format,
        category,
        if_alternate_rows,
        if_autofilter,
        if_column_widths,
        cols_numeric,
        rule_missing,
        rule_extra,
        missing_value_str,
        sheet_name,
        if_freeze_header,
    )?;
    run_export(py, &l_records, file_name, cfg_options)
}

#[pyfunction]
#[pyo3(signature = (
    df_ipc,
    file_name,
    format = None,
    category = None,
    if_alternate_rows = true,
    if_autofilter = true,
    if_column_widths = true,
    cols_numeric = None,
    rule_missing = "blank",
    rule_extra = "drop",
    missing_value_str = "",
    sheet_name = None,
    if_freeze_header = true
))]
#[allow(clippy::too_many_arguments)]
fn export_ipc(
    py: Python<'_>,
    df_ipc: &[u8],
    file_name: &str,
    format: Option<&str>,
    category: Option<&str>,
    if_alternate_rows: bool,
    if_autofilter: bool,
    if_column_widths: bool,
    cols_numeric: Option<Vec<String>>,
    rule_missing: &str,
    rule_extra: &str,
    missing_value_str: &str,
    sheet_name: Option<String>,
    if_freeze_header: bool,
) -> PyResult<Option<PyExportArtifact>> {
    let cfg_options = parse_export_options(
        file_name,
        format,
        category,
        if_alternate_rows,
        if_autofilter,
        if_column_widths,
        cols_numeric,
        rule_missing,
        rule_extra,
        missing_value_str,
        sheet_name,
        if_freeze_header,
    )?;
    let l_records = py
        .allow_threads(|| records_from_ipc_bytes(df_ipc))
        .map_err(derive_py_err)?;
    run_export(py, &l_records, file_name, cfg_options)
}

fn run_export(
    py: Python<'_>,
    records: &[SpecRecord],
    file_name: &str,
    options: SpecExportOptions,
) -> PyResult<Option<PyExportArtifact>> {
    let exporter = TableExporter::new(options);
    let res_artifact = py.allow_threads(|| -> Result<Option<SpecExportArtifact>, ExportError> {
        match exporter.build_document(records, file_name)? {
            Some(doc) => Ok(Some(exporter.package(&doc)?)),
            None => Ok(None),
        }
    });
    Ok(res_artifact
        .map_err(derive_py_err)?
        .map(|inner| PyExportArtifact { inner }))
}

#[allow(clippy::too_many_arguments)]
fn parse_export_options(
    file_name: &str,
    format: Option<&str>,
    category: Option<&str>,
    if_alternate_rows: bool,
    if_autofilter: bool,
    if_column_widths: bool,
    cols_numeric: Option<Vec<String>>,
    rule_missing: &str,
    rule_extra: &str,
    missing_value_str: &str,
    sheet_name: Option<String>,
    if_freeze_header: bool,
) -> PyResult<SpecExportOptions> {
    let mut cfg_options = derive_default_export_options();

    cfg_options.format = match format {
        Some(c_format) => EnumSpreadsheetFormat::parse(c_format).map_err(derive_py_err)?,
        None => EnumSpreadsheetFormat::from_file_name(file_name).unwrap_or_default(),
    };
    cfg_options.category = category
        .map(str::parse::<EnumExportCategory>)
        .transpose()
        .map_err(derive_py_err)?;
    cfg_options.if_alternate_rows = if_alternate_rows;
    cfg_options.if_autofilter = if_autofilter;
    cfg_options.if_column_widths = if_column_widths;
    cfg_options.if_freeze_header = if_freeze_header;
    cfg_options.sheet_name = sheet_name;
    cfg_options.cols_numeric = cols_numeric.unwrap_or_default();
    cfg_options.policy_shape.rule_missing = parse_rule_missing(rule_missing)?;
    cfg_options.policy_shape.rule_extra = parse_rule_extra(rule_extra)?;
    cfg_options.policy_shape.missing_value_str = missing_value_str.to_string();
    validate_policy_shape(&cfg_options.policy_shape).map_err(derive_py_err)?;

    Ok(cfg_options)
}

fn parse_rule_missing(value: &str) -> PyResult<EnumMissingColumnRule> {
    match value {
        "blank" => Ok(EnumMissingColumnRule::Blank),
        "placeholder" => Ok(EnumMissingColumnRule::Placeholder),
        _ => Err(PyValueError::new_err(
            "rule_missing must be one of: 'blank', 'placeholder'.",
        )),
    }
}

fn parse_rule_extra(value: &str) -> PyResult<EnumExtraColumnRule> {
    match value {
        "drop" => Ok(EnumExtraColumnRule::Drop),
        "reject" => Ok(EnumExtraColumnRule::Reject),
        _ => Err(PyValueError::new_err(
            "rule_extra must be one of: 'drop', 'reject'.",
        )),
    }
}

fn parse_records(records: &Bound<'_, PyAny>) -> PyResult<Vec<SpecRecord>> {
    let mut l_records = Vec::new();
    for (n_idx, item) in records.try_iter()?.enumerate() {
        let item = item?;
        let dict_fields = item.downcast::<PyDict>().map_err(|_| {
            PyValueError::new_err(format!("Record {n_idx} must be a dict."))
        })?;
        let mut record = SpecRecord::new();
        for (key, value) in dict_fields.iter() {
            let c_key = if key.is_instance_of::<PyString>() {
                key.extract::<String>()?
            } else {
                key.str()?.to_string()
            };
            record.insert(c_key, parse_cell_value(&value)?);
        }
        l_records.push(record);
    }
    Ok(l_records)
}

fn parse_cell_value(value: &Bound<'_, PyAny>) -> PyResult<EnumCellValue> {
    if value.is_none() {
        return Ok(EnumCellValue::None);
    }
    // bool before int: Python bools are ints.
    if value.is_instance_of::<PyBool>() {
        return Ok(EnumCellValue::Boolean(value.extract::<bool>()?));
    }
    if value.is_instance_of::<PyInt>() || value.is_instance_of::<PyFloat>() {
        return Ok(EnumCellValue::Number(value.extract::<f64>()?));
    }
    if value.is_instance_of::<PyString>() {
        return Ok(EnumCellValue::String(value.extract::<String>()?));
    }
    Ok(EnumCellValue::String(value.str()?.to_string()))
}

fn derive_py_err(err: ExportError) -> PyErr {
    match err {
        ExportError::Io(e) => PyOSError::new_err(e.to_string()),
        other => PyValueError::new_err(other.to_string()),
    }
}

#[pymodule]
fn _checkloop_io_export_rs(_py: Python<'_>, module: &Bound<'_, PyModule>) -> PyResult<()> {
    module.add_class::<PyExportArtifact>()?;
    module.add_function(wrap_pyfunction!(export_records, module)?)?;
    module.add_function(wrap_pyfunction!(export_ipc, module)?)?;
    module.add("__bridge_abi__", N_BRIDGE_ABI_VERSION)?;
    module.add("__bridge_contract__", C_BRIDGE_CONTRACT_VERSION)?;
    module.add("__bridge_transport__", C_BRIDGE_TRANSPORT)?;
    Ok(())
}
