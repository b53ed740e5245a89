use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::model::{MetricSeries, ResultsSet};

/// Columns of the long (one row per array element) layout used by the
/// CSV and Parquet exports.
const LONG_COLUMNS: [&str; 4] = ["scenario", "method", "metric", "value"];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load an aggregated results file.  Dispatch by extension.
///
/// Supported formats:
/// * `.json`    – `{ scenario: { method: { metric: [...] } } }`
/// * `.csv`     – long layout, header `scenario,method,metric,value`
/// * `.parquet` – the same long layout as columns
pub fn load_file(path: &Path) -> Result<ResultsSet> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let results = match ext.as_str() {
        "json" => load_json(path),
        "csv" => load_csv(path),
        "parquet" | "pq" => load_parquet(path),
        "pkl" | "pickle" => bail!(
            "Unsupported file extension: .{ext} (export the summary as JSON, CSV or Parquet)"
        ),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading results from {}", path.display()))?;

    log::debug!(
        "{}: {} series",
        path.display(),
        results.series_count()
    );
    Ok(results)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (the nested mapping as produced by the aggregation
/// step):
///
/// ```json
/// {
///   "2d_5r_noised_prior": {
///     "imesa": { "iate_trans": [0.41, 0.39], "statuses": [true, false, true] }
///   }
/// }
/// ```
fn load_json(path: &Path) -> Result<ResultsSet> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    serde_json::from_str(&text).context("parsing JSON results mapping")
}

// ---------------------------------------------------------------------------
// Long-format accumulation (CSV / Parquet)
// ---------------------------------------------------------------------------

/// One element of a long-format series.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Cell {
    Number(f64),
    Flag(bool),
}

/// Collects long-format rows, keeping each series in row order.
#[derive(Default)]
struct LongTable {
    series: BTreeMap<(String, String, String), Vec<Cell>>,
}

impl LongTable {
    fn push(&mut self, scenario: &str, method: &str, metric: &str, cell: Cell) {
        self.series
            .entry((scenario.to_string(), method.to_string(), metric.to_string()))
            .or_default()
            .push(cell);
    }

    /// A series made only of booleans stays a flag series; anything mixed
    /// becomes numeric with booleans as 1.0 / 0.0.
    fn finish(self) -> ResultsSet {
        let mut results = ResultsSet::new();
        for ((scenario, method, metric), cells) in self.series {
            let flags: Option<Vec<bool>> = cells
                .iter()
                .map(|c| match c {
                    Cell::Flag(b) => Some(*b),
                    Cell::Number(_) => None,
                })
                .collect();
            let series = match flags {
                Some(f) => MetricSeries::Flags(f),
                None => MetricSeries::Values(
                    cells
                        .iter()
                        .map(|c| match c {
                            Cell::Number(v) => *v,
                            Cell::Flag(b) => f64::from(u8::from(*b)),
                        })
                        .collect(),
                ),
            };
            results.insert(&scenario, &method, &metric, series);
        }
        results
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row `scenario,method,metric,value` (any column order),
/// one row per array element, rows of a series in order.
/// `value` is a number or `true` / `false`.
fn load_csv(path: &Path) -> Result<ResultsSet> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut idx = [0usize; 4];
    for (slot, name) in idx.iter_mut().zip(LONG_COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h == name)
            .with_context(|| format!("CSV missing '{name}' column"))?;
    }
    let [scenario_idx, method_idx, metric_idx, value_idx] = idx;

    let mut table = LongTable::default();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let field = |i: usize| record.get(i).unwrap_or("").trim();

        let cell = parse_cell(field(value_idx))
            .with_context(|| format!("CSV row {row_no}: '{}' is not a number or boolean", field(value_idx)))?;
        table.push(field(scenario_idx), field(method_idx), field(metric_idx), cell);
    }

    Ok(table.finish())
}

fn parse_cell(s: &str) -> Option<Cell> {
    match s {
        "true" | "True" => Some(Cell::Flag(true)),
        "false" | "False" => Some(Cell::Flag(false)),
        other => other.parse::<f64>().ok().map(Cell::Number),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file in the long layout.
///
/// Expected schema:
/// - `scenario`, `method`, `metric`: Utf8 / LargeUtf8
/// - `value`: Float64, Float32, Int64, Int32 or Boolean
fn load_parquet(path: &Path) -> Result<ResultsSet> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut table = LongTable::default();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let mut cols = Vec::with_capacity(LONG_COLUMNS.len());
        for name in LONG_COLUMNS {
            let i = schema
                .index_of(name)
                .map_err(|_| anyhow::anyhow!("Parquet file missing '{name}' column"))?;
            cols.push(batch.column(i));
        }

        for row in 0..batch.num_rows() {
            let scenario = extract_string(cols[0], row)
                .with_context(|| format!("Row {row}: failed to read 'scenario'"))?;
            let method = extract_string(cols[1], row)
                .with_context(|| format!("Row {row}: failed to read 'method'"))?;
            let metric = extract_string(cols[2], row)
                .with_context(|| format!("Row {row}: failed to read 'metric'"))?;
            let cell = extract_cell(cols[3], row)
                .with_context(|| format!("Row {row}: failed to read 'value'"))?;
            table.push(&scenario, &method, &metric, cell);
        }
    }

    Ok(table.finish())
}

// -- Parquet / Arrow helpers --

fn extract_string(col: &Arc<dyn Array>, row: usize) -> Result<String> {
    if col.is_null(row) {
        bail!("null value in key column");
    }
    match col.data_type() {
        DataType::Utf8 => {
            let arr = col
                .as_any()
                .downcast_ref::<StringArray>()
                .context("expected StringArray")?;
            Ok(arr.value(row).to_string())
        }
        DataType::LargeUtf8 => Ok(col.as_string::<i64>().value(row).to_string()),
        other => bail!("Expected Utf8 column, got {other:?}"),
    }
}

/// Extract a single value cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> Result<Cell> {
    if col.is_null(row) {
        bail!("null value in 'value' column");
    }
    let cell = match col.data_type() {
        DataType::Float64 => {
            let arr = downcast::<Float64Array>(col)?;
            Cell::Number(arr.value(row))
        }
        DataType::Float32 => {
            let arr = downcast::<Float32Array>(col)?;
            Cell::Number(f64::from(arr.value(row)))
        }
        DataType::Int64 => {
            let arr = downcast::<Int64Array>(col)?;
            Cell::Number(arr.value(row) as f64)
        }
        DataType::Int32 => {
            let arr = downcast::<Int32Array>(col)?;
            Cell::Number(f64::from(arr.value(row)))
        }
        DataType::Boolean => {
            let arr = downcast::<BooleanArray>(col)?;
            Cell::Flag(arr.value(row))
        }
        other => bail!("Unsupported 'value' column type {other:?}"),
    };
    Ok(cell)
}

fn downcast<T: Array + 'static>(col: &Arc<dyn Array>) -> Result<&T> {
    col.as_any()
        .downcast_ref::<T>()
        .with_context(|| format!("column does not match its type {:?}", col.data_type()))
}

#[cfg(test)]
mod tests {
    use super::*;

    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("imesa-plots-{}-{name}", std::process::id()))
    }

    #[test]
    fn loads_nested_json() {
        let path = temp_path("results.json");
        std::fs::write(
            &path,
            r#"{"2d_nr_noised": {"imesa": {"iate_trans": [0.3, 0.4], "statuses": [true, true]}}}"#,
        )
        .unwrap();

        let rs = load_file(&path).unwrap();
        assert_eq!(
            rs.metric_values("2d_nr_noised", "imesa", "iate_trans").unwrap(),
            vec![0.3, 0.4]
        );
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn loads_long_csv_in_row_order() {
        let path = temp_path("results.csv");
        std::fs::write(
            &path,
            "scenario,method,metric,value\n\
             s,raido,iate_trans,2.5\n\
             s,raido,statuses,true\n\
             s,raido,iate_trans,1.5\n\
             s,raido,statuses,false\n",
        )
        .unwrap();

        let rs = load_file(&path).unwrap();
        assert_eq!(rs.metric_values("s", "raido", "iate_trans").unwrap(), vec![2.5, 1.5]);
        assert_eq!(
            rs.metric_flags("s", "raido", "statuses").unwrap(),
            Some(vec![true, false])
        );
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn csv_method_with_only_failed_runs_builds_without_it() {
        use crate::figure::{build_all, default_figures};
        use crate::style::StyleSheet;

        let path = temp_path("all_failed.csv");
        std::fs::write(
            &path,
            "scenario,method,metric,value\n\
             2d_5r_noised_prior,imesa,iate_trans,0.4\n\
             2d_5r_noised_prior,imesa,statuses,true\n\
             2d_5r_noised_prior,imesa,statuses,false\n\
             2d_5r_noised_prior,imesa,statuses,false\n\
             2d_5r_noised_prior,raido,statuses,false\n\
             2d_5r_noised_prior,raido,statuses,false\n\
             2d_5r_noised_prior,raido,statuses,false\n",
        )
        .unwrap();

        let rs = load_file(&path).unwrap();
        let figures = build_all(&rs, &default_figures(), &StyleSheet::default()).unwrap();
        assert_eq!(figures.len(), 1);
        let methods: Vec<&str> = figures[0].series.iter().map(|s| s.method.as_str()).collect();
        assert_eq!(methods, vec!["imesa"]);
        assert_eq!(figures[0].series[0].points, vec![(5.0, 0.4)]);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn csv_rejects_bad_value() {
        let path = temp_path("bad.csv");
        std::fs::write(&path, "scenario,method,metric,value\ns,m,x,abc\n").unwrap();
        let err = load_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("row 0"));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn csv_requires_long_columns() {
        let path = temp_path("cols.csv");
        std::fs::write(&path, "scenario,method,value\ns,m,1\n").unwrap();
        let err = load_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("'metric'"));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn loads_long_parquet() {
        let path = temp_path("results.parquet");
        let schema = Arc::new(Schema::new(vec![
            Field::new("scenario", DataType::Utf8, false),
            Field::new("method", DataType::Utf8, false),
            Field::new("metric", DataType::Utf8, false),
            Field::new("value", DataType::Float64, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["s", "s", "s"])),
                Arc::new(StringArray::from(vec!["imesa", "imesa", "imesa"])),
                Arc::new(StringArray::from(vec!["iate_trans", "statuses", "statuses"])),
                Arc::new(Float64Array::from(vec![0.25, 1.0, 0.0])),
            ],
        )
        .unwrap();
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let rs = load_file(&path).unwrap();
        assert_eq!(rs.metric_values("s", "imesa", "iate_trans").unwrap(), vec![0.25]);
        assert_eq!(
            rs.metric_flags("s", "imesa", "statuses").unwrap(),
            Some(vec![true, false])
        );
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn unknown_extension_is_an_error() {
        let err = load_file(Path::new("metric_summary.pkl")).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("Unsupported file extension: .pkl"));
        assert!(msg.contains("export the summary as JSON"));

        let err = load_file(Path::new("metric_summary.xlsx")).unwrap_err();
        assert!(format!("{err:#}").contains("Unsupported file extension: .xlsx"));
    }
}
