use std::io;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array, StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::model::{AccidentDataset, Record};

/// Column names of the processed dataset (datos.gob.ar / SAT export).
pub mod columns {
    pub const YEAR: &str = "anio";
    pub const MONTH: &str = "mes_num";
    pub const PROVINCE: &str = "provincia_nombre";
    pub const INCIDENT_ID: &str = "id_hecho";
    pub const AGE_BRACKET: &str = "victima_tr_edad";
    pub const VEHICLE: &str = "victima_vehiculo_ampliado";
    pub const LATITUDE: &str = "latitud";
    pub const LONGITUDE: &str = "longitud";
}

/// Structural load failures. Cell-level problems never raise these; a bad
/// cell just becomes `None` in the [`Record`].
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the accident dataset from a file. Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – the processed dataset as published (primary format)
/// * `.json`    – records-oriented array, `[{ "anio": 2019, ... }, ...]`
/// * `.parquet` – flat scalar columns with the same names
pub fn load_file(path: &Path) -> Result<AccidentDataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!(LoadError::UnsupportedExtension(other.to_string())),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<AccidentDataset> {
    let reader = csv::Reader::from_path(path).context("opening CSV")?;
    read_csv(reader)
}

/// Parse the dataset out of any CSV reader. `anio`, `mes_num` and
/// `provincia_nombre` must exist as columns; everything else is optional and
/// its absence only degrades the dependent view.
fn read_csv<R: io::Read>(mut reader: csv::Reader<R>) -> Result<AccidentDataset> {
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let position = |name: &'static str| headers.iter().position(|h| h == name);
    let required =
        |name: &'static str| position(name).ok_or(LoadError::MissingColumn(name));

    let year_idx = required(columns::YEAR)?;
    let month_idx = required(columns::MONTH)?;
    let province_idx = required(columns::PROVINCE)?;
    let incident_idx = position(columns::INCIDENT_ID);
    let age_idx = position(columns::AGE_BRACKET);
    let vehicle_idx = position(columns::VEHICLE);
    let lat_idx = position(columns::LATITUDE);
    let lon_idx = position(columns::LONGITUDE);

    let mut records = Vec::new();
    let mut unplaceable = 0usize;

    for (row_no, result) in reader.records().enumerate() {
        let row = result.with_context(|| format!("CSV row {row_no}"))?;

        let rec = Record {
            year: cell(&row, Some(year_idx)).and_then(parse_int).map(|y| y as i32),
            month: cell(&row, Some(month_idx)).and_then(parse_int).map(|m| m as u32),
            province: cell(&row, Some(province_idx)).map(str::to_string),
            incident_id: cell(&row, incident_idx).map(str::to_string),
            age_bracket: cell(&row, age_idx).map(str::to_string),
            vehicle: cell(&row, vehicle_idx).map(str::to_string),
            latitude: cell(&row, lat_idx).and_then(|s| s.parse().ok()),
            longitude: cell(&row, lon_idx).and_then(|s| s.parse().ok()),
        };

        if rec.year.is_none() || rec.month.is_none() {
            unplaceable += 1;
        }
        records.push(rec);
    }

    if unplaceable > 0 {
        log::warn!("{unplaceable} rows have an unparseable year or month");
    }

    Ok(AccidentDataset::from_records(records, incident_idx.is_some()))
}

/// A non-empty, non-`nan` trimmed cell, or `None`.
fn cell<'a>(row: &'a csv::StringRecord, idx: Option<usize>) -> Option<&'a str> {
    let s = row.get(idx?)?.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("nan") {
        None
    } else {
        Some(s)
    }
}

/// Lenient integer parse: accepts `2019` as well as pandas-style `2019.0`.
fn parse_int(s: &str) -> Option<i64> {
    s.parse::<i64>()
        .ok()
        .or_else(|| s.parse::<f64>().ok().filter(|f| f.fract() == 0.0).map(|f| f as i64))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// One row in the records-oriented JSON export; field names follow the
/// dataset's column names.
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "anio", default)]
    year: Option<i32>,
    #[serde(rename = "mes_num", default)]
    month: Option<u32>,
    #[serde(rename = "provincia_nombre", default)]
    province: Option<String>,
    #[serde(rename = "id_hecho", default)]
    incident_id: Option<String>,
    #[serde(rename = "victima_tr_edad", default)]
    age_bracket: Option<String>,
    #[serde(rename = "victima_vehiculo_ampliado", default)]
    vehicle: Option<String>,
    #[serde(rename = "latitud", default)]
    latitude: Option<f64>,
    #[serde(rename = "longitud", default)]
    longitude: Option<f64>,
}

impl From<RawRecord> for Record {
    fn from(raw: RawRecord) -> Self {
        Record {
            year: raw.year,
            month: raw.month,
            province: raw.province,
            incident_id: raw.incident_id,
            age_bracket: raw.age_bracket,
            vehicle: raw.vehicle,
            latitude: raw.latitude,
            longitude: raw.longitude,
        }
    }
}

/// Records-oriented JSON (the default `df.to_json(orient='records')`).
fn load_json(path: &Path) -> Result<AccidentDataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let rows: Vec<JsonValue> = serde_json::from_str(&text).context("parsing JSON")?;

    let has_incident_ids = rows
        .iter()
        .filter_map(|v| v.as_object())
        .any(|obj| obj.contains_key(columns::INCIDENT_ID));

    let mut records = Vec::with_capacity(rows.len());
    let mut skipped = 0usize;
    for (i, row) in rows.into_iter().enumerate() {
        match serde_json::from_value::<RawRecord>(row) {
            Ok(raw) => records.push(raw.into()),
            Err(e) => {
                log::warn!("skipping JSON row {i}: {e}");
                skipped += 1;
            }
        }
    }
    if skipped > 0 {
        log::warn!("skipped {skipped} malformed JSON rows");
    }

    Ok(AccidentDataset::from_records(records, has_incident_ids))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Flat scalar columns with the dataset's column names; numeric columns may
/// be Int32/Int64/Float32/Float64, text columns Utf8 or LargeUtf8.
fn load_parquet(path: &Path) -> Result<AccidentDataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();
    let mut has_incident_ids = false;

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let position = |name: &'static str| schema.index_of(name).ok();
        let required = |name: &'static str| position(name).ok_or(LoadError::MissingColumn(name));

        let year_idx = required(columns::YEAR)?;
        let month_idx = required(columns::MONTH)?;
        let province_idx = required(columns::PROVINCE)?;
        let incident_idx = position(columns::INCIDENT_ID);
        let age_idx = position(columns::AGE_BRACKET);
        let vehicle_idx = position(columns::VEHICLE);
        let lat_idx = position(columns::LATITUDE);
        let lon_idx = position(columns::LONGITUDE);

        has_incident_ids |= incident_idx.is_some();

        let column = |idx: Option<usize>| idx.map(|i| batch.column(i));
        let year_col = batch.column(year_idx);
        let month_col = batch.column(month_idx);
        let province_col = batch.column(province_idx);
        let incident_col = column(incident_idx);
        let age_col = column(age_idx);
        let vehicle_col = column(vehicle_idx);
        let lat_col = column(lat_idx);
        let lon_col = column(lon_idx);

        for row in 0..batch.num_rows() {
            records.push(Record {
                year: int_at(year_col, row).map(|y| y as i32),
                month: int_at(month_col, row).map(|m| m as u32),
                province: string_at(province_col, row),
                incident_id: incident_col.and_then(|c| string_at(c, row)),
                age_bracket: age_col.and_then(|c| string_at(c, row)),
                vehicle: vehicle_col.and_then(|c| string_at(c, row)),
                latitude: lat_col.and_then(|c| float_at(c, row)),
                longitude: lon_col.and_then(|c| float_at(c, row)),
            });
        }
    }

    Ok(AccidentDataset::from_records(records, has_incident_ids))
}

// -- Arrow scalar helpers --

fn int_at(col: &Arc<dyn Array>, row: usize) -> Option<i64> {
    if col.is_null(row) {
        return None;
    }
    match col.data_type() {
        DataType::Int32 => col
            .as_any()
            .downcast_ref::<Int32Array>()
            .map(|a| a.value(row) as i64),
        DataType::Int64 => col
            .as_any()
            .downcast_ref::<Int64Array>()
            .map(|a| a.value(row)),
        // Pandas promotes integer columns with NaNs to float.
        DataType::Float64 => col
            .as_any()
            .downcast_ref::<Float64Array>()
            .map(|a| a.value(row))
            .filter(|f| f.fract() == 0.0)
            .map(|f| f as i64),
        _ => None,
    }
}

fn float_at(col: &Arc<dyn Array>, row: usize) -> Option<f64> {
    if col.is_null(row) {
        return None;
    }
    match col.data_type() {
        DataType::Float32 => col
            .as_any()
            .downcast_ref::<Float32Array>()
            .map(|a| a.value(row) as f64),
        DataType::Float64 => col
            .as_any()
            .downcast_ref::<Float64Array>()
            .map(|a| a.value(row)),
        _ => int_at(col, row).map(|i| i as f64),
    }
}

fn string_at(col: &Arc<dyn Array>, row: usize) -> Option<String> {
    if col.is_null(row) {
        return None;
    }
    let s = match col.data_type() {
        DataType::Utf8 => col
            .as_any()
            .downcast_ref::<StringArray>()
            .map(|a| a.value(row).to_string()),
        DataType::LargeUtf8 => Some(col.as_string::<i64>().value(row).to_string()),
        // Identifier columns sometimes come through as integers.
        DataType::Int32 | DataType::Int64 => int_at(col, row).map(|i| i.to_string()),
        DataType::Boolean => col
            .as_any()
            .downcast_ref::<BooleanArray>()
            .map(|a| a.value(row).to_string()),
        _ => None,
    };
    s.filter(|s| !s.trim().is_empty())
}
