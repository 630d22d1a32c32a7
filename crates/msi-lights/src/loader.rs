//! CSV loading for light catalogs and locations of interest
//!
//! Column names are resolved through alias lists so the Cork County Council
//! street lighting exports and the sample house coordinate files load without
//! manual renaming.

use crate::{ExposureError, LightRecord, QueryLocation, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{info, warn};

const LIGHT_ID_COLUMNS: &[&str] = &["id", "ID"];
const LIGHT_EASTING_COLUMNS: &[&str] = &["easting", "Easting_ITM", "12) Easting_ITM"];
const LIGHT_NORTHING_COLUMNS: &[&str] = &["northing", "Northing_ITM", "13) Northing_ITM"];
const LAMP_TYPE_COLUMNS: &[&str] = &["lamp_type", "Lamp Type", "39) Lamp Type"];
const WATTAGE_COLUMNS: &[&str] = &["wattage", "Wattage", "40) Wattage"];

const LOCATION_ID_COLUMNS: &[&str] = &["id", "eircode", "Eircode", "Unnamed: 1"];
const LOCATION_EASTING_COLUMNS: &[&str] = &["easting", "IRENET95-East"];
const LOCATION_NORTHING_COLUMNS: &[&str] = &["northing", "IRENET95-North"];

/// Index of the first header matching any alias
fn find_column(headers: &StringRecord, aliases: &[&str]) -> Option<usize> {
    aliases
        .iter()
        .find_map(|alias| headers.iter().position(|h| h == *alias))
}

fn require_column(headers: &StringRecord, column: &str, aliases: &[&str]) -> Result<usize> {
    find_column(headers, aliases).ok_or_else(|| ExposureError::MissingColumn {
        column: column.to_string(),
        accepted: aliases.join(", "),
    })
}

/// Location exports carry the Eircode in an unnamed second column
fn location_id_column(headers: &StringRecord) -> Option<usize> {
    find_column(headers, LOCATION_ID_COLUMNS).or_else(|| match headers.get(1) {
        Some("") => Some(1),
        _ => None,
    })
}

/// Parse a finite float from a cell; empty or malformed cells yield `None`
fn parse_cell(record: &StringRecord, idx: usize) -> Option<f64> {
    record
        .get(idx)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

fn text_cell(record: &StringRecord, idx: usize) -> Option<&str> {
    record.get(idx).filter(|s| !s.is_empty())
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader)
}

/// Load street lights from a CSV file
pub fn load_lights(path: impl AsRef<Path>) -> Result<Vec<LightRecord>> {
    let path = path.as_ref();
    info!("Loading lights from {:?}", path);

    let file = File::open(path)?;
    read_lights(BufReader::new(file))
}

/// Read street lights from any CSV source.
///
/// Rows without finite coordinates or with a missing or negative wattage are
/// skipped. An empty lamp type is kept and will not resolve.
pub fn read_lights<R: Read>(reader: R) -> Result<Vec<LightRecord>> {
    let mut csv = csv_reader(reader);
    let headers = csv.headers()?.clone();

    let id_col = find_column(&headers, LIGHT_ID_COLUMNS);
    let easting_col = require_column(&headers, "easting", LIGHT_EASTING_COLUMNS)?;
    let northing_col = require_column(&headers, "northing", LIGHT_NORTHING_COLUMNS)?;
    let lamp_type_col = require_column(&headers, "lamp_type", LAMP_TYPE_COLUMNS)?;
    let wattage_col = require_column(&headers, "wattage", WATTAGE_COLUMNS)?;

    let mut lights = Vec::new();
    let mut skipped = 0;

    for (i, row) in csv.records().enumerate() {
        let row = row?;

        let (Some(easting), Some(northing)) =
            (parse_cell(&row, easting_col), parse_cell(&row, northing_col))
        else {
            skipped += 1;
            continue;
        };
        let wattage = match parse_cell(&row, wattage_col) {
            Some(w) if w >= 0.0 => w,
            _ => {
                skipped += 1;
                continue;
            }
        };

        let id = id_col
            .and_then(|c| text_cell(&row, c))
            .map(str::to_string)
            .unwrap_or_else(|| i.to_string());
        let lamp_type = text_cell(&row, lamp_type_col).unwrap_or_default();

        lights.push(LightRecord::new(id, easting, northing, lamp_type, wattage));
    }

    info!("Loaded {} lights", lights.len());
    if skipped > 0 {
        warn!("Skipped {} light rows with missing coordinates or wattage", skipped);
    }

    Ok(lights)
}

/// Load locations of interest from a CSV file
pub fn load_locations(path: impl AsRef<Path>) -> Result<Vec<QueryLocation>> {
    let path = path.as_ref();
    info!("Loading locations from {:?}", path);

    let file = File::open(path)?;
    read_locations(BufReader::new(file))
}

/// Read locations of interest from any CSV source
pub fn read_locations<R: Read>(reader: R) -> Result<Vec<QueryLocation>> {
    let mut csv = csv_reader(reader);
    let headers = csv.headers()?.clone();

    let id_col = location_id_column(&headers);
    let easting_col = require_column(&headers, "easting", LOCATION_EASTING_COLUMNS)?;
    let northing_col = require_column(&headers, "northing", LOCATION_NORTHING_COLUMNS)?;

    let mut locations = Vec::new();
    let mut skipped = 0;

    for (i, row) in csv.records().enumerate() {
        let row = row?;

        let (Some(easting), Some(northing)) =
            (parse_cell(&row, easting_col), parse_cell(&row, northing_col))
        else {
            skipped += 1;
            continue;
        };

        let id = id_col
            .and_then(|c| text_cell(&row, c))
            .map(str::to_string)
            .unwrap_or_else(|| format!("loc-{}", i));

        locations.push(QueryLocation::new(id, easting, northing));
    }

    info!("Loaded {} locations", locations.len());
    if skipped > 0 {
        warn!("Skipped {} location rows with missing coordinates", skipped);
    }

    Ok(locations)
}
