//! Report writing: per-location text/CSV dump, JSON summary, GeoJSON export

use crate::config::QueryConfig;
use crate::{LocationReport, RankedContribution, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Columns of the per-location table
pub const TABLE_COLUMNS: [&str; 14] = [
    "id",
    "easting",
    "northing",
    "lamp_type",
    "wattage",
    "msi",
    "lumens_per_watt",
    "lamp_lumens",
    "measured_distance",
    "distance",
    "illuminance",
    "msi_weighted",
    "running_total",
    "cumulative_share",
];

/// Projected reference system of the Cork lighting data (Irish Transverse Mercator)
pub const DEFAULT_CRS: &str = "EPSG:2157";

/// Numeric formatting applied when writing reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportFormat {
    /// Digits after the decimal point
    pub precision: usize,
}

impl Default for ReportFormat {
    fn default() -> Self {
        Self { precision: 6 }
    }
}

impl ReportFormat {
    pub fn with_precision(precision: usize) -> Self {
        Self { precision }
    }

    fn num(&self, value: f64) -> String {
        format!("{:.*}", self.precision, value)
    }

    fn opt(&self, value: Option<f64>) -> String {
        value.map(|v| self.num(v)).unwrap_or_default()
    }

    fn row(&self, c: &RankedContribution) -> Vec<String> {
        let light = &c.light;
        vec![
            light.record.id.clone(),
            self.num(light.record.easting),
            self.num(light.record.northing),
            light.record.lamp_type.clone(),
            self.num(light.record.wattage),
            self.opt(light.suppression_weight()),
            self.opt(light.lumens_per_watt()),
            self.opt(light.lamp_lumens()),
            self.num(c.measured_distance_m),
            self.num(c.distance_m),
            self.num(c.illuminance),
            self.num(c.weighted_contribution),
            self.num(c.running_total),
            self.num(c.cumulative_share),
        ]
    }
}

/// Write one block per location:
///
/// ```text
/// Location: <id>
/// Lamps: <retained>
/// <csv table, only if lamps were retained>
///
/// ```
pub fn write_text_report<W: Write>(
    out: &mut W,
    reports: &[LocationReport],
    format: &ReportFormat,
) -> Result<()> {
    for report in reports {
        writeln!(out, "Location: {}", report.location.id)?;
        writeln!(out, "Lamps: {}", report.retained())?;

        if !report.is_empty() {
            let mut table = csv::Writer::from_writer(&mut *out);
            table.write_record(TABLE_COLUMNS)?;
            for c in &report.contributions {
                table.write_record(format.row(c))?;
            }
            table.flush()?;
        }

        writeln!(out)?;
    }
    Ok(())
}

/// Complete run output for JSON export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryReport {
    pub generated_at: String,
    pub radius_m: f64,
    pub threshold: f64,
    pub total_lights: usize,
    pub total_locations: usize,
    pub locations: Vec<LocationReport>,
}

impl SummaryReport {
    pub fn new(locations: Vec<LocationReport>, config: &QueryConfig, total_lights: usize) -> Self {
        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            radius_m: config.radius_m,
            threshold: config.threshold,
            total_lights,
            total_locations: locations.len(),
            locations,
        }
    }
}

pub fn write_json<W: Write>(out: W, summary: &SummaryReport) -> Result<()> {
    serde_json::to_writer_pretty(out, summary)?;
    Ok(())
}

/// Export locations and their retained lights as a GeoJSON FeatureCollection.
///
/// Coordinates stay in the catalog's projected system, named by `crs`.
pub fn to_geojson(summary: &SummaryReport, crs: &str) -> serde_json::Value {
    let mut features: Vec<serde_json::Value> = Vec::new();

    for report in &summary.locations {
        let loc = &report.location;
        features.push(serde_json::json!({
            "type": "Feature",
            "geometry": {
                "type": "Point",
                "coordinates": [loc.easting, loc.northing]
            },
            "properties": {
                "kind": "location",
                "id": loc.id,
                "candidates": report.candidates_considered,
                "retained": report.retained(),
                "total_msi_weighted": report.total_weighted()
            }
        }));

        for (rank, c) in report.contributions.iter().enumerate() {
            let light = &c.light;
            features.push(serde_json::json!({
                "type": "Feature",
                "geometry": {
                    "type": "Point",
                    "coordinates": [light.record.easting, light.record.northing]
                },
                "properties": {
                    "kind": "light",
                    "id": light.record.id,
                    "location_id": loc.id,
                    "rank": rank,
                    "lamp_type": light.record.lamp_type,
                    "wattage": light.record.wattage,
                    "msi": light.suppression_weight(),
                    "measured_distance_m": c.measured_distance_m,
                    "distance_m": c.distance_m,
                    "illuminance": c.illuminance,
                    "msi_weighted": c.weighted_contribution,
                    "cumulative_share": c.cumulative_share
                }
            }));
        }
    }

    serde_json::json!({
        "type": "FeatureCollection",
        "crs": {
            "type": "name",
            "properties": { "name": crs }
        },
        "features": features,
        "metadata": {
            "generated_at": summary.generated_at,
            "radius_m": summary.radius_m,
            "threshold": summary.threshold,
            "total_lights": summary.total_lights,
            "total_locations": summary.total_locations
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LampTypeTable, LightCatalog, LightRecord, QueryLocation, QueryPipeline};

    fn reports() -> Vec<LocationReport> {
        let catalog = LightCatalog::build(
            vec![
                LightRecord::new("A", 1000.0, 1000.0, "SON", 100.0),
                LightRecord::new("B", 1005.0, 1000.0, "SOX", 50.0),
            ],
            &LampTypeTable::msi_defaults(),
        );
        let pipeline = QueryPipeline::new(&catalog, QueryConfig::default()).unwrap();
        pipeline
            .run(&[
                QueryLocation::new("T12AB34", 998.0, 1000.0),
                QueryLocation::new("EMPTY", 0.0, 0.0),
            ])
            .unwrap()
    }

    #[test]
    fn test_text_report_layout() {
        let mut out = Vec::new();
        write_text_report(&mut out, &reports(), &ReportFormat::with_precision(2)).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Location: T12AB34");
        assert_eq!(lines[1], "Lamps: 2");
        assert_eq!(lines[2], TABLE_COLUMNS.join(","));
        assert_eq!(
            lines[3],
            "A,1000.00,1000.00,SON,100.00,0.12,120.00,12000.00,2.00,2.00,25.00,2.95,2.95,1.00"
        );
        assert!(lines[4].starts_with("B,1005.00,1000.00,SOX,50.00,0.02,170.00,8500.00,7.00,7.00,"));
        assert_eq!(lines[5], "");
        assert_eq!(lines[6], "Location: EMPTY");
        assert_eq!(lines[7], "Lamps: 0");
        assert_eq!(lines[8], "");
        assert_eq!(lines.len(), 9);
    }

    #[test]
    fn test_precision_is_a_parameter() {
        let reports = reports();
        let mut six = Vec::new();
        write_text_report(&mut six, &reports, &ReportFormat::default()).unwrap();
        assert!(String::from_utf8(six).unwrap().contains(",2.000000,25.000000,"));
    }

    #[test]
    fn test_json_summary() {
        let summary = SummaryReport::new(reports(), &QueryConfig::default(), 2);
        let mut out = Vec::new();
        write_json(&mut out, &summary).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["radius_m"], 150.0);
        assert_eq!(value["total_locations"], 2);
        assert_eq!(value["locations"][0]["contributions"][0]["light"]["id"], "A");
        assert_eq!(value["locations"][0]["contributions"][0]["cumulative_share"], 1.0);
    }

    #[test]
    fn test_geojson_features() {
        let summary = SummaryReport::new(reports(), &QueryConfig::default(), 2);
        let geojson = to_geojson(&summary, DEFAULT_CRS);

        assert_eq!(geojson["type"], "FeatureCollection");
        assert_eq!(geojson["crs"]["properties"]["name"], "EPSG:2157");
        // 2 locations + 2 retained lights
        let features = geojson["features"].as_array().unwrap();
        assert_eq!(features.len(), 4);
        assert_eq!(features[1]["properties"]["kind"], "light");
        assert_eq!(features[1]["properties"]["location_id"], "T12AB34");
        assert_eq!(features[1]["geometry"]["coordinates"][0], 1000.0);
        assert_eq!(features[1]["properties"]["measured_distance_m"], 2.0);
    }
}
