//! MSI Street Light Exposure
//!
//! Estimates how much artificial light at a location of interest comes from
//! nearby street lighting, weighted by each lamp type's melatonin suppression
//! index (MSI).
//!
//! # Contribution Model
//!
//! ```text
//! E(l)   = W(l) / d(l)²
//! C(l)   = E(l) · MSI(type(l))
//! S_i    = C_i / Σ_{j≤i} C_j        (S_0 := 1, sorted by C descending)
//! keep i ⇔ S_i > threshold
//! ```
//!
//! | Symbol | Description |
//! |--------|-------------|
//! | W      | Lamp wattage (watts) |
//! | d      | Planar distance from location to lamp (meters) |
//! | MSI    | Melatonin suppression weight of the lamp type |
//! | S      | Share of the running total at rank i |
//!
//! # Pipeline
//!
//! 1. [`lamp_types::LampTypeTable`] maps lamp labels to MSI and lm/W
//! 2. [`catalog::LightCatalog`] left-joins raw records against the table
//! 3. [`spatial::nearby_lights`] narrows the catalog around a location
//! 4. [`ranker::rank`] weights, sorts and prunes the neighbours
//! 5. [`pipeline::QueryPipeline`] repeats 3-4 for every location

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod catalog;
pub mod config;
pub mod lamp_types;
pub mod loader;
pub mod pipeline;
pub mod ranker;
pub mod report;
pub mod spatial;

pub use catalog::LightCatalog;
pub use config::{DistancePolicy, QueryConfig};
pub use lamp_types::{LampTypeEntry, LampTypeTable};
pub use pipeline::QueryPipeline;
pub use spatial::FilterMode;

/// Default search radius around a location in meters
pub const DEFAULT_RADIUS_M: f64 = 150.0;

/// Default pruning threshold (keep every positive share)
pub const DEFAULT_THRESHOLD: f64 = 0.0;

/// Default floor applied to a location coincident with a lamp, in meters
pub const DEFAULT_MIN_DISTANCE_M: f64 = 1.0;

#[derive(Error, Debug)]
pub enum ExposureError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Search radius must be positive and finite, got {0}")]
    InvalidRadius(f64),
    #[error("Threshold must be in [0, 1), got {0}")]
    InvalidThreshold(f64),
    #[error("Minimum distance must be positive and finite, got {0}")]
    InvalidDistanceFloor(f64),
    #[error("Invalid lamp type {label:?}: {reason}")]
    InvalidLampType { label: String, reason: String },
    #[error("Missing column {column:?} (accepted names: {accepted})")]
    MissingColumn { column: String, accepted: String },
    #[error("Light {id:?} has no computed distance; use accurate filtering before ranking")]
    MissingDistance { id: String },
}

pub type Result<T> = std::result::Result<T, ExposureError>;

/// A street light as delivered by the ingestion layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightRecord {
    pub id: String,
    /// Projected easting (meters)
    pub easting: f64,
    /// Projected northing (meters)
    pub northing: f64,
    /// Lamp technology label, e.g. "SON" or "LED 4000K"
    pub lamp_type: String,
    /// Rated wattage (W)
    pub wattage: f64,
}

impl LightRecord {
    pub fn new(
        id: impl Into<String>,
        easting: f64,
        northing: f64,
        lamp_type: impl Into<String>,
        wattage: f64,
    ) -> Self {
        Self {
            id: id.into(),
            easting,
            northing,
            lamp_type: lamp_type.into(),
            wattage,
        }
    }
}

/// Photometric data resolved from the lamp type table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LampEnrichment {
    /// Melatonin suppression weight (0, 1]
    pub suppression_weight: f64,
    /// Luminous efficiency (lm/W)
    pub lumens_per_watt: f64,
}

/// A light record joined against the lamp type table.
///
/// `enrichment` is `None` when the lamp type label is not in the table. Such
/// records stay in the catalog but never take part in ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedLightRecord {
    #[serde(flatten)]
    pub record: LightRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrichment: Option<LampEnrichment>,
}

impl EnrichedLightRecord {
    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn suppression_weight(&self) -> Option<f64> {
        self.enrichment.map(|e| e.suppression_weight)
    }

    pub fn lumens_per_watt(&self) -> Option<f64> {
        self.enrichment.map(|e| e.lumens_per_watt)
    }

    /// Total lamp output (wattage × lm/W).
    ///
    /// Informational only: ranking divides raw wattage by distance squared,
    /// not lamp lumens. Switching would change every ranked value, so it is
    /// left as is until the intended photometric model is confirmed.
    pub fn lamp_lumens(&self) -> Option<f64> {
        self.lumens_per_watt().map(|lpw| self.record.wattage * lpw)
    }
}

/// A location of interest (e.g. a house identified by its Eircode)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryLocation {
    pub id: String,
    pub easting: f64,
    pub northing: f64,
}

impl QueryLocation {
    pub fn new(id: impl Into<String>, easting: f64, northing: f64) -> Self {
        Self {
            id: id.into(),
            easting,
            northing,
        }
    }
}

/// One light's ranked contribution at a location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedContribution {
    pub light: EnrichedLightRecord,
    /// Planar distance between the light and the location
    pub measured_distance_m: f64,
    /// Distance used for the inverse-square law, after any floor was applied
    pub distance_m: f64,
    /// wattage / distance²
    pub illuminance: f64,
    /// illuminance × suppression weight
    pub weighted_contribution: f64,
    /// Sum of weighted contributions up to and including this rank
    pub running_total: f64,
    /// weighted_contribution / running_total, forced to 1 for the first rank
    pub cumulative_share: f64,
}

/// Ranked and pruned result for a single location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationReport {
    pub location: QueryLocation,
    /// Number of lights inside the radius before ranking and pruning
    pub candidates_considered: usize,
    pub contributions: Vec<RankedContribution>,
}

impl LocationReport {
    /// Number of lights retained after pruning
    pub fn retained(&self) -> usize {
        self.contributions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contributions.is_empty()
    }

    /// Sum of retained weighted contributions
    pub fn total_weighted(&self) -> f64 {
        self.contributions
            .iter()
            .map(|c| c.weighted_contribution)
            .sum()
    }
}

/// Planar Euclidean distance in projected coordinates (meters)
pub fn planar_distance(e1: f64, n1: f64, e2: f64, n2: f64) -> f64 {
    (e1 - e2).hypot(n1 - n2)
}
