//! Neighbourhood search around a location
//!
//! A cheap axis-aligned bounding square (side 2·radius) always runs first.
//! Accurate mode then keeps only lights strictly inside the circle. Quick
//! mode stops at the square and computes no distances.

use crate::catalog::LightCatalog;
use crate::{planar_distance, EnrichedLightRecord};
use serde::{Deserialize, Serialize};

/// How precisely the neighbourhood is resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Bounding square followed by an exact Euclidean radius check
    #[default]
    Accurate,
    /// Bounding square only; suitable for coverage checks, not ranking
    Quick,
}

/// A catalog record found near a location
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor<'a> {
    pub light: &'a EnrichedLightRecord,
    /// Distance to the location in meters; `None` in quick mode
    pub distance_m: Option<f64>,
}

/// Records inside the axis-aligned square of half-side `radius`
pub fn bounding_square<'a>(
    records: &'a [EnrichedLightRecord],
    easting: f64,
    northing: f64,
    radius: f64,
) -> impl Iterator<Item = &'a EnrichedLightRecord> + 'a {
    records.iter().filter(move |r| {
        (r.record.easting - easting).abs() < radius && (r.record.northing - northing).abs() < radius
    })
}

/// Lights near (`easting`, `northing`), in catalog order
pub fn nearby_lights<'a>(
    catalog: &'a LightCatalog,
    easting: f64,
    northing: f64,
    radius: f64,
    mode: FilterMode,
) -> Vec<Neighbor<'a>> {
    let square = bounding_square(catalog.records(), easting, northing, radius);

    match mode {
        FilterMode::Quick => square
            .map(|light| Neighbor {
                light,
                distance_m: None,
            })
            .collect(),
        FilterMode::Accurate => square
            .filter_map(|light| {
                let d = planar_distance(light.record.easting, light.record.northing, easting, northing);
                (d < radius).then_some(Neighbor {
                    light,
                    distance_m: Some(d),
                })
            })
            .collect(),
    }
}
