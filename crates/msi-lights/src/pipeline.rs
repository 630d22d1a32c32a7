//! Per-location query pipeline
//!
//! Each location is filtered and ranked independently against a shared,
//! read-only catalog, so locations can run in any order or in parallel.

use crate::catalog::LightCatalog;
use crate::config::QueryConfig;
use crate::spatial::{nearby_lights, FilterMode};
use crate::{ranker, LocationReport, QueryLocation, Result};
use rayon::prelude::*;
use tracing::{debug, info};

/// Runs location queries against a catalog with a validated configuration
#[derive(Debug, Clone, Copy)]
pub struct QueryPipeline<'a> {
    catalog: &'a LightCatalog,
    config: QueryConfig,
}

impl<'a> QueryPipeline<'a> {
    /// Validates `config` before any query can run
    pub fn new(catalog: &'a LightCatalog, config: QueryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { catalog, config })
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    pub fn catalog(&self) -> &'a LightCatalog {
        self.catalog
    }

    /// Ranked, pruned lights around one location
    pub fn query(&self, location: &QueryLocation) -> Result<LocationReport> {
        let neighbors = nearby_lights(
            self.catalog,
            location.easting,
            location.northing,
            self.config.radius_m,
            FilterMode::Accurate,
        );
        let contributions = ranker::rank(&neighbors, &self.config)?;

        debug!(
            "Location {}: {} lights within {} m, {} retained",
            location.id,
            neighbors.len(),
            self.config.radius_m,
            contributions.len()
        );

        Ok(LocationReport {
            location: location.clone(),
            candidates_considered: neighbors.len(),
            contributions,
        })
    }

    /// Number of lights inside the bounding square (no distances, no ranking)
    pub fn coverage(&self, location: &QueryLocation) -> usize {
        nearby_lights(
            self.catalog,
            location.easting,
            location.northing,
            self.config.radius_m,
            FilterMode::Quick,
        )
        .len()
    }

    /// Query every location in input order
    pub fn run(&self, locations: &[QueryLocation]) -> Result<Vec<LocationReport>> {
        info!(
            "Querying {} locations against {} lights (radius {} m)",
            locations.len(),
            self.catalog.len(),
            self.config.radius_m
        );
        locations.iter().map(|loc| self.query(loc)).collect()
    }

    /// Query every location on the rayon pool; output matches [`Self::run`]
    pub fn run_parallel(&self, locations: &[QueryLocation]) -> Result<Vec<LocationReport>> {
        info!(
            "Querying {} locations in parallel against {} lights (radius {} m)",
            locations.len(),
            self.catalog.len(),
            self.config.radius_m
        );
        locations.par_iter().map(|loc| self.query(loc)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExposureError, LampTypeTable, LightRecord};
    use proptest::prelude::*;

    fn catalog() -> LightCatalog {
        LightCatalog::build(
            vec![
                LightRecord::new("A", 1000.0, 1000.0, "SON", 100.0),
                LightRecord::new("B", 1005.0, 1000.0, "SOX", 50.0),
                LightRecord::new("C", 1120.0, 1120.0, "LED 4000K", 60.0),
                LightRecord::new("D", 5000.0, 5000.0, "MHL", 250.0),
            ],
            &LampTypeTable::msi_defaults(),
        )
    }

    #[test]
    fn test_invalid_config_fails_before_queries() {
        let catalog = catalog();
        let err = QueryPipeline::new(&catalog, QueryConfig::default().with_radius(0.0)).unwrap_err();
        assert!(matches!(err, ExposureError::InvalidRadius(_)));

        let err = QueryPipeline::new(&catalog, QueryConfig::default().with_threshold(1.0)).unwrap_err();
        assert!(matches!(err, ExposureError::InvalidThreshold(_)));
    }

    #[test]
    fn test_accessors_expose_validated_inputs() {
        let catalog = catalog();
        let config = QueryConfig::default().with_radius(75.0).with_threshold(0.1);
        let pipeline = QueryPipeline::new(&catalog, config).unwrap();

        assert_eq!(pipeline.config(), &config);
        assert!(std::ptr::eq(pipeline.catalog(), &catalog));
        assert_eq!(pipeline.catalog().len(), 4);
    }

    #[test]
    fn test_query_scenario() {
        let catalog = catalog();
        let pipeline = QueryPipeline::new(&catalog, QueryConfig::default().with_radius(50.0)).unwrap();

        let report = pipeline.query(&QueryLocation::new("house", 998.0, 1000.0)).unwrap();
        assert_eq!(report.candidates_considered, 2);
        assert_eq!(report.retained(), 2);
        assert_eq!(report.contributions[0].light.id(), "A");
        assert_eq!(report.contributions[0].cumulative_share, 1.0);
    }

    #[test]
    fn test_empty_neighbourhood() {
        let catalog = catalog();
        let pipeline = QueryPipeline::new(&catalog, QueryConfig::default()).unwrap();

        let report = pipeline.query(&QueryLocation::new("remote", -9000.0, -9000.0)).unwrap();
        assert!(report.is_empty());
        assert_eq!(report.candidates_considered, 0);
        assert_eq!(report.total_weighted(), 0.0);
    }

    #[test]
    fn test_run_keeps_location_order() {
        let catalog = catalog();
        let pipeline = QueryPipeline::new(&catalog, QueryConfig::default()).unwrap();
        let locations = vec![
            QueryLocation::new("far", 5010.0, 5000.0),
            QueryLocation::new("near", 1000.0, 1001.0),
            QueryLocation::new("none", 0.0, 0.0),
        ];

        let reports = pipeline.run(&locations).unwrap();
        let ids: Vec<&str> = reports.iter().map(|r| r.location.id.as_str()).collect();
        assert_eq!(ids, vec!["far", "near", "none"]);
        assert_eq!(reports[0].contributions[0].light.id(), "D");
        assert!(reports[2].is_empty());
    }

    #[test]
    fn test_coverage_uses_square() {
        let catalog = catalog();
        let pipeline = QueryPipeline::new(&catalog, QueryConfig::default()).unwrap();
        let loc = QueryLocation::new("corner", 1000.0, 1000.0);

        // C sits inside the 150 m square but ~170 m away
        assert_eq!(pipeline.coverage(&loc), 3);
        assert_eq!(pipeline.query(&loc).unwrap().candidates_considered, 2);
    }

    proptest! {
        #[test]
        fn prop_parallel_matches_sequential(
            points in prop::collection::vec((800.0f64..1300.0, 800.0f64..1300.0), 0..25)
        ) {
            let catalog = catalog();
            let pipeline = QueryPipeline::new(&catalog, QueryConfig::default()).unwrap();
            let locations: Vec<QueryLocation> = points
                .into_iter()
                .enumerate()
                .map(|(i, (e, n))| QueryLocation::new(format!("loc-{}", i), e, n))
                .collect();

            let sequential = pipeline.run(&locations).unwrap();
            let parallel = pipeline.run_parallel(&locations).unwrap();
            prop_assert_eq!(sequential, parallel);
        }
    }
}
