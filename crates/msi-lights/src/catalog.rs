//! Light catalog: raw records joined against the lamp type table

use crate::lamp_types::LampTypeTable;
use crate::{EnrichedLightRecord, LightRecord};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Immutable set of enriched light records.
///
/// Built once, then shared read-only by every query.
#[derive(Debug, Clone, Default)]
pub struct LightCatalog {
    records: Vec<EnrichedLightRecord>,
}

impl LightCatalog {
    /// Left-join `records` against `table` on the lamp type label.
    ///
    /// Every input record yields exactly one catalog record, in input order.
    /// Unmatched labels keep `enrichment: None`.
    pub fn build(records: Vec<LightRecord>, table: &LampTypeTable) -> Self {
        let records: Vec<EnrichedLightRecord> = records
            .into_iter()
            .map(|record| {
                let enrichment = table.lookup(&record.lamp_type).map(|e| e.enrichment());
                EnrichedLightRecord { record, enrichment }
            })
            .collect();

        let catalog = Self { records };
        let unresolved = catalog.unresolved_count();

        info!(
            "Built light catalog: {} records ({} resolved)",
            catalog.len(),
            catalog.len() - unresolved
        );
        if unresolved > 0 {
            let labels: Vec<String> = catalog
                .lamp_type_counts()
                .into_iter()
                .filter(|(label, _)| table.lookup(label).is_none())
                .map(|(label, count)| format!("{:?}x{}", label, count))
                .collect();
            warn!(
                "{} records have unrecognised lamp types and will not be ranked: {}",
                unresolved,
                labels.join(", ")
            );
        }

        catalog
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[EnrichedLightRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EnrichedLightRecord> {
        self.records.iter()
    }

    /// Records whose lamp type was not found in the table
    pub fn unresolved_count(&self) -> usize {
        self.records.iter().filter(|r| r.enrichment.is_none()).count()
    }

    /// Record count per lamp type label
    pub fn lamp_type_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for r in &self.records {
            *counts.entry(r.record.lamp_type.clone()).or_insert(0) += 1;
        }
        counts
    }
}

impl<'a> IntoIterator for &'a LightCatalog {
    type Item = &'a EnrichedLightRecord;
    type IntoIter = std::slice::Iter<'a, EnrichedLightRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
