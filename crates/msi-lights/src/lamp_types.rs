//! Lamp type reference table
//!
//! Maps a lamp technology label to its melatonin suppression index (MSI) and
//! luminous efficiency. The built-in values follow the MSI estimates in
//! <https://www.ncbi.nlm.nih.gov/pmc/articles/PMC3702543/>.
//!
//! | Label       | MSI   | lm/W  |
//! |-------------|-------|-------|
//! | SOX         | 0.017 | 170.0 |
//! | SON         | 0.118 | 120.0 |
//! | Fluorescent | 0.435 |  90.0 |
//! | MHL         | 0.624 | 120.0 |
//! | LED 4000K   | 0.452 |  75.0 |
//! | Tungsten    | 0.255 |  15.0 |
//! | Halogen     | 0.377 |  24.0 |
//! | Mercury     | 0.435 |  10.5 |
//! | CFL         | 0.435 |  60.0 |

use crate::{ExposureError, LampEnrichment, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

/// A lamp technology and its photometric weighting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LampTypeEntry {
    pub label: String,
    /// Melatonin suppression weight, (0, 1]
    pub suppression_weight: f64,
    /// Luminous efficiency, > 0
    pub lumens_per_watt: f64,
}

impl LampTypeEntry {
    pub fn new(label: impl Into<String>, suppression_weight: f64, lumens_per_watt: f64) -> Self {
        Self {
            label: label.into(),
            suppression_weight,
            lumens_per_watt,
        }
    }

    pub fn enrichment(&self) -> LampEnrichment {
        LampEnrichment {
            suppression_weight: self.suppression_weight,
            lumens_per_watt: self.lumens_per_watt,
        }
    }

    fn validate(&self) -> Result<()> {
        let invalid = |reason: String| ExposureError::InvalidLampType {
            label: self.label.clone(),
            reason,
        };

        if self.label.trim().is_empty() {
            return Err(invalid("label is empty".to_string()));
        }
        if !(self.suppression_weight > 0.0 && self.suppression_weight <= 1.0) {
            return Err(invalid(format!(
                "suppression weight {} outside (0, 1]",
                self.suppression_weight
            )));
        }
        if !(self.lumens_per_watt > 0.0 && self.lumens_per_watt.is_finite()) {
            return Err(invalid(format!(
                "lumens per watt {} must be positive",
                self.lumens_per_watt
            )));
        }
        Ok(())
    }
}

/// Lamp type lookup by exact label
#[derive(Debug, Clone, Default)]
pub struct LampTypeTable {
    entries: HashMap<String, LampTypeEntry>,
}

impl LampTypeTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Create the built-in MSI table
    pub fn msi_defaults() -> Self {
        let mut table = Self::new();
        table.add_builtin("SOX", 0.017, 170.0);
        table.add_builtin("SON", 0.118, 120.0);
        table.add_builtin("Fluorescent", 0.435, 90.0);
        table.add_builtin("MHL", 0.624, 120.0);
        table.add_builtin("LED 4000K", 0.452, 75.0);
        table.add_builtin("Tungsten", 0.255, 15.0);
        table.add_builtin("Halogen", 0.377, 24.0);
        table.add_builtin("Mercury", 0.435, 10.5);
        table.add_builtin("CFL", 0.435, 60.0);
        table
    }

    fn add_builtin(&mut self, label: &str, msi: f64, lumens_per_watt: f64) {
        self.entries.insert(
            label.to_string(),
            LampTypeEntry::new(label, msi, lumens_per_watt),
        );
    }

    /// Insert or replace an entry after range validation
    pub fn insert(&mut self, entry: LampTypeEntry) -> Result<()> {
        entry.validate()?;
        self.entries.insert(entry.label.clone(), entry);
        Ok(())
    }

    /// Look up a lamp type. Unknown labels are not an error.
    pub fn lookup(&self, label: &str) -> Option<&LampTypeEntry> {
        self.entries.get(label)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Labels in sorted order
    pub fn labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        labels.sort_unstable();
        labels
    }

    /// Load a table from a JSON array of entries, replacing the built-in one
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut table = Self::new();
        table.extend_from_json_file(path)?;
        Ok(table)
    }

    /// Add or override entries from a JSON array of entries
    pub fn extend_from_json_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        info!("Loading lamp types from {:?}", path);

        let reader = BufReader::new(File::open(path)?);
        let entries: Vec<LampTypeEntry> = serde_json::from_reader(reader)?;
        let count = entries.len();
        for entry in entries {
            self.insert(entry)?;
        }

        info!("Loaded {} lamp types ({} in table)", count, self.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let table = LampTypeTable::msi_defaults();
        assert_eq!(table.len(), 9);

        let son = table.lookup("SON").unwrap();
        assert!((son.suppression_weight - 0.118).abs() < 1e-12);
        assert_eq!(son.lumens_per_watt, 120.0);

        let led = table.lookup("LED 4000K").unwrap();
        assert_eq!(led.suppression_weight, 0.452);
    }

    #[test]
    fn test_unknown_label_not_found() {
        let table = LampTypeTable::msi_defaults();
        assert!(table.lookup("Unknown").is_none());
        // Labels are matched exactly
        assert!(table.lookup("son").is_none());
    }

    #[test]
    fn test_insert_validates_ranges() {
        let mut table = LampTypeTable::new();
        assert!(table.insert(LampTypeEntry::new("LED 3000K", 0.35, 90.0)).is_ok());
        assert!(table.insert(LampTypeEntry::new("Zero", 0.0, 90.0)).is_err());
        assert!(table.insert(LampTypeEntry::new("TooHigh", 1.2, 90.0)).is_err());
        assert!(table.insert(LampTypeEntry::new("Dark", 0.5, 0.0)).is_err());
        assert!(table.insert(LampTypeEntry::new(" ", 0.5, 10.0)).is_err());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_extend_from_json() {
        let json = r#"[
            {"label": "LED 3000K", "suppression_weight": 0.35, "lumens_per_watt": 95.0},
            {"label": "SON", "suppression_weight": 0.12, "lumens_per_watt": 110.0}
        ]"#;
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let mut table = LampTypeTable::msi_defaults();
        table.extend_from_json_file(file.path()).unwrap();

        assert_eq!(table.len(), 10);
        assert_eq!(table.lookup("SON").unwrap().lumens_per_watt, 110.0);
        assert!(table.lookup("LED 3000K").is_some());

        let replaced = LampTypeTable::from_json_file(file.path()).unwrap();
        assert_eq!(replaced.labels(), vec!["LED 3000K", "SON"]);
    }

    #[test]
    fn test_json_with_invalid_entry_rejected() {
        let json = r#"[{"label": "Bad", "suppression_weight": 2.0, "lumens_per_watt": 95.0}]"#;
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let err = LampTypeTable::from_json_file(file.path()).unwrap_err();
        assert!(matches!(err, ExposureError::InvalidLampType { .. }));
    }
}
