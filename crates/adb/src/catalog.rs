use std::collections::HashMap;

use tracing::warn;
use trajsim_config::{AdbTableConfig, SynonymConfig};

use crate::{AdbError, PerformanceTable};

/// Index of a table inside an [`AdbCatalog`]. Only the catalog hands these out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AdbIndex(usize);

impl AdbIndex {
    pub fn get(self) -> usize {
        self.0
    }
}

/// Immutable collection of performance tables keyed by aircraft type.
#[derive(Debug, Clone, Default)]
pub struct AdbCatalog {
    tables: Vec<PerformanceTable>,
    by_type: HashMap<String, usize>,
    synonyms: HashMap<String, usize>,
}

impl AdbCatalog {
    pub fn from_config(
        tables: &[AdbTableConfig],
        synonyms: &[SynonymConfig],
    ) -> Result<Self, AdbError> {
        let mut catalog = Self::default();
        for config in tables {
            let table = PerformanceTable::from_config(config)?;
            if catalog.by_type.contains_key(table.actype()) {
                warn!(actype = %table.actype(), "duplicate performance table ignored");
                continue;
            }
            catalog
                .by_type
                .insert(table.actype().to_string(), catalog.tables.len());
            catalog.tables.push(table);
        }
        for entry in synonyms {
            let target = entry.actype.trim().to_ascii_uppercase();
            match catalog.by_type.get(&target) {
                Some(&idx) => {
                    catalog
                        .synonyms
                        .insert(entry.synonym.trim().to_ascii_uppercase(), idx);
                }
                None => warn!(
                    synonym = %entry.synonym,
                    actype = %entry.actype,
                    "synonym points at a missing performance table"
                ),
            }
        }
        Ok(catalog)
    }

    /// Resolve an aircraft type, falling back to the synonym table.
    pub fn resolve(&self, actype: &str) -> Result<AdbIndex, AdbError> {
        let key = actype.trim().to_ascii_uppercase();
        self.by_type
            .get(&key)
            .or_else(|| self.synonyms.get(&key))
            .map(|&idx| AdbIndex(idx))
            .ok_or_else(|| AdbError::TypeNotFound(actype.to_string()))
    }

    /// Table behind a resolved index.
    ///
    /// # Panics
    /// Panics if `index` came from a different catalog and is out of range.
    pub fn table(&self, index: AdbIndex) -> &PerformanceTable {
        &self.tables[index.0]
    }

    /// Resolve and fetch in one step.
    pub fn lookup(&self, actype: &str) -> Result<&PerformanceTable, AdbError> {
        self.resolve(actype).map(|idx| self.table(idx))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::tests::sample_config;

    fn catalog() -> AdbCatalog {
        let synonyms = vec![
            SynonymConfig {
                synonym: "B737".into(),
                actype: "B733".into(),
            },
            SynonymConfig {
                synonym: "ZZZZ".into(),
                actype: "NOPE".into(),
            },
        ];
        AdbCatalog::from_config(&[sample_config()], &synonyms).expect("catalog")
    }

    #[test]
    fn resolves_direct_type_case_insensitively() {
        let c = catalog();
        assert_eq!(c.lookup("b733").expect("type").actype(), "B733");
    }

    #[test]
    fn resolves_through_synonyms() {
        let c = catalog();
        assert_eq!(c.resolve("B737").expect("synonym"), c.resolve("B733").expect("type"));
    }

    #[test]
    fn first_table_wins_on_duplicate_type() {
        let first = sample_config();
        let mut second = sample_config();
        second.rows[0].cruise_tas_knots += 50.0;
        let c = AdbCatalog::from_config(&[first.clone(), second], &[]).expect("catalog");
        assert_eq!(c.len(), 1);
        let tas = c.lookup("B733").expect("type").cruise_tas(first.rows[0].altitude_ft);
        assert_eq!(tas, Ok(first.rows[0].cruise_tas_knots));
    }

    #[test]
    fn unknown_type_is_reported() {
        let c = catalog();
        assert_eq!(c.resolve("ZZZZ"), Err(AdbError::TypeNotFound("ZZZZ".into())));
        assert_eq!(c.len(), 1);
    }
}
