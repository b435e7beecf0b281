//! Named, schema-aware policies that rewrite a table config's indexing.
//!
//! A table config lists tuner directives by name; each name is resolved
//! against a [`TunerRegistry`] at derivation time. Resolution failure is the
//! only way derivation can fail.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::schema::SchemaDoc;
use crate::table::TableConfigDoc;

/// Name of the built-in automatic index selection tuner.
pub const AUTO_INDEX_TUNER: &str = "realtimeAutoIndexTuner";

/// A tuning policy.
///
/// Implementations must be deterministic and must only rewrite the table
/// config they are handed. Any closure with the matching signature is a
/// tuner.
pub trait TableTuner: Send + Sync {
    fn apply(
        &self,
        schema: &SchemaDoc,
        table: &mut TableConfigDoc,
        properties: &BTreeMap<String, String>,
    );
}

impl<F> TableTuner for F
where
    F: Fn(&SchemaDoc, &mut TableConfigDoc, &BTreeMap<String, String>) + Send + Sync,
{
    fn apply(
        &self,
        schema: &SchemaDoc,
        table: &mut TableConfigDoc,
        properties: &BTreeMap<String, String>,
    ) {
        self(schema, table, properties)
    }
}

/// Automatic index selection: every schema dimension gets an inverted
/// index and every metric is stored without a dictionary.
///
/// Existing list order is kept, new columns are appended in schema order,
/// and a column already claimed by the opposite list is left alone so the
/// result never holds an inverted/no-dictionary conflict.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoIndexTuner;

impl TableTuner for AutoIndexTuner {
    fn apply(
        &self,
        schema: &SchemaDoc,
        table: &mut TableConfigDoc,
        _properties: &BTreeMap<String, String>,
    ) {
        let indexing = &mut table.table_index_config;
        for dimension in schema.dimension_names() {
            if !indexing.no_dictionary_columns.iter().any(|c| c == dimension) {
                push_unique(&mut indexing.inverted_index_columns, dimension);
            }
        }
        for metric in schema.metric_names() {
            if !indexing.inverted_index_columns.iter().any(|c| c == metric) {
                push_unique(&mut indexing.no_dictionary_columns, metric);
            }
        }
    }
}

fn push_unique(columns: &mut Vec<String>, column: &str) {
    if !columns.iter().any(|c| c == column) {
        columns.push(column.to_string());
    }
}

/// Tuner name to policy.
///
/// Registries are built explicitly and handed to the controller; there is
/// no process-wide default instance.
#[derive(Clone, Default)]
pub struct TunerRegistry {
    tuners: BTreeMap<String, Arc<dyn TableTuner>>,
}

impl TunerRegistry {
    /// A registry with no tuners. Every directive will be unknown.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry holding the built-in tuners.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(AUTO_INDEX_TUNER, AutoIndexTuner);
        registry
    }

    /// Register `tuner` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, tuner: impl TableTuner + 'static) {
        self.tuners.insert(name.into(), Arc::new(tuner));
    }

    pub fn get(&self, name: &str) -> Option<&dyn TableTuner> {
        self.tuners.get(name).map(|t| t.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tuners.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tuners.keys().map(String::as_str)
    }
}

impl fmt::Debug for TunerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TunerRegistry")
            .field("tuners", &self.tuners.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DataType;
    use crate::table::TableType;

    fn schema() -> SchemaDoc {
        SchemaDoc::new("events")
            .with_dimension("d1", DataType::String)
            .with_dimension("d2", DataType::Int)
            .with_metric("m1", DataType::Double)
            .with_date_time("ts", DataType::Long, "1:MILLISECONDS:EPOCH", "1:MILLISECONDS")
    }

    #[test]
    fn auto_index_adds_dimensions_and_metrics() {
        let mut table = TableConfigDoc::new("events", TableType::Offline);
        table.table_index_config.inverted_index_columns = vec!["d2".into()];

        AutoIndexTuner.apply(&schema(), &mut table, &BTreeMap::new());

        assert_eq!(
            table.table_index_config.inverted_index_columns,
            vec!["d2".to_string(), "d1".to_string()]
        );
        assert_eq!(table.table_index_config.no_dictionary_columns, vec!["m1".to_string()]);
    }

    #[test]
    fn auto_index_respects_opposite_list() {
        let mut table = TableConfigDoc::new("events", TableType::Offline);
        table.table_index_config.no_dictionary_columns = vec!["d1".into()];

        AutoIndexTuner.apply(&schema(), &mut table, &BTreeMap::new());

        assert_eq!(table.table_index_config.inverted_index_columns, vec!["d2".to_string()]);
        assert_eq!(
            table.table_index_config.no_dictionary_columns,
            vec!["d1".to_string(), "m1".to_string()]
        );
    }

    #[test]
    fn auto_index_is_idempotent() {
        let mut table = TableConfigDoc::new("events", TableType::Realtime);
        AutoIndexTuner.apply(&schema(), &mut table, &BTreeMap::new());
        let once = table.clone();
        AutoIndexTuner.apply(&schema(), &mut table, &BTreeMap::new());
        assert_eq!(table.table_index_config.inverted_index_columns, once.table_index_config.inverted_index_columns);
        assert_eq!(table.table_index_config.no_dictionary_columns, once.table_index_config.no_dictionary_columns);
    }

    #[test]
    fn registry_lookup_and_custom_tuners() {
        let mut registry = TunerRegistry::with_defaults();
        assert!(registry.contains(AUTO_INDEX_TUNER));
        assert!(registry.get("nope").is_none());

        registry.register(
            "sortByFirstDimension",
            |schema: &SchemaDoc, table: &mut TableConfigDoc, _: &BTreeMap<String, String>| {
                if let Some(first) = schema.dimension_names().next() {
                    table.table_index_config.sorted_column = vec![first.to_string()];
                }
            },
        );
        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            vec![AUTO_INDEX_TUNER, "sortByFirstDimension"]
        );

        let mut table = TableConfigDoc::new("events", TableType::Offline);
        registry
            .get("sortByFirstDimension")
            .unwrap()
            .apply(&schema(), &mut table, &BTreeMap::new());
        assert_eq!(table.table_index_config.sorted_column, vec!["d1".to_string()]);

        assert_eq!(TunerRegistry::empty().names().count(), 0);
    }
}
