//! Tracking of JSON keys that decoding did not map onto a declared field.
//!
//! Every modelled object carries a flattened catch-all map. After decoding,
//! [`TableConfigs::take_unrecognized`](crate::TableConfigs::take_unrecognized)
//! drains those maps into one [`UnrecognizedProperties`] keyed by absolute
//! JSON pointer from the envelope root. Objects are descended by key and
//! arrays by index, so a stray key in the first metric spec reports as
//! `/schema/metricFieldSpecs/0/<key>`. Free-form string maps
//! (`streamConfigs`, `tunerProperties`) accept any key and never report.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::composite::TableConfigs;
use crate::schema::{DateTimeFieldSpec, FieldSpec, SchemaDoc};
use crate::table::{
    IndexingConfig, QuotaConfig, SegmentsConfig, TableConfigDoc, TenantConfig, TunerConfig,
};

/// JSON pointer → raw value of every key that decoding did not recognize.
///
/// An empty set means the document was fully recognized. This is a
/// diagnostic returned to the caller, never an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnrecognizedProperties(BTreeMap<String, Value>);

impl UnrecognizedProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, pointer: &str) -> Option<&Value> {
        self.0.get(pointer)
    }

    pub fn contains(&self, pointer: &str) -> bool {
        self.0.contains_key(pointer)
    }

    pub fn pointers(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.0
    }

    fn absorb(&mut self, parent: &str, extra: &mut BTreeMap<String, Value>) {
        for (key, value) in std::mem::take(extra) {
            self.0.insert(child_pointer(parent, &key), value);
        }
    }
}

impl FromIterator<(String, Value)> for UnrecognizedProperties {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Append one reference token to a JSON pointer, escaping per RFC 6901.
pub(crate) fn child_pointer(parent: &str, token: &str) -> String {
    let escaped = token.replace('~', "~0").replace('/', "~1");
    format!("{parent}/{escaped}")
}

/// Something that may hold unrecognized keys, directly or in children.
pub(crate) trait TrackUnrecognized {
    /// Move every unrecognized key under `path` into `out`, leaving `self`
    /// fully recognized.
    fn drain_unrecognized(&mut self, path: &str, out: &mut UnrecognizedProperties);
}

impl<T: TrackUnrecognized> TrackUnrecognized for Option<T> {
    fn drain_unrecognized(&mut self, path: &str, out: &mut UnrecognizedProperties) {
        if let Some(inner) = self {
            inner.drain_unrecognized(path, out);
        }
    }
}

impl<T: TrackUnrecognized> TrackUnrecognized for Vec<T> {
    fn drain_unrecognized(&mut self, path: &str, out: &mut UnrecognizedProperties) {
        for (i, item) in self.iter_mut().enumerate() {
            item.drain_unrecognized(&child_pointer(path, &i.to_string()), out);
        }
    }
}

impl TrackUnrecognized for TableConfigs {
    fn drain_unrecognized(&mut self, path: &str, out: &mut UnrecognizedProperties) {
        out.absorb(path, &mut self.unrecognized);
        self.schema
            .drain_unrecognized(&child_pointer(path, "schema"), out);
        self.offline
            .drain_unrecognized(&child_pointer(path, "offline"), out);
        self.realtime
            .drain_unrecognized(&child_pointer(path, "realtime"), out);
    }
}

impl TrackUnrecognized for SchemaDoc {
    fn drain_unrecognized(&mut self, path: &str, out: &mut UnrecognizedProperties) {
        out.absorb(path, &mut self.unrecognized);
        self.dimension_field_specs
            .drain_unrecognized(&child_pointer(path, "dimensionFieldSpecs"), out);
        self.metric_field_specs
            .drain_unrecognized(&child_pointer(path, "metricFieldSpecs"), out);
        self.date_time_field_specs
            .drain_unrecognized(&child_pointer(path, "dateTimeFieldSpecs"), out);
    }
}

impl TrackUnrecognized for TableConfigDoc {
    fn drain_unrecognized(&mut self, path: &str, out: &mut UnrecognizedProperties) {
        out.absorb(path, &mut self.unrecognized);
        self.segments_config
            .drain_unrecognized(&child_pointer(path, "segmentsConfig"), out);
        self.table_index_config
            .drain_unrecognized(&child_pointer(path, "tableIndexConfig"), out);
        self.quota
            .drain_unrecognized(&child_pointer(path, "quota"), out);
        self.tenants
            .drain_unrecognized(&child_pointer(path, "tenants"), out);
        self.tuner_configs
            .drain_unrecognized(&child_pointer(path, "tunerConfigs"), out);
    }
}

macro_rules! leaf_tracker {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl TrackUnrecognized for $ty {
                fn drain_unrecognized(&mut self, path: &str, out: &mut UnrecognizedProperties) {
                    out.absorb(path, &mut self.unrecognized);
                }
            }
        )+
    };
}

leaf_tracker!(
    FieldSpec,
    DateTimeFieldSpec,
    SegmentsConfig,
    IndexingConfig,
    QuotaConfig,
    TenantConfig,
    TunerConfig,
);
