//! Config-driven field mapper.
//!
//! Translates source field names to the target schema immediately before a
//! write. A kind with no map passes fields through unchanged; a kind with a
//! map keeps only the renamed fields, then overlays its constants.

use std::collections::BTreeMap;

use crosswalk_engine::apply::FieldMapper;
use crosswalk_engine::model::RecordKind;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MapperConfig {
    #[serde(default)]
    pub kinds: BTreeMap<RecordKind, FieldMap>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldMap {
    /// source field name -> target field name. Fields not listed are dropped.
    #[serde(default)]
    pub rename: BTreeMap<String, String>,
    /// Fixed values stamped on every mapped payload (audit fields, class
    /// names). Overrides a renamed field of the same name.
    #[serde(default)]
    pub constants: BTreeMap<String, String>,
}

impl FieldMapper for MapperConfig {
    fn map_fields(
        &self,
        kind: RecordKind,
        fields: &BTreeMap<String, String>,
    ) -> BTreeMap<String, String> {
        let map = match self.kinds.get(&kind) {
            Some(map) => map,
            None => return fields.clone(),
        };

        let mut out = BTreeMap::new();
        for (source_field, target_field) in &map.rename {
            if let Some(value) = fields.get(source_field) {
                out.insert(target_field.clone(), value.clone());
            }
        }
        for (field, value) in &map.constants {
            out.insert(field.clone(), value.clone());
        }
        out
    }
}
