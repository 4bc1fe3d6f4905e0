use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::EngineError;
use crate::model::RecordKind;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub thresholds: Thresholds,
    /// Minimum name similarity for the fuzzy-name candidate tier.
    #[serde(default = "default_fuzzy_floor")]
    pub fuzzy_floor: f64,
    /// Statuses a record must carry to be eligible. Empty set = accept all.
    #[serde(default = "default_valid_statuses")]
    pub valid_statuses: Vec<String>,
    /// Marker strings in notes/description that exclude a record.
    #[serde(default = "default_exclusion_markers")]
    pub exclusion_markers: Vec<String>,
    /// Field holding the record status.
    #[serde(default = "default_status_field")]
    pub status_field: String,
    /// Fields scanned for exclusion markers.
    #[serde(default = "default_notes_fields")]
    pub notes_fields: Vec<String>,
    #[serde(default)]
    pub dry_run: bool,
    /// Matching rules per record kind. Tables are data, not control flow:
    /// a new kind needs only a new entry here.
    #[serde(default = "default_kind_rules")]
    pub kinds: BTreeMap<RecordKind, KindRules>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Thresholds {
    /// Scores at or above route to auto_update.
    pub high: f64,
    /// Scores at or above (but below high) route to manual_review.
    pub medium: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self { high: 0.8, medium: 0.6 }
    }
}

// ---------------------------------------------------------------------------
// Per-kind rules
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct KindRules {
    /// Field treated as the record's display/match name.
    #[serde(default = "default_name_field")]
    pub name_field: String,
    /// Strong-identifier fields probed by the identifier tier, in order.
    #[serde(default)]
    pub identifiers: Vec<String>,
    /// Field name -> (weight, comparator family).
    pub fields: BTreeMap<String, FieldRule>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FieldRule {
    pub weight: f64,
    pub comparator: Comparator,
}

/// Comparator family for one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    /// Exact equality on normalized values; absence is never similarity.
    Identifier,
    /// Continuous string similarity for free-text fields.
    Fuzzy,
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_fuzzy_floor() -> f64 {
    0.6
}

fn default_status_field() -> String {
    "status".into()
}

fn default_name_field() -> String {
    "name".into()
}

fn default_notes_fields() -> Vec<String> {
    vec!["notes".into(), "description".into()]
}

fn default_valid_statuses() -> Vec<String> {
    [
        "Active",
        "Active - Popup",
        "Credit Hold",
        "Product Only",
        "Presales",
        "Service Hold Phase 1",
        "Service Hold Phase 2",
        "Service Hold Phase 3",
        "Pre-Pay Only",
        "Staff Augmentation",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_exclusion_markers() -> Vec<String> {
    vec!["Do Not Migrate".into()]
}

fn rule(weight: f64, comparator: Comparator) -> FieldRule {
    FieldRule { weight, comparator }
}

fn default_kind_rules() -> BTreeMap<RecordKind, KindRules> {
    use Comparator::{Fuzzy, Identifier};

    let mut kinds = BTreeMap::new();

    kinds.insert(
        RecordKind::Organization,
        KindRules {
            name_field: "name".into(),
            identifiers: vec!["core_id".into()],
            fields: BTreeMap::from([
                ("core_id".into(), rule(0.5, Identifier)),
                ("name".into(), rule(0.3, Fuzzy)),
            ]),
        },
    );

    kinds.insert(
        RecordKind::Server,
        KindRules {
            name_field: "name".into(),
            identifiers: vec!["serial_number".into(), "mac_address".into(), "asset_tag".into()],
            fields: BTreeMap::from([
                ("serial_number".into(), rule(0.4, Identifier)),
                ("mac_address".into(), rule(0.3, Identifier)),
                ("asset_tag".into(), rule(0.3, Identifier)),
                ("hostname".into(), rule(0.2, Fuzzy)),
                ("name".into(), rule(0.1, Fuzzy)),
            ]),
        },
    );

    kinds.insert(
        RecordKind::VoiceGateway,
        KindRules {
            name_field: "name".into(),
            identifiers: vec!["serial_number".into(), "mac_address".into()],
            fields: BTreeMap::from([
                ("serial_number".into(), rule(0.4, Identifier)),
                ("mac_address".into(), rule(0.3, Identifier)),
                ("name".into(), rule(0.2, Fuzzy)),
                ("hostname".into(), rule(0.1, Fuzzy)),
            ]),
        },
    );

    kinds.insert(
        RecordKind::EmailService,
        KindRules {
            name_field: "name".into(),
            identifiers: vec!["domain".into()],
            fields: BTreeMap::from([
                ("domain".into(), rule(0.5, Identifier)),
                ("name".into(), rule(0.3, Fuzzy)),
            ]),
        },
    );

    kinds.insert(
        RecordKind::LobApplication,
        KindRules {
            name_field: "name".into(),
            identifiers: vec![],
            fields: BTreeMap::from([
                ("name".into(), rule(0.5, Fuzzy)),
                ("vendor".into(), rule(0.3, Fuzzy)),
            ]),
        },
    );

    kinds.insert(
        RecordKind::Site,
        KindRules {
            name_field: "name".into(),
            identifiers: vec!["core_id".into()],
            fields: BTreeMap::from([
                ("core_id".into(), rule(0.5, Identifier)),
                ("name".into(), rule(0.3, Fuzzy)),
            ]),
        },
    );

    kinds
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            fuzzy_floor: default_fuzzy_floor(),
            valid_statuses: default_valid_statuses(),
            exclusion_markers: default_exclusion_markers(),
            status_field: default_status_field(),
            notes_fields: default_notes_fields(),
            dry_run: false,
            kinds: default_kind_rules(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl EngineConfig {
    pub fn from_toml(input: &str) -> Result<Self, EngineError> {
        let config: EngineConfig =
            toml::from_str(input).map_err(|e| EngineError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Fatal on violation; runs before any record is processed.
    pub fn validate(&self) -> Result<(), EngineError> {
        let t = &self.thresholds;
        if !(0.0..=1.0).contains(&t.medium) || !(0.0..=1.0).contains(&t.high) || t.medium > t.high {
            return Err(EngineError::ConfigValidation(format!(
                "thresholds must satisfy 0 <= medium <= high <= 1, got medium={} high={}",
                t.medium, t.high
            )));
        }

        if !(0.0..=1.0).contains(&self.fuzzy_floor) {
            return Err(EngineError::ConfigValidation(format!(
                "fuzzy_floor must be in [0, 1], got {}",
                self.fuzzy_floor
            )));
        }

        if self.kinds.is_empty() {
            return Err(EngineError::ConfigValidation(
                "at least one record kind must be configured".into(),
            ));
        }

        for (kind, rules) in &self.kinds {
            if rules.fields.is_empty() {
                return Err(EngineError::ConfigValidation(format!(
                    "kind '{kind}': field table is empty"
                )));
            }

            for (field, rule) in &rules.fields {
                if !rule.weight.is_finite() || rule.weight < 0.0 {
                    return Err(EngineError::ConfigValidation(format!(
                        "kind '{kind}': field '{field}' has invalid weight {}",
                        rule.weight
                    )));
                }
            }

            if !rules.fields.contains_key(&rules.name_field) {
                return Err(EngineError::ConfigValidation(format!(
                    "kind '{kind}': name field '{}' has no field rule",
                    rules.name_field
                )));
            }

            for ident in &rules.identifiers {
                match rules.fields.get(ident) {
                    Some(rule) if rule.comparator == Comparator::Identifier => {}
                    Some(_) => {
                        return Err(EngineError::ConfigValidation(format!(
                            "kind '{kind}': identifier '{ident}' must use the identifier comparator"
                        )));
                    }
                    None => {
                        return Err(EngineError::ConfigValidation(format!(
                            "kind '{kind}': identifier '{ident}' has no field rule"
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    pub fn rules_for(&self, kind: RecordKind) -> Result<&KindRules, EngineError> {
        self.kinds
            .get(&kind)
            .ok_or_else(|| EngineError::UnknownKind(kind.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
fuzzy_floor = 0.65
valid_statuses = ["Active", "Credit Hold"]
exclusion_markers = ["Do Not Migrate"]

[thresholds]
high = 0.85
medium = 0.55

[kinds.server]
name_field = "name"
identifiers = ["serial_number"]

[kinds.server.fields.serial_number]
weight = 0.4
comparator = "identifier"

[kinds.server.fields.name]
weight = 0.1
comparator = "fuzzy"
"#;

    #[test]
    fn parse_valid() {
        let config = EngineConfig::from_toml(VALID).unwrap();
        assert_eq!(config.thresholds.high, 0.85);
        assert_eq!(config.thresholds.medium, 0.55);
        assert_eq!(config.fuzzy_floor, 0.65);
        assert_eq!(config.valid_statuses.len(), 2);
        let server = &config.kinds[&RecordKind::Server];
        assert_eq!(server.identifiers, vec!["serial_number"]);
        assert_eq!(server.fields["name"].comparator, Comparator::Fuzzy);
    }

    #[test]
    fn defaults_cover_all_kinds() {
        let config = EngineConfig::default();
        config.validate().unwrap();
        assert_eq!(config.kinds.len(), 6);
        assert_eq!(config.thresholds.high, 0.8);
        assert_eq!(config.thresholds.medium, 0.6);
        assert_eq!(config.fuzzy_floor, 0.6);
    }

    #[test]
    fn rules_for_rejects_unconfigured_kind() {
        let config = EngineConfig::from_toml(VALID).unwrap();
        assert!(config.rules_for(RecordKind::Server).is_ok());
        let err = config.rules_for(RecordKind::Site).unwrap_err();
        assert!(err.to_string().contains("site"));
    }

    #[test]
    fn reject_inverted_thresholds() {
        let input = VALID.replace("high = 0.85", "high = 0.3");
        let err = EngineConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("medium <= high"));
    }

    #[test]
    fn reject_threshold_out_of_range() {
        let input = VALID.replace("high = 0.85", "high = 1.5");
        assert!(EngineConfig::from_toml(&input).is_err());
    }

    #[test]
    fn reject_negative_weight() {
        let input = VALID.replace("weight = 0.4", "weight = -0.4");
        let err = EngineConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("invalid weight"));
    }

    #[test]
    fn reject_identifier_without_rule() {
        let input = VALID.replace("identifiers = [\"serial_number\"]", "identifiers = [\"mac_address\"]");
        let err = EngineConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("mac_address"));
    }

    #[test]
    fn reject_fuzzy_identifier() {
        let input = VALID.replace(
            "[kinds.server.fields.serial_number]\nweight = 0.4\ncomparator = \"identifier\"",
            "[kinds.server.fields.serial_number]\nweight = 0.4\ncomparator = \"fuzzy\"",
        );
        let err = EngineConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("identifier comparator"));
    }

    #[test]
    fn reject_unknown_comparator() {
        let input = VALID.replace("comparator = \"fuzzy\"", "comparator = \"fizzy\"");
        assert!(EngineConfig::from_toml(&input).is_err());
    }
}
