// src/types/bot_config.rs
//! The five-section configuration aggregate edited through the web form

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::schema::Section;

/// Configuration for the external bot, keyed by section name.
///
/// Sections are kept as raw JSON objects so that fields the form does not
/// know about survive a load/save cycle untouched. The field tables in
/// [`crate::core::schema`] define what the bot actually reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BotConfig(Map<String, Value>);

impl BotConfig {
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Section object, if present and actually an object
    pub fn section(&self, section: Section) -> Option<&Map<String, Value>> {
        self.0.get(section.key()).and_then(Value::as_object)
    }

    pub fn field(&self, section: Section, name: &str) -> Option<&Value> {
        self.section(section).and_then(|fields| fields.get(name))
    }

    pub fn set_field(&mut self, section: Section, name: &str, value: Value) {
        self.section_mut(section).insert(name.to_string(), value);
    }

    /// Apply a partial update.
    ///
    /// For each known section whose update value is an object, every key in
    /// that object overwrites the current value; keys absent from the update
    /// are left alone. Anything else in `update` is ignored.
    pub fn merge(&mut self, update: &Value) {
        let Some(update) = update.as_object() else {
            return;
        };

        for section in Section::ALL {
            if let Some(Value::Object(fields)) = update.get(section.key()) {
                let current = self.section_mut(section);
                for (name, value) in fields {
                    current.insert(name.clone(), value.clone());
                }
            }
        }
    }

    fn section_mut(&mut self, section: Section) -> &mut Map<String, Value> {
        let entry = self
            .0
            .entry(section.key().to_string())
            .or_insert_with(|| Value::Object(Map::new()));

        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }

        match entry {
            Value::Object(fields) => fields,
            _ => unreachable!("section entry was just normalized to an object"),
        }
    }
}

impl From<BotConfig> for Value {
    fn from(config: BotConfig) -> Self {
        Value::Object(config.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::default_config;
    use serde_json::json;

    #[test]
    fn test_merge_keeps_untouched_fields() {
        let mut config = default_config();
        config.set_field(Section::Search, "easy_apply_only", json!(true));

        config.merge(&json!({ "search": { "switch_number": 50 } }));

        assert_eq!(
            config.field(Section::Search, "easy_apply_only"),
            Some(&json!(true))
        );
        assert_eq!(
            config.field(Section::Search, "switch_number"),
            Some(&json!(50))
        );
        assert_eq!(
            config.field(Section::Search, "date_posted"),
            Some(&json!("Past week"))
        );
    }

    #[test]
    fn test_merge_creates_missing_section() {
        let mut config = BotConfig::default();
        config.merge(&json!({ "secrets": { "username": "me@example.com" } }));

        assert_eq!(
            config.field(Section::Secrets, "username"),
            Some(&json!("me@example.com"))
        );
        assert!(config.section(Section::Personals).is_none());
    }

    #[test]
    fn test_merge_ignores_unknown_and_non_object_sections() {
        let mut config = default_config();
        let before = config.clone();

        config.merge(&json!({
            "personals": "not an object",
            "extras": { "first_name": "Nope" },
        }));
        config.merge(&json!(["not", "an", "object"]));

        assert_eq!(config, before);
    }

    #[test]
    fn test_merge_replaces_corrupt_section() {
        let mut config = BotConfig::from_map(
            json!({ "settings": 42 }).as_object().cloned().unwrap_or_default(),
        );
        config.merge(&json!({ "settings": { "safe_mode": false } }));

        assert_eq!(config.as_map()["settings"], json!({ "safe_mode": false }));
    }

    #[test]
    fn test_unknown_fields_round_trip_through_serde() {
        let raw = json!({
            "personals": { "first_name": "Ada", "nickname": "Countess" },
            "theme": "dark",
        });
        let config: BotConfig = serde_json::from_value(raw.clone()).unwrap();

        assert_eq!(Value::from(config), raw);
    }
}
