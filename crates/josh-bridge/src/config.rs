//! Configuration lookup (`spec.md` §6: the `.jshc` config file and the
//! `config name.path` handler expression).

use std::collections::HashMap;

/// A single configuration value, parsed from `.jshc` text.
///
/// `spec.md` §6 scopes the config grammar itself out ("parsing the full
/// config DSL is out of scope"); what survives is the lookup contract a
/// compiled handler's `config` op relies on, so this carries only the
/// three primitive shapes a `.jshc` line can name.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigValue {
    /// A bare text value.
    String(String),
    /// A numeric value.
    Number(f64),
    /// A boolean value (`true`/`false`, case-insensitive).
    Boolean(bool),
}

/// Where an engine bridge looks up named configuration values.
///
/// Kept as a trait, not a concrete type, so an embedder can back
/// configuration with a file, an environment, or a test fixture without
/// the bridge caring which.
pub trait ConfigSource: Send + Sync {
    /// Look up `name`, returning `None` if it is not declared.
    fn get(&self, name: &str) -> Option<ConfigValue>;
}

/// A [`ConfigSource`] backed by an in-memory name -> value map.
///
/// Mirrors `murk-engine`'s own map-backed configuration fixture: the
/// production embedder populates one of these from a parsed `.jshc`
/// file, and tests build one directly from literals.
#[derive(Clone, Debug, Default)]
pub struct MapConfigSource {
    values: HashMap<String, ConfigValue>,
}

impl MapConfigSource {
    /// An empty config source; every lookup misses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a value, overwriting any prior value under the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: ConfigValue) {
        self.values.insert(name.into(), value);
    }

    /// Parse a minimal `.jshc` text body into a populated source.
    ///
    /// One `name = value` declaration per line. Blank lines and lines
    /// starting with `#` are ignored. A value is parsed as `Boolean` if
    /// it is exactly `true`/`false` (case-insensitive), `Number` if it
    /// parses as `f64`, and `String` otherwise (quotes, if present, are
    /// stripped). This is the subset of `.jshc` syntax the bridge's
    /// config lookup actually needs; the full config grammar is out of
    /// scope here (`spec.md` §6).
    pub fn from_jshc(text: &str) -> Self {
        let mut values = HashMap::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((name, raw)) = line.split_once('=') else {
                continue;
            };
            let name = name.trim().to_string();
            let raw = raw.trim();
            let value = if raw.eq_ignore_ascii_case("true") {
                ConfigValue::Boolean(true)
            } else if raw.eq_ignore_ascii_case("false") {
                ConfigValue::Boolean(false)
            } else if let Ok(n) = raw.parse::<f64>() {
                ConfigValue::Number(n)
            } else {
                ConfigValue::String(raw.trim_matches('"').to_string())
            };
            values.insert(name, value);
        }
        Self { values }
    }
}

impl ConfigSource for MapConfigSource {
    fn get(&self, name: &str) -> Option<ConfigValue> {
        self.values.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_source_returns_inserted_values() {
        let mut source = MapConfigSource::new();
        source.insert("worker.count", ConfigValue::Number(4.0));
        assert_eq!(source.get("worker.count"), Some(ConfigValue::Number(4.0)));
        assert_eq!(source.get("missing"), None);
    }

    #[test]
    fn jshc_parses_typed_lines_and_skips_comments() {
        let text = "\
            # a comment\n\
            name = Plot A\n\
            retention = 2\n\
            earthSpace = true\n\
            \n\
        ";
        let source = MapConfigSource::from_jshc(text);
        assert_eq!(source.get("name"), Some(ConfigValue::String("Plot A".to_string())));
        assert_eq!(source.get("retention"), Some(ConfigValue::Number(2.0)));
        assert_eq!(source.get("earthSpace"), Some(ConfigValue::Boolean(true)));
    }
}
