// ⚙️ Pipeline Configuration - Static lookup tables as data
// Column aliases and the pass-type catalogue, optionally extended from JSON

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

// ============================================================================
// BUILT-IN TABLES
// ============================================================================

/// Source column name (lower-cased, trimmed) → canonical field
pub const DEFAULT_COLUMN_ALIASES: &[(&str, &str)] = &[
    ("id salida", "id_salida"),
    ("usuario", "usuario"),
    ("email de usuario", "usuario"),
    ("tipo_usuario", "tipo_usuario"),
    ("tipo de usuario", "tipo_usuario"),
    ("fecha", "fecha"),
    ("fecha de operación", "fecha"),
    ("fecha inicio", "fecha"),
    ("fecha término", "fecha"),
    ("unnamed: 11", "tipo_pase"),
    ("tipo de pase", "tipo_pase"),
    ("ruta", "ruta"),
    ("descripción de ruta", "ruta"),
    ("validado", "validado"),
];

/// Pass-type label as it appears on tickets → KPI title
pub const DEFAULT_PASS_TYPES: &[(&str, &str)] = &[
    ("Pase semestral", "Pases Semestrales"),
    ("Pase semanal", "Pases Semanales"),
    ("Pase redondo", "Pases Redondos"),
    ("Pase de verano", "Pases de Verano"),
    ("Pase mensual colaboradores", "Pases Mensual Colab."),
    ("Pases especiales", "Pases Especiales"),
];

// ============================================================================
// COLUMN MAP
// ============================================================================

/// ColumnMap - Immutable alias table used by the Field Normalizer
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMap {
    aliases: BTreeMap<String, String>,
}

impl ColumnMap {
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut map = ColumnMap {
            aliases: BTreeMap::new(),
        };
        for (source, canonical) in pairs {
            map.add_alias(source, canonical);
        }
        map
    }

    fn add_alias(&mut self, source: &str, canonical: &str) {
        self.aliases
            .insert(source.trim().to_lowercase(), canonical.trim().to_string());
    }

    /// Canonical name for an already lower-cased, trimmed column
    pub fn canonical(&self, normalized_column: &str) -> Option<&str> {
        self.aliases.get(normalized_column).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

impl Default for ColumnMap {
    fn default() -> Self {
        ColumnMap::from_pairs(DEFAULT_COLUMN_ALIASES.iter().copied())
    }
}

// ============================================================================
// PASS TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassType {
    /// Exact label found in the ticket's `tipo_pase`
    pub key: String,

    /// KPI title
    pub title: String,
}

pub fn default_pass_types() -> Vec<PassType> {
    DEFAULT_PASS_TYPES
        .iter()
        .map(|(key, title)| PassType {
            key: key.to_string(),
            title: title.to_string(),
        })
        .collect()
}

// ============================================================================
// PIPELINE CONFIG
// ============================================================================

/// On-disk shape. Both sections are optional.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    column_aliases: BTreeMap<String, String>,

    #[serde(default)]
    pass_types: Vec<PassType>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub column_map: ColumnMap,
    pub pass_types: Vec<PassType>,
}

impl PipelineConfig {
    /// Load overrides from a JSON file
    ///
    /// Extra aliases are merged over the built-in ones; a non-empty
    /// `pass_types` list replaces the built-in catalogue.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let file: ConfigFile =
            serde_json::from_str(content).context("Failed to parse pipeline config JSON")?;

        let mut config = PipelineConfig::default();
        for (source, canonical) in &file.column_aliases {
            config.column_map.add_alias(source, canonical);
        }
        if !file.pass_types.is_empty() {
            config.pass_types = file.pass_types;
        }

        Ok(config)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            column_map: ColumnMap::default(),
            pass_types: default_pass_types(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_column_map() {
        let map = ColumnMap::default();
        assert_eq!(map.canonical("id salida"), Some("id_salida"));
        assert_eq!(map.canonical("email de usuario"), Some("usuario"));
        assert_eq!(map.canonical("fecha término"), Some("fecha"));
        assert_eq!(map.canonical("unnamed: 11"), Some("tipo_pase"));
        assert_eq!(map.canonical("nope"), None);
    }

    #[test]
    fn test_default_pass_types_order() {
        let passes = default_pass_types();
        assert_eq!(passes.len(), 6);
        assert_eq!(passes[0].key, "Pase semestral");
        assert_eq!(passes[5].title, "Pases Especiales");
    }

    #[test]
    fn test_config_merges_aliases() {
        let config = PipelineConfig::from_json(
            r#"{"column_aliases": {"  Correo ": "usuario"}}"#,
        )
        .unwrap();

        assert_eq!(config.column_map.canonical("correo"), Some("usuario"));
        assert_eq!(config.column_map.canonical("id salida"), Some("id_salida"));
        assert_eq!(config.pass_types, default_pass_types());
    }

    #[test]
    fn test_config_replaces_pass_types() {
        let config = PipelineConfig::from_json(
            r#"{"pass_types": [{"key": "Pase anual", "title": "Pases Anuales"}]}"#,
        )
        .unwrap();

        assert_eq!(config.pass_types.len(), 1);
        assert_eq!(config.pass_types[0].title, "Pases Anuales");
    }

    #[test]
    fn test_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{}}").unwrap();

        let config = PipelineConfig::from_file(file.path()).unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_config_invalid_json() {
        assert!(PipelineConfig::from_json("not json").is_err());
    }
}
