//! Contest configuration loaded from YAML.
//!
//! Nothing here is global: the binary loads one `ContestConfig` and passes the
//! values each stage needs down as arguments.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Parameter names used by the contest template on talk pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldNames {
    /// Exact name of the participant parameter
    pub participant: String,
    /// Prefix shared by `tēma`, `tēma2`, `tēma3`, ...
    pub topic_prefix: String,
    /// Prefix shared by `valsts`, `valsts2`, ...
    pub country_prefix: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        FieldNames {
            participant: "dalībnieks".to_string(),
            topic_prefix: "tēma".to_string(),
            country_prefix: "valsts".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContestConfig {
    pub year: String,
    /// Derived from `year` when unset
    pub template_name: Option<String>,
    pub structure_page_prefix: Option<String>,
    pub category_prefix: Option<String>,
    /// Module names accepted in `{{#invoke:<name>|table...}}` blocks
    pub table_macros: Vec<String>,
    pub fields: FieldNames,
    pub allowed_countries: Vec<String>,
    pub min_readable_length: usize,
    pub women_topic: String,
    pub human_rights_topic: String,
}

impl Default for ContestConfig {
    fn default() -> Self {
        ContestConfig {
            year: "2025".to_string(),
            template_name: None,
            structure_page_prefix: None,
            category_prefix: None,
            table_macros: vec!["WikimediaCEETable".to_string(), "UCDMtable".to_string()],
            fields: FieldNames::default(),
            allowed_countries: Vec::new(),
            min_readable_length: 1500,
            women_topic: "Sievietes".to_string(),
            human_rights_topic: "Cilvēktiesības".to_string(),
        }
    }
}

impl ContestConfig {
    /// Name of the talk-page template, e.g. `CEE Spring 2025`
    pub fn template_name(&self) -> String {
        self.template_name
            .clone()
            .unwrap_or_else(|| format!("CEE Spring {}", self.year))
    }

    /// Meta-Wiki prefix of the structure pages, e.g. `Wikimedia CEE Spring 2025/Structure/`
    pub fn structure_page_prefix(&self) -> String {
        self.structure_page_prefix
            .clone()
            .unwrap_or_else(|| format!("Wikimedia CEE Spring {}/Structure/", self.year))
    }

    pub fn category_prefix(&self) -> String {
        self.category_prefix
            .clone()
            .unwrap_or_else(|| format!("CEE Spring {} raksti", self.year))
    }

    pub fn from_yaml_str(contents: &str, path: &Path) -> Result<Self> {
        serde_yaml::from_str(contents).map_err(|source| Error::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| Error::Config(format!("Failed to open config file {:?}: {}", path, e)))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_yaml_str(&contents, path)
    }

    /// Load the explicit path if given, otherwise the first default candidate
    /// that exists, otherwise fall back to built-in defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => match find_config_file() {
                Some(path) => {
                    tracing::debug!(path = %path.display(), "using default config file");
                    Self::load(&path)
                }
                None => {
                    tracing::info!("no config/contest.yaml found, using built-in defaults");
                    Ok(Self::default())
                }
            },
        }
    }
}

fn find_config_file() -> Option<PathBuf> {
    let candidates = [
        PathBuf::from("config/contest.yaml"),
        PathBuf::from("../config/contest.yaml"),
    ];
    candidates.into_iter().find(|p| p.exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_derive_from_year() {
        let config = ContestConfig::default();
        assert_eq!(config.template_name(), "CEE Spring 2025");
        assert_eq!(
            config.structure_page_prefix(),
            "Wikimedia CEE Spring 2025/Structure/"
        );
        assert_eq!(config.category_prefix(), "CEE Spring 2025 raksti");
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let yaml = "year: \"2026\"\nallowed_countries:\n  - Latvija\n  - Igaunija\n";
        let config = ContestConfig::from_yaml_str(yaml, Path::new("inline.yaml")).unwrap();
        assert_eq!(config.template_name(), "CEE Spring 2026");
        assert_eq!(config.allowed_countries, vec!["Latvija", "Igaunija"]);
        assert_eq!(config.fields.participant, "dalībnieks");
        assert_eq!(config.min_readable_length, 1500);
        assert_eq!(config.table_macros.len(), 2);
    }

    #[test]
    fn explicit_template_name_overrides_year() {
        let yaml = "year: \"2026\"\ntemplate_name: Pavasaris\n";
        let config = ContestConfig::from_yaml_str(yaml, Path::new("inline.yaml")).unwrap();
        assert_eq!(config.template_name(), "Pavasaris");
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let result = ContestConfig::from_yaml_str("year: [unclosed", Path::new("bad.yaml"));
        assert!(matches!(result, Err(Error::Yaml { .. })));
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let result = ContestConfig::load(Path::new("/nonexistent/contest.yaml"));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
