use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::simulation::classifier::{ArchetypeRule, RuleTable, ScoreRule};

/// Column names as chosen by the user. Anything left out is inferred from the
/// headers.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ColumnsConfig {
    pub segment: Option<String>,
    pub score: Option<String>,
    pub text: Vec<String>,
    pub group: Option<String>,
    pub quantity: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ThresholdsConfig {
    pub high: f64,
    pub low: f64,
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self { high: 6.0, low: 4.0 }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LabelsConfig {
    pub promoter: String,
    pub detractor: String,
    pub neutral: String,
}

impl Default for LabelsConfig {
    fn default() -> Self {
        let score = ScoreRule::default();
        Self {
            promoter: score.promoter,
            detractor: score.detractor,
            neutral: score.neutral,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct RuleConfig {
    pub name: String,
    pub keywords: Vec<String>,
}

#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    /// One synthetic population per census group.
    #[default]
    Census,
    /// Top the real sample up to a total size.
    Augment,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
    pub seed: Option<u64>,
    pub mode: GenerationMode,
    pub total_universe: Option<u64>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub columns: ColumnsConfig,
    pub thresholds: ThresholdsConfig,
    pub labels: LabelsConfig,
    pub rules: Vec<RuleConfig>,
    pub generation: GenerationConfig,
}

fn rule(name: &str, keywords: &[&str]) -> RuleConfig {
    RuleConfig {
        name: name.to_string(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
    }
}

/// Sports-club vocabulary. Order is priority: infrastructure complaints win
/// over everything else.
pub fn default_rules() -> Vec<RuleConfig> {
    vec![
        rule(
            "Crítico de Infraestructura",
            &[
                "luz", "iluminación", "cancha", "baño", "vestuario", "infraestructura",
                "mantenimiento", "instalaciones", "sucio", "roto", "goteras",
            ],
        ),
        rule(
            "Competitivo / Logro",
            &[
                "competencia", "competir", "torneo", "campeonato", "ganar", "rendimiento",
                "nivel", "entrenador", "logro",
            ],
        ),
        rule(
            "Social / Pertenencia",
            &[
                "amigos", "familia", "ambiente", "comunidad", "social", "compañeros",
                "pertenencia", "grupo humano",
            ],
        ),
        rule(
            "Formativo / Desarrollo",
            &["aprender", "formación", "desarrollo", "enseñanza", "valores", "crecer", "escuela"],
        ),
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            columns: ColumnsConfig::default(),
            thresholds: ThresholdsConfig::default(),
            labels: LabelsConfig::default(),
            rules: default_rules(),
            generation: GenerationConfig::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.thresholds;
        if !(t.low.is_finite() && t.high.is_finite()) || t.low >= t.high {
            return Err(ConfigError::Invalid(format!(
                "thresholds.low ({}) must be below thresholds.high ({})",
                t.low, t.high
            )));
        }

        let mut seen = HashSet::new();
        for r in &self.rules {
            if r.name.trim().is_empty() {
                return Err(ConfigError::Invalid("rule with an empty name".to_string()));
            }
            if r.keywords.iter().all(|k| k.trim().is_empty()) {
                return Err(ConfigError::Invalid(format!(
                    "rule '{}' has no keywords",
                    r.name
                )));
            }
            if !seen.insert(r.name.trim().to_string()) {
                return Err(ConfigError::Invalid(format!("duplicate label '{}'", r.name)));
            }
        }
        for label in [&self.labels.promoter, &self.labels.detractor, &self.labels.neutral] {
            if label.trim().is_empty() {
                return Err(ConfigError::Invalid("score labels must not be empty".to_string()));
            }
            if !seen.insert(label.trim().to_string()) {
                return Err(ConfigError::Invalid(format!("duplicate label '{}'", label)));
            }
        }
        Ok(())
    }

    pub fn rule_table(&self) -> RuleTable {
        let rules = self
            .rules
            .iter()
            .map(|r| {
                let keywords: Vec<&str> = r.keywords.iter().map(String::as_str).collect();
                ArchetypeRule::new(&r.name, &keywords)
            })
            .collect();
        let score = ScoreRule {
            high: self.thresholds.high,
            low: self.thresholds.low,
            promoter: self.labels.promoter.trim().to_string(),
            detractor: self.labels.detractor.trim().to_string(),
            neutral: self.labels.neutral.trim().to_string(),
        };
        RuleTable::new(rules, score)
    }
}

pub fn parse_config(contents: &str, origin: &Path) -> Result<Config, ConfigError> {
    let config = toml::from_str::<Config>(contents).map_err(|source| ConfigError::Parse {
        path: origin.to_path_buf(),
        source,
    })?;
    config.validate()?;
    Ok(config)
}

pub fn load_config_from_file(file_path: &Path) -> Result<Config, ConfigError> {
    let contents = fs::read_to_string(file_path).map_err(|source| ConfigError::Read {
        path: file_path.to_path_buf(),
        source,
    })?;
    parse_config(&contents, file_path)
}
