use serde::{Deserialize, Serialize};

use crate::simulation::report::CrossTab;

/// One surveyed person as read from the sample table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Respondent {
    pub segment: String,
    pub score: Option<f64>,
    pub text_fields: Vec<String>,
}

impl Respondent {
    /// Lowercase concatenation of all text fields, single-space separated.
    /// Missing fields are carried as empty strings, so the separators stay.
    pub fn text_blob(&self) -> String {
        self.text_fields.join(" ").to_lowercase()
    }
}

/// A respondent after classification. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledRespondent {
    pub segment: String,
    pub score: Option<f64>,
    pub archetype: String,
}

/// A census row: how many people a group has.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupEntry {
    pub group: String,
    /// `None` when the source cell was blank, malformed or not positive.
    pub quantity: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provenance {
    Real,
    Synthetic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    pub group: String,
    pub archetype: String,
    pub provenance: Provenance,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerationStats {
    pub groups_seen: usize,
    pub groups_skipped: usize,
    pub groups_matched: usize,
    pub groups_fallback: usize,
    pub ambiguous_matches: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyntheticPopulation {
    pub individuals: Vec<Individual>,
    pub stats: GenerationStats,
}

impl SyntheticPopulation {
    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    pub fn count_for(&self, group: &str) -> usize {
        self.individuals.iter().filter(|i| i.group == group).count()
    }

    pub fn count_archetype(&self, group: &str, archetype: &str) -> usize {
        self.individuals
            .iter()
            .filter(|i| i.group == group && i.archetype == archetype)
            .count()
    }

    pub fn count_provenance(&self, provenance: Provenance) -> usize {
        self.individuals.iter().filter(|i| i.provenance == provenance).count()
    }

    pub fn crosstab(&self, vocabulary: &[String]) -> CrossTab {
        CrossTab::from_individuals(&self.individuals, vocabulary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_blob_joins_and_lowercases() {
        let r = Respondent {
            segment: "Tenis".into(),
            score: None,
            text_fields: vec!["Falta LUZ".into(), String::new(), "Buen Ambiente".into()],
        };
        assert_eq!(r.text_blob(), "falta luz  buen ambiente");
    }
}
