use serde::Serialize;

use crate::types::survey::Individual;

/// Archetype-by-group matrix. Rows keep first-seen group order; columns follow
/// the vocabulary, with unknown labels appended. `percentages` rows sum to 100.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CrossTab {
    pub groups: Vec<String>,
    pub archetypes: Vec<String>,
    pub counts: Vec<Vec<u64>>,
    pub percentages: Vec<Vec<f64>>,
}

impl CrossTab {
    pub fn from_individuals(individuals: &[Individual], vocabulary: &[String]) -> Self {
        let mut tab = CrossTab {
            archetypes: vocabulary.to_vec(),
            ..Default::default()
        };

        for ind in individuals {
            let col = match tab.archetypes.iter().position(|a| *a == ind.archetype) {
                Some(col) => col,
                None => {
                    tab.archetypes.push(ind.archetype.clone());
                    for row in &mut tab.counts {
                        row.push(0);
                    }
                    tab.archetypes.len() - 1
                }
            };
            let row = match tab.groups.iter().position(|g| *g == ind.group) {
                Some(row) => row,
                None => {
                    tab.groups.push(ind.group.clone());
                    tab.counts.push(vec![0; tab.archetypes.len()]);
                    tab.groups.len() - 1
                }
            };
            tab.counts[row][col] += 1;
        }

        tab.percentages = tab
            .counts
            .iter()
            .map(|row| {
                let total: u64 = row.iter().sum();
                row.iter()
                    .map(|&c| if total == 0 { 0.0 } else { c as f64 * 100.0 / total as f64 })
                    .collect()
            })
            .collect();
        tab
    }

    pub fn row_total(&self, group: &str) -> u64 {
        self.groups
            .iter()
            .position(|g| g == group)
            .map_or(0, |row| self.counts[row].iter().sum())
    }

    pub fn percentage(&self, group: &str, archetype: &str) -> Option<f64> {
        let row = self.groups.iter().position(|g| g == group)?;
        let col = self.archetypes.iter().position(|a| a == archetype)?;
        Some(self.percentages[row][col])
    }

    /// Fixed-width text rendering for terminal output.
    pub fn render(&self) -> String {
        let group_width = self
            .groups
            .iter()
            .map(|g| g.chars().count())
            .chain(std::iter::once("Grupo".len()))
            .max()
            .unwrap_or(0);
        let widths: Vec<usize> = self.archetypes.iter().map(|a| a.chars().count().max(6)).collect();

        let mut out = format!("{:<w$}", "Grupo", w = group_width);
        for (a, w) in self.archetypes.iter().zip(&widths) {
            out.push_str(&format!(" | {:>w$}", a, w = *w));
        }
        out.push_str(&format!(" | {:>7}\n", "N"));

        for (row, group) in self.groups.iter().enumerate() {
            out.push_str(&format!("{:<w$}", group, w = group_width));
            for (pct, w) in self.percentages[row].iter().zip(&widths) {
                out.push_str(&format!(" | {:>w$}", format!("{:.1}%", pct), w = *w));
            }
            out.push_str(&format!(" | {:>7}\n", self.counts[row].iter().sum::<u64>()));
        }
        out
    }
}
