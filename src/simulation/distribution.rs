use rand::distributions::{Distribution as _, WeightedIndex};
use rand::Rng;
use serde::Serialize;

use crate::error::EngineError;

/// Categorical distribution over labels, kept in a fixed label order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Distribution {
    entries: Vec<(String, f64)>,
}

impl Distribution {
    /// Normalizes raw counts. Labels listed in `order` come first in that
    /// order; labels not in `order` follow in first-seen order. Zero-count
    /// labels are kept with probability 0.
    pub fn from_counts<'a, I>(counts: I, order: &[String]) -> Self
    where
        I: IntoIterator<Item = (&'a str, u64)>,
    {
        let mut tallies: Vec<(String, u64)> = order.iter().map(|l| (l.clone(), 0)).collect();
        for (label, n) in counts {
            match tallies.iter_mut().find(|(l, _)| l == label) {
                Some((_, c)) => *c += n,
                None => tallies.push((label.to_string(), n)),
            }
        }

        let total: u64 = tallies.iter().map(|(_, c)| c).sum();
        if total == 0 {
            return Self::default();
        }
        Self {
            entries: tallies
                .into_iter()
                .map(|(l, c)| (l, c as f64 / total as f64))
                .collect(),
        }
    }

    /// Tallies each label occurrence once.
    pub fn from_labels<'a, I>(labels: I, order: &[String]) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        Self::from_counts(labels.into_iter().map(|l| (l, 1)), order)
    }

    pub fn entries(&self) -> &[(String, f64)] {
        &self.entries
    }

    pub fn probability(&self, label: &str) -> f64 {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map_or(0.0, |(_, p)| *p)
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, p)| p).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|(_, p)| *p <= 0.0)
    }

    pub fn sampler(&self) -> Result<Sampler<'_>, EngineError> {
        let index = WeightedIndex::new(self.entries.iter().map(|(_, p)| *p))
            .map_err(|_| EngineError::EmptyDistribution)?;
        Ok(Sampler { dist: self, index })
    }
}

/// Draws labels with replacement, weighted by probability.
pub struct Sampler<'a> {
    dist: &'a Distribution,
    index: WeightedIndex<f64>,
}

impl<'a> Sampler<'a> {
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> &'a str {
        &self.dist.entries[self.index.sample(rng)].0
    }
}
