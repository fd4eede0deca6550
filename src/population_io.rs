use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::error::ExportError;
use crate::simulation::report::CrossTab;
use crate::types::survey::{GenerationStats, Individual, SyntheticPopulation};

// This struct is what the reporting side reads.
#[derive(Serialize, Debug)]
pub struct PopulationSnapshot<'a> {
    pub individuals: &'a [Individual],
    pub stats: &'a GenerationStats,
    pub crosstab: &'a CrossTab,
}

/// Saves the flat population table and its archetype matrix as JSON.
pub fn save_population_snapshot(
    population: &SyntheticPopulation,
    crosstab: &CrossTab,
    file_path: &Path,
) -> Result<(), ExportError> {
    let snapshot = PopulationSnapshot {
        individuals: &population.individuals,
        stats: &population.stats,
        crosstab,
    };

    let file = File::create(file_path).map_err(|source| ExportError::Io {
        path: file_path.to_path_buf(),
        source,
    })?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, &snapshot).map_err(|source| ExportError::Serialize {
        path: file_path.to_path_buf(),
        source,
    })?;

    Ok(())
}
