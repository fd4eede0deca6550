// Survey sample -> archetype labels -> per-segment tables -> synthetic population.
pub mod config;
pub mod error;
pub mod types {
    pub mod survey;
}
pub mod parsing;
pub mod simulation;
pub mod population_io;

pub use config::{load_config_from_file, Config, GenerationMode};
pub use error::{ConfigError, EngineError, ExportError, FitError, TableError};
pub use simulation::{classify, CrossTab, DigitalTwinEngine, RuleTable, TrainedModel};
pub use types::survey::{GroupEntry, Individual, LabeledRespondent, Provenance, SyntheticPopulation};
