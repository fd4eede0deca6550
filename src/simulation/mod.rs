pub mod classifier;
pub mod distribution;
pub mod engine;
pub mod report;

pub use classifier::{classify, ArchetypeRule, RuleTable, ScoreRule};
pub use distribution::Distribution;
pub use engine::{label_respondents, DigitalTwinEngine, FitStats, SegmentMatch, TrainedModel};
pub use report::CrossTab;
