use std::collections::{BTreeMap, HashMap};

use rand::Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::classifier::{classify, RuleTable};
use super::distribution::{Distribution, Sampler};
use super::report::CrossTab;
use crate::error::{EngineError, FitError};
use crate::parsing::columns::{SurveyColumns, UniverseColumns};
use crate::parsing::table::Table;
use crate::parsing::values::{parse_quantity, parse_score};
use crate::types::survey::{
    GenerationStats, GroupEntry, Individual, LabeledRespondent, Provenance, Respondent,
    SyntheticPopulation,
};

/// Per-row problems recovered while labeling the sample.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FitStats {
    pub rows: usize,
    pub missing_scores: usize,
    pub blank_segments: usize,
}

/// Classifies every row of the survey table into a fresh record.
pub fn label_respondents(
    table: &Table,
    columns: &SurveyColumns,
    rules: &RuleTable,
) -> Result<(Vec<LabeledRespondent>, FitStats), FitError> {
    let resolved = columns
        .resolve(table)
        .map_err(|(role, requested)| FitError::MissingColumn { role, requested })?;
    if table.height() == 0 {
        return Err(FitError::EmptySample);
    }

    let mut stats = FitStats::default();
    let mut labeled = Vec::with_capacity(table.height());
    for row in 0..table.height() {
        let respondent = Respondent {
            segment: table.cell(resolved.segment, row).trim().to_string(),
            score: parse_score(table.cell(resolved.score, row)),
            text_fields: resolved
                .text
                .iter()
                .map(|col| col.map_or(String::new(), |c| table.cell(c, row).to_string()))
                .collect(),
        };
        if respondent.score.is_none() {
            stats.missing_scores += 1;
        }
        if respondent.segment.is_empty() {
            stats.blank_segments += 1;
        }

        let archetype = classify(&respondent.text_blob(), respondent.score, rules).to_string();
        labeled.push(LabeledRespondent {
            segment: respondent.segment,
            score: respondent.score,
            archetype,
        });
    }
    stats.rows = labeled.len();
    Ok((labeled, stats))
}

/// Outcome of looking a census group up in the trained table.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentMatch<'a> {
    /// First trained segment (in table order) contained in the group label.
    /// `also_matched` lists the other segments that matched too.
    Segment {
        segment: &'a str,
        also_matched: Vec<&'a str>,
    },
    Fallback,
}

/// Learned state. Segments are kept in lexicographic order, which is also the
/// order fuzzy matching walks them in.
#[derive(Debug, Clone, Serialize)]
pub struct TrainedModel {
    profiles: BTreeMap<String, Distribution>,
    global: Distribution,
    segment_mix: Distribution,
    real: Vec<LabeledRespondent>,
    vocabulary: Vec<String>,
}

impl TrainedModel {
    fn build(real: Vec<LabeledRespondent>, vocabulary: Vec<String>) -> Self {
        let mut by_segment: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for r in real.iter().filter(|r| !r.segment.is_empty()) {
            by_segment.entry(&r.segment).or_default().push(&r.archetype);
        }

        let profiles: BTreeMap<String, Distribution> = by_segment
            .iter()
            .map(|(segment, labels)| {
                (
                    segment.to_string(),
                    Distribution::from_labels(labels.iter().copied(), &vocabulary),
                )
            })
            .collect();
        let segment_order: Vec<String> = profiles.keys().cloned().collect();
        let segment_mix = Distribution::from_counts(
            by_segment.iter().map(|(s, labels)| (*s, labels.len() as u64)),
            &segment_order,
        );
        let global =
            Distribution::from_labels(real.iter().map(|r| r.archetype.as_str()), &vocabulary);

        Self {
            profiles,
            global,
            segment_mix,
            real,
            vocabulary,
        }
    }

    pub fn profiles(&self) -> &BTreeMap<String, Distribution> {
        &self.profiles
    }

    pub fn profile(&self, segment: &str) -> Option<&Distribution> {
        self.profiles.get(segment)
    }

    pub fn global(&self) -> &Distribution {
        &self.global
    }

    pub fn segment_mix(&self) -> &Distribution {
        &self.segment_mix
    }

    pub fn real(&self) -> &[LabeledRespondent] {
        &self.real
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    /// Case-insensitive containment of a trained segment label within the
    /// group label. Several segments can match one group; the first in table
    /// order is used.
    pub fn match_segment(&self, group: &str) -> SegmentMatch<'_> {
        let group = group.trim().to_lowercase();
        let mut hits = self
            .profiles
            .keys()
            .filter(|segment| group.contains(&segment.to_lowercase()))
            .map(String::as_str);
        match hits.next() {
            Some(segment) => SegmentMatch::Segment {
                segment,
                also_matched: hits.collect(),
            },
            None => SegmentMatch::Fallback,
        }
    }

    /// Archetype mix of the labeled sample, per segment.
    pub fn sample_crosstab(&self) -> CrossTab {
        let individuals: Vec<Individual> = self
            .real
            .iter()
            .map(|r| Individual {
                group: r.segment.clone(),
                archetype: r.archetype.clone(),
                provenance: Provenance::Real,
            })
            .collect();
        CrossTab::from_individuals(&individuals, &self.vocabulary)
    }
}

/// Owns one run's learned tables. Each session gets its own engine.
#[derive(Debug, Clone)]
pub struct DigitalTwinEngine {
    rules: RuleTable,
    model: Option<TrainedModel>,
    last_failure: Option<String>,
}

impl DigitalTwinEngine {
    pub fn new(rules: RuleTable) -> Self {
        Self {
            rules,
            model: None,
            last_failure: None,
        }
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    pub fn model(&self) -> Result<&TrainedModel, EngineError> {
        match (&self.model, &self.last_failure) {
            (Some(model), _) => Ok(model),
            (None, Some(reason)) => Err(EngineError::NotTrained {
                reason: format!("last fit failed: {}", reason),
            }),
            (None, None) => Err(EngineError::NotTrained {
                reason: "fit has not been called".to_string(),
            }),
        }
    }

    fn record_failure(&mut self, err: &FitError) {
        warn!("Fit failed: {}", err);
        self.model = None;
        self.last_failure = Some(err.to_string());
    }

    /// Labels the survey table and learns the segment tables from it.
    pub fn fit(
        &mut self,
        table: &Table,
        columns: &SurveyColumns,
    ) -> Result<&TrainedModel, FitError> {
        match label_respondents(table, columns, &self.rules) {
            Ok((labeled, stats)) => {
                if stats.missing_scores > 0 || stats.blank_segments > 0 {
                    warn!(
                        missing_scores = stats.missing_scores,
                        blank_segments = stats.blank_segments,
                        "Recovered malformed survey rows"
                    );
                }
                self.fit_labeled(labeled)
            }
            Err(e) => {
                self.record_failure(&e);
                Err(e)
            }
        }
    }

    /// Trains from records that are already labeled.
    pub fn fit_labeled(
        &mut self,
        labeled: Vec<LabeledRespondent>,
    ) -> Result<&TrainedModel, FitError> {
        if labeled.is_empty() {
            self.record_failure(&FitError::EmptySample);
            return Err(FitError::EmptySample);
        }

        let model = TrainedModel::build(labeled, self.rules.vocabulary());
        info!(
            respondents = model.real.len(),
            segments = model.profiles.len(),
            "Trained segment/archetype tables"
        );
        self.last_failure = None;
        Ok(self.model.insert(model))
    }

    /// Reads group entries from the universe table and generates them.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        universe: &Table,
        columns: &UniverseColumns,
        rng: &mut R,
    ) -> Result<SyntheticPopulation, EngineError> {
        self.model()?;
        let (group_col, quantity_col) = columns
            .resolve(universe)
            .map_err(|(role, requested)| EngineError::MissingColumn { role, requested })?;

        let entries: Vec<GroupEntry> = (0..universe.height())
            .map(|row| {
                let group = universe.cell(group_col, row).trim().to_string();
                let quantity = if group.is_empty() {
                    None
                } else {
                    parse_quantity(universe.cell(quantity_col, row))
                };
                GroupEntry { group, quantity }
            })
            .collect();
        self.generate_entries(&entries, rng)
    }

    /// One synthetic individual per requested head, drawn from the matched
    /// segment's distribution or the global one.
    pub fn generate_entries<R: Rng + ?Sized>(
        &self,
        entries: &[GroupEntry],
        rng: &mut R,
    ) -> Result<SyntheticPopulation, EngineError> {
        let model = self.model()?;
        let global = model.global.sampler()?;
        let mut population = SyntheticPopulation::default();

        for entry in entries {
            population.stats.groups_seen += 1;
            let Some(quantity) = entry.quantity else {
                debug!(group = %entry.group, "Skipping group without a usable quantity");
                population.stats.groups_skipped += 1;
                continue;
            };

            let local;
            let sampler: &Sampler<'_> = match model.match_segment(&entry.group) {
                SegmentMatch::Segment { segment, also_matched } => {
                    if !also_matched.is_empty() {
                        warn!(
                            group = %entry.group,
                            chosen = segment,
                            others = ?also_matched,
                            "Group label is ambiguous across trained segments, using the first"
                        );
                        population.stats.ambiguous_matches += 1;
                    }
                    population.stats.groups_matched += 1;
                    local = model.profiles[segment].sampler()?;
                    &local
                }
                SegmentMatch::Fallback => {
                    debug!(group = %entry.group, "No trained segment matches, using global distribution");
                    population.stats.groups_fallback += 1;
                    &global
                }
            };

            for _ in 0..quantity {
                population.individuals.push(Individual {
                    group: entry.group.clone(),
                    archetype: sampler.draw(rng).to_string(),
                    provenance: Provenance::Synthetic,
                });
            }
        }

        info!(
            individuals = population.len(),
            groups = population.stats.groups_seen,
            skipped = population.stats.groups_skipped,
            fallback = population.stats.groups_fallback,
            "Generated synthetic population"
        );
        Ok(population)
    }

    /// Real respondents plus enough synthetic ones to reach `total_universe`.
    /// Segments are drawn from the sample's own segment mix.
    pub fn augment<R: Rng + ?Sized>(
        &self,
        total_universe: u64,
        rng: &mut R,
    ) -> Result<SyntheticPopulation, EngineError> {
        let model = self.model()?;
        let mut population = SyntheticPopulation {
            individuals: model
                .real
                .iter()
                .map(|r| Individual {
                    group: r.segment.clone(),
                    archetype: r.archetype.clone(),
                    provenance: Provenance::Real,
                })
                .collect(),
            stats: GenerationStats::default(),
        };

        let real = model.real.len() as u64;
        if total_universe <= real {
            info!(total_universe, real, "Universe already covered by the real sample");
            return Ok(population);
        }

        let segments = model.segment_mix.sampler()?;
        let mut samplers: HashMap<&str, Sampler<'_>> = HashMap::new();
        for (segment, dist) in &model.profiles {
            samplers.insert(segment.as_str(), dist.sampler()?);
        }
        let global = model.global.sampler()?;

        let shortfall = total_universe - real;
        for _ in 0..shortfall {
            let segment = segments.draw(rng);
            let archetype = samplers.get(segment).unwrap_or(&global).draw(rng);
            population.individuals.push(Individual {
                group: segment.to_string(),
                archetype: archetype.to_string(),
                provenance: Provenance::Synthetic,
            });
        }
        info!(real, synthetic = shortfall, "Augmented real sample");
        Ok(population)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::ColumnRole;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tracing_test::traced_test;

    fn labeled(segment: &str, archetype: &str) -> LabeledRespondent {
        LabeledRespondent {
            segment: segment.to_string(),
            score: None,
            archetype: archetype.to_string(),
        }
    }

    fn engine() -> DigitalTwinEngine {
        DigitalTwinEngine::new(Config::default().rule_table())
    }

    fn trained(records: Vec<LabeledRespondent>) -> DigitalTwinEngine {
        let mut e = engine();
        e.fit_labeled(records).expect("fits");
        e
    }

    fn entry(group: &str, quantity: Option<u64>) -> GroupEntry {
        GroupEntry {
            group: group.to_string(),
            quantity,
        }
    }

    #[test]
    fn tables_are_normalized() {
        let e = trained(vec![
            labeled("Tenis", "Promotor"),
            labeled("Tenis", "Detractor"),
            labeled("Tenis", "Promotor"),
            labeled("Fútbol", "Neutral"),
            labeled("", "Detractor"),
        ]);
        let model = e.model().expect("trained");
        for dist in model.profiles().values() {
            assert!((dist.total() - 1.0).abs() < 1e-9);
        }
        assert!((model.global().total() - 1.0).abs() < 1e-9);
        assert!((model.profile("Tenis").unwrap().probability("Promotor") - 2.0 / 3.0).abs() < 1e-9);
        assert!((model.global().probability("Detractor") - 0.4).abs() < 1e-9);
        assert_eq!(model.profiles().len(), 2);
        assert!((model.segment_mix().probability("Tenis") - 0.75).abs() < 1e-9);
    }

    #[test]
    fn fit_resolves_columns_and_classifies() {
        let table = Table::from_columns(vec![
            ("Disciplina", vec!["Tenis".to_string(), "Tenis".to_string(), "Fútbol".to_string()]),
            ("NPS", vec!["9".to_string(), "abc".to_string(), "2".to_string()]),
            ("Comentario", vec![String::new(), "Falta LUZ".to_string(), String::new()]),
        ]);
        let mut e = engine();
        let (records, stats) =
            label_respondents(&table, &SurveyColumns::default(), e.rules()).expect("labels");
        assert_eq!(stats, FitStats { rows: 3, missing_scores: 1, blank_segments: 0 });
        let archetypes: Vec<&str> = records.iter().map(|r| r.archetype.as_str()).collect();
        assert_eq!(archetypes, vec!["Promotor", "Crítico de Infraestructura", "Detractor"]);

        e.fit(&table, &SurveyColumns::default()).expect("fits");
        assert!(e.is_trained());
    }

    #[test]
    fn fit_failure_is_named_and_blocks_generation() {
        let table = Table::from_columns(vec![("Disciplina", vec!["Tenis".to_string()])]);
        let mut e = engine();
        let err = e.fit(&table, &SurveyColumns::default()).unwrap_err();
        assert!(matches!(err, FitError::MissingColumn { .. }));

        let mut rng = StdRng::seed_from_u64(1);
        let gen = e.generate_entries(&[entry("Tenis", Some(5))], &mut rng);
        assert!(matches!(gen, Err(EngineError::NotTrained { reason }) if reason.contains("score")));
    }

    #[test]
    fn named_column_missing_from_sample_fails_fit() {
        let table = Table::from_columns(vec![
            ("Sede", vec!["Norte".to_string()]),
            ("Disciplina", vec!["Tenis".to_string()]),
            ("NPS", vec!["9".to_string()]),
        ]);
        let cols = SurveyColumns {
            segment: Some("Deporte".into()),
            ..Default::default()
        };
        let mut e = engine();
        assert_eq!(
            e.fit(&table, &cols).unwrap_err(),
            FitError::MissingColumn {
                role: ColumnRole::Segment,
                requested: Some("Deporte".into()),
            }
        );
        assert!(!e.is_trained());
    }

    #[test]
    fn empty_sample_is_rejected() {
        let table = Table::from_columns(vec![
            ("Disciplina", Vec::new()),
            ("NPS", Vec::new()),
        ]);
        let mut e = engine();
        assert_eq!(e.fit(&table, &SurveyColumns::default()).unwrap_err(), FitError::EmptySample);
        assert!(!e.is_trained());
    }

    #[test]
    fn generation_before_fit_fails() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            engine().augment(10, &mut rng),
            Err(EngineError::NotTrained { .. })
        ));
    }

    #[test]
    fn fuzzy_match_prefers_trained_segment() {
        let e = trained(vec![labeled("Fútbol", "Promotor"), labeled("Tenis", "Detractor")]);
        let model = e.model().unwrap();
        assert_eq!(
            model.match_segment("FÚTBOL Infantil"),
            SegmentMatch::Segment { segment: "Fútbol", also_matched: vec![] }
        );
        assert_eq!(model.match_segment("Natación"), SegmentMatch::Fallback);
    }

    #[test]
    fn ambiguous_match_takes_first_in_table_order() {
        let e = trained(vec![labeled("Tenis de Mesa", "Neutral"), labeled("Tenis", "Promotor")]);
        let model = e.model().unwrap();
        assert_eq!(
            model.match_segment("Tenis de Mesa - Juvenil"),
            SegmentMatch::Segment { segment: "Tenis", also_matched: vec!["Tenis de Mesa"] }
        );
    }

    #[test]
    #[traced_test]
    fn ambiguous_generation_is_counted_and_logged() {
        let e = trained(vec![labeled("Tenis de Mesa", "Neutral"), labeled("Tenis", "Promotor")]);
        let mut rng = StdRng::seed_from_u64(2);
        let pop = e
            .generate_entries(&[entry("Tenis de Mesa Juvenil", Some(20))], &mut rng)
            .expect("generates");
        assert_eq!(pop.stats.ambiguous_matches, 1);
        assert_eq!(pop.count_archetype("Tenis de Mesa Juvenil", "Promotor"), 20);
        assert!(logs_contain("ambiguous"));
    }

    #[test]
    fn requested_counts_are_respected() {
        let e = trained(vec![labeled("Tenis", "Promotor"), labeled("Fútbol", "Detractor")]);
        let mut rng = StdRng::seed_from_u64(3);
        let pop = e
            .generate_entries(
                &[
                    entry("Tenis - Juvenil", Some(40)),
                    entry("Fútbol", None),
                    entry("Natación", Some(7)),
                ],
                &mut rng,
            )
            .expect("generates");
        assert_eq!(pop.len(), 47);
        assert_eq!(pop.count_for("Tenis - Juvenil"), 40);
        assert_eq!(pop.count_archetype("Tenis - Juvenil", "Promotor"), 40);
        assert_eq!(pop.count_for("Fútbol"), 0);
        assert_eq!(pop.count_for("Natación"), 7);
        assert_eq!(
            pop.stats,
            GenerationStats {
                groups_seen: 3,
                groups_skipped: 1,
                groups_matched: 1,
                groups_fallback: 1,
                ambiguous_matches: 0,
            }
        );
        // order: census rows first, then draw order
        assert_eq!(pop.individuals[0].group, "Tenis - Juvenil");
        assert_eq!(pop.individuals[46].group, "Natación");
        assert_eq!(pop.count_provenance(Provenance::Synthetic), 47);
    }

    #[test]
    fn all_groups_skipped_gives_empty_population() {
        let e = trained(vec![labeled("Tenis", "Promotor")]);
        let mut rng = StdRng::seed_from_u64(3);
        let pop = e
            .generate_entries(&[entry("Tenis", None), entry("", None)], &mut rng)
            .expect("generates");
        assert!(pop.is_empty());
        assert_eq!(pop.stats.groups_skipped, 2);
    }

    #[test]
    fn generate_reads_universe_table() {
        let e = trained(vec![labeled("Tenis", "Promotor")]);
        let universe = Table::from_columns(vec![
            ("Grupo", vec!["Tenis A".to_string(), "Tenis B".to_string(), String::new(), "Tenis C".to_string()]),
            ("Cantidad", vec!["1.200".to_string(), "0".to_string(), "5".to_string(), "n/a".to_string()]),
        ]);
        let mut rng = StdRng::seed_from_u64(9);
        let pop = e
            .generate(&universe, &UniverseColumns::default(), &mut rng)
            .expect("generates");
        assert_eq!(pop.len(), 1200);
        assert_eq!(pop.stats.groups_skipped, 3);
    }

    #[test]
    fn generate_reports_unresolvable_universe() {
        let e = trained(vec![labeled("Tenis", "Promotor")]);
        let universe = Table::from_columns(vec![("Nombre", vec!["Tenis".to_string()])]);
        let mut rng = StdRng::seed_from_u64(9);
        assert!(matches!(
            e.generate(&universe, &UniverseColumns::default(), &mut rng),
            Err(EngineError::MissingColumn { .. })
        ));
    }

    #[test]
    fn named_group_column_missing_from_universe() {
        let e = trained(vec![labeled("Tenis", "Promotor")]);
        let universe = Table::from_columns(vec![
            ("Código", vec!["1".to_string()]),
            ("Grupo", vec!["Tenis".to_string()]),
            ("Cantidad", vec!["10".to_string()]),
        ]);
        let cols = UniverseColumns {
            group: Some("Categoría".into()),
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(9);
        assert!(matches!(
            e.generate(&universe, &cols, &mut rng),
            Err(EngineError::MissingColumn { role: ColumnRole::Group, requested: Some(name) })
                if name == "Categoría"
        ));
    }

    #[test]
    fn sample_crosstab_reflects_labeled_sample() {
        let e = trained(vec![
            labeled("Tenis", "Promotor"),
            labeled("Tenis", "Promotor"),
            labeled("Tenis", "Detractor"),
            labeled("Fútbol", "Neutral"),
        ]);
        let tab = e.model().expect("trained").sample_crosstab();
        assert_eq!(tab.groups, vec!["Tenis", "Fútbol"]);
        assert_eq!(tab.row_total("Tenis"), 3);
        let promoters = tab.percentage("Tenis", "Promotor").expect("cell");
        assert!((promoters - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(tab.percentage("Fútbol", "Neutral"), Some(100.0));
    }

    #[test]
    fn augment_keeps_real_sample_when_covered() {
        let records = vec![labeled("Tenis", "Promotor"), labeled("Fútbol", "Detractor")];
        let e = trained(records);
        let mut rng = StdRng::seed_from_u64(5);
        for total in [0, 1, 2] {
            let pop = e.augment(total, &mut rng).expect("augments");
            assert_eq!(pop.len(), 2);
            assert_eq!(pop.count_provenance(Provenance::Real), 2);
            assert_eq!(pop.individuals[0].archetype, "Promotor");
        }
    }

    #[test]
    fn augment_fills_shortfall_from_segment_mix() {
        let mut records = vec![labeled("Tenis", "Promotor"); 3];
        records.push(labeled("Fútbol", "Detractor"));
        let e = trained(records);
        let mut rng = StdRng::seed_from_u64(11);
        let pop = e.augment(4004, &mut rng).expect("augments");
        assert_eq!(pop.len(), 4004);
        assert_eq!(pop.count_provenance(Provenance::Real), 4);
        assert_eq!(pop.count_provenance(Provenance::Synthetic), 4000);
        // segment-pure profiles: archetype follows segment exactly
        assert_eq!(pop.count_for("Tenis"), pop.count_archetype("Tenis", "Promotor"));
        let tenis_share = pop.count_for("Tenis") as f64 / pop.len() as f64;
        assert!((tenis_share - 0.75).abs() < 0.03, "{tenis_share}");
    }
}
