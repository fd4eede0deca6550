/// One text rule: the archetype fires when any keyword is a substring of the
/// respondent's text blob.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchetypeRule {
    pub name: String,
    pub keywords: Vec<String>,
}

impl ArchetypeRule {
    /// Keywords are lowercased and trimmed; blank ones are dropped.
    pub fn new(name: &str, keywords: &[&str]) -> Self {
        Self {
            name: name.trim().to_string(),
            keywords: keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn matches(&self, text_blob: &str) -> bool {
        self.keywords.iter().any(|k| text_blob.contains(k.as_str()))
    }
}

/// Score fallback applied when no text rule fires.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRule {
    pub high: f64,
    pub low: f64,
    pub promoter: String,
    pub detractor: String,
    pub neutral: String,
}

impl Default for ScoreRule {
    fn default() -> Self {
        Self {
            high: 6.0,
            low: 4.0,
            promoter: "Promotor".to_string(),
            detractor: "Detractor".to_string(),
            neutral: "Neutral".to_string(),
        }
    }
}

impl ScoreRule {
    pub fn label_for(&self, score: Option<f64>) -> &str {
        match score {
            Some(s) if s >= self.high => &self.promoter,
            Some(s) if s <= self.low => &self.detractor,
            _ => &self.neutral,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleTable {
    pub rules: Vec<ArchetypeRule>,
    pub score: ScoreRule,
}

impl RuleTable {
    pub fn new(rules: Vec<ArchetypeRule>, score: ScoreRule) -> Self {
        Self { rules, score }
    }

    /// Every label `classify` can return, in priority order.
    pub fn vocabulary(&self) -> Vec<String> {
        let mut labels: Vec<String> = self.rules.iter().map(|r| r.name.clone()).collect();
        labels.push(self.score.promoter.clone());
        labels.push(self.score.detractor.clone());
        labels.push(self.score.neutral.clone());
        labels
    }
}

/// Assigns exactly one archetype. Text rules are tried in table order and the
/// first hit wins; otherwise the score decides. `text_blob` is expected to be
/// lowercase already (see `Respondent::text_blob`).
pub fn classify<'a>(text_blob: &str, score: Option<f64>, table: &'a RuleTable) -> &'a str {
    for rule in &table.rules {
        if rule.matches(text_blob) {
            return &rule.name;
        }
    }
    table.score.label_for(score)
}
