use super::table::Table;
use crate::config::ColumnsConfig;
use crate::error::ColumnRole;

pub const SEGMENT_HINTS: &[&str] = &[
    "segmento", "segment", "disciplina", "deporte", "departamento", "área", "area", "sede",
];
pub const SCORE_HINTS: &[&str] = &["nps", "satisf", "puntaje", "score", "calificación"];
pub const TEXT_HINTS: &[&str] = &[
    "comentario", "comment", "opinión", "opinion", "por qué", "porque", "mejorar", "sugerencia",
    "motivo",
];
pub const GROUP_HINTS: &[&str] = &["grupo", "group", "categoría", "categoria", "segmento", "disciplina"];
pub const QUANTITY_HINTS: &[&str] = &["cantidad", "quantity", "socios", "población", "poblacion", "total"];

/// Second column of a census sheet.
pub const GROUP_POSITION: usize = 1;
/// Fifth column of a census sheet.
pub const QUANTITY_POSITION: usize = 4;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurveyColumns {
    pub segment: Option<String>,
    pub score: Option<String>,
    pub text: Vec<String>,
}

impl From<&ColumnsConfig> for SurveyColumns {
    fn from(c: &ColumnsConfig) -> Self {
        Self {
            segment: c.segment.clone(),
            score: c.score.clone(),
            text: c.text.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniverseColumns {
    pub group: Option<String>,
    pub quantity: Option<String>,
}

impl From<&ColumnsConfig> for UniverseColumns {
    fn from(c: &ColumnsConfig) -> Self {
        Self {
            group: c.group.clone(),
            quantity: c.quantity.clone(),
        }
    }
}

/// Survey column indices after resolution. A `None` text slot is a
/// configured column the table does not have; it reads as empty text.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSurvey {
    pub segment: usize,
    pub score: usize,
    pub text: Vec<Option<usize>>,
}

impl SurveyColumns {
    /// The survey has no positional fallback.
    pub fn resolve(&self, table: &Table) -> Result<ResolvedSurvey, (ColumnRole, Option<String>)> {
        let segment = table
            .resolve_column(self.segment.as_deref(), SEGMENT_HINTS, None)
            .ok_or((ColumnRole::Segment, self.segment.clone()))?;
        let score = table
            .resolve_column(self.score.as_deref(), SCORE_HINTS, None)
            .filter(|idx| *idx != segment)
            .ok_or((ColumnRole::Score, self.score.clone()))?;

        let text = if self.text.is_empty() {
            table
                .columns_matching(TEXT_HINTS)
                .into_iter()
                .filter(|idx| *idx != segment && *idx != score)
                .map(Some)
                .collect()
        } else {
            self.text.iter().map(|name| table.index_of(name)).collect()
        };

        Ok(ResolvedSurvey { segment, score, text })
    }
}

impl UniverseColumns {
    pub fn resolve(&self, table: &Table) -> Result<(usize, usize), (ColumnRole, Option<String>)> {
        let group = table
            .resolve_column(self.group.as_deref(), GROUP_HINTS, Some(GROUP_POSITION))
            .ok_or((ColumnRole::Group, self.group.clone()))?;
        let quantity = table
            .resolve_column(self.quantity.as_deref(), QUANTITY_HINTS, Some(QUANTITY_POSITION))
            .filter(|idx| *idx != group)
            .ok_or((ColumnRole::Quantity, self.quantity.clone()))?;
        Ok((group, quantity))
    }
}
