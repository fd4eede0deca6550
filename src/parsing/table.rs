/// Column-major table handed over by the ingestion boundary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub columns: Vec<Vec<String>>,
}

fn normalize_header(name: &str) -> String {
    name.trim().to_lowercase()
}

/// True when `hint` occurs in `header` at the start of a word, so "area"
/// does not fire inside "tareas".
fn hint_starts_word(header: &str, hint: &str) -> bool {
    header.match_indices(hint).any(|(i, _)| {
        header[..i]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric())
    })
}

impl Table {
    /// Builds from (header, values) pairs. Shorter columns are padded with
    /// empty cells so every column has the same length.
    pub fn from_columns<S: Into<String>>(columns: Vec<(S, Vec<String>)>) -> Self {
        let height = columns.iter().map(|(_, v)| v.len()).max().unwrap_or(0);
        let mut table = Table::default();
        for (name, mut values) in columns {
            values.resize(height, String::new());
            table.headers.push(name.into());
            table.columns.push(values);
        }
        table
    }

    /// Builds from a header row and data rows (already the same width).
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let mut columns = vec![Vec::with_capacity(rows.len()); headers.len()];
        for row in rows {
            for (idx, cell) in row.into_iter().enumerate().take(headers.len()) {
                columns[idx].push(cell);
            }
        }
        Self { headers, columns }
    }

    pub fn height(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn width(&self) -> usize {
        self.headers.len()
    }

    /// Trimmed, case-insensitive header lookup.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        let wanted = normalize_header(name);
        self.headers.iter().position(|h| normalize_header(h) == wanted)
    }

    pub fn column(&self, name: &str) -> Option<&[String]> {
        self.index_of(name).map(|idx| self.columns[idx].as_slice())
    }

    pub fn cell(&self, column: usize, row: usize) -> &str {
        self.columns
            .get(column)
            .and_then(|c| c.get(row))
            .map_or("", String::as_str)
    }

    /// Indices of headers with a word starting with any of `hints`
    /// (case-insensitive).
    pub fn columns_matching(&self, hints: &[&str]) -> Vec<usize> {
        self.headers
            .iter()
            .enumerate()
            .filter(|(_, h)| {
                let h = normalize_header(h);
                hints.iter().any(|hint| hint_starts_word(&h, &hint.to_lowercase()))
            })
            .map(|(idx, _)| idx)
            .collect()
    }

    /// A named column must exist under that name; no substitute is picked.
    /// Without a name: the first header matching a hint, then the positional
    /// fallback if the table is wide enough.
    pub fn resolve_column(
        &self,
        explicit: Option<&str>,
        hints: &[&str],
        positional: Option<usize>,
    ) -> Option<usize> {
        if let Some(name) = explicit {
            return self.index_of(name);
        }
        if let Some(idx) = self.columns_matching(hints).first() {
            return Some(*idx);
        }
        positional.filter(|idx| *idx < self.width())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_columns(vec![
            ("ID", vec!["1".to_string(), "2".to_string()]),
            (" Disciplina ", vec!["Tenis".to_string(), "Fútbol".to_string()]),
            ("Puntaje NPS", vec!["9".to_string()]),
        ])
    }

    #[test]
    fn pads_short_columns() {
        let t = sample();
        assert_eq!(t.height(), 2);
        assert_eq!(t.cell(2, 1), "");
        assert_eq!(t.cell(9, 9), "");
    }

    #[test]
    fn header_lookup_ignores_case_and_padding() {
        let t = sample();
        assert_eq!(t.index_of("disciplina"), Some(1));
        assert_eq!(t.column("DISCIPLINA").map(|c| c[1].as_str()), Some("Fútbol"));
        assert_eq!(t.index_of("missing"), None);
    }

    #[test]
    fn resolution_order() {
        let t = sample();
        assert_eq!(t.resolve_column(Some("ID"), &["nps"], Some(1)), Some(0));
        assert_eq!(t.resolve_column(Some("nope"), &["nps"], Some(1)), None);
        assert_eq!(t.resolve_column(None, &["nps"], Some(1)), Some(2));
        assert_eq!(t.resolve_column(None, &["zzz"], Some(1)), Some(1));
        assert_eq!(t.resolve_column(None, &["zzz"], Some(4)), None);
        assert_eq!(t.resolve_column(None, &[], None), None);
    }

    #[test]
    fn hints_match_word_starts_only() {
        let t = Table::from_columns(vec![
            ("Tareas", Vec::new()),
            ("Área deportiva", Vec::new()),
            ("Puntaje-NPS", Vec::new()),
        ]);
        assert_eq!(t.columns_matching(&["área"]), vec![1]);
        assert_eq!(t.columns_matching(&["area"]), Vec::<usize>::new());
        assert_eq!(t.columns_matching(&["nps", "puntaje"]), vec![2]);
    }

    #[test]
    fn from_rows_transposes() {
        let t = Table::from_rows(
            vec!["a".into(), "b".into()],
            vec![vec!["1".into(), "2".into()], vec!["3".into(), "4".into()]],
        );
        assert_eq!(t.column("b"), Some(&["2".to_string(), "4".to_string()][..]));
    }
}
