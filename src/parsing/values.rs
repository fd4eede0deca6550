use regex::Regex;
use std::sync::OnceLock;

fn grouped_number() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // 1.200 / 12,500 / 1.234.567 -- thousands groups of exactly three digits
    RE.get_or_init(|| Regex::new(r"^-?\d{1,3}([.,]\d{3})+$").expect("static regex"))
}

fn grouped_with_decimals() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // 1.234,00 / 1,234.00 -- the last separator differs from the grouping one
    RE.get_or_init(|| {
        Regex::new(r"^-?\d{1,3}(?:(?:\.\d{3})+,\d+|(?:,\d{3})+\.\d+)$").expect("static regex")
    })
}

fn spacing() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\s'_]").expect("static regex"))
}

fn is_nan_like(s: &str) -> bool {
    matches!(
        s.to_lowercase().as_str(),
        "" | "nan" | "na" | "n/a" | "null" | "none" | "-" | "--"
    )
}

/// Satisfaction score. Accepts a decimal comma (`7,5`). Blank, NaN-like and
/// non-finite values are `None`.
pub fn parse_score(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if is_nan_like(s) {
        return None;
    }
    let value = match s.parse::<f64>() {
        Ok(v) => v,
        Err(_) if s.matches(',').count() == 1 && !s.contains('.') => {
            s.replace(',', ".").parse::<f64>().ok()?
        }
        Err(_) => return None,
    };
    value.is_finite().then_some(value)
}

/// Census head count. Thousands separators are stripped, also when followed
/// by a decimal part in the other separator (`1.234,00`); decimals are
/// truncated. Zero, negative and unparseable values are `None`.
pub fn parse_quantity(raw: &str) -> Option<u64> {
    let compact = spacing().replace_all(raw.trim(), "");
    let s = compact.as_ref();
    if is_nan_like(s) {
        return None;
    }

    let value: i64 = if grouped_number().is_match(s) {
        s.replace(['.', ','], "").parse().ok()?
    } else {
        let v = if grouped_with_decimals().is_match(s) {
            let (whole, fraction) = s.rsplit_once(['.', ','])?;
            format!("{}.{}", whole.replace(['.', ','], ""), fraction)
                .parse::<f64>()
                .ok()?
        } else {
            parse_score(s)?
        };
        if v.abs() >= i64::MAX as f64 {
            return None;
        }
        v.trunc() as i64
    };

    u64::try_from(value).ok().filter(|v| *v > 0)
}
