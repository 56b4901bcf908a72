//! Date Expression Resolver — finds one Spanish date reference in a question.
//!
//! Two literal pattern tables, tried in order, first hit wins:
//! relative terms ("ayer", "hoy", "mañana", "esta semana", "semana pasada"),
//! then absolute day/month forms. Anything unrecognised resolves to `None`.

use chrono::{Datelike, Days, NaiveDate};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

pub const MONTHS: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

type RelativeResolver = fn(NaiveDate) -> Option<NaiveDate>;

/// Capture group positions of (day, month, year) in an absolute pattern.
struct AbsolutePattern {
    regex: Regex,
    day: usize,
    month: usize,
    year: usize,
}

fn word(pattern: &str) -> Regex {
    Regex::new(&format!(r"\b{pattern}\b")).expect("valid relative date regex")
}

static RELATIVE_TERMS: Lazy<Vec<(Regex, RelativeResolver)>> = Lazy::new(|| {
    vec![
        (word("ayer"), yesterday as RelativeResolver),
        (word("hoy"), today as RelativeResolver),
        (word("mañana"), tomorrow as RelativeResolver),
        (word(r"esta\s+semana"), start_of_week as RelativeResolver),
        (word(r"(?:la\s+)?semana\s+pasada"), week_ago as RelativeResolver),
    ]
});

static MONTH_ALTERNATION: Lazy<String> = Lazy::new(|| MONTHS.join("|"));

static ABSOLUTE_PATTERNS: Lazy<Vec<AbsolutePattern>> = Lazy::new(|| {
    let months = MONTH_ALTERNATION.as_str();
    let build = |pattern: String| Regex::new(&pattern).expect("valid absolute date regex");
    vec![
        // 22 de agosto [de 2025]
        AbsolutePattern {
            regex: build(format!(
                r"\b(\d{{1,2}})\s+de\s+({months})\b(?:\s+del?\s+(\d{{4}}))?"
            )),
            day: 1,
            month: 2,
            year: 3,
        },
        // 22 agosto [2025]
        AbsolutePattern {
            regex: build(format!(r"\b(\d{{1,2}})\s+({months})\b(?:\s+(\d{{4}}))?")),
            day: 1,
            month: 2,
            year: 3,
        },
        // agosto 22[, 2025]
        AbsolutePattern {
            regex: build(format!(
                r"\b({months})\s+(\d{{1,2}})\b(?:(?:,\s*|\s+)(\d{{4}}))?"
            )),
            day: 2,
            month: 1,
            year: 3,
        },
    ]
});

static MONTH_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\b(?:{})\b", MONTH_ALTERNATION.as_str())).expect("valid month regex")
});

fn yesterday(now: NaiveDate) -> Option<NaiveDate> {
    now.pred_opt()
}

fn today(now: NaiveDate) -> Option<NaiveDate> {
    Some(now)
}

fn tomorrow(now: NaiveDate) -> Option<NaiveDate> {
    now.succ_opt()
}

/// Weeks start on Sunday.
fn start_of_week(now: NaiveDate) -> Option<NaiveDate> {
    now.checked_sub_days(Days::new(u64::from(
        now.weekday().num_days_from_sunday(),
    )))
}

fn week_ago(now: NaiveDate) -> Option<NaiveDate> {
    now.checked_sub_days(Days::new(7))
}

/// Resolves the first date expression in `question` relative to `now`.
///
/// Relative terms take priority over absolute dates in the same question. A missing year
/// defaults to `now`'s year; a calendar-invalid day ("31 de febrero") matches nothing.
/// The returned date formats as `YYYY-MM-DD`.
pub fn resolve_date(question: &str, now: NaiveDate) -> Option<NaiveDate> {
    let lowered = question.to_lowercase();

    if let Some((_, resolve)) = RELATIVE_TERMS.iter().find(|(re, _)| re.is_match(&lowered)) {
        return resolve(now);
    }

    ABSOLUTE_PATTERNS.iter().find_map(|pattern| {
        pattern
            .regex
            .captures(&lowered)
            .and_then(|caps| absolute_date(pattern, &caps, now))
    })
}

fn absolute_date(
    pattern: &AbsolutePattern,
    caps: &Captures<'_>,
    now: NaiveDate,
) -> Option<NaiveDate> {
    let day: u32 = caps.get(pattern.day)?.as_str().parse().ok()?;
    let month_name = caps.get(pattern.month)?.as_str();
    let month = MONTHS.iter().position(|m| *m == month_name)? as u32 + 1;
    let year = match caps.get(pattern.year) {
        Some(y) => y.as_str().parse().ok()?,
        None => now.year(),
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Lexical check used by intent classification: does the already lower-cased question
/// mention any relative term, absolute date form, or month name?
pub fn mentions_date(lowered: &str) -> bool {
    RELATIVE_TERMS.iter().any(|(re, _)| re.is_match(lowered))
        || ABSOLUTE_PATTERNS.iter().any(|p| p.regex.is_match(lowered))
        || MONTH_NAME.is_match(lowered)
}
