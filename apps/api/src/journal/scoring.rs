use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Relevance floor applied when an entry falls exactly on the date the question names.
pub const EXACT_DATE_RELEVANCE_FLOOR: f64 = 0.8;

/// Question tokens of this many characters or fewer are ignored.
const MIN_TOKEN_CHARS: usize = 2;

/// Words that say nothing about an entry's content, including the media-request vocabulary.
const STOP_WORDS: &[&str] = &[
    "que", "qué", "los", "las", "del", "una", "uno", "unos", "unas", "por", "para", "con",
    "sin", "mis", "tus", "sus", "este", "esta", "ese", "esa", "eso", "como", "cómo", "cuando",
    "cuándo", "donde", "dónde", "hice", "fue", "muy", "más", "mas", "pero", "todo", "día",
    "dia", "muéstrame", "muestrame", "enséñame", "enseñame", "envíame", "enviame", "foto",
    "fotos", "imagen", "imágenes", "imagenes", "video", "vídeo", "videos", "vídeos", "the",
    "and", "for", "with", "from", "what", "was", "did", "how", "where", "show", "send", "photo",
    "photos", "picture", "pictures", "image", "images", "this", "that", "you", "your",
];

/// Additive bonuses making up the media score on top of relevance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaScoreWeights {
    pub per_keyword_hit: f64,
    pub exact_date: f64,
    pub near_date_base: f64,
    pub near_date_decay_per_day: f64,
    pub recent: f64,
    pub recent_window_days: i64,
}

impl Default for MediaScoreWeights {
    fn default() -> Self {
        Self {
            per_keyword_hit: 0.4,
            exact_date: 1.0,
            near_date_base: 0.5,
            near_date_decay_per_day: 0.1,
            recent: 0.2,
            recent_window_days: 30,
        }
    }
}

/// Lower-cased whitespace tokens longer than two characters.
pub fn question_tokens(question: &str) -> Vec<String> {
    question
        .split_whitespace()
        .map(str::to_lowercase)
        .filter(|t| t.chars().count() > MIN_TOKEN_CHARS)
        .collect()
}

/// Fraction of question tokens that overlap some entry token, in `[0, 1]`.
///
/// Overlap is bidirectional substring containment, which tolerates plurals and
/// stems. A question with no qualifying tokens scores 0.0.
pub fn compute_relevance(entry_text: &str, question: &str) -> f64 {
    let q_tokens = question_tokens(question);
    if q_tokens.is_empty() {
        return 0.0;
    }

    let entry_tokens: Vec<String> = entry_text.split_whitespace().map(str::to_lowercase).collect();

    let matches = q_tokens
        .iter()
        .filter(|q| {
            entry_tokens
                .iter()
                .any(|e| e.contains(q.as_str()) || q.contains(e.as_str()))
        })
        .count();

    matches as f64 / q_tokens.len() as f64
}

/// Raises relevance to the exact-date floor when the entry is on the target date.
pub fn apply_date_floor(relevance: f64, entry_date: NaiveDate, target: Option<NaiveDate>) -> f64 {
    match target {
        Some(t) if t == entry_date => relevance.max(EXACT_DATE_RELEVANCE_FLOOR),
        _ => relevance,
    }
}

/// Question tokens with the stop words removed.
pub fn extract_keywords(question: &str) -> Vec<String> {
    question_tokens(question)
        .into_iter()
        .filter(|t| !STOP_WORDS.contains(&t.as_str()))
        .collect()
}

/// Non-overlapping, case-insensitive occurrences of every keyword in `text`, summed.
pub fn count_keyword_hits(text: &str, keywords: &[String]) -> usize {
    let haystack = text.to_lowercase();
    keywords
        .iter()
        .map(|kw| haystack.matches(kw.as_str()).count())
        .sum()
}

/// Flat bonus on the exact date, otherwise a bonus decaying linearly with day distance.
pub fn date_proximity_bonus(
    entry_date: NaiveDate,
    target: Option<NaiveDate>,
    weights: &MediaScoreWeights,
) -> f64 {
    let Some(target) = target else {
        return 0.0;
    };
    let diff_days = (entry_date - target).num_days().abs();
    if diff_days == 0 {
        weights.exact_date
    } else {
        (weights.near_date_base - weights.near_date_decay_per_day * diff_days as f64).max(0.0)
    }
}

pub fn recency_bonus(entry_date: NaiveDate, today: NaiveDate, weights: &MediaScoreWeights) -> f64 {
    let age_days = (today - entry_date).num_days();
    if (0..=weights.recent_window_days).contains(&age_days) {
        weights.recent
    } else {
        0.0
    }
}

/// Inputs shared by every candidate scored for one question.
pub struct MediaScoreContext<'a> {
    pub keywords: &'a [String],
    pub target_date: Option<NaiveDate>,
    pub today: NaiveDate,
    pub weights: &'a MediaScoreWeights,
}

/// relevance + keyword hits + date proximity + recency. All terms are additive; the
/// exact-date relevance floor is expected to be applied to `relevance` already.
pub fn compute_media_score(
    relevance: f64,
    entry_text: &str,
    entry_date: NaiveDate,
    ctx: &MediaScoreContext<'_>,
) -> f64 {
    let hits = count_keyword_hits(entry_text, ctx.keywords);
    relevance
        + ctx.weights.per_keyword_hit * hits as f64
        + date_proximity_bonus(entry_date, ctx.target_date, ctx.weights)
        + recency_bonus(entry_date, ctx.today, ctx.weights)
}
