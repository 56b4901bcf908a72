//! Media branch of context assembly — answers "show me my photos" questions directly,
//! without a synthesis call.
//!
//! Candidate chain when the question names a date: exact day → within
//! `DATE_WINDOW_DAYS` → every entry with images.

use chrono::NaiveDate;
use tracing::debug;

use crate::journal::assembler::ScoredEntry;
use crate::journal::scoring::{
    compute_media_score, extract_keywords, MediaScoreContext, MediaScoreWeights,
};

/// Maximum entries whose images are returned.
pub const MEDIA_TOP_N: usize = 3;
/// Width of the fallback window around a resolved date, in calendar days.
pub const DATE_WINDOW_DAYS: i64 = 3;

pub const NO_IMAGES_MESSAGE: &str =
    "No encontré imágenes en tus entradas del diario. Puedes añadir fotos desde el editor.";
pub const NO_RELEVANT_IMAGES_MESSAGE: &str =
    "No encontré imágenes relacionadas con tu pregunta.";

/// An image-bearing entry ranked for a media request.
#[derive(Debug, Clone)]
pub struct MediaCandidate<'e, 'a> {
    pub scored: &'e ScoredEntry<'a>,
    pub media_score: f64,
}

/// The images of one entry, in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryImages {
    pub entry_date: NaiveDate,
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MediaAnswer {
    NoImages,
    NoRelevantImages,
    Single(EntryImages),
    Multiple(Vec<EntryImages>),
}

impl MediaAnswer {
    /// Markdown answer. Only URLs taken from the caller's entries ever appear in it.
    pub fn render(&self) -> String {
        match self {
            MediaAnswer::NoImages => NO_IMAGES_MESSAGE.to_string(),
            MediaAnswer::NoRelevantImages => NO_RELEVANT_IMAGES_MESSAGE.to_string(),
            MediaAnswer::Single(images) => format!(
                "Estas son las imágenes de tu entrada del {}:\n\n{}",
                images.entry_date,
                image_lines(&images.urls)
            ),
            MediaAnswer::Multiple(groups) => {
                let mut out = format!("Encontré imágenes en {} entradas:\n", groups.len());
                for group in groups {
                    out.push_str(&format!(
                        "\n### {}\n\n{}\n",
                        group.entry_date,
                        image_lines(&group.urls)
                    ));
                }
                out.trim_end().to_string()
            }
        }
    }
}

fn image_lines(urls: &[String]) -> String {
    urls.iter()
        .map(|url| format!("![Imagen]({url})"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Narrows image-bearing entries to the resolved date when possible, widening otherwise.
fn date_candidates<'e, 'a>(
    with_images: Vec<&'e ScoredEntry<'a>>,
    target: Option<NaiveDate>,
) -> Vec<&'e ScoredEntry<'a>> {
    let Some(target) = target else {
        return with_images;
    };

    let exact: Vec<_> = with_images
        .iter()
        .copied()
        .filter(|s| s.entry_date() == target)
        .collect();
    if !exact.is_empty() {
        debug!("Media candidates: {} on {target}", exact.len());
        return exact;
    }

    let nearby: Vec<_> = with_images
        .iter()
        .copied()
        .filter(|s| (s.entry_date() - target).num_days().abs() <= DATE_WINDOW_DAYS)
        .collect();
    if !nearby.is_empty() {
        debug!(
            "Media candidates: {} within {DATE_WINDOW_DAYS} days of {target}",
            nearby.len()
        );
        return nearby;
    }

    debug!("Media candidates: no entry near {target}, using all {}", with_images.len());
    with_images
}

/// Picks the top image-bearing entries for a media request.
///
/// `scored` must already carry the exact-date relevance floor.
pub fn select_media(
    scored: &[ScoredEntry<'_>],
    question: &str,
    target_date: Option<NaiveDate>,
    today: NaiveDate,
) -> MediaAnswer {
    let with_images: Vec<&ScoredEntry<'_>> =
        scored.iter().filter(|s| !s.flattened.image_urls.is_empty()).collect();
    if with_images.is_empty() {
        return MediaAnswer::NoImages;
    }

    let candidates = date_candidates(with_images, target_date);

    let keywords = extract_keywords(question);
    let weights = MediaScoreWeights::default();
    let ctx = MediaScoreContext {
        keywords: &keywords,
        target_date,
        today,
        weights: &weights,
    };

    let mut ranked: Vec<MediaCandidate<'_, '_>> = candidates
        .into_iter()
        .map(|scored| MediaCandidate {
            scored,
            media_score: compute_media_score(
                scored.relevance,
                &scored.flattened.plain_text,
                scored.entry_date(),
                &ctx,
            ),
        })
        .collect();

    // Stable: ties keep store order (newest first).
    ranked.sort_by(|a, b| {
        b.media_score
            .partial_cmp(&a.media_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(MEDIA_TOP_N);

    let mut groups: Vec<EntryImages> = ranked
        .into_iter()
        .map(|c| EntryImages {
            entry_date: c.scored.entry_date(),
            urls: c.scored.flattened.image_urls.clone(),
        })
        .collect();

    match groups.len() {
        0 => MediaAnswer::NoRelevantImages,
        1 => MediaAnswer::Single(groups.remove(0)),
        _ => MediaAnswer::Multiple(groups),
    }
}
