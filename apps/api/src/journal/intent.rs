//! Intent Classifier — coarse lexical classification of a chat question.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::journal::dates::mentions_date;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionIntent {
    MediaRequest,
    EntryLookup,
    General,
}

/// Photo/image/video vocabulary plus request verbs, Spanish and English.
const MEDIA_TERMS: &[&str] = &[
    r"fotos?",
    r"fotograf[ií]as?",
    r"im[aá]gen(?:es)?",
    r"imagenes",
    r"v[ií]deos?",
    r"photos?",
    r"pictures?",
    r"pics?",
    r"images?",
    r"mu[eé]strame",
    r"ens[eé][ñn]ame",
    r"env[ií]ame",
    r"m[aá]ndame",
    r"show\s+me",
    r"send(?:\s+me)?",
];

/// "What did I do/eat/see", "how was", "where was I", "how did I feel".
const EXPERIENTIAL_TERMS: &[&str] = &[
    r"qu[eé]\s+hice",
    r"qu[eé]\s+com[ií]",
    r"qu[eé]\s+vi",
    r"c[oó]mo\s+(?:fue|estuvo)",
    r"d[oó]nde\s+estuve",
    r"c[oó]mo\s+me\s+sent[ií]",
    r"what\s+did\s+i\s+(?:do|eat|see)",
    r"how\s+was",
    r"where\s+was\s+i",
];

fn alternation(terms: &[&str]) -> Regex {
    Regex::new(&format!(r"\b(?:{})\b", terms.join("|"))).expect("valid intent regex")
}

static MEDIA_REQUEST: Lazy<Regex> = Lazy::new(|| alternation(MEDIA_TERMS));
static EXPERIENTIAL: Lazy<Regex> = Lazy::new(|| alternation(EXPERIENTIAL_TERMS));

/// Media vocabulary, or an experiential question anchored to a date, is a media request.
/// An experiential question without a date is an entry lookup. Everything else is general.
pub fn classify(question: &str) -> QuestionIntent {
    let lowered = question.to_lowercase();

    let media = MEDIA_REQUEST.is_match(&lowered);
    let experiential = EXPERIENTIAL.is_match(&lowered);
    let dated = mentions_date(&lowered);

    if media || (experiential && dated) {
        QuestionIntent::MediaRequest
    } else if experiential {
        QuestionIntent::EntryLookup
    } else {
        QuestionIntent::General
    }
}
