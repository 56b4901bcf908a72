//! Context Assembler — turns one question plus the caller's fetched entries into either a
//! finished media answer or a grounded synthesis request.
//!
//! Flow: resolve date → classify intent → flatten + score every entry →
//!       media branch (direct answer) | text branch (top-N grounding context + prompt).
//!
//! Everything here is request-scoped and pure; no I/O, no caching between requests.

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::journal::blocks::flatten;
use crate::journal::chat::AskRequest;
use crate::journal::dates::resolve_date;
use crate::journal::intent::{classify, QuestionIntent};
use crate::journal::media::{select_media, MediaAnswer};
use crate::journal::prompts::{build_chat_prompt, chat_system_prompt};
use crate::journal::scoring::{apply_date_floor, compute_relevance};
use crate::models::entry::JournalEntryRow;
use crate::models::user::AuthenticatedUser;

/// Entries considered for the grounding context.
pub const CONTEXT_TOP_N: usize = 10;
/// Entries at or below this relevance are left out of the grounding context.
pub const CONTEXT_MIN_RELEVANCE: f64 = 0.1;
/// Prior conversation turns forwarded to the synthesizer.
pub const HISTORY_LIMIT: usize = 10;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// An entry reduced to plain text and image URLs for this request.
#[derive(Debug, Clone)]
pub struct FlattenedEntry<'a> {
    pub entry: &'a JournalEntryRow,
    pub plain_text: String,
    pub image_urls: Vec<String>,
}

impl<'a> FlattenedEntry<'a> {
    pub fn from_row(entry: &'a JournalEntryRow) -> Self {
        let flat = flatten(&entry.content);
        Self {
            entry,
            plain_text: flat.plain_text,
            image_urls: flat.image_urls,
        }
    }
}

/// A flattened entry with its relevance to the current question.
#[derive(Debug, Clone)]
pub struct ScoredEntry<'a> {
    pub flattened: FlattenedEntry<'a>,
    pub relevance: f64,
}

impl ScoredEntry<'_> {
    pub fn entry_date(&self) -> NaiveDate {
        self.flattened.entry.entry_date
    }
}

/// What the synthesizer receives for a text-branch question.
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    pub system: String,
    pub prompt: String,
    /// Number of entries that made it into the grounding context.
    pub context_entries: usize,
}

#[derive(Debug, Clone)]
pub enum AssemblyOutcome {
    Media(MediaAnswer),
    Synthesis(SynthesisRequest),
}

#[derive(Debug, Clone)]
pub struct Assembly {
    pub intent: QuestionIntent,
    pub target_date: Option<NaiveDate>,
    pub outcome: AssemblyOutcome,
}

// ────────────────────────────────────────────────────────────────────────────
// Assembly
// ────────────────────────────────────────────────────────────────────────────

/// Flattens every entry and scores it against the question, applying the exact-date floor.
/// Output order equals input order.
pub fn score_entries<'a>(
    entries: &'a [JournalEntryRow],
    question: &str,
    target_date: Option<NaiveDate>,
) -> Vec<ScoredEntry<'a>> {
    entries
        .iter()
        .map(|entry| {
            let flattened = FlattenedEntry::from_row(entry);
            let relevance = apply_date_floor(
                compute_relevance(&flattened.plain_text, question),
                entry.entry_date,
                target_date,
            );
            ScoredEntry {
                flattened,
                relevance,
            }
        })
        .collect()
}

/// Runs the full assembly for one request.
///
/// Rows that do not belong to `user` are dropped before flattening; the store is expected
/// to have scoped the query already, this only guarantees nothing foreign can leak.
pub fn assemble(
    user: &AuthenticatedUser,
    request: &AskRequest,
    entries: &[JournalEntryRow],
    today: NaiveDate,
) -> Assembly {
    let owned: Vec<JournalEntryRow> = entries
        .iter()
        .filter(|e| e.user_id == user.id)
        .cloned()
        .collect();
    if owned.len() != entries.len() {
        warn!(
            "Dropped {} entries not owned by user {}",
            entries.len() - owned.len(),
            user.id
        );
    }

    let question = request.question.as_str();
    let target_date = resolve_date(question, today);
    let intent = classify(question);
    debug!("Question resolved: date={target_date:?}, intent={intent:?}");

    let scored = score_entries(&owned, question, target_date);

    let outcome = match intent {
        QuestionIntent::MediaRequest => {
            AssemblyOutcome::Media(select_media(&scored, question, target_date, today))
        }
        QuestionIntent::EntryLookup | QuestionIntent::General => {
            AssemblyOutcome::Synthesis(build_synthesis_request(&scored, request))
        }
    };

    Assembly {
        intent,
        target_date,
        outcome,
    }
}

/// `- {date}: {text}` lines for the top entries above the relevance threshold.
pub fn grounding_lines(scored: &[ScoredEntry<'_>]) -> Vec<String> {
    let mut ranked: Vec<&ScoredEntry<'_>> = scored.iter().collect();
    // Stable: ties keep store order.
    ranked.sort_by(|a, b| {
        b.relevance
            .partial_cmp(&a.relevance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    ranked
        .into_iter()
        .take(CONTEXT_TOP_N)
        .filter(|s| s.relevance > CONTEXT_MIN_RELEVANCE)
        .map(|s| format!("- {}: {}", s.entry_date(), s.flattened.plain_text))
        .collect()
}

fn build_synthesis_request(scored: &[ScoredEntry<'_>], request: &AskRequest) -> SynthesisRequest {
    let lines = grounding_lines(scored);
    let history_start = request.history.len().saturating_sub(HISTORY_LIMIT);
    let history = &request.history[history_start..];

    debug!(
        "Grounding context: {} entries, {} attachments, {} history turns",
        lines.len(),
        request.attachments.len(),
        history.len()
    );

    SynthesisRequest {
        system: chat_system_prompt(),
        prompt: build_chat_prompt(&lines, &request.attachments, history, &request.question),
        context_entries: lines.len(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::chat::ChatTurn;
    use crate::journal::testing::{ask, date, entry_with, user};

    fn today() -> NaiveDate {
        date(2025, 9, 1)
    }

    #[test]
    fn test_scored_entries_keep_input_order_and_floor() {
        let u = user();
        let entries = vec![
            entry_with(&u, "2025-08-22", "nada que ver", &[]),
            entry_with(&u, "2025-08-21", "nada que ver", &[]),
        ];
        let scored = score_entries(&entries, "montaña", Some(date(2025, 8, 22)));
        assert_eq!(scored[0].entry_date(), date(2025, 8, 22));
        assert_eq!(scored[0].relevance, 0.8);
        assert_eq!(scored[1].relevance, 0.0);
    }

    #[test]
    fn test_media_request_end_to_end() {
        let u = user();
        let entries = vec![
            entry_with(&u, "2025-08-22", "concierto", &["u1"]),
            entry_with(&u, "2025-08-01", "playa", &["u2"]),
        ];
        let assembly = assemble(&u, &ask("muéstrame fotos del 22 de agosto"), &entries, today());

        assert_eq!(assembly.intent, QuestionIntent::MediaRequest);
        assert_eq!(assembly.target_date, Some(date(2025, 8, 22)));
        match assembly.outcome {
            AssemblyOutcome::Media(answer) => {
                let rendered = answer.render();
                assert!(rendered.contains("![Imagen](u1)"));
                assert!(!rendered.contains("u2"));
            }
            other => panic!("expected media answer, got {other:?}"),
        }
    }

    #[test]
    fn test_text_branch_truncates_to_top_ten_above_threshold() {
        let u = user();
        let entries: Vec<_> = (1..=20)
            .map(|day| {
                let text = if day % 2 == 0 { "montaña y lago" } else { "oficina" };
                entry_with(&u, &format!("2025-03-{day:02}"), text, &[])
            })
            .collect();
        let scored = score_entries(&entries, "montaña lago", None);
        let lines = grounding_lines(&scored);

        assert_eq!(lines.len(), 10);
        assert!(lines.iter().all(|l| l.contains("montaña y lago")));
        // Ties keep input order
        assert!(lines[0].starts_with("- 2025-03-02:"));
    }

    #[test]
    fn test_text_branch_excludes_low_relevance() {
        let u = user();
        let entries = vec![
            entry_with(&u, "2025-03-01", "oficina", &[]),
            entry_with(&u, "2025-03-02", "lago", &[]),
        ];
        let scored = score_entries(&entries, "montaña lago bosque río nieve", None);
        // "lago" matches 1 of 5 tokens: 0.2 > 0.1
        let lines = grounding_lines(&scored);
        assert_eq!(lines, vec!["- 2025-03-02: lago".to_string()]);
    }

    #[test]
    fn test_general_question_builds_prompt_with_history_tail() {
        let u = user();
        let entries = vec![entry_with(&u, "2025-03-02", "aprendí a tocar guitarra", &[])];
        let mut request = ask("háblame de la guitarra");
        request.history = (0..15)
            .map(|i| ChatTurn {
                role: "user".to_string(),
                content: format!("turno {i}"),
            })
            .collect();

        let assembly = assemble(&u, &request, &entries, today());
        assert_eq!(assembly.intent, QuestionIntent::General);
        match assembly.outcome {
            AssemblyOutcome::Synthesis(req) => {
                assert_eq!(req.context_entries, 1);
                assert!(req.prompt.contains("- 2025-03-02: aprendí a tocar guitarra"));
                assert!(req.prompt.contains("user: turno 14"));
                assert!(req.prompt.contains("user: turno 5"));
                assert!(!req.prompt.contains("user: turno 4\n"));
            }
            other => panic!("expected synthesis request, got {other:?}"),
        }
    }

    #[test]
    fn test_foreign_entries_never_reach_output() {
        let alice = user();
        let bob = user();
        let entries = vec![
            entry_with(&alice, "2025-08-22", "concierto", &["alice-photo"]),
            entry_with(&bob, "2025-08-22", "concierto", &["bob-photo"]),
        ];
        let question = ask("muéstrame fotos del concierto");

        let for_alice = assemble(&alice, &question, &entries, today());
        let for_bob = assemble(&bob, &question, &entries, today());

        let render = |a: Assembly| match a.outcome {
            AssemblyOutcome::Media(m) => m.render(),
            AssemblyOutcome::Synthesis(s) => s.prompt,
        };
        let alice_out = render(for_alice);
        let bob_out = render(for_bob);
        assert!(alice_out.contains("alice-photo") && !alice_out.contains("bob-photo"));
        assert!(bob_out.contains("bob-photo") && !bob_out.contains("alice-photo"));
    }
}
