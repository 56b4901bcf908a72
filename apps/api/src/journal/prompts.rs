// Prompt templates for the journal chat. The synthesizer receives the system prompt
// and one user prompt assembled from these pieces.

use crate::journal::chat::{Attachment, ChatTurn};
use crate::llm_client::prompts::{GROUNDING_INSTRUCTION, TONE_INSTRUCTION};

pub const CHAT_SYSTEM: &str = "\
Eres el asistente personal del diario del usuario. \
Conoces sus entradas fechadas y le ayudas a recordar lo que vivió, sintió y aprendió.";

/// Placeholder used when no entry cleared the relevance threshold.
pub const EMPTY_CONTEXT: &str = "(ninguna entrada relevante para esta pregunta)";

pub fn chat_system_prompt() -> String {
    format!("{CHAT_SYSTEM}\n\n{GROUNDING_INSTRUCTION}\n\n{TONE_INSTRUCTION}")
}

/// Builds the user prompt. `history` must already be truncated by the caller.
pub fn build_chat_prompt(
    context_lines: &[String],
    attachments: &[Attachment],
    history: &[ChatTurn],
    question: &str,
) -> String {
    let context = if context_lines.is_empty() {
        EMPTY_CONTEXT.to_string()
    } else {
        context_lines.join("\n")
    };

    let mut sections = String::new();
    if !attachments.is_empty() {
        sections.push_str("\nADJUNTOS:\n");
        for attachment in attachments {
            sections.push_str(&format!("- {}: {}\n", attachment.kind, attachment.url));
        }
    }
    if !history.is_empty() {
        sections.push_str("\nCONVERSACIÓN PREVIA:\n");
        for turn in history {
            sections.push_str(&format!("{}: {}\n", turn.role, turn.content));
        }
    }

    format!("ENTRADAS DEL DIARIO:\n{context}\n{sections}\nPREGUNTA:\n{question}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_without_extras_has_no_optional_sections() {
        let prompt = build_chat_prompt(&["- 2025-08-22: playa".to_string()], &[], &[], "¿y?");
        assert!(prompt.contains("- 2025-08-22: playa"));
        assert!(!prompt.contains("ADJUNTOS"));
        assert!(!prompt.contains("CONVERSACIÓN PREVIA"));
        assert!(prompt.ends_with("PREGUNTA:\n¿y?"));
    }

    #[test]
    fn test_prompt_marks_empty_context() {
        let prompt = build_chat_prompt(&[], &[], &[], "hola");
        assert!(prompt.contains(EMPTY_CONTEXT));
    }

    #[test]
    fn test_prompt_lists_attachments_and_history() {
        let attachments = vec![Attachment {
            kind: "image".to_string(),
            url: "https://cdn/x.png".to_string(),
        }];
        let history = vec![
            ChatTurn {
                role: "user".to_string(),
                content: "hola".to_string(),
            },
            ChatTurn {
                role: "assistant".to_string(),
                content: "¡hola!".to_string(),
            },
        ];
        let prompt = build_chat_prompt(&[], &attachments, &history, "¿qué ves?");
        assert!(prompt.contains("ADJUNTOS:\n- image: https://cdn/x.png"));
        assert!(prompt.contains("CONVERSACIÓN PREVIA:\nuser: hola\nassistant: ¡hola!"));
    }

    #[test]
    fn test_entry_text_with_braces_is_kept_literally() {
        let lines = vec!["- 2025-01-01: escribí {question} en la pizarra".to_string()];
        let prompt = build_chat_prompt(&lines, &[], &[], "¿qué escribí?");
        assert!(prompt.contains("escribí {question} en la pizarra"));
    }

    #[test]
    fn test_system_prompt_carries_grounding_rule() {
        assert!(chat_system_prompt().contains("No inventes"));
    }
}
