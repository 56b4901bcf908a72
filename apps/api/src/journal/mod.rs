// Journal chat: flatten entries, resolve dates, classify, score, assemble, answer.
// All synthesis goes through llm_client::AnswerSynthesizer; no direct Anthropic calls here.

pub mod assembler;
pub mod blocks;
pub mod chat;
pub mod dates;
pub mod handlers;
pub mod intent;
pub mod media;
pub mod prompts;
pub mod scoring;
pub mod store;

#[cfg(test)]
pub mod testing;
