// Shared prompt fragments. Each service that calls the synthesizer keeps its own
// prompts.rs alongside it; only cross-cutting instructions live here.

/// Keeps answers tied to the supplied journal excerpts.
pub const GROUNDING_INSTRUCTION: &str = "\
    IMPORTANTE: Responde únicamente con información que aparezca en las entradas del diario \
    proporcionadas o en la conversación previa. No inventes fechas, lugares, personas ni \
    eventos. Si las entradas no contienen la respuesta, dilo con claridad y sugiere qué \
    podría escribir el usuario en su diario para recordarlo en el futuro.";

/// Language and tone of every user-facing answer.
pub const TONE_INSTRUCTION: &str = "\
    Responde en el mismo idioma de la pregunta, en segunda persona, con un tono cálido y \
    breve. Cuando cites una entrada menciona su fecha.";
