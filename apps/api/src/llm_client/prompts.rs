// Cross-cutting prompt fragments. Each feature that calls the LLM keeps its
// own prompts.rs next to it.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Keeps generated company facts tied to the supplied news sources.
pub const GROUNDING_INSTRUCTION: &str = "\
    Every statement you make must be supported by the sources provided below. \
    Do NOT invent figures, executives, products or dates. \
    If the sources say nothing useful, keep the existing description.";
