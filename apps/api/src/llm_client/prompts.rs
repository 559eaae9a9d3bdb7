// Shared prompt fragments.
// Each feature that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting fragments only.

/// Closing instruction for any call that must come back as a single JSON object.
pub const JSON_ONLY_INSTRUCTION: &str = "CRITICAL: Return ONLY valid JSON. \
    Do NOT use markdown code fences. \
    Do NOT include any text outside the JSON object.";
