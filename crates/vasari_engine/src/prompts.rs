//! Prompt rendering for each pipeline step.
//!
//! Pure formatting: every function takes already-assembled context and
//! returns a prompt string or a JSON schema. No control flow lives here.

use vasari_core::{ChapterPlan, OutlineBrief};

/// System instruction for outline generation.
pub fn outline_system() -> String {
    "You are a book architect. You design complete, coherent outlines for long-form books."
        .to_string()
}

/// Prompt for generating an outline from a brief.
pub fn outline_prompt(brief: &OutlineBrief) -> String {
    let themes = if brief.themes().is_empty() {
        "none specified".to_string()
    } else {
        brief.themes().join(", ")
    };
    format!(
        "Design an outline for a book titled \"{}\".\n\
         Premise: {}\n\
         Audience: {}\n\
         Themes: {}\n\
         Plan exactly {} chapters of roughly {} words each. For every chapter \
         give a title, a summary, the key events, and the characters involved. \
         Include a synopsis of the whole book and a profile for each major character.",
        brief.title(),
        brief.premise(),
        brief.audience(),
        themes,
        brief.chapter_count(),
        brief.words_per_chapter(),
    )
}

/// JSON schema for the outline object.
pub fn outline_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "required": ["title", "synopsis", "chapters"],
        "properties": {
            "title": { "type": "string" },
            "synopsis": { "type": "string" },
            "themes": { "type": "array", "items": { "type": "string" } },
            "audience": { "type": "string" },
            "chapters": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["number", "title", "summary"],
                    "properties": {
                        "number": { "type": "integer" },
                        "title": { "type": "string" },
                        "summary": { "type": "string" },
                        "target_words": { "type": "integer" },
                        "key_events": { "type": "array", "items": { "type": "string" } },
                        "characters": { "type": "array", "items": { "type": "string" } }
                    }
                }
            },
            "characters": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["name"],
                    "properties": {
                        "name": { "type": "string" },
                        "description": { "type": "string" },
                        "arc": { "type": "string" }
                    }
                }
            }
        }
    })
}

/// System instruction for detailed chapter planning.
pub fn plan_system() -> String {
    "You are a story planner. You break a chapter summary into concrete, writable scenes."
        .to_string()
}

/// Prompt for the planning step.
pub fn plan_prompt(plan: &ChapterPlan, rolling_summary: &str, memory: &str) -> String {
    let mut prompt = format!(
        "Plan chapter {} (\"{}\") in detail.\n\
         Chapter summary: {}\n\
         Key events: {}\n\
         Characters: {}\n\
         Target length: {} words.\n",
        plan.number,
        plan.title,
        plan.summary,
        plan.key_events.join("; "),
        plan.characters.join(", "),
        plan.target_words,
    );
    if !rolling_summary.is_empty() {
        prompt.push_str(&format!("\nThe story so far:\n{rolling_summary}\n"));
    }
    if !memory.is_empty() {
        prompt.push_str(&format!("\nRetrieved context:\n{memory}\n"));
    }
    prompt.push_str(
        "\nBreak the chapter into ordered scenes with setting, characters, objective, \
         conflict, resolution, and a word target per scene. Choose a point of view and \
         tone, and describe how the chapter bridges from the previous one and into the next.",
    );
    prompt
}

/// JSON schema for the detailed chapter plan object.
pub fn plan_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "required": ["title", "scenes"],
        "properties": {
            "chapter_number": { "type": "integer" },
            "title": { "type": "string" },
            "scenes": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["setting", "objective"],
                    "properties": {
                        "setting": { "type": "string" },
                        "characters": { "type": "array", "items": { "type": "string" } },
                        "objective": { "type": "string" },
                        "conflict": { "type": "string" },
                        "resolution": { "type": "string" },
                        "target_words": { "type": "integer" }
                    }
                }
            },
            "point_of_view": { "type": "string" },
            "tone": { "type": "string" },
            "bridge_from_previous": { "type": "string" },
            "bridge_to_next": { "type": "string" }
        }
    })
}

/// Compact writer context for a chapter when no detailed plan is on hand
/// (expand operations on already-approved chapters).
pub fn chapter_brief(plan: &ChapterPlan) -> String {
    format!(
        "Chapter {}: {}\nSummary: {}\nKey events: {}\nCharacters: {}",
        plan.number,
        plan.title,
        plan.summary,
        plan.key_events.join("; "),
        plan.characters.join(", "),
    )
}

/// System instruction for prose writing.
pub fn writer_system() -> String {
    "You are a professional novelist. Write polished, immersive prose. \
     Output only the chapter text itself: no preamble, no headings, no commentary."
        .to_string()
}

/// Prompt for the writing step.
pub fn writer_prompt(context: &str, target_words: u32, rewrite: Option<&RewriteDirective>) -> String {
    let mut prompt = format!(
        "{context}\n\nWrite the full chapter now, approximately {target_words} words. \
         Begin with the first sentence of the chapter."
    );
    if let Some(directive) = rewrite {
        prompt.push_str(&format!(
            "\n\nThis is a rewrite. Editorial instructions:\n{}\n\n\
             Previous draft for reference (revise it, do not merely summarize it):\n{}",
            directive.instructions, directive.previous_draft,
        ));
    }
    prompt
}

/// Editorial instructions carried into a rewrite pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteDirective {
    /// What must change.
    pub instructions: String,
    /// The rejected draft, attached verbatim.
    pub previous_draft: String,
}

/// Escalating corrective clause appended on refusal retries.
///
/// Attempt 0 is the base prompt; attempts 1 through 3 escalate.
pub fn retry_clause(attempt: u32) -> &'static str {
    match attempt {
        0 => "",
        1 => {
            "\n\nIMPORTANT: Do not apologize or explain limitations. \
             Produce the chapter prose and nothing else."
        }
        2 => {
            "\n\nIMPORTANT: Your very first output token must be the first word \
             of the story. Any meta-commentary is a failure."
        }
        _ => {
            "\n\nFINAL WARNING: Previous attempts produced commentary instead of \
             the chapter. Output the chapter text in full, starting immediately, \
             or the work is discarded."
        }
    }
}

/// Prompt for the expand step.
pub fn expand_prompt(text: &str, target_words: u32, deficit: usize) -> String {
    format!(
        "The chapter below is about {deficit} words short of its {target_words}-word target. \
         Expand it by deepening scenes, dialogue, and description. Preserve all existing \
         content and continuity; do not summarize or remove anything. \
         Return the complete expanded chapter.\n\n{text}"
    )
}

/// System instruction for editorial scoring.
pub fn edit_system() -> String {
    "You are a sharp, fair developmental editor. Score honestly; approve only work \
     that is ready for readers."
        .to_string()
}

/// Prompt for the editing step.
pub fn edit_prompt(draft: &str, plan_context: &str) -> String {
    format!(
        "Score this chapter draft 1-10 on prose, plot, character, pacing, dialogue, \
         and overall quality. Provide brief notes, and if the overall score is below 7, \
         give concrete rewrite instructions.\n\nChapter plan:\n{plan_context}\n\nDraft:\n{draft}"
    )
}

/// JSON schema for the edit result object.
pub fn edit_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "required": ["prose", "plot", "character", "pacing", "dialogue", "overall", "approved"],
        "properties": {
            "prose": { "type": "integer", "minimum": 1, "maximum": 10 },
            "plot": { "type": "integer", "minimum": 1, "maximum": 10 },
            "character": { "type": "integer", "minimum": 1, "maximum": 10 },
            "pacing": { "type": "integer", "minimum": 1, "maximum": 10 },
            "dialogue": { "type": "integer", "minimum": 1, "maximum": 10 },
            "overall": { "type": "integer", "minimum": 1, "maximum": 10 },
            "notes": { "type": "string" },
            "approved": { "type": "boolean" },
            "rewrite_instructions": { "type": ["string", "null"] }
        }
    })
}

/// System instruction for continuity summarization.
pub fn summary_system() -> String {
    "You maintain a running synopsis of a book in progress. Be factual and compact."
        .to_string()
}

/// Prompt for folding a finished chapter into the rolling summary.
pub fn summary_prompt(prior_summary: &str, chapter_text: &str, plan: &ChapterPlan) -> String {
    let mut prompt = String::new();
    if prior_summary.is_empty() {
        prompt.push_str("Start a running synopsis of the book from its first finished chapter.\n");
    } else {
        prompt.push_str(&format!(
            "Running synopsis so far:\n{prior_summary}\n\n\
             Fold the newly finished chapter below into the synopsis.\n"
        ));
    }
    prompt.push_str(&format!(
        "\nChapter {} (\"{}\"):\n{}\n\nReturn the updated synopsis only. \
         Keep every plot-relevant fact; drop scene-level detail.",
        plan.number, plan.title, chapter_text,
    ));
    prompt
}

/// Prompt for condensing an over-long rolling summary.
pub fn condense_prompt(summary: &str, word_cap: usize) -> String {
    format!(
        "Condense this synopsis to under {word_cap} words without losing any \
         plot-relevant fact:\n\n{summary}"
    )
}
