//! Finished chapter content and per-chapter status.

use serde::{Deserialize, Serialize};

use crate::text::word_count;

/// Generation status of a chapter within a session.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ChapterStatus {
    /// Not yet generated.
    Pending,
    /// A pipeline run is in flight.
    Generating,
    /// Generated and approved.
    Approved,
    /// The last pipeline run failed.
    Failed,
}

/// The finished text of a chapter.
///
/// Produced by the pipeline on chapter completion. Immutable once approved
/// except through explicit rewrite/expand operations, which replace the
/// value for the same number wholesale.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChapterContent {
    /// Chapter number.
    pub number: u32,
    /// Chapter title.
    pub title: String,
    /// Full prose text.
    pub text: String,
    /// Word count of `text`.
    pub word_count: usize,
    /// Short summary used for continuity.
    pub summary: String,
    /// How many edit cycles the chapter went through.
    pub edit_cycles: u32,
    /// Whether the chapter passed (or was force-approved by) the editor.
    pub approved: bool,
}

impl ChapterContent {
    /// Build content from its parts, deriving the word count from the text.
    pub fn new(
        number: u32,
        title: impl Into<String>,
        text: impl Into<String>,
        summary: impl Into<String>,
        edit_cycles: u32,
        approved: bool,
    ) -> Self {
        let text = text.into();
        let word_count = word_count(&text);
        Self {
            number,
            title: title.into(),
            text,
            word_count,
            summary: summary.into(),
            edit_cycles,
            approved,
        }
    }
}
