//! Editorial review scoring types.

use serde::{Deserialize, Serialize};

/// Minimum overall score for approval under normal policy.
pub const APPROVAL_THRESHOLD: u8 = 7;

/// Scores and verdict from one editorial pass over a draft.
///
/// All scores are integers on a 1–10 scale. Under normal policy `approved`
/// is true iff `overall >= APPROVAL_THRESHOLD`; the pipeline may force
/// approval once the edit-cycle budget is exhausted, which is a policy
/// override rather than a scoring contract violation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EditResult {
    /// Prose quality score.
    #[serde(default)]
    pub prose: u8,
    /// Plot coherence score.
    #[serde(default)]
    pub plot: u8,
    /// Character consistency score.
    #[serde(default)]
    pub character: u8,
    /// Pacing score.
    #[serde(default)]
    pub pacing: u8,
    /// Dialogue quality score.
    #[serde(default)]
    pub dialogue: u8,
    /// Overall score; drives the approval decision.
    #[serde(default)]
    pub overall: u8,
    /// Free-text editorial notes.
    #[serde(default)]
    pub notes: String,
    /// Approval verdict.
    #[serde(default)]
    pub approved: bool,
    /// Instructions for the rewrite when rejected.
    #[serde(default)]
    pub rewrite_instructions: Option<String>,
}

impl EditResult {
    /// Clamp scores into the 1–10 range and re-derive `approved` from
    /// `overall`, discarding whatever verdict the model claimed.
    pub fn normalized(mut self) -> Self {
        for score in [
            &mut self.prose,
            &mut self.plot,
            &mut self.character,
            &mut self.pacing,
            &mut self.dialogue,
            &mut self.overall,
        ] {
            *score = (*score).clamp(1, 10);
        }
        self.approved = self.overall >= APPROVAL_THRESHOLD;
        self
    }
}
