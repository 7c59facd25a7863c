//! Per-chapter detailed planning types.

use serde::{Deserialize, Serialize};

/// A single scene within a detailed chapter plan.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScenePlan {
    /// Where the scene takes place.
    #[serde(default)]
    pub setting: String,
    /// Characters present in the scene.
    #[serde(default)]
    pub characters: Vec<String>,
    /// What the scene sets out to accomplish.
    #[serde(default)]
    pub objective: String,
    /// Central conflict or tension.
    #[serde(default)]
    pub conflict: String,
    /// How the scene resolves or hands off.
    #[serde(default)]
    pub resolution: String,
    /// Target word count for the scene.
    #[serde(default)]
    pub target_words: u32,
}

/// Scene-level plan produced at the planning step of the pipeline.
///
/// Consumed by the writing and editing steps; not persisted beyond chapter
/// completion except as a historical record on the outcome.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DetailedChapterPlan {
    /// Chapter number this plan covers.
    #[serde(default)]
    pub chapter_number: u32,
    /// Chapter title (may refine the outline title).
    #[serde(default)]
    pub title: String,
    /// Ordered scenes.
    #[serde(default)]
    pub scenes: Vec<ScenePlan>,
    /// Narrative point of view for the chapter.
    #[serde(default)]
    pub point_of_view: String,
    /// Tonal direction for the prose.
    #[serde(default)]
    pub tone: String,
    /// How the chapter picks up from the previous one.
    #[serde(default)]
    pub bridge_from_previous: String,
    /// What the chapter sets up for the next one.
    #[serde(default)]
    pub bridge_to_next: String,
}

impl DetailedChapterPlan {
    /// Render the plan as compact text for inclusion in a writer prompt.
    pub fn as_context(&self) -> String {
        let mut out = format!("Chapter {}: {}\n", self.chapter_number, self.title);
        if !self.point_of_view.is_empty() {
            out.push_str(&format!("Point of view: {}\n", self.point_of_view));
        }
        if !self.tone.is_empty() {
            out.push_str(&format!("Tone: {}\n", self.tone));
        }
        if !self.bridge_from_previous.is_empty() {
            out.push_str(&format!("Opens from: {}\n", self.bridge_from_previous));
        }
        for (index, scene) in self.scenes.iter().enumerate() {
            out.push_str(&format!(
                "Scene {}: {} — {} ({} words)\n",
                index + 1,
                scene.setting,
                scene.objective,
                scene.target_words,
            ));
            if !scene.conflict.is_empty() {
                out.push_str(&format!("  Conflict: {}\n", scene.conflict));
            }
            if !scene.resolution.is_empty() {
                out.push_str(&format!("  Resolution: {}\n", scene.resolution));
            }
        }
        if !self.bridge_to_next.is_empty() {
            out.push_str(&format!("Leads into: {}", self.bridge_to_next));
        }
        out
    }
}
