//! Shared test helpers: a scripted generation driver and an event recorder.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use vasari_core::{
    EventSink, GenerationRequest, GenerationResponse, SessionEvent, StructuredRequest,
    StructuredResponse, TokenUsage,
};
use vasari_error::{GenerationError, GenerationErrorKind, VasariResult};
use vasari_interface::{ModelProfile, ModelRegistry, ModelRole, TextGenerator};

/// A generation driver that replays scripted responses in order.
///
/// Text and structured calls consume separate queues; an exhausted queue
/// is a provider error so an under-scripted test fails loudly.
#[derive(Default)]
pub struct ScriptedGenerator {
    texts: Mutex<VecDeque<Result<String, String>>>,
    objects: Mutex<VecDeque<Result<serde_json::Value, String>>>,
    pub text_prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_text(&self, text: impl Into<String>) {
        self.texts.lock().unwrap().push_back(Ok(text.into()));
    }

    pub fn push_text_error(&self, message: &str) {
        self.texts
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    pub fn push_object(&self, object: serde_json::Value) {
        self.objects.lock().unwrap().push_back(Ok(object));
    }

    pub fn push_object_error(&self, message: &str) {
        self.objects
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, req: &GenerationRequest) -> VasariResult<GenerationResponse> {
        self.text_prompts.lock().unwrap().push(req.prompt.clone());
        match self.texts.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(GenerationResponse {
                text,
                usage: TokenUsage::new(120, 480),
            }),
            Some(Err(message)) => {
                Err(GenerationError::new(GenerationErrorKind::Provider(message)).into())
            }
            None => Err(GenerationError::new(GenerationErrorKind::Provider(
                "text script exhausted".to_string(),
            ))
            .into()),
        }
    }

    async fn generate_structured(&self, _req: &StructuredRequest) -> VasariResult<StructuredResponse> {
        match self.objects.lock().unwrap().pop_front() {
            Some(Ok(object)) => Ok(StructuredResponse {
                object,
                usage: TokenUsage::new(200, 100),
            }),
            Some(Err(message)) => {
                Err(GenerationError::new(GenerationErrorKind::Provider(message)).into())
            }
            None => Err(GenerationError::new(GenerationErrorKind::Provider(
                "structured script exhausted".to_string(),
            ))
            .into()),
        }
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}

/// Records every emitted event for later assertions.
#[derive(Default)]
pub struct EventRecorder {
    pub events: Mutex<Vec<SessionEvent>>,
}

impl EventRecorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(|e| e.name()).collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.names().iter().filter(|n| **n == name).count()
    }
}

impl EventSink for EventRecorder {
    fn emit(&self, event: &SessionEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Deterministic prose of exactly `words` words that matches no refusal
/// pattern.
pub fn prose(words: usize) -> String {
    (0..words)
        .map(|i| format!("w{i}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// A refusal response carrying a clean salvageable paragraph of `words`
/// words.
pub fn refusal_with_salvage(words: usize) -> String {
    format!(
        "I'm sorry, but I cannot write this chapter. Would you like an outline instead?\n\n{}",
        prose(words)
    )
}

/// A refusal with no usable content at all.
pub fn bare_refusal() -> String {
    "I'm sorry, but as an AI I cannot produce this chapter.".to_string()
}

/// Registry with all five roles configured.
pub fn registry() -> ModelRegistry {
    ModelRegistry::new()
        .with_role(
            ModelRole::Outline,
            ModelProfile::new("architect-large", Some(0.7), Some(8_192), 3.0, 15.0),
        )
        .with_role(
            ModelRole::Planning,
            ModelProfile::new("planner-mid", Some(0.6), Some(4_096), 1.0, 5.0),
        )
        .with_role(
            ModelRole::Writing,
            ModelProfile::new("prose-large", Some(0.9), Some(8_192), 3.0, 15.0),
        )
        .with_role(
            ModelRole::Editing,
            ModelProfile::new("critic-mid", Some(0.3), Some(2_048), 1.0, 5.0),
        )
        .with_role(
            ModelRole::Continuity,
            ModelProfile::new("summarist-small", Some(0.2), Some(2_048), 0.5, 1.5),
        )
}

/// A minimal valid detailed-plan object.
pub fn plan_object() -> serde_json::Value {
    serde_json::json!({
        "title": "The Long Crossing",
        "scenes": [
            {
                "setting": "the river delta at dawn",
                "characters": ["Mara"],
                "objective": "leave without being seen",
                "conflict": "the ferryman names his price",
                "resolution": "a bargain neither wanted",
                "target_words": 600
            }
        ],
        "point_of_view": "third person limited",
        "tone": "quietly tense",
        "bridge_from_previous": "picks up the night after the fire",
        "bridge_to_next": "the letter remains unopened"
    })
}

/// An edit-result object with the given overall score.
pub fn edit_object(overall: u8, rewrite_instructions: Option<&str>) -> serde_json::Value {
    serde_json::json!({
        "prose": overall,
        "plot": overall,
        "character": overall,
        "pacing": overall,
        "dialogue": overall,
        "overall": overall,
        "notes": "scored by scripted editor",
        "approved": overall >= 7,
        "rewrite_instructions": rewrite_instructions
    })
}

/// An outline object with `chapters` chapters.
pub fn outline_object(chapters: usize, target_words: u32) -> serde_json::Value {
    let chapter_objects: Vec<serde_json::Value> = (1..=chapters)
        .map(|n| {
            serde_json::json!({
                "number": n,
                "title": format!("Chapter {n}"),
                "summary": format!("Things happen in chapter {n}."),
                "target_words": target_words,
                "key_events": [format!("event {n}")],
                "characters": ["Mara"]
            })
        })
        .collect();
    serde_json::json!({
        "title": "The Cartographer's Debt",
        "synopsis": "A mapmaker discovers her maps rewrite the places they describe.",
        "themes": ["obligation", "memory"],
        "audience": "adult fantasy readers",
        "chapters": chapter_objects,
        "characters": [
            { "name": "Mara", "description": "a mapmaker", "arc": "learns the cost of precision" }
        ]
    })
}
