//! Tests for the chapter pipeline state machine: refusal retries, the
//! expand loop, edit cycles, and failure propagation.

mod common;

use std::sync::Arc;

use common::*;
use vasari_core::{word_count, ChapterPlan};
use vasari_engine::{
    ChapterOutcome, ChapterPipeline, ContinuityState, ContinuityTracker, EngineConfig, EventBus,
    RefusalClassifier,
};
use vasari_error::VasariResult;
use vasari_interface::PricingTable;

fn chapter_plan(target_words: u32) -> ChapterPlan {
    ChapterPlan {
        number: 1,
        title: "The Long Crossing".to_string(),
        summary: "Mara leaves the delta.".to_string(),
        target_words,
        key_events: vec!["the ferryman's bargain".to_string()],
        characters: vec!["Mara".to_string()],
    }
}

async fn run_chapter(
    generator: &Arc<ScriptedGenerator>,
    recorder: &Arc<EventRecorder>,
    plan: &ChapterPlan,
    continuity: &ContinuityState,
) -> VasariResult<ChapterOutcome> {
    let registry = registry();
    let config = EngineConfig::default();
    let classifier = RefusalClassifier::new();
    let tracker =
        ContinuityTracker::new(*config.summary_word_cap(), *config.ending_bridge_chars());
    let pricing = PricingTable::from_registry(&registry);
    let mut events = EventBus::new();
    events.subscribe(recorder.clone());
    let pipeline = ChapterPipeline::new(
        generator,
        &registry,
        &config,
        &classifier,
        &tracker,
        &pricing,
        &events,
    );
    pipeline.run(plan, continuity, None).await
}

#[tokio::test]
async fn happy_path_runs_all_four_phases() {
    let generator = ScriptedGenerator::new();
    let recorder = EventRecorder::new();
    generator.push_object(plan_object());
    generator.push_text(prose(100));
    generator.push_object(edit_object(8, None));
    generator.push_text("Mara crossed the river and owed the ferryman.");

    let outcome = run_chapter(&generator, &recorder, &chapter_plan(100), &ContinuityState::default())
        .await
        .unwrap();

    assert!(outcome.content.approved);
    assert_eq!(outcome.content.word_count, 100);
    assert_eq!(outcome.content.edit_cycles, 1);
    assert_eq!(
        outcome.continuity.rolling_summary,
        "Mara crossed the river and owed the ferryman."
    );
    assert!(!outcome.continuity.previous_ending.is_empty());
    // plan + write + edit + summary
    assert_eq!(outcome.costs.len(), 4);
    assert_eq!(
        recorder.names(),
        vec!["chapter_started", "chapter_written", "edit_cycle", "chapter_complete"]
    );
}

#[tokio::test]
async fn best_salvage_across_attempts_wins_by_word_count() {
    let generator = ScriptedGenerator::new();
    let recorder = EventRecorder::new();
    generator.push_object(plan_object());
    for words in [40usize, 80, 150, 60] {
        generator.push_text(refusal_with_salvage(words));
    }
    generator.push_object(edit_object(8, None));
    generator.push_text("Summary.");

    let outcome = run_chapter(&generator, &recorder, &chapter_plan(150), &ContinuityState::default())
        .await
        .unwrap();

    assert_eq!(outcome.content.word_count, 150);
    assert_eq!(recorder.count("refusal_detected"), 4);
    assert!(!outcome.content.text.contains("sorry"));
}

#[tokio::test]
async fn useless_salvage_leaves_empty_draft_for_regeneration() {
    let generator = ScriptedGenerator::new();
    let recorder = EventRecorder::new();
    generator.push_object(plan_object());
    for _ in 0..4 {
        generator.push_text(bare_refusal());
    }
    // The expand loop regenerates from scratch on a near-empty draft.
    generator.push_text(prose(100));
    generator.push_object(edit_object(8, None));
    generator.push_text("Summary.");

    let outcome = run_chapter(&generator, &recorder, &chapter_plan(100), &ContinuityState::default())
        .await
        .unwrap();

    assert_eq!(outcome.content.word_count, 100);
    assert_eq!(recorder.count("refusal_detected"), 4);
    assert_eq!(recorder.count("expand_attempt"), 1);
}

#[tokio::test]
async fn expand_loop_stops_once_above_the_floor() {
    let generator = ScriptedGenerator::new();
    let recorder = EventRecorder::new();
    generator.push_object(plan_object());
    generator.push_text(prose(400));
    generator.push_text(prose(900));
    generator.push_object(edit_object(8, None));
    generator.push_text("Summary.");

    let outcome = run_chapter(&generator, &recorder, &chapter_plan(1_000), &ContinuityState::default())
        .await
        .unwrap();

    // 400 < floor(1000 * 0.85) = 850, one expansion lands at 900 >= 850.
    assert_eq!(outcome.content.word_count, 900);
    assert_eq!(recorder.count("expand_attempt"), 1);
    assert_eq!(recorder.count("word_count_warning"), 0);

    let prompts = generator.text_prompts.lock().unwrap();
    assert!(prompts[1].contains("1000-word target"));
}

#[tokio::test]
async fn expansion_that_shrinks_is_rejected_and_loop_stops() {
    let generator = ScriptedGenerator::new();
    let recorder = EventRecorder::new();
    generator.push_object(plan_object());
    generator.push_text(prose(400));
    generator.push_text(prose(350));
    generator.push_object(edit_object(8, None));
    generator.push_text("Summary.");

    let outcome = run_chapter(&generator, &recorder, &chapter_plan(1_000), &ContinuityState::default())
        .await
        .unwrap();

    assert_eq!(outcome.content.word_count, 400);
    assert_eq!(recorder.count("expand_attempt"), 1);
    assert_eq!(recorder.count("word_count_warning"), 1);
}

#[tokio::test]
async fn expansion_preamble_and_injected_refusal_are_removed() {
    let generator = ScriptedGenerator::new();
    let recorder = EventRecorder::new();
    generator.push_object(plan_object());
    generator.push_text(prose(400));
    generator.push_text(format!(
        "Below is the expanded chapter:\n{}\n\nI'm sorry, I cannot continue this as an AI model.",
        prose(900)
    ));
    generator.push_object(edit_object(8, None));
    generator.push_text("Summary.");

    let outcome = run_chapter(&generator, &recorder, &chapter_plan(1_000), &ContinuityState::default())
        .await
        .unwrap();

    assert_eq!(outcome.content.word_count, 900);
    assert!(!outcome.content.text.contains("sorry"));
    assert!(!outcome.content.text.contains("Below is"));
}

#[tokio::test]
async fn three_rejections_force_approval() {
    let generator = ScriptedGenerator::new();
    let recorder = EventRecorder::new();
    generator.push_object(plan_object());
    generator.push_text(prose(100));
    generator.push_object(edit_object(5, Some("tighten the pacing")));
    generator.push_text(prose(110));
    generator.push_object(edit_object(5, Some("still sags in the middle")));
    generator.push_text(prose(120));
    generator.push_object(edit_object(5, None));
    generator.push_text("Summary.");

    let outcome = run_chapter(&generator, &recorder, &chapter_plan(100), &ContinuityState::default())
        .await
        .unwrap();

    assert!(outcome.content.approved);
    assert_eq!(outcome.content.edit_cycles, 3);
    assert_eq!(outcome.content.word_count, 120);
    assert_eq!(recorder.count("edit_cycle"), 3);

    // The second writing prompt carries the rewrite directive and the
    // rejected draft.
    let prompts = generator.text_prompts.lock().unwrap();
    assert!(prompts[1].contains("This is a rewrite"));
    assert!(prompts[1].contains("tighten the pacing"));
    assert!(prompts[1].contains(&prose(100)));
}

#[tokio::test]
async fn provider_failure_is_a_hard_chapter_error() {
    let generator = ScriptedGenerator::new();
    let recorder = EventRecorder::new();
    generator.push_object(plan_object());
    generator.push_text_error("connection reset");

    let result =
        run_chapter(&generator, &recorder, &chapter_plan(100), &ContinuityState::default()).await;

    assert!(result.is_err());
    assert_eq!(recorder.count("chapter_complete"), 0);
}

#[tokio::test]
async fn writer_context_carries_continuity_state() {
    let generator = ScriptedGenerator::new();
    let recorder = EventRecorder::new();
    generator.push_object(plan_object());
    generator.push_text(prose(100));
    generator.push_object(edit_object(8, None));
    generator.push_text("Summary.");

    let continuity = ContinuityState {
        rolling_summary: "Mara has already crossed two borders.".to_string(),
        previous_ending: "The lantern guttered as the gate closed.".to_string(),
    };
    run_chapter(&generator, &recorder, &chapter_plan(100), &continuity)
        .await
        .unwrap();

    let prompts = generator.text_prompts.lock().unwrap();
    assert!(prompts[0].contains("Mara has already crossed two borders."));
    assert!(prompts[0].contains("The lantern guttered as the gate closed."));
    assert!(word_count(&prompts[0]) > 0);
}
