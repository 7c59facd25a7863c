//! Progress events emitted during a generation session.
//!
//! Events are delivered synchronously to registered sinks as they occur.
//! Sinks must be cheap; a slow sink stalls the pipeline.

use serde::{Deserialize, Serialize};

/// A progress event from the pipeline or session controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// An outline was generated or regenerated.
    OutlineGenerated {
        /// Book title.
        title: String,
        /// Number of planned chapters.
        chapters: usize,
    },
    /// A chapter pipeline run began.
    ChapterStarted {
        /// Chapter number.
        number: u32,
        /// Chapter title from the outline.
        title: String,
    },
    /// The writing step produced a draft.
    ChapterWritten {
        /// Chapter number.
        number: u32,
        /// Draft word count.
        words: usize,
    },
    /// One iteration of the expand loop ran.
    ExpandAttempt {
        /// Chapter number.
        number: u32,
        /// 1-based attempt counter.
        attempt: u32,
        /// Word count going into the attempt.
        words: usize,
        /// Target word count.
        target: u32,
    },
    /// The chapter finished below its acceptable word floor.
    WordCountWarning {
        /// Chapter number.
        number: u32,
        /// Final word count.
        words: usize,
        /// Target word count.
        target: u32,
    },
    /// One editorial scoring pass completed.
    EditCycle {
        /// Chapter number.
        number: u32,
        /// 1-based cycle counter.
        cycle: u32,
        /// Overall score from the editor.
        overall: u8,
        /// Whether the cycle approved the draft.
        approved: bool,
    },
    /// A chapter completed and was recorded in the session.
    ChapterComplete {
        /// Chapter number.
        number: u32,
        /// Final word count.
        words: usize,
        /// Edit cycles consumed.
        edit_cycles: u32,
    },
    /// A chapter run failed; the session continues with the rest.
    ChapterFailed {
        /// Chapter number.
        number: u32,
        /// Failure description.
        reason: String,
    },
    /// The writing step classified a response as a refusal.
    RefusalDetected {
        /// Chapter number.
        number: u32,
        /// 0-based generation attempt.
        attempt: u32,
    },
    /// Session state was persisted.
    SessionSaved {
        /// Session id the state was saved under.
        id: String,
    },
}

impl SessionEvent {
    /// Stable snake_case event name.
    pub fn name(&self) -> &'static str {
        self.into()
    }
}

/// Receives session events synchronously as they occur.
pub trait EventSink: Send + Sync {
    /// Handle one event.
    fn emit(&self, event: &SessionEvent);
}
