//! Exported book structure and session progress snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chapter::ChapterContent;
use crate::outline::Outline;

/// Generation metadata attached to an exported book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct BookMetadata {
    /// Session the book was generated in.
    session_id: String,
    /// When the export was produced.
    generated_at: DateTime<Utc>,
    /// Distinct model identifiers that contributed.
    models: Vec<String>,
}

impl BookMetadata {
    /// Create metadata stamped with the current time.
    pub fn new(session_id: impl Into<String>, models: Vec<String>) -> Self {
        Self {
            session_id: session_id.into(),
            generated_at: Utc::now(),
            models,
        }
    }
}

/// The final exported book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct Book {
    /// Book title.
    title: String,
    /// The outline the book was generated from.
    outline: Outline,
    /// Approved chapters in order.
    chapters: Vec<ChapterContent>,
    /// Total words across chapters.
    total_words: usize,
    /// Total generation cost in USD.
    total_cost: f64,
    /// Generation metadata.
    metadata: BookMetadata,
}

impl Book {
    /// Assemble a book from approved chapters.
    pub fn new(
        title: impl Into<String>,
        outline: Outline,
        chapters: Vec<ChapterContent>,
        total_cost: f64,
        metadata: BookMetadata,
    ) -> Self {
        let total_words = chapters.iter().map(|c| c.word_count).sum();
        Self {
            title: title.into(),
            outline,
            chapters,
            total_words,
            total_cost,
            metadata,
        }
    }
}

/// Point-in-time progress snapshot for a session.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, derive_getters::Getters)]
pub struct Progress {
    /// Chapters in the outline.
    total_chapters: usize,
    /// Chapters generated and approved.
    completed_chapters: usize,
    /// Chapters whose last run failed.
    failed_chapters: usize,
    /// Total words across completed chapters.
    total_words: usize,
    /// Cost accrued so far in USD.
    total_cost: f64,
    /// Estimated cost to finish the remaining chapters.
    estimated_remaining_cost: f64,
}

impl Progress {
    /// Create a snapshot.
    pub fn new(
        total_chapters: usize,
        completed_chapters: usize,
        failed_chapters: usize,
        total_words: usize,
        total_cost: f64,
        estimated_remaining_cost: f64,
    ) -> Self {
        Self {
            total_chapters,
            completed_chapters,
            failed_chapters,
            total_words,
            total_cost,
            estimated_remaining_cost,
        }
    }
}
