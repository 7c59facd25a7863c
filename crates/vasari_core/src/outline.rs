//! Outline types and structural edits.
//!
//! The outline is the single structural authority for a book: an ordered
//! sequence of chapter plans plus the cast of characters. All structural
//! edits go through [`Outline`] methods, each of which re-establishes the
//! invariant that chapter numbers form a contiguous `1..=N` sequence.

use serde::{Deserialize, Serialize};
use vasari_error::{OutlineError, OutlineErrorKind};

/// A character sheet carried alongside the outline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, derive_new::new)]
pub struct CharacterProfile {
    /// Character name as it appears in chapter plans.
    pub name: String,
    /// Short description of who the character is.
    #[serde(default)]
    pub description: String,
    /// Intended arc across the book.
    #[serde(default)]
    pub arc: String,
}

/// Plan for a single chapter within the outline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChapterPlan {
    /// 1-based chapter number, unique within the outline.
    pub number: u32,
    /// Chapter title.
    pub title: String,
    /// What happens in this chapter.
    #[serde(default)]
    pub summary: String,
    /// Target word count for the written chapter.
    #[serde(default)]
    pub target_words: u32,
    /// Key events the chapter must cover.
    #[serde(default)]
    pub key_events: Vec<String>,
    /// Names of characters appearing in the chapter.
    #[serde(default)]
    pub characters: Vec<String>,
}

/// Inputs for outline generation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, derive_getters::Getters)]
pub struct OutlineBrief {
    /// Working title for the book.
    title: String,
    /// One-paragraph premise.
    premise: String,
    /// Intended audience description.
    #[serde(default)]
    audience: String,
    /// Themes to weave through the outline.
    #[serde(default)]
    themes: Vec<String>,
    /// Number of chapters to plan.
    chapter_count: u32,
    /// Target words per chapter.
    words_per_chapter: u32,
}

impl OutlineBrief {
    /// Create a new brief.
    pub fn new(
        title: impl Into<String>,
        premise: impl Into<String>,
        audience: impl Into<String>,
        themes: Vec<String>,
        chapter_count: u32,
        words_per_chapter: u32,
    ) -> Self {
        Self {
            title: title.into(),
            premise: premise.into(),
            audience: audience.into(),
            themes,
            chapter_count,
            words_per_chapter,
        }
    }
}

/// The book outline: title, synopsis, themes, audience, chapters, cast.
///
/// Created once by an outline generation call; mutated only through the
/// structural edit methods below, each of which renumbers chapters back to
/// a contiguous `1..=N` sequence.
///
/// # Examples
///
/// ```
/// use vasari_core::{ChapterPlan, Outline};
///
/// let chapters = (1..=3)
///     .map(|n| ChapterPlan {
///         number: n,
///         title: format!("Chapter {n}"),
///         ..ChapterPlan::default()
///     })
///     .collect();
/// let mut outline = Outline::new("Title", "Synopsis", vec![], "Adults", chapters, vec![]);
///
/// outline.remove_chapters(&[2]).unwrap();
/// let numbers: Vec<u32> = outline.chapters().iter().map(|c| c.number).collect();
/// assert_eq!(numbers, vec![1, 2]);
/// assert_eq!(outline.chapters()[1].title, "Chapter 3");
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, derive_getters::Getters)]
pub struct Outline {
    /// Book title.
    title: String,
    /// One-paragraph synopsis of the whole book.
    #[serde(default)]
    synopsis: String,
    /// Themes running through the book.
    #[serde(default)]
    themes: Vec<String>,
    /// Intended audience.
    #[serde(default)]
    audience: String,
    /// Ordered chapter plans, numbered `1..=N`.
    #[serde(default)]
    chapters: Vec<ChapterPlan>,
    /// Character sheets.
    #[serde(default)]
    characters: Vec<CharacterProfile>,
}

impl Outline {
    /// Create a new outline; chapters are renumbered to `1..=N`.
    pub fn new(
        title: impl Into<String>,
        synopsis: impl Into<String>,
        themes: Vec<String>,
        audience: impl Into<String>,
        chapters: Vec<ChapterPlan>,
        characters: Vec<CharacterProfile>,
    ) -> Self {
        let mut outline = Self {
            title: title.into(),
            synopsis: synopsis.into(),
            themes,
            audience: audience.into(),
            chapters,
            characters,
        };
        outline.renumber();
        outline
    }

    /// Find a chapter plan by number.
    pub fn chapter(&self, number: u32) -> Option<&ChapterPlan> {
        self.chapters.iter().find(|c| c.number == number)
    }

    /// Number of chapters in the outline.
    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    /// Whether the outline has no chapters.
    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    /// Insert a chapter at a 1-based position (`len + 1` appends).
    ///
    /// # Errors
    ///
    /// Returns an error if `position` is 0 or greater than `len + 1`.
    pub fn insert_chapter(&mut self, position: u32, plan: ChapterPlan) -> Result<(), OutlineError> {
        if position == 0 || position as usize > self.chapters.len() + 1 {
            return Err(OutlineError::new(OutlineErrorKind::PositionOutOfRange {
                position,
                len: self.chapters.len(),
            }));
        }
        self.chapters.insert(position as usize - 1, plan);
        self.renumber();
        Ok(())
    }

    /// Remove the named chapters.
    ///
    /// # Errors
    ///
    /// Returns an error if any number is unknown or if the edit would
    /// leave the outline empty.
    pub fn remove_chapters(&mut self, numbers: &[u32]) -> Result<(), OutlineError> {
        for number in numbers {
            if self.chapter(*number).is_none() {
                return Err(OutlineError::new(OutlineErrorKind::UnknownChapter(*number)));
            }
        }
        if numbers.len() >= self.chapters.len() {
            return Err(OutlineError::new(OutlineErrorKind::EmptyOutline));
        }
        self.chapters.retain(|c| !numbers.contains(&c.number));
        self.renumber();
        Ok(())
    }

    /// Move a chapter from one 1-based position to another.
    ///
    /// # Errors
    ///
    /// Returns an error if either position names a chapter that does not
    /// exist.
    pub fn move_chapter(&mut self, from: u32, to: u32) -> Result<(), OutlineError> {
        if self.chapter(from).is_none() {
            return Err(OutlineError::new(OutlineErrorKind::UnknownChapter(from)));
        }
        if to == 0 || to as usize > self.chapters.len() {
            return Err(OutlineError::new(OutlineErrorKind::PositionOutOfRange {
                position: to,
                len: self.chapters.len(),
            }));
        }
        let plan = self.chapters.remove(from as usize - 1);
        self.chapters.insert(to as usize - 1, plan);
        self.renumber();
        Ok(())
    }

    /// Merge two adjacent chapters into one.
    ///
    /// The merged chapter keeps the first chapter's position; titles are
    /// joined, summaries concatenated, targets summed, and event/character
    /// lists unioned.
    ///
    /// # Errors
    ///
    /// Returns an error if the chapters are unknown or not adjacent.
    pub fn merge_chapters(&mut self, first: u32, second: u32) -> Result<(), OutlineError> {
        if self.chapter(first).is_none() {
            return Err(OutlineError::new(OutlineErrorKind::UnknownChapter(first)));
        }
        if self.chapter(second).is_none() {
            return Err(OutlineError::new(OutlineErrorKind::UnknownChapter(second)));
        }
        if second != first + 1 {
            return Err(OutlineError::new(OutlineErrorKind::NonAdjacentMerge {
                first,
                second,
            }));
        }
        let absorbed = self.chapters.remove(second as usize - 1);
        let keeper = &mut self.chapters[first as usize - 1];
        keeper.title = format!("{} / {}", keeper.title, absorbed.title);
        if !absorbed.summary.is_empty() {
            if !keeper.summary.is_empty() {
                keeper.summary.push(' ');
            }
            keeper.summary.push_str(&absorbed.summary);
        }
        keeper.target_words += absorbed.target_words;
        keeper.key_events.extend(absorbed.key_events);
        for name in absorbed.characters {
            if !keeper.characters.contains(&name) {
                keeper.characters.push(name);
            }
        }
        self.renumber();
        Ok(())
    }

    /// Apply a structural edit.
    pub fn apply(&mut self, edit: OutlineEdit) -> Result<(), OutlineError> {
        match edit {
            OutlineEdit::Insert { position, plan } => self.insert_chapter(position, *plan),
            OutlineEdit::Remove { chapters } => self.remove_chapters(&chapters),
            OutlineEdit::Move { from, to } => self.move_chapter(from, to),
            OutlineEdit::Merge { first, second } => self.merge_chapters(first, second),
        }
    }

    /// Consume the outline and return it with contiguous numbering.
    ///
    /// Used after deserializing a model-produced outline whose chapter
    /// numbers cannot be trusted.
    pub fn renumbered(mut self) -> Self {
        self.renumber();
        self
    }

    /// Fill in a default word target for chapters that came back without one.
    pub fn with_default_target_words(mut self, words: u32) -> Self {
        for chapter in &mut self.chapters {
            if chapter.target_words == 0 {
                chapter.target_words = words;
            }
        }
        self
    }

    /// Re-establish contiguous `1..=N` chapter numbering in order.
    fn renumber(&mut self) {
        for (index, chapter) in self.chapters.iter_mut().enumerate() {
            chapter.number = index as u32 + 1;
        }
    }
}

/// A structural outline edit, applied through [`Outline::apply`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum OutlineEdit {
    /// Insert a chapter at a 1-based position.
    Insert {
        /// Position to insert at (`len + 1` appends).
        position: u32,
        /// The chapter plan to insert.
        plan: Box<ChapterPlan>,
    },
    /// Remove the named chapters.
    Remove {
        /// Chapter numbers to remove.
        chapters: Vec<u32>,
    },
    /// Move a chapter to a new position.
    Move {
        /// Current chapter number.
        from: u32,
        /// Destination position.
        to: u32,
    },
    /// Merge two adjacent chapters.
    Merge {
        /// First chapter (keeps its position).
        first: u32,
        /// Second chapter (absorbed).
        second: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outline(n: u32) -> Outline {
        let chapters = (1..=n)
            .map(|i| ChapterPlan {
                number: i,
                title: format!("Chapter {i}"),
                target_words: 1_000,
                ..ChapterPlan::default()
            })
            .collect();
        Outline::new("Test", "", vec![], "", chapters, vec![])
    }

    #[test]
    fn numbers_stay_contiguous_after_edit_sequences() {
        let mut o = outline(5);
        o.remove_chapters(&[2, 4]).unwrap();
        o.insert_chapter(2, ChapterPlan::default()).unwrap();
        o.move_chapter(4, 1).unwrap();
        o.merge_chapters(2, 3).unwrap();
        let numbers: Vec<u32> = o.chapters().iter().map(|c| c.number).collect();
        assert_eq!(numbers, (1..=o.len() as u32).collect::<Vec<_>>());
    }

    #[test]
    fn remove_renumbers_following_chapters() {
        let mut o = outline(3);
        o.remove_chapters(&[2]).unwrap();
        assert_eq!(o.len(), 2);
        assert_eq!(o.chapters()[1].number, 2);
        assert_eq!(o.chapters()[1].title, "Chapter 3");
    }

    #[test]
    fn cannot_remove_every_chapter() {
        let mut o = outline(2);
        let err = o.remove_chapters(&[1, 2]).unwrap_err();
        assert_eq!(err.kind, OutlineErrorKind::EmptyOutline);
    }

    #[test]
    fn merge_requires_adjacency() {
        let mut o = outline(4);
        let err = o.merge_chapters(1, 3).unwrap_err();
        assert!(matches!(err.kind, OutlineErrorKind::NonAdjacentMerge { .. }));
    }

    #[test]
    fn merge_sums_targets_and_unions_characters() {
        let mut o = outline(2);
        o.chapters[0].characters = vec!["Ada".into(), "Brin".into()];
        o.chapters[1].characters = vec!["Brin".into(), "Cole".into()];
        o.merge_chapters(1, 2).unwrap();
        assert_eq!(o.len(), 1);
        assert_eq!(o.chapters()[0].target_words, 2_000);
        assert_eq!(o.chapters()[0].characters, vec!["Ada", "Brin", "Cole"]);
    }
}
