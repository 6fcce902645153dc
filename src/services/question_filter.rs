use serde::Serialize;

use crate::domain::models::Question;

const WILDCARD: &str = "All";

/// Class or subject predicate: a wildcard or an exact tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TagFilter {
    All,
    Exact(String),
}

impl TagFilter {
    /// `"All"`, an empty value and no value all mean "no restriction".
    pub(crate) fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") | Some(WILDCARD) => Self::All,
            Some(tag) => Self::Exact(tag.to_string()),
        }
    }

    fn matches(&self, tag: &str) -> bool {
        match self {
            Self::All => true,
            Self::Exact(expected) => expected == tag,
        }
    }

    fn is_active(&self) -> bool {
        matches!(self, Self::Exact(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct GalleryFilter {
    pub(crate) class_level: TagFilter,
    pub(crate) subject: TagFilter,
    pub(crate) chapter_search: String,
}

impl GalleryFilter {
    pub(crate) fn new(class_level: TagFilter, subject: TagFilter, chapter_search: &str) -> Self {
        Self { class_level, subject, chapter_search: chapter_search.to_string() }
    }

    pub(crate) fn has_active_filters(&self) -> bool {
        self.class_level.is_active()
            || self.subject.is_active()
            || !self.chapter_search.trim().is_empty()
    }

    fn matches(&self, question: &Question, chapter_needle: Option<&str>) -> bool {
        if !self.class_level.matches(&question.class_level) {
            return false;
        }
        if !self.subject.matches(&question.subject) {
            return false;
        }
        match chapter_needle {
            Some(needle) => question.chapter.to_lowercase().contains(needle),
            None => true,
        }
    }
}

/// Gallery filtering. Keeps the input order.
pub(crate) fn filter_questions<'a>(
    questions: &'a [Question],
    filter: &GalleryFilter,
) -> Vec<&'a Question> {
    // The emptiness check trims, the match itself uses the raw lowercased search.
    let needle = (!filter.chapter_search.trim().is_empty())
        .then(|| filter.chapter_search.to_lowercase());

    questions
        .iter()
        .filter(|question| filter.matches(question, needle.as_deref()))
        .collect()
}

/// Candidates for a test: nothing until both class level and subject are chosen.
pub(crate) fn builder_questions<'a>(
    questions: &'a [Question],
    class_level: &str,
    subject: &str,
) -> Vec<&'a Question> {
    if class_level.is_empty() || subject.is_empty() {
        return Vec::new();
    }

    questions
        .iter()
        .filter(|question| question.class_level == class_level && question.subject == subject)
        .collect()
}

/// Question ids picked for the test being composed, in the order they were picked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub(crate) struct SelectionSet {
    ids: Vec<String>,
}

impl SelectionSet {
    /// Inserts `id` if absent, removes it if present. Returns whether it is now selected.
    pub(crate) fn toggle(&mut self, id: &str) -> bool {
        if let Some(position) = self.ids.iter().position(|existing| existing == id) {
            self.ids.remove(position);
            false
        } else {
            self.ids.push(id.to_string());
            true
        }
    }

    /// Drops every id in `submitted`, keeping the order of the rest.
    pub(crate) fn remove_all(&mut self, submitted: &[String]) {
        self.ids.retain(|id| !submitted.contains(id));
    }

    pub(crate) fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|existing| existing == id)
    }

    pub(crate) fn len(&self) -> usize {
        self.ids.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub(crate) fn ids(&self) -> &[String] {
        &self.ids
    }
}
