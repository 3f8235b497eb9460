//! Builds the text that gets embedded for an idea.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::idea::Idea;

/// Separator placed between fragments.
pub const FRAGMENT_SEPARATOR: &str = " | ";

/// The embedding input for one idea.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectedText(String);

impl ProjectedText {
    /// The text as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether there is anything to embed.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Consume into the inner string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ProjectedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn present(field: Option<&str>) -> Option<&str> {
    field.filter(|s| !s.trim().is_empty())
}

/// Concatenate an idea's text fields in a fixed order.
///
/// Title, description, content, then `Tags: ...` and `Category: ...`.
/// Blank fields are left out. Tag names are sorted and de-duplicated so the
/// result does not depend on the order tags were attached in.
pub fn project(idea: &Idea) -> ProjectedText {
    let mut parts: Vec<String> = Vec::with_capacity(5);

    for field in [
        Some(idea.title.as_str()),
        idea.description.as_deref(),
        idea.content.as_deref(),
    ] {
        if let Some(text) = present(field) {
            parts.push(text.to_string());
        }
    }

    let tags: BTreeSet<&str> = idea
        .tags
        .iter()
        .map(String::as_str)
        .filter(|t| !t.trim().is_empty())
        .collect();
    if !tags.is_empty() {
        let tags: Vec<&str> = tags.into_iter().collect();
        parts.push(format!("Tags: {}", tags.join(", ")));
    }

    if let Some(category) = present(idea.category.as_deref()) {
        parts.push(format!("Category: {category}"));
    }

    ProjectedText(parts.join(FRAGMENT_SEPARATOR))
}
