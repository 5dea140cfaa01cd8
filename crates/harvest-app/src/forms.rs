// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};

use crate::{Run, RunId};

pub const COMMON_TAGS: [&str; 7] = [
    "Urgent",
    "Important",
    "Verified",
    "Review",
    "Completed",
    "Draft",
    "Archive",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginFormInput {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrapeFormInput {
    pub pages: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameFormInput {
    pub run_id: RunId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesFormInput {
    pub run_id: RunId,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagsFormInput {
    pub run_id: RunId,
    pub tags: Vec<String>,
}

impl LoginFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.username.trim().is_empty() || self.password.is_empty() {
            bail!("username and password are required -- fill in both and retry");
        }
        Ok(())
    }
}

impl ScrapeFormInput {
    /// Parses the page-count field. The input must be a whole number >= 1.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let Ok(pages) = trimmed.parse::<u32>() else {
            bail!("page count {trimmed:?} is not a number -- enter a whole number of pages");
        };
        let input = Self { pages };
        input.validate()?;
        Ok(input)
    }

    pub fn validate(&self) -> Result<()> {
        if self.pages == 0 {
            bail!("page count must be at least 1");
        }
        Ok(())
    }
}

impl RenameFormInput {
    /// Rename prompt seeded with the name the run is currently shown under.
    pub fn prefilled(run: &Run) -> Self {
        Self {
            run_id: run.id,
            name: run.display_name(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("run name is required -- enter a name and retry");
        }
        Ok(())
    }

    pub fn trimmed_name(&self) -> &str {
        self.name.trim()
    }
}

impl NotesFormInput {
    pub fn prefilled(run: &Run) -> Self {
        Self {
            run_id: run.id,
            notes: run.notes.clone().unwrap_or_default(),
        }
    }
}

impl TagsFormInput {
    pub fn prefilled(run: &Run) -> Self {
        Self {
            run_id: run.id,
            tags: run.tags.clone(),
        }
    }

    pub fn from_raw(run_id: RunId, raw: &str) -> Self {
        Self {
            run_id,
            tags: parse_tags(raw),
        }
    }

    pub fn joined(&self) -> String {
        self.tags.join(", ")
    }
}

/// Splits a comma-separated tag string: trims each piece, drops empties and
/// keeps the first occurrence of duplicates.
pub fn parse_tags(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for piece in raw.split(',') {
        let tag = piece.trim();
        if !tag.is_empty() && !tags.iter().any(|existing| existing == tag) {
            tags.push(tag.to_owned());
        }
    }
    tags
}

/// Common tags not yet applied, in suggestion order.
pub fn suggested_tags(applied: &[String]) -> Vec<&'static str> {
    COMMON_TAGS
        .into_iter()
        .filter(|tag| !applied.iter().any(|existing| existing == tag))
        .collect()
}
