// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Deserializer, Serialize};
use time::{Date, OffsetDateTime};

use crate::ids::*;
use crate::timefmt;

pub const FALLBACK_NAME_PREFIX: &str = "Data";
pub const PAGE_SIZE_CHOICES: [usize; 5] = [5, 10, 25, 50, 100];
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// One invocation of the collection job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub id: RunId,
    #[serde(default)]
    pub name: Option<String>,
    pub pages: u32,
    #[serde(with = "timefmt::naive_utc")]
    pub created_at: OffsetDateTime,
    #[serde(default)]
    pub total_data: Option<u64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, with = "tag_list")]
    pub tags: Vec<String>,
}

impl Run {
    /// Name shown everywhere the run is rendered or exported.
    pub fn display_name(&self) -> String {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name.to_owned(),
            _ => fallback_name(self.id),
        }
    }

    pub fn total_data_or_zero(&self) -> u64 {
        self.total_data.unwrap_or(0)
    }
}

pub fn fallback_name(id: RunId) -> String {
    format!("{FALLBACK_NAME_PREFIX} #{id}")
}

/// One collected contact record. Read-only from the dashboard's side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    #[serde(rename = "nama", default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(rename = "no_telpon", default, deserialize_with = "null_as_empty")]
    pub phone: String,
    #[serde(rename = "no_hp", default, deserialize_with = "null_as_empty")]
    pub mobile: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub email: String,
    #[serde(rename = "alamat", default)]
    pub address: Option<String>,
    #[serde(rename = "sumber", default)]
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Screen {
    Login,
    Runs,
    Entries(RunId),
}

impl Screen {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Runs => "runs",
            Self::Entries(_) => "entries",
        }
    }

    pub const fn requires_session(self) -> bool {
        !matches!(self, Self::Login)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunSortField {
    Name,
    Pages,
    TotalData,
    CreatedAt,
}

impl RunSortField {
    pub const ALL: [Self; 4] = [Self::Name, Self::Pages, Self::TotalData, Self::CreatedAt];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Pages => "pages",
            Self::TotalData => "total data",
            Self::CreatedAt => "created",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSort {
    pub field: RunSortField,
    pub direction: SortDirection,
}

impl Default for RunSort {
    fn default() -> Self {
        Self {
            field: RunSortField::CreatedAt,
            direction: SortDirection::Desc,
        }
    }
}

impl RunSort {
    /// Same field flips the order; a new field starts ascending.
    pub fn toggled(self, field: RunSortField) -> Self {
        if self.field == field {
            Self {
                field,
                direction: self.direction.flipped(),
            }
        } else {
            Self {
                field,
                direction: SortDirection::Asc,
            }
        }
    }
}

/// Inclusive calendar-day bounds on `Run::created_at`, evaluated in the
/// display zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<Date>,
    pub end: Option<Date>,
}

impl DateRange {
    pub const fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn admits(&self, instant: OffsetDateTime) -> bool {
        let after_start = self
            .start
            .is_none_or(|start| instant >= timefmt::start_of_day(start));
        let before_end = self
            .end
            .is_none_or(|end| instant <= timefmt::end_of_day(end));
        after_start && before_end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunStats {
    pub runs: usize,
    pub total_data: u64,
    pub total_pages: u64,
    pub average_data: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeOutcome {
    pub run_id: RunId,
    pub total: u64,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Tags travel as a comma-separated string (or null); older payloads may send
/// a JSON array.
mod tag_list {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wire {
        Joined(String),
        List(Vec<String>),
    }

    pub fn serialize<S>(tags: &[String], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if tags.is_empty() {
            serializer.serialize_none()
        } else {
            serializer.serialize_str(&tags.join(","))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let tags = match Option::<Wire>::deserialize(deserializer)? {
            None => Vec::new(),
            Some(Wire::Joined(raw)) => crate::forms::parse_tags(&raw),
            Some(Wire::List(items)) => crate::forms::parse_tags(&items.join(",")),
        };
        Ok(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::{DateRange, Entry, Run, RunSort, RunSortField, SortDirection};
    use crate::{RunId, timefmt};
    use anyhow::Result;
    use time::macros::{date, datetime};

    #[test]
    fn run_decodes_backend_row() -> Result<()> {
        let run: Run = serde_json::from_str(
            r#"{"id":7,"name":null,"pages":2,"notes":null,"tags":"Urgent, Review,,","created_at":"2025-01-01 00:00:00","total_data":5}"#,
        )?;
        assert_eq!(run.id, RunId::new(7));
        assert_eq!(run.display_name(), "Data #7");
        assert_eq!(run.created_at, datetime!(2025-01-01 00:00:00 UTC));
        assert_eq!(run.tags, vec!["Urgent".to_owned(), "Review".to_owned()]);
        assert_eq!(run.total_data_or_zero(), 5);
        Ok(())
    }

    #[test]
    fn run_without_optional_fields_decodes() -> Result<()> {
        let run: Run =
            serde_json::from_str(r#"{"id":1,"pages":1,"created_at":"2025-01-01T00:00:00"}"#)?;
        assert!(run.name.is_none());
        assert!(run.tags.is_empty());
        assert_eq!(run.total_data_or_zero(), 0);
        Ok(())
    }

    #[test]
    fn empty_name_falls_back_to_label() -> Result<()> {
        let run: Run = serde_json::from_str(
            r#"{"id":3,"name":"","pages":1,"created_at":"2025-01-01T00:00:00"}"#,
        )?;
        assert_eq!(run.display_name(), "Data #3");
        Ok(())
    }

    #[test]
    fn entry_decodes_wire_names_and_nulls() -> Result<()> {
        let entry: Entry = serde_json::from_str(
            r#"{"id":4,"nama":"Budi","no_telpon":null,"no_hp":"0812","email":"b@x.id","alamat":"Jl. Merdeka","sumber":"lsp"}"#,
        )?;
        assert_eq!(entry.name, "Budi");
        assert_eq!(entry.phone, "");
        assert_eq!(entry.mobile, "0812");
        assert_eq!(entry.address.as_deref(), Some("Jl. Merdeka"));
        Ok(())
    }

    #[test]
    fn run_serializes_naive_timestamp_and_joined_tags() -> Result<()> {
        let run: Run = serde_json::from_str(
            r#"{"id":1,"pages":1,"tags":["a","b"],"created_at":"2025-01-01T08:30:00"}"#,
        )?;
        let value = serde_json::to_value(&run)?;
        assert_eq!(value["created_at"], "2025-01-01T08:30:00");
        assert_eq!(value["tags"], "a,b");
        Ok(())
    }

    #[test]
    fn sort_toggle_flips_same_field_and_resets_new_field() {
        let sort = RunSort::default();
        assert_eq!(sort.field, RunSortField::CreatedAt);
        assert_eq!(sort.direction, SortDirection::Desc);

        let flipped = sort.toggled(RunSortField::CreatedAt);
        assert_eq!(flipped.direction, SortDirection::Asc);

        let renamed = flipped.toggled(RunSortField::Name);
        assert_eq!(renamed.field, RunSortField::Name);
        assert_eq!(renamed.direction, SortDirection::Asc);

        let desc = renamed.toggled(RunSortField::Name);
        assert_eq!(desc.direction, SortDirection::Desc);
    }

    #[test]
    fn date_range_end_is_inclusive_to_the_second() {
        let range = DateRange {
            start: None,
            end: Some(date!(2025 - 01 - 31)),
        };
        let boundary = timefmt::end_of_day(date!(2025 - 01 - 31));
        assert!(range.admits(boundary));
        assert!(!range.admits(boundary + time::Duration::SECOND));
    }

    #[test]
    fn date_range_start_is_inclusive_at_midnight() {
        let range = DateRange {
            start: Some(date!(2025 - 02 - 01)),
            end: None,
        };
        let midnight = timefmt::start_of_day(date!(2025 - 02 - 01));
        assert!(range.admits(midnight));
        assert!(!range.admits(midnight - time::Duration::SECOND));
        assert!(DateRange::default().admits(midnight));
    }
}
