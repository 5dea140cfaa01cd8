// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use harvest_app::{Entry, Run, timefmt};
use time::OffsetDateTime;

use crate::{Column, Sheet};

pub const RUNS_SHEET_NAME: &str = "Runs";
pub const ENTRIES_SHEET_NAME: &str = "Contacts";

/// Sheet over the filtered, sorted run working set.
pub fn runs_sheet(runs: &[&Run]) -> Sheet {
    Sheet {
        name: RUNS_SHEET_NAME.to_owned(),
        columns: vec![
            Column::new("Name", 30),
            Column::new("Pages", 10),
            Column::new("Total Data", 12),
            Column::new("Created", 25),
        ],
        rows: runs
            .iter()
            .map(|run| {
                vec![
                    run.display_name(),
                    run.pages.to_string(),
                    run.total_data_or_zero().to_string(),
                    timefmt::format_display(run.created_at),
                ]
            })
            .collect(),
    }
}

pub fn entries_sheet(entries: &[&Entry]) -> Sheet {
    Sheet {
        name: ENTRIES_SHEET_NAME.to_owned(),
        columns: vec![
            Column::new("Name", 30),
            Column::new("Phone", 15),
            Column::new("Mobile", 15),
            Column::new("Email", 30),
        ],
        rows: entries
            .iter()
            .map(|entry| {
                vec![
                    entry.name.clone(),
                    entry.phone.clone(),
                    entry.mobile.clone(),
                    entry.email.clone(),
                ]
            })
            .collect(),
    }
}

/// `data-scraping-YYYY-MM-DD`, dated in UTC.
pub fn runs_file_stem(now: OffsetDateTime) -> String {
    format!("data-scraping-{}", timefmt::format_file_date(now))
}

/// `data-<run name>-YYYY-MM-DD`, dated in UTC.
pub fn entries_file_stem(run: &Run, now: OffsetDateTime) -> String {
    format!(
        "data-{}-{}",
        sanitize_file_part(&run.display_name()),
        timefmt::format_file_date(now)
    )
}

/// Keeps letters, digits, `_` and `.`; everything else collapses into single
/// dashes.
pub fn sanitize_file_part(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if ch.is_alphanumeric() || ch == '_' || ch == '.' {
            out.push(ch);
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    let trimmed = out.trim_matches('-');
    if trimmed.is_empty() || trimmed.chars().all(|ch| ch == '.') {
        "run".to_owned()
    } else {
        trimmed.to_owned()
    }
}
