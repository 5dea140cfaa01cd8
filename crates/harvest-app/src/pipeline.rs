// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! The list-processing pipeline shared by the run and entry listings.
//!
//! Stages run in a fixed order: filter, sort, paginate. Statistics are taken
//! over the unfiltered collection. Every function here is pure.

use std::cmp::Ordering;

use crate::{DateRange, Entry, Run, RunSort, RunSortField, RunStats, SortDirection};

pub const PAGE_WINDOW_WIDTH: usize = 5;

pub fn filter_runs<'a>(runs: &'a [Run], search: &str, range: &DateRange) -> Vec<&'a Run> {
    let needle = search.to_lowercase();
    runs.iter()
        .filter(|run| needle.is_empty() || run.display_name().to_lowercase().contains(&needle))
        .filter(|run| range.admits(run.created_at))
        .collect()
}

/// Name and email fold case; phone numbers are matched on the raw query.
pub fn filter_entries<'a>(entries: &'a [Entry], search: &str) -> Vec<&'a Entry> {
    if search.is_empty() {
        return entries.iter().collect();
    }
    let needle = search.to_lowercase();
    entries
        .iter()
        .filter(|entry| {
            entry.name.to_lowercase().contains(&needle)
                || entry.email.to_lowercase().contains(&needle)
                || entry.phone.contains(search)
                || entry.mobile.contains(search)
        })
        .collect()
}

pub fn compare_runs(left: &Run, right: &Run, field: RunSortField) -> Ordering {
    match field {
        RunSortField::Name => left
            .display_name()
            .to_lowercase()
            .cmp(&right.display_name().to_lowercase()),
        RunSortField::Pages => left.pages.cmp(&right.pages),
        RunSortField::TotalData => left.total_data_or_zero().cmp(&right.total_data_or_zero()),
        RunSortField::CreatedAt => left.created_at.cmp(&right.created_at),
    }
}

/// Stable sort. Descending reverses the comparator so ties keep input order.
pub fn sort_runs(runs: &mut [&Run], sort: RunSort) {
    runs.sort_by(|left, right| {
        let ordering = compare_runs(left, right, sort.field);
        match sort.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

/// `ceil(len / page_size)`; zero for an empty set.
pub fn total_pages(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    len.div_ceil(page_size)
}

/// One-based page slice. Pages outside the set yield an empty slice.
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    if page == 0 || page_size == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

/// At most `PAGE_WINDOW_WIDTH` contiguous page numbers around `current`,
/// clamped to `[1, total]`.
pub fn page_window(current: usize, total: usize) -> Vec<usize> {
    if total == 0 {
        return Vec::new();
    }
    if total <= PAGE_WINDOW_WIDTH {
        return (1..=total).collect();
    }
    let current = current.clamp(1, total);
    let half = PAGE_WINDOW_WIDTH / 2;
    let start = current
        .saturating_sub(half)
        .max(1)
        .min(total + 1 - PAGE_WINDOW_WIDTH);
    (start..start + PAGE_WINDOW_WIDTH).collect()
}

pub fn run_stats(runs: &[Run]) -> RunStats {
    let total_data: u64 = runs.iter().map(Run::total_data_or_zero).sum();
    let total_pages: u64 = runs.iter().map(|run| u64::from(run.pages)).sum();
    let count = runs.len() as u64;
    let average_data = if count == 0 {
        0
    } else {
        (total_data * 2 + count) / (2 * count)
    };
    RunStats {
        runs: runs.len(),
        total_data,
        total_pages,
        average_data,
    }
}

/// Page-indicator text. Shows at least "page 1 of 1".
pub fn page_indicator(page: usize, total: usize) -> String {
    let total = total.max(1);
    format!("page {} of {total}", page.clamp(1, total))
}

/// "showing X of Y" result line.
pub fn showing_line(visible: usize, matched: usize) -> String {
    format!("showing {visible} of {matched}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunListing<'a> {
    pub matched: Vec<&'a Run>,
    pub page: usize,
    pub total_pages: usize,
    pub window: Vec<usize>,
    pub stats: RunStats,
}

impl<'a> RunListing<'a> {
    pub fn visible(&self, page_size: usize) -> &[&'a Run] {
        paginate(&self.matched, self.page, page_size)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryListing<'a> {
    pub matched: Vec<&'a Entry>,
    pub page: usize,
    pub total_pages: usize,
    pub window: Vec<usize>,
}

impl<'a> EntryListing<'a> {
    pub fn visible(&self, page_size: usize) -> &[&'a Entry] {
        paginate(&self.matched, self.page, page_size)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunQuery<'q> {
    pub search: &'q str,
    pub range: DateRange,
    pub sort: RunSort,
    pub page: usize,
    pub page_size: usize,
}

pub fn process_runs<'a>(runs: &'a [Run], query: &RunQuery<'_>) -> RunListing<'a> {
    let mut matched = filter_runs(runs, query.search, &query.range);
    sort_runs(&mut matched, query.sort);
    let pages = total_pages(matched.len(), query.page_size);
    RunListing {
        window: page_window(query.page, pages),
        total_pages: pages,
        page: query.page,
        stats: run_stats(runs),
        matched,
    }
}

pub fn process_entries<'a>(
    entries: &'a [Entry],
    search: &str,
    page: usize,
    page_size: usize,
) -> EntryListing<'a> {
    let matched = filter_entries(entries, search);
    let pages = total_pages(matched.len(), page_size);
    EntryListing {
        window: page_window(page, pages),
        total_pages: pages,
        page,
        matched,
    }
}
