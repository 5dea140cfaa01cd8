// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::Date;

use crate::{DEFAULT_PAGE_SIZE, DateRange, PAGE_SIZE_CHOICES, RunQuery, RunSort, RunSortField};

/// Per-screen view parameters. Created fresh on every screen visit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListView {
    pub search: String,
    pub range: DateRange,
    pub sort: RunSort,
    pub page: usize,
    pub page_size: usize,
}

impl Default for ListView {
    fn default() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewCommand {
    SetSearch(String),
    SetStartDate(Option<Date>),
    SetEndDate(Option<Date>),
    ResetFilter,
    SortBy(RunSortField),
    SetPageSize(usize),
    CyclePageSize,
    FirstPage,
    PrevPage,
    NextPage,
    LastPage,
    JumpTo(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    FilterChanged,
    SortChanged(RunSort),
    PageChanged(usize),
    PageSizeChanged(usize),
    Rejected(String),
}

impl ListView {
    pub fn with_page_size(page_size: usize) -> Self {
        let page_size = if PAGE_SIZE_CHOICES.contains(&page_size) {
            page_size
        } else {
            DEFAULT_PAGE_SIZE
        };
        Self {
            search: String::new(),
            range: DateRange::default(),
            sort: RunSort::default(),
            page: 1,
            page_size,
        }
    }

    pub fn query(&self) -> RunQuery<'_> {
        RunQuery {
            search: &self.search,
            range: self.range,
            sort: self.sort,
            page: self.page,
            page_size: self.page_size,
        }
    }

    pub fn is_filtered(&self) -> bool {
        !self.search.is_empty() || !self.range.is_unbounded()
    }

    /// Applies one command. `total_pages` is the page count of the current
    /// working set and bounds navigation.
    pub fn dispatch(&mut self, command: ViewCommand, total_pages: usize) -> Vec<ViewEvent> {
        let last = total_pages.max(1);
        match command {
            ViewCommand::SetSearch(search) => {
                self.search = search;
                self.filter_changed()
            }
            ViewCommand::SetStartDate(start) => {
                self.range.start = start;
                self.filter_changed()
            }
            ViewCommand::SetEndDate(end) => {
                self.range.end = end;
                self.filter_changed()
            }
            ViewCommand::ResetFilter => {
                self.search.clear();
                self.range = DateRange::default();
                self.filter_changed()
            }
            ViewCommand::SortBy(field) => {
                self.sort = self.sort.toggled(field);
                vec![ViewEvent::SortChanged(self.sort)]
            }
            ViewCommand::SetPageSize(size) => self.set_page_size(size),
            ViewCommand::CyclePageSize => {
                let next = PAGE_SIZE_CHOICES
                    .iter()
                    .position(|choice| *choice == self.page_size)
                    .map_or(0, |index| (index + 1) % PAGE_SIZE_CHOICES.len());
                self.set_page_size(PAGE_SIZE_CHOICES[next])
            }
            ViewCommand::FirstPage => self.go_to(1, last),
            ViewCommand::PrevPage => self.go_to(self.page.saturating_sub(1), last),
            ViewCommand::NextPage => self.go_to(self.page.saturating_add(1), last),
            ViewCommand::LastPage => self.go_to(last, last),
            ViewCommand::JumpTo(page) => self.go_to(page, last),
        }
    }

    /// Pulls the page back inside `[1, total_pages]` after the collection
    /// shrank, for example after a delete.
    pub fn settle(&mut self, total_pages: usize) {
        self.page = self.page.clamp(1, total_pages.max(1));
    }

    fn filter_changed(&mut self) -> Vec<ViewEvent> {
        self.page = 1;
        vec![ViewEvent::FilterChanged, ViewEvent::PageChanged(1)]
    }

    fn set_page_size(&mut self, size: usize) -> Vec<ViewEvent> {
        if !PAGE_SIZE_CHOICES.contains(&size) {
            return vec![ViewEvent::Rejected(format!(
                "page size {size} is not offered -- choose one of 5, 10, 25, 50, 100"
            ))];
        }
        self.page_size = size;
        self.page = 1;
        vec![ViewEvent::PageSizeChanged(size), ViewEvent::PageChanged(1)]
    }

    fn go_to(&mut self, page: usize, last: usize) -> Vec<ViewEvent> {
        let target = page.clamp(1, last);
        if target == self.page {
            return Vec::new();
        }
        self.page = target;
        vec![ViewEvent::PageChanged(target)]
    }
}

#[cfg(test)]
mod tests {
    use super::{ListView, ViewCommand, ViewEvent};
    use crate::{RunSortField, SortDirection};
    use time::macros::date;

    fn on_page(page: usize) -> ListView {
        ListView {
            page,
            ..ListView::default()
        }
    }

    #[test]
    fn search_resets_page() {
        let mut view = on_page(4);
        let events = view.dispatch(ViewCommand::SetSearch("client".to_owned()), 9);
        assert_eq!(view.page, 1);
        assert_eq!(
            events,
            vec![ViewEvent::FilterChanged, ViewEvent::PageChanged(1)]
        );
        assert!(view.is_filtered());
    }

    #[test]
    fn date_bounds_reset_page() {
        let mut view = on_page(3);
        view.dispatch(ViewCommand::SetStartDate(Some(date!(2025 - 01 - 01))), 9);
        assert_eq!(view.page, 1);
        view.page = 2;
        view.dispatch(ViewCommand::SetEndDate(Some(date!(2025 - 01 - 31))), 9);
        assert_eq!(view.page, 1);
        assert_eq!(view.range.end, Some(date!(2025 - 01 - 31)));
    }

    #[test]
    fn reset_filter_clears_search_and_range() {
        let mut view = on_page(2);
        view.search = "x".to_owned();
        view.range.start = Some(date!(2025 - 01 - 01));
        view.dispatch(ViewCommand::ResetFilter, 5);
        assert!(!view.is_filtered());
        assert_eq!(view.page, 1);
    }

    #[test]
    fn sort_change_keeps_page() {
        let mut view = on_page(3);
        let events = view.dispatch(ViewCommand::SortBy(RunSortField::Name), 5);
        assert_eq!(view.page, 3);
        assert_eq!(view.sort.direction, SortDirection::Asc);
        assert!(matches!(events.as_slice(), [ViewEvent::SortChanged(_)]));
    }

    #[test]
    fn page_size_change_resets_page_and_rejects_unknown_sizes() {
        let mut view = on_page(3);
        view.dispatch(ViewCommand::SetPageSize(25), 5);
        assert_eq!((view.page, view.page_size), (1, 25));

        let events = view.dispatch(ViewCommand::SetPageSize(7), 5);
        assert_eq!(view.page_size, 25);
        assert!(matches!(events.as_slice(), [ViewEvent::Rejected(_)]));
    }

    #[test]
    fn page_size_cycles_through_choices() {
        let mut view = ListView::with_page_size(100);
        view.dispatch(ViewCommand::CyclePageSize, 1);
        assert_eq!(view.page_size, 5);
        view.dispatch(ViewCommand::CyclePageSize, 1);
        assert_eq!(view.page_size, 10);
        assert_eq!(ListView::with_page_size(3).page_size, 10);
    }

    #[test]
    fn navigation_clamps_to_available_pages() {
        let mut view = ListView::default();
        assert!(view.dispatch(ViewCommand::PrevPage, 4).is_empty());
        view.dispatch(ViewCommand::NextPage, 4);
        assert_eq!(view.page, 2);
        view.dispatch(ViewCommand::LastPage, 4);
        assert_eq!(view.page, 4);
        assert!(view.dispatch(ViewCommand::NextPage, 4).is_empty());
        view.dispatch(ViewCommand::JumpTo(99), 4);
        assert_eq!(view.page, 4);
        view.dispatch(ViewCommand::FirstPage, 4);
        assert_eq!(view.page, 1);
    }

    #[test]
    fn settle_pulls_page_back_after_shrink() {
        let mut view = on_page(5);
        view.settle(3);
        assert_eq!(view.page, 3);
        view.settle(0);
        assert_eq!(view.page, 1);
    }

    #[test]
    fn navigation_on_empty_set_stays_on_first_page() {
        let mut view = ListView::default();
        assert!(view.dispatch(ViewCommand::LastPage, 0).is_empty());
        assert_eq!(view.page, 1);
    }
}
