// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use harvest_api::Client;
use harvest_app::{Entry, Run, RunId, ScrapeOutcome, ScrapeResult, User};
use harvest_export::{
    SheetWriter, XlsxSheetWriter, entries_file_stem, entries_sheet, export_print, export_sheet,
    print_document, runs_file_stem, runs_sheet, save_download,
};
use harvest_tui::{AppRuntime, ExportKind, ExportTarget, InternalEvent};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::thread;
use time::OffsetDateTime;
use tracing::{info, warn};

const RUNS_PRINT_TITLE: &str = "Scrape runs";

/// Dashboard runtime backed by the scraper HTTP API and the local export
/// directory.
pub struct ApiRuntime {
    client: Client,
    export_dir: PathBuf,
}

impl ApiRuntime {
    pub fn new(client: Client, export_dir: PathBuf) -> Self {
        Self { client, export_dir }
    }
}

impl AppRuntime for ApiRuntime {
    fn login(&mut self, username: &str, password: &str) -> Result<Option<User>> {
        Ok(self.client.login(username, password)?)
    }

    fn load_runs(&mut self) -> Result<Vec<Run>> {
        Ok(self.client.list_runs()?)
    }

    fn load_entries(&mut self, run_id: RunId) -> Result<Vec<Entry>> {
        Ok(self.client.list_entries(run_id)?)
    }

    fn rename_run(&mut self, run_id: RunId, name: &str) -> Result<()> {
        self.client.rename_run(run_id, name)?;
        info!(run_id = %run_id, "run renamed");
        Ok(())
    }

    fn delete_run(&mut self, run_id: RunId) -> Result<()> {
        self.client.delete_run(run_id)?;
        info!(run_id = %run_id, "run deleted");
        Ok(())
    }

    fn update_notes(&mut self, run_id: RunId, notes: &str) -> Result<()> {
        Ok(self.client.update_notes(run_id, notes)?)
    }

    fn update_tags(&mut self, run_id: RunId, tags: &[String]) -> Result<()> {
        Ok(self.client.update_tags(run_id, tags)?)
    }

    fn export(&mut self, kind: ExportKind, target: ExportTarget<'_>) -> Result<PathBuf> {
        export_target(
            &self.export_dir,
            kind,
            target,
            &XlsxSheetWriter,
            OffsetDateTime::now_utc(),
        )
    }

    fn download_csv(&mut self, run_id: Option<RunId>) -> Result<PathBuf> {
        let (file_name, bytes) = match run_id {
            Some(run_id) => (
                format!("scraping-{run_id}.csv"),
                self.client.download_entries_csv(run_id)?,
            ),
            None => ("scrapings.csv".to_owned(), self.client.download_runs_csv()?),
        };
        save_download(&self.export_dir, &file_name, &bytes)
    }

    fn run_scrape(&mut self, pages: u32) -> Result<ScrapeOutcome> {
        Ok(self.client.trigger_scrape(pages)?)
    }

    /// Runs the scrape on a worker thread; the dashboard keeps drawing and
    /// picks the result up from the internal channel.
    fn spawn_scrape(&mut self, pages: u32, tx: Sender<InternalEvent>) -> Result<()> {
        let client = self.client.clone();
        thread::Builder::new()
            .name("harvest-scrape".to_owned())
            .spawn(move || {
                let result = match client.trigger_scrape(pages) {
                    Ok(outcome) => {
                        info!(run_id = %outcome.run_id, total = outcome.total, "scrape finished");
                        ScrapeResult::Succeeded(outcome)
                    }
                    Err(error) => {
                        warn!(pages, error = %error, "scrape failed");
                        ScrapeResult::Failed
                    }
                };
                if tx.send(InternalEvent::Scrape(result)).is_err() {
                    warn!(pages, "dashboard exited before the scrape finished");
                }
            })
            .context("spawn scrape worker thread")?;
        Ok(())
    }
}

/// Writes a sheet (through `sheets`) or print file for `target` into `dir`,
/// stamped with `now`.
pub fn export_target(
    dir: &Path,
    kind: ExportKind,
    target: ExportTarget<'_>,
    sheets: &dyn SheetWriter,
    now: OffsetDateTime,
) -> Result<PathBuf> {
    let (title, stem, sheet) = match target {
        ExportTarget::Runs(runs) => (
            RUNS_PRINT_TITLE.to_owned(),
            runs_file_stem(now),
            runs_sheet(runs),
        ),
        ExportTarget::Entries { run, entries } => (
            format!("Contacts: {}", run.display_name()),
            entries_file_stem(run, now),
            entries_sheet(entries),
        ),
    };

    match kind {
        ExportKind::Sheet => export_sheet(dir, &stem, sheets, &sheet),
        ExportKind::Print => {
            let html = print_document(&title, &sheet, now);
            export_print(dir, &format!("{stem}-print"), &html)
        }
    }
}
