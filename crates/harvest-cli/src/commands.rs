// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Non-interactive commands for scripting: plain tab-separated listings and
//! CSV sheet exports in the dashboard's default order.

use anyhow::{Context, Result, anyhow};
use harvest_api::Client;
use harvest_app::{Entry, ListView, Run, RunId, process_runs, timefmt};
use harvest_export::CsvSheetWriter;
use harvest_tui::{ExportKind, ExportTarget};
use std::io::Write;
use std::path::Path;
use time::OffsetDateTime;
use tracing::info;

use crate::ExportScope;
use crate::runtime::export_target;

pub fn list_runs(client: &Client, out: &mut dyn Write) -> Result<()> {
    let runs = client.list_runs().context("list runs")?;
    write_runs(&runs, out)
}

pub fn list_entries(client: &Client, run_id: RunId, out: &mut dyn Write) -> Result<()> {
    let entries = client
        .list_entries(run_id)
        .with_context(|| format!("list entries of run {run_id}"))?;
    write_entries(&entries, out)
}

pub fn export(client: &Client, scope: ExportScope, dir: &Path, out: &mut dyn Write) -> Result<()> {
    let runs = client.list_runs().context("list runs")?;
    let now = OffsetDateTime::now_utc();
    let path = match scope {
        ExportScope::Runs => {
            let listing = process_runs(&runs, &ListView::default().query());
            export_target(
                dir,
                ExportKind::Sheet,
                ExportTarget::Runs(&listing.matched),
                &CsvSheetWriter,
                now,
            )?
        }
        ExportScope::Entries(run_id) => {
            let run = find_run(&runs, run_id)?;
            let entries = client
                .list_entries(run_id)
                .with_context(|| format!("list entries of run {run_id}"))?;
            let refs: Vec<&Entry> = entries.iter().collect();
            export_target(
                dir,
                ExportKind::Sheet,
                ExportTarget::Entries {
                    run,
                    entries: &refs,
                },
                &CsvSheetWriter,
                now,
            )?
        }
    };
    info!(path = %path.display(), "export written");
    writeln!(out, "{}", path.display()).context("write export path")?;
    Ok(())
}

fn find_run(runs: &[Run], run_id: RunId) -> Result<&Run> {
    runs.iter().find(|run| run.id == run_id).ok_or_else(|| {
        anyhow!("run {run_id} not found -- list runs with `harvest runs` and retry")
    })
}

fn write_runs(runs: &[Run], out: &mut dyn Write) -> Result<()> {
    let listing = process_runs(runs, &ListView::default().query());
    writeln!(out, "ID\tNAME\tPAGES\tTOTAL DATA\tCREATED").context("write runs header")?;
    for run in &listing.matched {
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}",
            run.id,
            run.display_name(),
            run.pages,
            run.total_data_or_zero(),
            timefmt::format_display(run.created_at)
        )
        .context("write run row")?;
    }
    let stats = listing.stats;
    writeln!(
        out,
        "{} runs, {} total data, {} pages, average {} per run",
        stats.runs, stats.total_data, stats.total_pages, stats.average_data
    )
    .context("write runs summary")?;
    Ok(())
}

fn write_entries(entries: &[Entry], out: &mut dyn Write) -> Result<()> {
    writeln!(out, "NAME\tPHONE\tMOBILE\tEMAIL").context("write entries header")?;
    for entry in entries {
        writeln!(
            out,
            "{}\t{}\t{}\t{}",
            entry.name, entry.phone, entry.mobile, entry.email
        )
        .context("write entry row")?;
    }
    writeln!(out, "{} entries", entries.len()).context("write entries summary")?;
    Ok(())
}
