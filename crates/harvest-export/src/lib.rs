// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Spreadsheet and print output for the run and entry listings.

mod print;
mod sheets;

pub use print::print_document;
pub use sheets::{entries_file_stem, entries_sheet, runs_file_stem, runs_sheet, sanitize_file_part};

use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub header: String,
    /// Width in characters. The CSV writer has no layout and ignores it.
    pub width: u16,
}

impl Column {
    pub fn new(header: &str, width: u16) -> Self {
        Self {
            header: header.to_owned(),
            width,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    pub name: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|column| column.header.as_str())
    }
}

/// Serializes a `Sheet` into some workbook format.
pub trait SheetWriter {
    fn extension(&self) -> &'static str;

    fn write_sheet(&self, sheet: &Sheet, out: &mut dyn Write) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CsvSheetWriter;

impl SheetWriter for CsvSheetWriter {
    fn extension(&self) -> &'static str {
        "csv"
    }

    fn write_sheet(&self, sheet: &Sheet, out: &mut dyn Write) -> Result<()> {
        let mut writer = csv::Writer::from_writer(out);
        writer
            .write_record(sheet.headers())
            .with_context(|| format!("write {} header", sheet.name))?;
        for row in &sheet.rows {
            writer
                .write_record(row)
                .with_context(|| format!("write {} row", sheet.name))?;
        }
        writer.flush().context("flush csv output")?;
        Ok(())
    }
}

/// Excel workbook holding one sheet named after `Sheet::name`, with a bold
/// header row and the column widths applied.
#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxSheetWriter;

impl SheetWriter for XlsxSheetWriter {
    fn extension(&self) -> &'static str {
        "xlsx"
    }

    fn write_sheet(&self, sheet: &Sheet, out: &mut dyn Write) -> Result<()> {
        let mut workbook = Workbook::new();
        let header = Format::new().set_bold();
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(&sheet.name)
            .with_context(|| format!("name worksheet {:?}", sheet.name))?;

        for (index, column) in sheet.columns.iter().enumerate() {
            let col = column_index(index)?;
            worksheet
                .set_column_width(col, column.width)
                .with_context(|| format!("size column {:?}", column.header))?;
            worksheet
                .write_string_with_format(0, col, &column.header, &header)
                .with_context(|| format!("write {} header", sheet.name))?;
        }
        for (index, cells) in sheet.rows.iter().enumerate() {
            let row = u32::try_from(index + 1).context("sheet has too many rows for xlsx")?;
            for (col, cell) in cells.iter().enumerate() {
                worksheet
                    .write_string(row, column_index(col)?, cell)
                    .with_context(|| format!("write {} row {row}", sheet.name))?;
            }
        }

        let bytes = workbook.save_to_buffer().context("render xlsx workbook")?;
        out.write_all(&bytes).context("write xlsx workbook")?;
        Ok(())
    }
}

fn column_index(index: usize) -> Result<u16> {
    u16::try_from(index).context("sheet has too many columns for xlsx")
}

/// Writes `sheet` to `<dir>/<stem>.<ext>` and returns the path.
pub fn export_sheet(
    dir: &Path,
    stem: &str,
    writer: &dyn SheetWriter,
    sheet: &Sheet,
) -> Result<PathBuf> {
    let path = prepare_path(dir, stem, writer.extension())?;
    let file =
        File::create(&path).with_context(|| format!("create export file {}", path.display()))?;
    let mut out = BufWriter::new(file);
    writer.write_sheet(sheet, &mut out)?;
    out.flush()
        .with_context(|| format!("flush export file {}", path.display()))?;
    info!(path = %path.display(), sheet = %sheet.name, rows = sheet.rows.len(), "sheet exported");
    Ok(path)
}

/// Writes an HTML print document to `<dir>/<stem>.html`.
pub fn export_print(dir: &Path, stem: &str, html: &str) -> Result<PathBuf> {
    let path = prepare_path(dir, stem, "html")?;
    fs::write(&path, html).with_context(|| format!("write print file {}", path.display()))?;
    info!(path = %path.display(), "print document written");
    Ok(path)
}

/// Saves bytes the backend rendered (its own CSV downloads).
pub fn save_download(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("create export directory {}", dir.display()))?;
    let path = dir.join(file_name);
    fs::write(&path, bytes).with_context(|| format!("write download {}", path.display()))?;
    info!(path = %path.display(), bytes = bytes.len(), "download saved");
    Ok(path)
}

fn prepare_path(dir: &Path, stem: &str, extension: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| {
        format!(
            "create export directory {} -- check [export].dir in the config",
            dir.display()
        )
    })?;
    Ok(dir.join(format!("{stem}.{extension}")))
}
