// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use harvest_app::{COMMON_TAGS, Entry, EntryId, Run, RunId, timefmt};
use serde_json::{Value, json};
use std::path::PathBuf;
use time::macros::datetime;
use time::{Duration, OffsetDateTime};

const YEAR_START: OffsetDateTime = datetime!(2025-01-01 00:00:00 UTC);
const SECONDS_PER_YEAR: i64 = 365 * 24 * 60 * 60;

const RUN_TOPICS: [&str; 10] = [
    "Konstruksi",
    "Kesehatan",
    "Pariwisata",
    "Logistik",
    "Perbankan",
    "Pertanian",
    "Energi",
    "Pendidikan",
    "Manufaktur",
    "Telekomunikasi",
];
const RUN_QUALIFIERS: [&str; 6] = ["Bali", "Jawa Timur", "Batch", "Client", "Ulang", "Prioritas"];

const FIRST_NAMES: [&str; 16] = [
    "Made", "Ketut", "Wayan", "Nyoman", "Putu", "Kadek", "Budi", "Sari", "Dewi", "Agus", "Rina",
    "Eko", "Fitri", "Hendra", "Indah", "Joko",
];
const LAST_NAMES: [&str; 14] = [
    "Santoso", "Wijaya", "Saputra", "Pratama", "Lestari", "Hidayat", "Kusuma", "Setiawan",
    "Permana", "Utami", "Suryani", "Gunawan", "Purnama", "Adnyana",
];
const MAIL_DOMAINS: [&str; 5] = ["mail.id", "contoh.co.id", "kantor.id", "lsp.or.id", "web.id"];
const AREA_CODES: [&str; 6] = ["0361", "021", "031", "0274", "022", "0370"];
const MOBILE_PREFIXES: [&str; 6] = ["0812", "0813", "0857", "0878", "0819", "0821"];
const STREETS: [&str; 8] = [
    "Jl. Merdeka",
    "Jl. Sudirman",
    "Jl. Gatot Subroto",
    "Jl. Diponegoro",
    "Jl. Teuku Umar",
    "Jl. Hayam Wuruk",
    "Jl. Imam Bonjol",
    "Jl. Raya Kuta",
];

/// Reproducible runs and contact entries for tests and demos.
#[derive(Debug, Clone)]
pub struct ScrapeFaker {
    rng: fastrand::Rng,
    next_run_id: i64,
    next_entry_id: i64,
}

impl ScrapeFaker {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
            next_run_id: 1,
            next_entry_id: 1,
        }
    }

    /// A run with fresh id, created some time in 2025. Roughly one in four
    /// has no name and one in eight has no total yet.
    pub fn run(&mut self) -> Run {
        let id = RunId::new(self.next_run_id);
        self.next_run_id += 1;

        let name = (self.rng.usize(..4) != 0)
            .then(|| format!("{} {}", self.pick(&RUN_TOPICS), self.pick(&RUN_QUALIFIERS)));
        let pages = self.rng.u32(1..=20);
        let total_data =
            (self.rng.usize(..8) != 0).then(|| u64::from(pages) * self.rng.u64(5..=25));
        let tags = if self.rng.bool() {
            vec![self.pick(&COMMON_TAGS).to_owned()]
        } else {
            Vec::new()
        };

        Run {
            id,
            name,
            pages,
            created_at: YEAR_START + Duration::seconds(self.rng.i64(0..SECONDS_PER_YEAR)),
            total_data,
            notes: None,
            tags,
        }
    }

    pub fn runs(&mut self, count: usize) -> Vec<Run> {
        (0..count).map(|_| self.run()).collect()
    }

    /// A contact record. Phone, mobile and email are sometimes blank, the way
    /// collected listings often are.
    pub fn entry(&mut self) -> Entry {
        let id = EntryId::new(self.next_entry_id);
        self.next_entry_id += 1;

        let first = self.pick(&FIRST_NAMES);
        let last = self.pick(&LAST_NAMES);
        let phone = if self.rng.usize(..3) == 0 {
            String::new()
        } else {
            format!("{}-{}", self.pick(&AREA_CODES), self.digits(7))
        };
        let mobile = if self.rng.usize(..4) == 0 {
            String::new()
        } else {
            format!("{}{}", self.pick(&MOBILE_PREFIXES), self.digits(8))
        };
        let email = if self.rng.usize(..5) == 0 {
            String::new()
        } else {
            format!(
                "{}.{}@{}",
                first.to_lowercase(),
                last.to_lowercase(),
                self.pick(&MAIL_DOMAINS)
            )
        };
        let address = self
            .rng
            .bool()
            .then(|| format!("{} No. {}", self.pick(&STREETS), self.rng.u32(1..=200)));

        Entry {
            id,
            name: format!("{first} {last}"),
            phone,
            mobile,
            email,
            address,
            source: None,
        }
    }

    pub fn entries(&mut self, count: usize) -> Vec<Entry> {
        (0..count).map(|_| self.entry()).collect()
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.rng.usize(..items.len())]
    }

    fn digits(&mut self, count: usize) -> String {
        (0..count).map(|_| self.rng.digit(10)).collect()
    }
}

/// Backend row for a run, in the shape `GET /api/scrapings` returns.
pub fn run_json(run: &Run) -> Value {
    json!({
        "id": run.id.get(),
        "name": run.name,
        "pages": run.pages,
        "created_at": naive_timestamp(run.created_at),
        "total_data": run.total_data,
        "notes": run.notes,
        "tags": if run.tags.is_empty() { Value::Null } else { Value::from(run.tags.join(",")) },
    })
}

pub fn entry_json(entry: &Entry) -> Value {
    json!({
        "id": entry.id.get(),
        "nama": entry.name,
        "no_telpon": entry.phone,
        "no_hp": entry.mobile,
        "email": entry.email,
        "alamat": entry.address,
        "sumber": entry.source,
    })
}

/// Wraps `data` in the backend's success envelope.
pub fn success_envelope(data: Value) -> String {
    json!({ "status": "success", "data": data }).to_string()
}

pub fn error_envelope(message: &str) -> String {
    json!({ "status": "error", "message": message }).to_string()
}

pub fn temp_export_dir() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join("exports");
    std::fs::create_dir_all(&path).context("create export dir")?;
    Ok((dir, path))
}

fn naive_timestamp(instant: OffsetDateTime) -> String {
    let utc = instant.to_offset(time::UtcOffset::UTC);
    format!(
        "{}T{:02}:{:02}:{:02}",
        timefmt::format_filter_date(utc.date()),
        utc.hour(),
        utc.minute(),
        utc.second()
    )
}
