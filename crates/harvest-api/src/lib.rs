// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Blocking client for the scraper backend's JSON API.

use anyhow::{Context, Result, bail};
use harvest_app::{Entry, Run, RunId, ScrapeOutcome, User};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("cannot reach {base_url} -- start the scraper backend and retry ({source})")]
    Unreachable {
        base_url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },
    #[error("decode {what}: {message}")]
    Decode { what: &'static str, message: String },
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    scrape_timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration, scrape_timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("api.base_url must not be empty");
        }
        let parsed = Url::parse(&base_url)
            .with_context(|| format!("api.base_url {base_url:?} is not a valid URL"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!(
                "api.base_url must use http or https, got {:?}",
                parsed.scheme()
            );
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            scrape_timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `None` when the backend rejects the credentials.
    pub fn login(&self, username: &str, password: &str) -> ApiResult<Option<User>> {
        let request = self
            .http
            .post(self.endpoint("/api/auth/login"))
            .json(&serde_json::json!({ "username": username, "password": password }));
        let label = "POST /api/auth/login";
        let response = self.execute(request, label)?;
        if response.status() == StatusCode::UNAUTHORIZED {
            debug!(username, "credentials rejected");
            return Ok(None);
        }
        let response = check_status(response, label)?;
        let body: LoginResponse = decode(response, "login response")?;
        Ok(Some(body.user))
    }

    pub fn list_runs(&self) -> ApiResult<Vec<Run>> {
        let response = self.send(self.http.get(self.endpoint("/api/scrapings")), "GET runs")?;
        let envelope: DataEnvelope<Vec<Run>> = decode(response, "run list")?;
        Ok(envelope.data.unwrap_or_default())
    }

    pub fn list_entries(&self, run_id: RunId) -> ApiResult<Vec<Entry>> {
        let response = self.send(
            self.http
                .get(self.endpoint(&format!("/api/scrapings/{run_id}"))),
            "GET entries",
        )?;
        let envelope: DataEnvelope<Vec<Entry>> = decode(response, "entry list")?;
        Ok(envelope.data.unwrap_or_default())
    }

    /// Blocks until the backend finishes collecting. Uses the scrape timeout
    /// instead of the regular request timeout.
    pub fn trigger_scrape(&self, pages: u32) -> ApiResult<ScrapeOutcome> {
        let request = self
            .http
            .post(self.endpoint("/api/scrape"))
            .timeout(self.scrape_timeout)
            .json(&serde_json::json!({ "pages": pages }));
        let response = self.send(request, "POST scrape")?;
        let body: ScrapeResponse = decode(response, "scrape response")?;
        Ok(ScrapeOutcome {
            run_id: RunId::new(body.scraping_id),
            total: body.total,
        })
    }

    pub fn rename_run(&self, run_id: RunId, name: &str) -> ApiResult<()> {
        let request = self
            .http
            .patch(self.endpoint(&format!("/api/scrapings/{run_id}/rename")))
            .json(&serde_json::json!({ "name": name }));
        self.send(request, "PATCH rename").map(drop)
    }

    pub fn delete_run(&self, run_id: RunId) -> ApiResult<()> {
        let request = self
            .http
            .delete(self.endpoint(&format!("/api/scrapings/{run_id}")));
        self.send(request, "DELETE run").map(drop)
    }

    pub fn update_notes(&self, run_id: RunId, notes: &str) -> ApiResult<()> {
        let request = self
            .http
            .patch(self.endpoint(&format!("/api/scrapings/{run_id}/notes")))
            .json(&serde_json::json!({ "notes": notes }));
        self.send(request, "PATCH notes").map(drop)
    }

    pub fn update_tags(&self, run_id: RunId, tags: &[String]) -> ApiResult<()> {
        let request = self
            .http
            .patch(self.endpoint(&format!("/api/scrapings/{run_id}/tags")))
            .json(&serde_json::json!({ "tags": tags }));
        self.send(request, "PATCH tags").map(drop)
    }

    /// Server-rendered CSV of every run.
    pub fn download_runs_csv(&self) -> ApiResult<Vec<u8>> {
        let response = self.send(
            self.http.get(self.endpoint("/api/scrapings/download/csv")),
            "GET runs csv",
        )?;
        read_bytes(response, "runs csv")
    }

    pub fn download_entries_csv(&self, run_id: RunId) -> ApiResult<Vec<u8>> {
        let response = self.send(
            self.http
                .get(self.endpoint(&format!("/api/scrapings/{run_id}/download/csv"))),
            "GET entries csv",
        )?;
        read_bytes(response, "entries csv")
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn send(&self, request: RequestBuilder, label: &'static str) -> ApiResult<Response> {
        let response = self.execute(request, label)?;
        check_status(response, label)
    }

    fn execute(&self, request: RequestBuilder, label: &'static str) -> ApiResult<Response> {
        debug!(request = label, base_url = %self.base_url, "sending request");
        request.send().map_err(|source| {
            warn!(request = label, error = %source, "backend unreachable");
            ApiError::Unreachable {
                base_url: self.base_url.clone(),
                source,
            }
        })
    }
}

/// Any non-2xx status, 401 included, is a server error here. Only `login`
/// gives 401 its own meaning.
fn check_status(response: Response, label: &'static str) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    let error = clean_error_response(status, &body);
    warn!(request = label, status = status.as_u16(), %error, "request failed");
    Err(error)
}

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    data: Option<T>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    user: User,
}

#[derive(Debug, Deserialize)]
struct ScrapeResponse {
    scraping_id: i64,
    #[serde(default)]
    total: u64,
}

/// Decodes a success body. A 200 carrying `"status": "error"` is still an
/// error.
fn decode<T: DeserializeOwned>(response: Response, what: &'static str) -> ApiResult<T> {
    let status = response.status();
    let body = response.text().map_err(|error| ApiError::Decode {
        what,
        message: error.to_string(),
    })?;

    if let Ok(envelope) = serde_json::from_str::<DataEnvelope<serde_json::Value>>(&body)
        && envelope.status.as_deref() == Some("error")
    {
        return Err(ApiError::Server {
            status: status.as_u16(),
            message: envelope
                .message
                .unwrap_or_else(|| "request failed".to_owned()),
        });
    }

    serde_json::from_str(&body).map_err(|error| ApiError::Decode {
        what,
        message: error.to_string(),
    })
}

fn read_bytes(response: Response, what: &'static str) -> ApiResult<Vec<u8>> {
    response
        .bytes()
        .map(|bytes| bytes.to_vec())
        .map_err(|error| ApiError::Decode {
            what,
            message: error.to_string(),
        })
}

fn clean_error_response(status: StatusCode, body: &str) -> ApiError {
    let code = status.as_u16();
    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body)
        && let Some(message) = parsed.message.or(parsed.error)
        && !message.is_empty()
    {
        return ApiError::Server {
            status: code,
            message,
        };
    }

    let trimmed = body.trim();
    if !trimmed.is_empty()
        && trimmed.len() < 100
        && !trimmed.contains('{')
        && !trimmed.contains('<')
    {
        return ApiError::Server {
            status: code,
            message: trimmed.to_owned(),
        };
    }

    ApiError::Server {
        status: code,
        message: format!("server returned {code}"),
    }
}
