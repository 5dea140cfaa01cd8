// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use harvest_api::{ApiError, Client};
use harvest_app::RunId;
use harvest_testkit::{ScrapeFaker, entry_json, error_envelope, run_json, success_envelope};
use serde_json::{Value, json};
use std::thread;
use std::time::Duration;
use tiny_http::{Header, Method, Response, Server};

fn mock_server() -> Result<(Server, String)> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());
    Ok((server, addr))
}

fn client(addr: &str) -> Result<Client> {
    Client::new(addr, Duration::from_secs(2), Duration::from_secs(2))
}

fn json_response(status: u16, body: String) -> Response<std::io::Cursor<Vec<u8>>> {
    Response::from_string(body)
        .with_status_code(status)
        .with_header(
            Header::from_bytes("Content-Type", "application/json")
                .expect("valid content type header"),
        )
}

fn read_json(request: &mut tiny_http::Request) -> Value {
    let mut body = String::new();
    request
        .as_reader()
        .read_to_string(&mut body)
        .expect("request body should be readable");
    serde_json::from_str(&body).expect("request body should be JSON")
}

#[test]
fn unreachable_backend_error_is_actionable() -> Result<()> {
    let client = Client::new(
        "http://127.0.0.1:1",
        Duration::from_millis(50),
        Duration::from_millis(50),
    )?;

    let error = client
        .list_runs()
        .expect_err("listing should fail for unreachable endpoint");
    assert!(matches!(error, ApiError::Unreachable { .. }));
    assert!(error.to_string().contains("start the scraper backend"));
    Ok(())
}

#[test]
fn list_runs_decodes_envelope() -> Result<()> {
    let (server, addr) = mock_server()?;
    let mut faker = ScrapeFaker::new(5);
    let runs = faker.runs(3);
    let payload = success_envelope(Value::Array(runs.iter().map(run_json).collect()));

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.method(), &Method::Get);
        assert_eq!(request.url(), "/api/scrapings");
        request
            .respond(json_response(200, payload))
            .expect("response should succeed");
    });

    let listed = client(&addr)?.list_runs()?;
    assert_eq!(listed, runs);

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn list_entries_hits_run_path() -> Result<()> {
    let (server, addr) = mock_server()?;
    let mut faker = ScrapeFaker::new(9);
    let entries = faker.entries(4);
    let payload = success_envelope(Value::Array(entries.iter().map(entry_json).collect()));

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/api/scrapings/17");
        request
            .respond(json_response(200, payload))
            .expect("response should succeed");
    });

    let listed = client(&addr)?.list_entries(RunId::new(17))?;
    assert_eq!(listed, entries);

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn trigger_scrape_posts_pages_and_reads_outcome() -> Result<()> {
    let (server, addr) = mock_server()?;

    let handle = thread::spawn(move || {
        let mut request = server.recv().expect("request expected");
        assert_eq!(request.method(), &Method::Post);
        assert_eq!(request.url(), "/api/scrape");
        assert_eq!(read_json(&mut request), json!({ "pages": 3 }));
        let body = json!({ "status": "success", "scraping_id": 21, "total": 57 }).to_string();
        request
            .respond(json_response(200, body))
            .expect("response should succeed");
    });

    let outcome = client(&addr)?.trigger_scrape(3)?;
    assert_eq!(outcome.run_id, RunId::new(21));
    assert_eq!(outcome.total, 57);

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn scrape_failure_carries_backend_message() -> Result<()> {
    let (server, addr) = mock_server()?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        request
            .respond(json_response(500, error_envelope("timeout fetching listing")))
            .expect("response should succeed");
    });

    let error = client(&addr)?
        .trigger_scrape(50)
        .expect_err("scrape should fail");
    assert_eq!(
        error.to_string(),
        "server error (500): timeout fetching listing"
    );

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn login_returns_user_or_none_on_401() -> Result<()> {
    let (server, addr) = mock_server()?;

    let handle = thread::spawn(move || {
        let mut accepted = server.recv().expect("request expected");
        assert_eq!(accepted.url(), "/api/auth/login");
        assert_eq!(
            read_json(&mut accepted),
            json!({ "username": "admin", "password": "secret" })
        );
        let body = json!({ "status": "success", "user": { "id": 1, "username": "admin" } });
        accepted
            .respond(json_response(200, body.to_string()))
            .expect("response should succeed");

        let rejected = server.recv().expect("request expected");
        rejected
            .respond(json_response(
                401,
                error_envelope("Username atau password salah"),
            ))
            .expect("response should succeed");
    });

    let client = client(&addr)?;
    let user = client.login("admin", "secret")?;
    assert_eq!(user.map(|user| user.username), Some("admin".to_owned()));
    assert!(client.login("admin", "wrong")?.is_none());

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn unauthorized_outside_login_is_a_server_error() -> Result<()> {
    let (server, addr) = mock_server()?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/api/scrapings");
        request
            .respond(json_response(401, error_envelope("Session expired")))
            .expect("response should succeed");
    });

    let error = client(&addr)?
        .list_runs()
        .expect_err("401 on a listing should fail");
    assert!(matches!(
        error,
        ApiError::Server { status: 401, ref message } if message == "Session expired"
    ));
    assert!(!error.to_string().contains("password"));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn writes_use_expected_methods_and_bodies() -> Result<()> {
    let (server, addr) = mock_server()?;

    let handle = thread::spawn(move || {
        let expectations = [
            (Method::Patch, "/api/scrapings/4/rename", json!({ "name": "Client A" })),
            (Method::Patch, "/api/scrapings/4/notes", json!({ "notes": "call back" })),
            (
                Method::Patch,
                "/api/scrapings/4/tags",
                json!({ "tags": ["Urgent", "Review"] }),
            ),
        ];
        for (method, url, body) in expectations {
            let mut request = server.recv().expect("request expected");
            assert_eq!(request.method(), &method);
            assert_eq!(request.url(), url);
            assert_eq!(read_json(&mut request), body);
            request
                .respond(json_response(200, json!({ "status": "success" }).to_string()))
                .expect("response should succeed");
        }

        let request = server.recv().expect("request expected");
        assert_eq!(request.method(), &Method::Delete);
        assert_eq!(request.url(), "/api/scrapings/4");
        request
            .respond(json_response(
                200,
                json!({ "status": "success", "message": "Scraping deleted" }).to_string(),
            ))
            .expect("response should succeed");
    });

    let client = client(&addr)?;
    let run_id = RunId::new(4);
    client.rename_run(run_id, "Client A")?;
    client.update_notes(run_id, "call back")?;
    client.update_tags(run_id, &["Urgent".to_owned(), "Review".to_owned()])?;
    client.delete_run(run_id)?;

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn csv_downloads_return_raw_bytes() -> Result<()> {
    let (server, addr) = mock_server()?;

    let handle = thread::spawn(move || {
        for expected in ["/api/scrapings/download/csv", "/api/scrapings/2/download/csv"] {
            let request = server.recv().expect("request expected");
            assert_eq!(request.url(), expected);
            let response = Response::from_string("ID,Nama\r\n1,Budi\r\n")
                .with_status_code(200)
                .with_header(
                    Header::from_bytes("Content-Type", "text/csv")
                        .expect("valid content type header"),
                );
            request.respond(response).expect("response should succeed");
        }
    });

    let client = client(&addr)?;
    assert_eq!(client.download_runs_csv()?, b"ID,Nama\r\n1,Budi\r\n".to_vec());
    assert_eq!(
        client.download_entries_csv(RunId::new(2))?,
        b"ID,Nama\r\n1,Budi\r\n".to_vec()
    );

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn error_status_inside_success_response_is_an_error() -> Result<()> {
    let (server, addr) = mock_server()?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        request
            .respond(json_response(200, error_envelope("no such table: scrapings")))
            .expect("response should succeed");
    });

    let error = client(&addr)?
        .list_runs()
        .expect_err("error envelope should fail");
    assert!(matches!(error, ApiError::Server { status: 200, .. }));

    handle.join().expect("server thread should join");
    Ok(())
}
