// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use harvest_app::timefmt;
use std::fmt::Write as _;
use time::OffsetDateTime;

use crate::Sheet;

const STYLE: &str = "body { font-family: Arial, sans-serif; margin: 20px; }\n\
h1 { color: #132440; margin-bottom: 10px; }\n\
.meta { color: #666; font-size: 14px; margin-bottom: 10px; }\n\
table { width: 100%; border-collapse: collapse; margin-top: 20px; }\n\
th, td { border: 1px solid #ddd; padding: 12px; text-align: left; }\n\
th { background-color: #132440; color: white; font-weight: bold; }\n\
tr:nth-child(even) { background-color: #f2f2f2; }\n";

/// Standalone HTML page for printing `sheet`: title, printed-at stamp, row
/// total and the table.
pub fn print_document(title: &str, sheet: &Sheet, printed_at: OffsetDateTime) -> String {
    let mut html = String::new();
    let title = escape_html(title);
    let _ = writeln!(html, "<!DOCTYPE html>");
    let _ = writeln!(html, "<html><head><meta charset=\"utf-8\"><title>{title}</title>");
    let _ = writeln!(html, "<style>\n{STYLE}</style></head><body>");
    let _ = writeln!(html, "<h1>{title}</h1>");
    let _ = writeln!(
        html,
        "<div class=\"meta\">Printed at: {}</div>",
        timefmt::format_display(printed_at)
    );
    let _ = writeln!(html, "<div class=\"meta\">Total: {}</div>", sheet.rows.len());
    html.push_str("<table><thead><tr>");
    for header in sheet.headers() {
        let _ = write!(html, "<th>{}</th>", escape_html(header));
    }
    html.push_str("</tr></thead><tbody>\n");
    for row in &sheet.rows {
        html.push_str("<tr>");
        for cell in row {
            let _ = write!(html, "<td>{}</td>", escape_html(cell));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody></table></body></html>\n");
    html
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
