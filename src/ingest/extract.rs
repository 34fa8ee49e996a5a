// src/ingest/extract.rs
//! Turns the announcements page into [`AnnouncementRecord`]s.
//!
//! Pure: the known-identifier set is only read, and the same markup with the
//! same set always yields the same records in the same order.

use std::collections::HashSet;

use metrics::histogram;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::config::SITE_ORIGIN;
use crate::error::ParseError;
use crate::ingest::types::AnnouncementRecord;

const ROW_SELECTOR: &str = "tr";
const CELL_SELECTOR: &str = "td";
const DOC_LINK_SELECTOR: &str = "a[href*='.pdf'], a[href*='.xbrl']";

struct Selectors {
    row: Selector,
    cell: Selector,
    doc_link: Selector,
}

fn compile(selector: &'static str) -> Result<Selector, ParseError> {
    Selector::parse(selector).map_err(|e| ParseError::Selector {
        selector,
        reason: e.to_string(),
    })
}

impl Selectors {
    fn new() -> Result<Self, ParseError> {
        Ok(Self {
            row: compile(ROW_SELECTOR)?,
            cell: compile(CELL_SELECTOR)?,
            doc_link: compile(DOC_LINK_SELECTOR)?,
        })
    }
}

/// Extract new announcements from `markup`, skipping identifiers in `known`.
pub fn extract(
    markup: &str,
    known: &HashSet<String>,
) -> Result<Vec<AnnouncementRecord>, ParseError> {
    if markup.trim().is_empty() {
        return Err(ParseError::EmptyDocument);
    }

    let t0 = std::time::Instant::now();
    let sel = Selectors::new()?;
    let origin =
        Url::parse(SITE_ORIGIN).map_err(|e| ParseError::Origin(format!("{SITE_ORIGIN}: {e}")))?;
    let doc = Html::parse_document(markup);

    let mut emitted: HashSet<String> = HashSet::new();
    let mut out = Vec::new();
    let mut rows = 0usize;

    for row in doc.select(&sel.row) {
        rows += 1;
        let Some(rec) = parse_row(row, &sel, &origin) else {
            continue;
        };
        if known.contains(&rec.identifier) {
            continue;
        }
        // Same document listed twice on one page: first row wins.
        if !emitted.insert(rec.identifier.clone()) {
            tracing::debug!(target: "ingest", id = %rec.identifier, "duplicate row on page");
            continue;
        }
        out.push(rec);
    }

    histogram!("announce_extract_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    tracing::debug!(target: "ingest", rows, new = out.len(), "page extracted");
    Ok(out)
}

fn parse_row(row: ElementRef<'_>, sel: &Selectors, origin: &Url) -> Option<AnnouncementRecord> {
    let cells: Vec<ElementRef<'_>> = row.select(&sel.cell).collect();
    if cells.len() < 3 {
        return None;
    }

    let company_name = cell_text(cells[0]);
    let report_type = cell_text(cells[1]);

    let href = cells[2]
        .select(&sel.doc_link)
        .next()
        .and_then(|a| a.value().attr("href"))?;
    let document_url = absolutize(href.trim(), origin)?;
    let identifier = identifier_of(&document_url).to_string();

    if company_name.is_empty() || report_type.is_empty() || identifier.is_empty() {
        return None;
    }

    Some(AnnouncementRecord {
        company_name,
        report_type,
        document_url,
        identifier,
    })
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

/// Absolute http(s) links are kept verbatim; relative links are joined onto
/// the site origin (and come back percent-encoded). Links with any other
/// scheme (`javascript:`, `mailto:`) resolve to nothing.
pub fn absolutize(href: &str, origin: &Url) -> Option<String> {
    match Url::parse(href) {
        Ok(u) if matches!(u.scheme(), "http" | "https") => Some(href.to_string()),
        Ok(_) => None,
        Err(_) => origin
            .join(href)
            .ok()
            .filter(|u| matches!(u.scheme(), "http" | "https"))
            .map(|u| u.to_string()),
    }
}

/// Text after the final `/`.
pub fn identifier_of(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or_default()
}
