//! Page Fetch and Analysis
//!
//! One blocking HTTP GET per work unit, followed by markup analysis. A
//! failed unit is recorded, never propagated — the crawl pool treats
//! network input as untrusted and keeps going.

use serde::{Deserialize, Serialize};
use std::io::Read;
use std::time::Instant;

/// Fixed identifying client header sent with every fetch
pub const USER_AGENT: &str = concat!("scalebench/", env!("CARGO_PKG_VERSION"));

const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Outcome of fetching and analyzing one URL.
///
/// Exactly one record exists per input URL, successful or not. Serialized
/// verbatim into the crawl RunResult document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchRecord {
    /// The fetched URL
    pub url: String,
    /// Whether fetch and analysis succeeded
    pub ok: bool,
    /// HTTP status code, when one was received
    pub status: Option<u16>,
    /// Wall-clock time spent on this unit
    pub elapsed_ms: u64,
    /// Page title, first non-empty text inside `<title>`
    pub title: Option<String>,
    /// Whitespace-delimited token count of the extracted text
    pub word_count: Option<u64>,
    /// Classified error, `"<kind>: <detail>"`, for failed units
    pub error: Option<String>,
}

/// Classification of a failed fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// Server answered with a 4xx/5xx status
    HttpStatus,
    /// Connect, DNS, TLS, or timeout failure — no usable response
    Transport,
    /// Anything else (e.g. a read error mid-body)
    Other,
}

impl FetchErrorKind {
    /// Stable label used as the prefix of `FetchRecord::error`
    pub fn as_str(self) -> &'static str {
        match self {
            FetchErrorKind::HttpStatus => "http-status",
            FetchErrorKind::Transport => "transport",
            FetchErrorKind::Other => "other",
        }
    }
}

/// Fetch one URL and analyze the returned markup.
///
/// The per-fetch timeout lives in the agent. Every failure path produces a
/// failed record with a classified error kind; this function never panics
/// and never returns `Err`.
pub fn fetch_and_analyze(agent: &ureq::Agent, url: &str) -> FetchRecord {
    let start = Instant::now();

    let response = agent
        .get(url)
        .set("User-Agent", USER_AGENT)
        .set("Accept", ACCEPT)
        .call();

    match response {
        Ok(resp) => {
            let status = resp.status();
            let mut raw = Vec::new();
            if let Err(e) = resp.into_reader().read_to_end(&mut raw) {
                return failed_record(
                    url,
                    Some(status),
                    start,
                    FetchErrorKind::Other,
                    &format!("body read: {e}"),
                );
            }

            let html = decode_body(raw);
            let (title, text) = extract_text(&html);

            FetchRecord {
                url: url.to_string(),
                ok: true,
                status: Some(status),
                elapsed_ms: start.elapsed().as_millis() as u64,
                title,
                word_count: Some(text.split_whitespace().count() as u64),
                error: None,
            }
        }
        Err(ureq::Error::Status(code, _resp)) => failed_record(
            url,
            Some(code),
            start,
            FetchErrorKind::HttpStatus,
            &code.to_string(),
        ),
        // Everything that is not an HTTP status is a transport-level
        // failure: connect, DNS, TLS, or the per-fetch timeout
        Err(other) => failed_record(
            url,
            None,
            start,
            FetchErrorKind::Transport,
            &other.to_string(),
        ),
    }
}

fn failed_record(
    url: &str,
    status: Option<u16>,
    start: Instant,
    kind: FetchErrorKind,
    detail: &str,
) -> FetchRecord {
    FetchRecord {
        url: url.to_string(),
        ok: false,
        status,
        elapsed_ms: start.elapsed().as_millis() as u64,
        title: None,
        word_count: None,
        error: Some(format!("{}: {}", kind.as_str(), detail)),
    }
}

/// Decode a body as UTF-8, falling back to Latin-1 on invalid sequences.
///
/// In Latin-1 every byte maps to the code point of the same value, so the
/// fallback cannot fail.
fn decode_body(raw: Vec<u8>) -> String {
    match String::from_utf8(raw) {
        Ok(s) => s,
        Err(e) => e.into_bytes().iter().map(|&b| b as char).collect(),
    }
}

/// Extract the page title and the visible text from markup.
///
/// A small tag-stripping scan: tags and comments are dropped, everything
/// between them is text. The title is the first non-empty text inside
/// `<title>`. Text segments are joined with single spaces.
pub fn extract_text(html: &str) -> (Option<String>, String) {
    let mut chunks: Vec<&str> = Vec::new();
    let mut title: Option<String> = None;
    let mut in_title = false;
    let mut pos = 0;

    while let Some(lt) = html[pos..].find('<') {
        let data = &html[pos..pos + lt];
        handle_data(data, in_title, &mut title, &mut chunks);

        let rest = &html[pos + lt..];
        if rest.starts_with("<!--") {
            match rest.find("-->") {
                Some(end) => {
                    pos = pos + lt + end + 3;
                    continue;
                }
                None => return (title, chunks.join(" ")),
            }
        }

        match rest.find('>') {
            Some(gt) => {
                let tag = rest[1..gt].trim();
                let closing = tag.starts_with('/');
                let name: String = tag
                    .trim_start_matches('/')
                    .chars()
                    .take_while(|c| c.is_ascii_alphanumeric())
                    .collect::<String>()
                    .to_ascii_lowercase();
                if name == "title" {
                    in_title = !closing;
                }
                pos = pos + lt + gt + 1;
            }
            // Unterminated tag: the remainder is markup junk, drop it
            None => return (title, chunks.join(" ")),
        }
    }

    handle_data(&html[pos..], in_title, &mut title, &mut chunks);
    (title, chunks.join(" "))
}

fn handle_data<'a>(
    data: &'a str,
    in_title: bool,
    title: &mut Option<String>,
    chunks: &mut Vec<&'a str>,
) {
    if data.is_empty() {
        return;
    }
    if in_title && title.is_none() {
        let cleaned = data.trim();
        if !cleaned.is_empty() {
            *title = Some(cleaned.to_string());
        }
    }
    chunks.push(data);
}
