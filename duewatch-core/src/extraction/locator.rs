//! Client block locator
//!
//! Finds every line announcing a client (`Cliente: <code> - <name>`) and
//! isolates the code and display name. Names are recognized by an ordered
//! cascade of strategies; the first one that yields a usable name wins.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use super::normalize::collapse_whitespace;
use super::settings::ParserSettings;
use crate::domain::{Diagnostic, DiagnosticKind};

/// Any line carrying the marker text and a numeric code
pub(crate) static RE_CLIENT_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Cliente:\s*\d+").expect("valid client marker regex"));

/// Text right before a marker that turns it into the subtotal label
static RE_SUBTOTAL_LEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Total\s+por\s*$").expect("valid subtotal lead regex"));

static RE_STRICT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)Cliente:\s*(\d+)\s*-\s*([A-ZÀ-ÿ][A-ZÀ-ÿ\s\.\-&/']*?)(?:\s+(?:Dt\.Vencto|Dt\.Emissao|Total)|\s*$)",
    )
    .expect("valid strict client regex")
});
static RE_NO_DIGITS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Cliente:\s*(\d+)\s*-\s*([A-ZÀ-ÿ][^0-9]*?)(?:\s+(?:Dt\.|Total)|\s*$)")
        .expect("valid no-digits client regex")
});
static RE_UP_TO_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Cliente:\s*(\d+)\s*-\s*(.+?)(?:\s+(?:Dt\.Vencto|Total)|$)")
        .expect("valid keyword client regex")
});
static RE_CODE_ONLY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Cliente:\s*(\d+)\s*-?\s*(.*)$").expect("valid code-only client regex")
});

static RE_NAME_TAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s+(?:Dt\.Vencto|Dt\.Emissao|Total|#NF|\d{2}/\d{2}/\d{4}).*$")
        .expect("valid name tail regex")
});
static RE_TRAILING_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s+\d{1,3}(?:\.\d{3})*,\d{2}\s*$").expect("valid trailing amount regex")
});
static RE_TRAILING_STRAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s+(?:[A-Za-z]|\d{1,2})$").expect("valid trailing stray regex")
});
static RE_RECOVERY_CUT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s+(?:Dt\.|Total|\d{2}/\d{2}/\d{4}|\d{1,3}(?:\.\d{3})*,\d{2})")
        .expect("valid recovery cut regex")
});
static RE_NOT_A_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:Cliente:|Dt\.Vencto|Dt\.Emissao|^Total|^\d{1,2}/\d{1,2}/\d{4}|^Página|^Filial)")
        .expect("valid not-a-name regex")
});

/// How a client's name was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameSource {
    Strict,
    Relaxed,
    Truncated,
    NextLine,
    Missing,
}

impl NameSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            NameSource::Strict => "strict",
            NameSource::Relaxed => "relaxed pattern",
            NameSource::Truncated => "truncated",
            NameSource::NextLine => "next line",
            NameSource::Missing => "missing",
        }
    }

    fn is_recovered(&self) -> bool {
        !matches!(self, NameSource::Strict | NameSource::Missing)
    }
}

/// Code and optional name read from one marker line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCapture {
    pub code: String,
    pub name: Option<String>,
    pub source: NameSource,
}

type Strategy = fn(&str, &ParserSettings) -> Option<ClientCapture>;

/// Tried in order on every marker line
const CASCADE: &[Strategy] = &[strict, no_digits, up_to_keyword, code_only];

/// A located client: one per distinct code, at its first marker line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientMarker {
    pub line: usize,
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocatedClients {
    /// Distinct clients in order of first appearance
    pub clients: Vec<ClientMarker>,
    /// Every marker line (repeats included) mapped to its client's index
    pub marker_lines: HashMap<usize, usize>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ClientMarker {
    /// Keep the longer of two captures of the same client's name
    fn refine_name(&mut self, candidate: String) -> bool {
        if candidate.chars().count() > self.name.chars().count() {
            self.name = candidate;
            return true;
        }
        false
    }
}

impl LocatedClients {
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

/// Run the cascade over a single line, starting at its first real marker
pub fn capture_client(line: &str, settings: &ParserSettings) -> Option<ClientCapture> {
    let start = marker_start(line)?;
    let rest = &line[start..];
    CASCADE.iter().find_map(|strategy| strategy(rest, settings))
}

/// `Total por Cliente: 1.500,00 ...` carries the marker text but closes a block
fn marker_start(line: &str) -> Option<usize> {
    RE_CLIENT_MARKER
        .find_iter(line)
        .map(|m| m.start())
        .find(|&start| !RE_SUBTOTAL_LEAD.is_match(&line[..start]))
}

/// Locate all client markers in the segmented lines
pub fn locate_clients(lines: &[String], settings: &ParserSettings) -> LocatedClients {
    let mut located = LocatedClients::default();
    let mut by_code: HashMap<String, usize> = HashMap::new();

    for (i, line) in lines.iter().enumerate() {
        let Some(mut capture) = capture_client(line, settings) else {
            continue;
        };

        if capture.name.is_none() {
            if let Some(name) = lines.get(i + 1).and_then(|next| name_from_next_line(next, settings)) {
                capture.name = Some(name);
                capture.source = NameSource::NextLine;
            }
        }

        let name = capture.name.clone().unwrap_or_default();

        if let Some(&idx) = by_code.get(&capture.code) {
            located.marker_lines.insert(i, idx);
            let mut message = format!("client {} announced again", capture.code);
            if located.clients[idx].refine_name(name) {
                message.push_str(", name refined");
            }
            located.diagnostics.push(
                Diagnostic::new(DiagnosticKind::DuplicateClient, message)
                    .at_line(i)
                    .for_client(&capture.code),
            );
            continue;
        }

        match capture.source {
            NameSource::Missing => located.diagnostics.push(
                Diagnostic::new(DiagnosticKind::ClientNameUnresolved, "no usable client name")
                    .at_line(i)
                    .for_client(&capture.code),
            ),
            source if source.is_recovered() => located.diagnostics.push(
                Diagnostic::new(
                    DiagnosticKind::ClientNameRecovered,
                    format!("name recovered ({})", source.as_str()),
                )
                .at_line(i)
                .for_client(&capture.code),
            ),
            _ => {}
        }

        let idx = located.clients.len();
        by_code.insert(capture.code.clone(), idx);
        located.marker_lines.insert(i, idx);
        located.clients.push(ClientMarker {
            line: i,
            code: capture.code,
            name,
        });
    }

    located
}

fn strict(line: &str, settings: &ParserSettings) -> Option<ClientCapture> {
    let caps = RE_STRICT.captures(line)?;
    let name = usable(collapse_whitespace(&caps[2]), settings)?;
    Some(ClientCapture {
        code: caps[1].to_string(),
        name: Some(name),
        source: NameSource::Strict,
    })
}

fn no_digits(line: &str, settings: &ParserSettings) -> Option<ClientCapture> {
    let caps = RE_NO_DIGITS.captures(line)?;
    let name = usable(clean_name(&caps[2]), settings)?;
    Some(ClientCapture {
        code: caps[1].to_string(),
        name: Some(name),
        source: NameSource::Relaxed,
    })
}

fn up_to_keyword(line: &str, settings: &ParserSettings) -> Option<ClientCapture> {
    let caps = RE_UP_TO_KEYWORD.captures(line)?;
    let name = usable(strip_stray_tail(&clean_name(&caps[2])), settings)?;
    Some(ClientCapture {
        code: caps[1].to_string(),
        name: Some(name),
        source: NameSource::Relaxed,
    })
}

/// Last resort: keep the code even when no clean name can be isolated
fn code_only(line: &str, settings: &ParserSettings) -> Option<ClientCapture> {
    let caps = RE_CODE_ONLY.captures(line)?;
    let rest = caps[2].trim();
    let head = RE_RECOVERY_CUT
        .splitn(rest, 2)
        .next()
        .unwrap_or_default();

    let mut name = strip_stray_tail(&clean_name(head));
    if name.chars().count() > settings.max_name_len {
        name = name.chars().take(settings.truncated_name_len).collect::<String>().trim_end().to_string();
    }

    let name = usable(name, settings);
    let source = if name.is_some() {
        NameSource::Truncated
    } else {
        NameSource::Missing
    };
    Some(ClientCapture {
        code: caps[1].to_string(),
        name,
        source,
    })
}

fn name_from_next_line(next: &str, settings: &ParserSettings) -> Option<String> {
    if RE_NOT_A_NAME.is_match(next) {
        return None;
    }
    usable(strip_stray_tail(&clean_name(next)), settings)
}

/// Drop trailing column headers, dates and amounts from a captured name
fn clean_name(raw: &str) -> String {
    let name = RE_NAME_TAIL.replace(raw, "");
    let name = RE_TRAILING_AMOUNT.replace(&name, "");
    collapse_whitespace(&name)
}

fn strip_stray_tail(name: &str) -> String {
    RE_TRAILING_STRAY.replace(name, "").trim().to_string()
}

/// A name is usable when it has a letter and its length falls within the configured bounds
fn usable(name: String, settings: &ParserSettings) -> Option<String> {
    let trimmed = name.trim().trim_end_matches(['-', '.']).trim();
    let len = trimmed.chars().count();
    if len >= settings.min_name_len
        && len <= settings.max_name_len
        && trimmed.chars().any(char::is_alphabetic)
    {
        Some(trimmed.to_string())
    } else {
        None
    }
}
