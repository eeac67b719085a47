//! Parse diagnostics - what the extractor skipped, repaired or guessed

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// An over-long line was re-split into several logical rows
    LineSplit,
    /// A title row matched but one of its amounts was unusable
    RowRejected,
    /// A line starts like a title row but the row shape did not match
    UnparsedRow,
    /// A title row appeared before any client marker
    OrphanRow,
    /// A client marker was found but no usable name could be isolated
    ClientNameUnresolved,
    /// A client name came from a permissive pattern or the next line
    ClientNameRecovered,
    /// The same client code was announced again
    DuplicateClient,
    /// An identical title was read twice for the same client
    DuplicateTitle,
    /// The printed subtotal was used because the client had no titles
    SubtotalFallback,
    /// A client block produced no titles and no subtotal
    EmptyClient,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::LineSplit => "line_split",
            DiagnosticKind::RowRejected => "row_rejected",
            DiagnosticKind::UnparsedRow => "unparsed_row",
            DiagnosticKind::OrphanRow => "orphan_row",
            DiagnosticKind::ClientNameUnresolved => "client_name_unresolved",
            DiagnosticKind::ClientNameRecovered => "client_name_recovered",
            DiagnosticKind::DuplicateClient => "duplicate_client",
            DiagnosticKind::DuplicateTitle => "duplicate_title",
            DiagnosticKind::SubtotalFallback => "subtotal_fallback",
            DiagnosticKind::EmptyClient => "empty_client",
        }
    }
}

/// A recoverable issue recorded during a parse
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// 0-based index into the segmented lines, when tied to one line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_code: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            line: None,
            client_code: None,
            message: message.into(),
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn for_client(mut self, code: impl Into<String>) -> Self {
        self.client_code = Some(code.into());
        self
    }
}
