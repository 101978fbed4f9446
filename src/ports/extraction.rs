//! Extraction Client Port - structured extraction from free text.

use async_trait::async_trait;

use crate::domain::collection::DataCollection;

/// Failures of the extraction capability.
///
/// An error here means the capability could not run; it is distinct from
/// a successful call that found nothing, which returns an empty record.
/// The collection algorithm treats both as "no new data this turn", but
/// the distinction is preserved at this boundary for diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("extraction service unavailable: {0}")]
    Unavailable(String),

    #[error("extraction response could not be parsed: {0}")]
    Parse(String),

    #[error("extraction request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },
}

/// Port for the language-extraction capability.
///
/// Implementations must extract only values the user explicitly stated
/// and never invent missing ones; dates and monetary amounts are the
/// highest-risk fields and may only be filled on explicit mention. The
/// returned record is a best-effort partial: any subset of fields may be
/// set, and callers validate every value before trusting it.
#[async_trait]
pub trait ExtractionClient: Send + Sync {
    /// Extracts whatever schema fields the message explicitly states.
    ///
    /// `question` is the prompt the user was answering, passed along as
    /// context so short answers ("yes", "15.08.") land in the right
    /// field.
    async fn extract(
        &self,
        user_message: &str,
        question: Option<&str>,
    ) -> Result<DataCollection, ExtractionError>;
}
