//! Prescription parser collaborator — an LLM behind a narrow trait.
//!
//! The core consumes structured medication data only; prompt transport
//! and model choice live behind `PrescriptionParser`. The wire shape in
//! `types` is the one contract that must stay exact.

pub mod client;
pub mod types;

pub use client::{HttpParserClient, MockParser};
pub use types::{RawMedication, RawPrescription, RawSchedule};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Cannot reach parser service at {0}")]
    Connection(String),

    #[error("Parser request timed out after {0}s")]
    Timeout(u64),

    #[error("Parser service error: HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("No JSON block found in parser response")]
    MissingJson,

    #[error("Malformed prescription JSON: {0}")]
    Malformed(String),

    #[error("Parser returned no medications")]
    Empty,
}

/// LLM collaborator contract. Implementations must return the exact
/// `RawPrescription` wire shape; everything downstream defaults missing
/// fields defensively instead of failing.
pub trait PrescriptionParser: Send + Sync {
    fn parse_text(&self, text: &str) -> Result<RawPrescription, ParseError>;
    fn parse_image(&self, bytes: &[u8], mime_type: &str) -> Result<RawPrescription, ParseError>;
}
