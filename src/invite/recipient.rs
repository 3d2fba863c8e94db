//! Recipient normalization and address checks.
//!
//! Parsing never fails: anything that is not a display form comes back
//! trimmed, and [`EmailValidator`] decides whether it is worth sending to.

use email_address::EmailAddress;

use crate::models::RecipientInput;

/// Split a batch into raw entries, preserving order. Every entry is kept,
/// blank ones included, so each gets its own outcome.
pub fn split_batch(input: &RecipientInput) -> Vec<String> {
    match input {
        RecipientInput::Joined(joined) => joined.split(',').map(str::to_string).collect(),
        RecipientInput::List(list) => list.clone(),
    }
}

/// Extract the bare address from `"Display Name <addr>"`, or return the
/// trimmed input unchanged.
pub fn parse_recipient(raw: &str) -> String {
    let trimmed = raw.trim();

    if let Some(close) = trimmed.rfind('>') {
        if let Some(open) = trimmed[..close].rfind('<') {
            return trimmed[open + 1..close].trim().to_string();
        }
    }

    trimmed.to_string()
}

/// Structural well-formedness check run before any send.
pub trait EmailValidator: Send + Sync {
    fn is_valid(&self, address: &str) -> bool;
}

/// RFC 5322 syntax check; no DNS or deliverability probing.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntaxValidator;

impl EmailValidator for SyntaxValidator {
    fn is_valid(&self, address: &str) -> bool {
        EmailAddress::is_valid(address)
    }
}
