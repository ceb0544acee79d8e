//! Cell address resolution.
//!
//! Converts address text (`A1`, `$AB$12`) into a validated `CellKey` plus
//! the `$`-fixed flags, or rejects it. The accepted grammar, left to right:
//!
//! ```text
//! [spaces] [$] letter+ [$] digit+ [spaces]
//! ```
//!
//! Column letters use bijective base-26 (`A=1`, `Z=26`, `AA=27`), rows are
//! base-10 and 1-based. Anything else is `MalformedAddress`, never a
//! partial result.

use serde::{Deserialize, Serialize};

use crate::cell_key::{col_to_letters, CellKey};
use crate::error::RefError;

/// Which components of an address carried a `$` prefix.
///
/// Informational for the link graph itself; consumed by address shifting
/// (see [`super::shift`]) where fixed components stay put on paste.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedFlags {
    /// `$` preceded the row digits (`A$1`)
    pub row_fixed: bool,
    /// `$` preceded the column letters (`$A1`)
    pub col_fixed: bool,
}

impl FixedFlags {
    /// Flags with neither component fixed.
    pub fn none() -> Self {
        Self::default()
    }
}

/// Resolve address text into a `CellKey` and its fixed flags.
///
/// Letters are case-insensitive; surrounding spaces are tolerated. Rejects
/// empty input, digits before letters, misplaced `$`, embedded spaces,
/// row 0, and columns/rows too large to represent.
pub fn resolve(text: &str) -> Result<(CellKey, FixedFlags), RefError> {
    let malformed = || RefError::MalformedAddress(text.to_string());

    let s = text.trim();
    let mut chars = s.chars().peekable();

    let col_fixed = if chars.peek() == Some(&'$') {
        chars.next();
        true
    } else {
        false
    };

    let mut col: u32 = 0;
    let mut saw_letter = false;
    while let Some(&c) = chars.peek() {
        if !c.is_ascii_alphabetic() {
            break;
        }
        let v = (c.to_ascii_uppercase() as u32) - ('A' as u32) + 1;
        col = col
            .checked_mul(26)
            .and_then(|n| n.checked_add(v))
            .ok_or_else(malformed)?;
        saw_letter = true;
        chars.next();
    }
    if !saw_letter {
        return Err(malformed());
    }

    let row_fixed = if chars.peek() == Some(&'$') {
        chars.next();
        true
    } else {
        false
    };

    let mut row: u32 = 0;
    let mut saw_digit = false;
    while let Some(&c) = chars.peek() {
        let Some(d) = c.to_digit(10) else { break };
        row = row
            .checked_mul(10)
            .and_then(|n| n.checked_add(d))
            .ok_or_else(malformed)?;
        saw_digit = true;
        chars.next();
    }
    if !saw_digit || row == 0 {
        return Err(malformed());
    }

    // Nothing may follow the row digits (spaces were trimmed up front).
    if chars.next().is_some() {
        return Err(malformed());
    }

    Ok((CellKey::new(row, col), FixedFlags { row_fixed, col_fixed }))
}

/// Render the canonical text form of an address: uppercase letters, no
/// spaces, `$` markers per `flags`.
///
/// Restricted to canonical forms, this is the two-sided inverse of
/// [`resolve`].
pub fn format_addr(key: CellKey, flags: FixedFlags) -> String {
    format!(
        "{}{}{}{}",
        if flags.col_fixed { "$" } else { "" },
        col_to_letters(key.col),
        if flags.row_fixed { "$" } else { "" },
        key.row
    )
}
