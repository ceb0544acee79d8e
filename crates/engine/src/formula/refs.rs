//! Reference extraction from formula text.
//!
//! Bridges the scanner and the resolver: scans the text for raw tokens,
//! resolves each one, expands ranges to their rectangular closure, and
//! returns the deduplicated set of cells the formula references.
//!
//! Failures are local: a token that does not resolve is dropped with a
//! warning and extraction continues with the rest of the text.

use rustc_hash::FxHashSet;

use crate::cell_key::CellKey;
use crate::error::RefError;
use crate::formula::addr::resolve;
use crate::formula::scan::{RefScanner, RefToken};

/// Extract every cell referenced by the given formula body (text after the
/// leading `=`).
///
/// A `Range` token contributes the full rectangle spanned by its two
/// corners, whichever order they were written in. A range with an endpoint
/// that fails to resolve is discarded whole, never partially applied.
pub fn extract_links(text: &str) -> FxHashSet<CellKey> {
    let mut links = FxHashSet::default();

    for token in RefScanner::new(text) {
        match token {
            RefToken::Single(addr) => match resolve(&addr) {
                Ok((key, _)) => {
                    links.insert(key);
                }
                Err(err) => log::warn!("dropping reference: {err}"),
            },
            RefToken::Range(start, end) => match (resolve(&start), resolve(&end)) {
                (Ok((a, _)), Ok((b, _))) => {
                    for row in a.row.min(b.row)..=a.row.max(b.row) {
                        for col in a.col.min(b.col)..=a.col.max(b.col) {
                            links.insert(CellKey::new(row, col));
                        }
                    }
                }
                _ => {
                    log::warn!("dropping range: {}", RefError::MalformedRange(start, end));
                }
            },
        }
    }

    links
}
