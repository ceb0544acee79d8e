//! Address rewriting for structural edits.
//!
//! When rows or columns are inserted or deleted, or when a formula is
//! pasted at an offset, the addresses embedded in formula text have to
//! move. These helpers rewrite the text itself; callers re-`update` the
//! affected cells afterwards, so no graph state is touched here.
//!
//! References into a deleted row/column band cannot be adjusted; they are
//! tagged in place with [`ERR_ROW`]/[`ERR_COL`] so the breakage is visible
//! in the formula text instead of silently pointing at a survivor cell.

use crate::cell_key::CellKey;
use crate::formula::addr::{format_addr, resolve, FixedFlags};

/// Tag spliced in front of a reference whose row was deleted or pushed out
/// of range.
pub const ERR_ROW: &str = "#ErrRow#";
/// Same for columns.
pub const ERR_COL: &str = "#ErrCol#";

/// Rewrite addresses after inserting or deleting rows/columns.
///
/// Rows beyond `after_row` move by `row_delta` (columns likewise). A
/// negative delta deletes the band `after_row+1 ..= after_row-row_delta`;
/// references into the band are error-tagged instead of moved. `$`-fixed
/// components move like any other (the sheet shifted under them) but keep
/// their markers in the rewritten text.
pub fn shift_for_insert_delete(
    text: &str,
    after_row: u32,
    row_delta: i64,
    after_col: u32,
    col_delta: i64,
) -> String {
    rewrite_addresses(text, |key, flags| {
        let mut err = String::new();
        let row = shift_component(key.row, after_row, row_delta, &mut err, ERR_ROW);
        let col = shift_component(key.col, after_col, col_delta, &mut err, ERR_COL);
        format!("{}{}", err, format_addr(CellKey::new(row, col), flags))
    })
}

/// Move one coordinate past a threshold, tagging deletions.
fn shift_component(value: u32, after: u32, delta: i64, err: &mut String, tag: &str) -> u32 {
    if delta > 0 {
        if value > after {
            return value + delta as u32;
        }
    } else if delta < 0 {
        let band_end = after as i64 - delta; // after + |delta|
        if (value as i64) > after as i64 && (value as i64) <= band_end {
            err.push_str(tag);
        } else if (value as i64) > band_end {
            return (value as i64 + delta) as u32;
        }
    }
    value
}

/// Rewrite addresses for paste at an offset.
///
/// Every component moves by the delta unless the user pinned it with a `$`
/// marker. Components that would land before row/column 1 are error-tagged
/// and left at their original value.
pub fn shift_for_paste(text: &str, row_delta: i64, col_delta: i64) -> String {
    rewrite_addresses(text, |key, flags| {
        let mut err = String::new();

        let mut row = key.row as i64;
        if !flags.row_fixed {
            row += row_delta;
        }
        if row < 1 {
            err.push_str(ERR_ROW);
            row = key.row as i64;
        }

        let mut col = key.col as i64;
        if !flags.col_fixed {
            col += col_delta;
        }
        if col < 1 {
            err.push_str(ERR_COL);
            col = key.col as i64;
        }

        format!(
            "{}{}",
            err,
            format_addr(CellKey::new(row as u32, col as u32), flags)
        )
    })
}

/// Walk the text, passing every token that resolves as an address through
/// `rewrite` and copying everything else verbatim.
///
/// Candidate tokens are maximal runs of alphanumerics and `$`, the same
/// shape the reference scanner tracks; anything that fails resolution
/// (function names, numbers, plain words) is left untouched.
fn rewrite_addresses(text: &str, mut rewrite: impl FnMut(CellKey, FixedFlags) -> String) -> String {
    let mut out = String::with_capacity(text.len());
    let mut token = String::new();

    let mut flush = |out: &mut String, token: &mut String| {
        if token.is_empty() {
            return;
        }
        match resolve(token) {
            Ok((key, flags)) => out.push_str(&rewrite(key, flags)),
            Err(_) => out.push_str(token),
        }
        token.clear();
    };

    for c in text.chars() {
        if c.is_ascii_alphanumeric() || c == '$' {
            token.push(c);
        } else {
            flush(&mut out, &mut token);
            out.push(c);
        }
    }
    flush(&mut out, &mut token);
    out
}
