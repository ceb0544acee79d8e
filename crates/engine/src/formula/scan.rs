//! Reference scanning over formula text.
//!
//! `RefScanner` walks formula text in a single forward pass and yields the
//! raw reference tokens it finds: single cell addresses and `start:end`
//! range pairs. Tokens carry the original text (including `$` markers),
//! unvalidated; resolution happens in [`super::addr`].
//!
//! The scanner classifies one character at a time (letter, digit, `$`, `:`,
//! space, other) with no lookahead. Non-address text such as function
//! names, operators and numbers is skipped, not emitted. It has no notion
//! of quoted literals: callers must hand it only the parts of a formula
//! expected to contain references.

use std::iter::Peekable;
use std::str::Chars;

use crate::error::RefError;

/// A raw reference token extracted from formula text.
///
/// Address text is exactly as written (case and `$` markers preserved) and
/// may still fail resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefToken {
    /// One cell address, e.g. `B12` or `$AB$3`.
    Single(String),
    /// Two corner addresses joined by `:`, e.g. `MN93:PQ99`. Corners are in
    /// source order; the rectangle is normalized during expansion, not here.
    Range(String, String),
}

/// Lazy scanner over formula text. Single pass, not restartable.
pub struct RefScanner<'a> {
    chars: Peekable<Chars<'a>>,
}

/// Scanner state for the address token currently in flight.
enum State {
    /// Between tokens.
    Idle,
    /// Consumed a `$` that may start an address.
    SawDollar,
    /// Inside the column letters; `row_dollar` set once a `$` for the row
    /// part has been consumed (only digits may follow it).
    InLetters { row_dollar: bool },
    /// Inside the row digits; the token is complete as soon as the digits
    /// end.
    InDigits,
}

impl<'a> RefScanner<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { chars: text.chars().peekable() }
    }
}

impl Iterator for RefScanner<'_> {
    type Item = RefToken;

    fn next(&mut self) -> Option<RefToken> {
        // Address completed earlier in this call, waiting to learn whether
        // a `:` follows it.
        let mut held: Option<String> = None;
        // Start address of a range whose `:` has been consumed.
        let mut pending: Option<String> = None;
        let mut buf = String::new();
        let mut state = State::Idle;

        loop {
            let Some(&c) = self.chars.peek() else {
                // End of input. A token in InDigits is complete; anything
                // else in flight is dropped and whichever address is still
                // held falls back to a Single.
                if let State::InDigits = state {
                    if let Some(start) = pending.take() {
                        return Some(RefToken::Range(start, buf));
                    }
                    return Some(RefToken::Single(buf));
                }
                return pending.take().or(held).map(RefToken::Single);
            };

            match state {
                State::Idle => {
                    if c.is_whitespace() {
                        // Permitted around a range `:`; otherwise noise.
                        self.chars.next();
                    } else if c == ':' {
                        self.chars.next();
                        if let Some(start) = held.take() {
                            pending = Some(start);
                        } else if let Some(start) = pending.take() {
                            // Second `:` before the range closed.
                            log::warn!("{}", RefError::AmbiguousRangeMarker);
                            return Some(RefToken::Single(start));
                        }
                        // Stray `:` with nothing held: skip.
                    } else if held.is_some() {
                        // Next non-space character is not `:`; the held
                        // address stands alone. Leave `c` for the rescan.
                        return held.map(RefToken::Single);
                    } else if c == '$' {
                        self.chars.next();
                        buf.push(c);
                        state = State::SawDollar;
                    } else if c.is_ascii_alphabetic() {
                        self.chars.next();
                        buf.push(c);
                        state = State::InLetters { row_dollar: false };
                    } else {
                        // Digits, operators, parentheses: skipped. Anything
                        // interposed after a `:` other than whitespace
                        // cancels the pending range.
                        self.chars.next();
                        if let Some(start) = pending.take() {
                            return Some(RefToken::Single(start));
                        }
                    }
                }

                State::SawDollar => {
                    if c.is_ascii_alphabetic() {
                        self.chars.next();
                        buf.push(c);
                        state = State::InLetters { row_dollar: false };
                    } else {
                        // `$` not followed by letters is not an address.
                        // Drop the prefix and rescan from `c`.
                        buf.clear();
                        state = State::Idle;
                        if let Some(start) = pending.take() {
                            return Some(RefToken::Single(start));
                        }
                    }
                }

                State::InLetters { row_dollar } => {
                    if c.is_ascii_digit() {
                        self.chars.next();
                        buf.push(c);
                        state = State::InDigits;
                    } else if !row_dollar && c.is_ascii_alphabetic() {
                        self.chars.next();
                        buf.push(c);
                    } else if !row_dollar && c == '$' {
                        self.chars.next();
                        buf.push(c);
                        state = State::InLetters { row_dollar: true };
                    } else {
                        // Letters with no digits yet (a word, a function
                        // name) are not an address. Rescan from `c`.
                        buf.clear();
                        state = State::Idle;
                        if let Some(start) = pending.take() {
                            return Some(RefToken::Single(start));
                        }
                    }
                }

                State::InDigits => {
                    if c.is_ascii_digit() {
                        self.chars.next();
                        buf.push(c);
                    } else if c.is_ascii_alphabetic() {
                        // Letter after digits: malformed. The prefix is
                        // discarded and scanning resumes from `c`.
                        buf.clear();
                        state = State::Idle;
                        if let Some(start) = pending.take() {
                            return Some(RefToken::Single(start));
                        }
                    } else {
                        // Token complete; `c` stays unconsumed so the Idle
                        // state can check it for a trailing `:`.
                        let addr = std::mem::take(&mut buf);
                        state = State::Idle;
                        if let Some(start) = pending.take() {
                            // A range end never starts another range.
                            return Some(RefToken::Range(start, addr));
                        }
                        held = Some(addr);
                    }
                }
            }
        }
    }
}
