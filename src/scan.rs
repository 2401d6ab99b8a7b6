//! Issue-key extraction from free text.
//!
//! The scanner is a greedy left-to-right token recognizer, not a grammar: a
//! key is any occurrence of `<mnemonic>-` followed by one or more ASCII
//! digits, wherever it appears in the text. A mnemonic that occurs inside a
//! longer token still matches; that ambiguity is part of the recognized
//! language and callers must not rely on word boundaries.

use crate::events::CapturedError;

/// One pending scan window: a byte offset into the text and the next
/// mnemonic to try against it.
struct Frame {
    start: usize,
    mnemonic: usize,
}

/// Lazy iterator over issue keys found in a text.
///
/// For each mnemonic in configured order, the scanner finds the first
/// `<mnemonic>-` in its window, consumes the digit run that follows, yields
/// the composed key when at least one digit was consumed, and then re-scans
/// the remainder with the full mnemonic set before moving on to the next
/// mnemonic. The same key can therefore be yielded more than once when
/// several mnemonic passes cover overlapping regions; duplicates are
/// deliberately preserved.
pub struct KeyScan<'a> {
    mnemonics: &'a [String],
    text: &'a str,
    stack: Vec<Frame>,
}

impl Iterator for KeyScan<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            let frame = self.stack.last_mut()?;
            let Some(mnemonic) = self.mnemonics.get(frame.mnemonic) else {
                self.stack.pop();
                continue;
            };
            frame.mnemonic += 1;
            let start = frame.start;

            let marker = format!("{mnemonic}-");
            let Some(pos) = self.text[start..].find(&marker) else {
                continue;
            };
            let key_start = start + pos;
            let digits_start = key_start + marker.len();
            let digits = self.text[digits_start..]
                .bytes()
                .take_while(u8::is_ascii_digit)
                .count();
            let resume = digits_start + digits;

            // The remainder is handled before this window's next mnemonic.
            self.stack.push(Frame { start: resume, mnemonic: 0 });
            if digits > 0 {
                return Some(self.text[key_start..resume].to_string());
            }
        }
    }
}

/// Scans `text` for issue keys built from the given mnemonics.
///
/// Returns a lazy, finite iterator; keys from a single mnemonic's chain
/// come out in textual order.
#[must_use]
pub fn scan<'a>(mnemonics: &'a [String], text: &'a str) -> KeyScan<'a> {
    KeyScan { mnemonics, text, stack: vec![Frame { start: 0, mnemonic: 0 }] }
}

/// Scans a captured failure payload for issue keys.
///
/// Only the `issue_hint` field is scanned; an absent payload or an absent
/// hint yields nothing. This never fails, whatever the payload looks like.
#[must_use]
pub fn scan_failure<'a>(
    mnemonics: &'a [String],
    error: Option<&'a CapturedError>,
) -> KeyScan<'a> {
    let hint = error.and_then(|e| e.issue_hint.as_deref()).unwrap_or("");
    scan(mnemonics, hint)
}
