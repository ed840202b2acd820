//! Record transforms
//!
//! Two reversible text transforms applied to serialized records:
//!
//! - **Run-length compression**: a run of three or more identical characters
//!   becomes the character followed by its decimal count (`"aaaa"` -> `"a4"`).
//!   Literal digits and backslashes are escaped with a backslash so any text
//!   decodes back exactly. This is not a general compressor; text without
//!   long runs (or with many digits) gets longer.
//!
//! - **Obfuscation**: reverse the characters, then base64 the UTF-8 bytes.
//!   This hides values from casual inspection of the storage file and nothing
//!   more. Anyone with the code, or who recognises base64, can read the data.
//!   Do not store secrets that need real protection with it.

use base64::{Engine as _, engine::general_purpose::STANDARD};

use super::substrate::{Result, StoreError};

/// Shortest run that is worth collapsing
const MIN_RUN: usize = 3;

const ESCAPE: char = '\\';

/// Largest text a compressed value may expand to (characters)
pub const MAX_DECODED_CHARS: usize = 64 * 1024 * 1024;

fn push_literal(out: &mut String, c: char) {
    if c.is_ascii_digit() || c == ESCAPE {
        out.push(ESCAPE);
    }
    out.push(c);
}

/// Run-length encode `input`.
pub fn rle_compress(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        let mut run = 1usize;
        while chars.peek() == Some(&c) {
            chars.next();
            run += 1;
        }

        if run >= MIN_RUN {
            push_literal(&mut out, c);
            out.push_str(&run.to_string());
        } else {
            for _ in 0..run {
                push_literal(&mut out, c);
            }
        }
    }

    out
}

/// Reverse [`rle_compress`].
pub fn rle_decompress(input: &str) -> Result<String> {
    let mut out = String::with_capacity(input.len() * 2);
    let mut chars = input.chars().peekable();
    let mut decoded = 0usize;

    while let Some(c) = chars.next() {
        let literal = if c == ESCAPE {
            chars
                .next()
                .ok_or_else(|| StoreError::Corrupt("dangling escape in compressed text".into()))?
        } else if c.is_ascii_digit() {
            return Err(StoreError::Corrupt(
                "run count without a preceding character".into(),
            ));
        } else {
            c
        };

        let mut count = String::new();
        while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
            count.push(d);
            chars.next();
        }

        let n: usize = if count.is_empty() {
            1
        } else {
            count
                .parse()
                .map_err(|_| StoreError::Corrupt(format!("bad run count {count}")))?
        };

        decoded = decoded
            .checked_add(n)
            .filter(|total| *total <= MAX_DECODED_CHARS)
            .ok_or_else(|| {
                StoreError::Corrupt(format!(
                    "compressed text expands past {MAX_DECODED_CHARS} characters"
                ))
            })?;
        out.extend(std::iter::repeat_n(literal, n));
    }

    Ok(out)
}

/// Obfuscate text for casual-inspection privacy. Not encryption.
pub fn obfuscate(input: &str) -> String {
    let reversed: String = input.chars().rev().collect();
    STANDARD.encode(reversed.as_bytes())
}

/// Reverse [`obfuscate`].
pub fn deobfuscate(input: &str) -> Result<String> {
    let bytes = STANDARD
        .decode(input.trim())
        .map_err(|e| StoreError::Corrupt(format!("invalid base64: {e}")))?;
    let reversed = String::from_utf8(bytes)
        .map_err(|e| StoreError::Corrupt(format!("invalid UTF-8 after decode: {e}")))?;
    Ok(reversed.chars().rev().collect())
}
