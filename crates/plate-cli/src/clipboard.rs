//! Clipboard sink using the OSC 52 terminal escape sequence.
//!
//! Works over SSH and inside most modern terminals without a system clipboard
//! library. The terminal decides whether to honour it; nothing is reported
//! back.

use std::io::{self, Write};

use base64::Engine;

/// Build the OSC 52 sequence that puts `text` on the system clipboard.
#[must_use]
pub fn osc52_sequence(text: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(text.as_bytes());
    format!("\x1b]52;c;{encoded}\x07")
}

/// Write `text` to the clipboard through `out`.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn copy_to<W: Write>(out: &mut W, text: &str) -> io::Result<()> {
    out.write_all(osc52_sequence(text).as_bytes())?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_format() {
        assert_eq!(
            osc52_sequence("redis://localhost:6379"),
            "\x1b]52;c;cmVkaXM6Ly9sb2NhbGhvc3Q6NjM3OQ==\x07"
        );
    }

    #[test]
    fn copy_writes_sequence() {
        let mut out = Vec::new();
        copy_to(&mut out, "abc").unwrap();
        assert_eq!(out, b"\x1b]52;c;YWJj\x07");
    }
}
