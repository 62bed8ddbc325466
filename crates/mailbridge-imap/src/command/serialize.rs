//! Command serialization helpers.

use super::FetchAttribute;

/// Writes an astring (atom or quoted string).
pub fn write_astring(buf: &mut Vec<u8>, s: &str) {
    if s.is_empty() || s.bytes().any(needs_quoting) {
        buf.push(b'"');
        for b in s.bytes() {
            if b == b'"' || b == b'\\' {
                buf.push(b'\\');
            }
            buf.push(b);
        }
        buf.push(b'"');
    } else {
        buf.extend_from_slice(s.as_bytes());
    }
}

/// Returns true if the byte needs quoting.
const fn needs_quoting(b: u8) -> bool {
    matches!(
        b,
        b' ' | b'"' | b'\\' | b'(' | b')' | b'{' | b'%' | b'*' | b']'
    ) || b < 0x20
        || b >= 0x7F
}

/// Writes a parenthesized FETCH attribute list.
pub fn write_fetch_attributes(buf: &mut Vec<u8>, items: &[FetchAttribute]) {
    buf.push(b'(');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            buf.push(b' ');
        }
        let name = match item {
            FetchAttribute::Rfc822 => "RFC822",
            FetchAttribute::Rfc822Size => "RFC822.SIZE",
            FetchAttribute::Uid => "UID",
        };
        buf.extend_from_slice(name.as_bytes());
    }
    buf.push(b')');
}
