//! Placeholder scanning over SQL text.
//!
//! Counts anonymous `?` placeholders while skipping quoted literals, quoted
//! identifiers and comments. Everything here is `const fn` so descriptors can
//! be checked at compile time.

/// Result of scanning a statement's SQL text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceholderScan {
    /// Anonymous `?` placeholders
    pub positional: usize,
    /// Numbered `?NNN` placeholders (not supported for positional binding)
    pub numbered: usize,
}

/// Skip past the closing `quote`, starting just after the opening one.
/// A doubled quote inside the literal closes and immediately reopens it,
/// which the caller's loop handles as two adjacent literals.
const fn skip_quoted(bytes: &[u8], mut i: usize, quote: u8) -> usize {
    while i < bytes.len() && bytes[i] != quote {
        i += 1;
    }
    i + 1
}

const fn skip_line_comment(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i] != b'\n' {
        i += 1;
    }
    i
}

const fn skip_block_comment(bytes: &[u8], mut i: usize) -> usize {
    while i + 1 < bytes.len() {
        if bytes[i] == b'*' && bytes[i + 1] == b'/' {
            return i + 2;
        }
        i += 1;
    }
    bytes.len()
}

/// Scan `sql` for placeholders
pub const fn scan(sql: &str) -> PlaceholderScan {
    let bytes = sql.as_bytes();
    let len = bytes.len();
    let mut positional = 0;
    let mut numbered = 0;
    let mut i = 0;

    while i < len {
        let c = bytes[i];
        if c == b'\'' || c == b'"' || c == b'`' {
            i = skip_quoted(bytes, i + 1, c);
        } else if c == b'[' {
            i = skip_quoted(bytes, i + 1, b']');
        } else if c == b'-' && i + 1 < len && bytes[i + 1] == b'-' {
            i = skip_line_comment(bytes, i + 2);
        } else if c == b'/' && i + 1 < len && bytes[i + 1] == b'*' {
            i = skip_block_comment(bytes, i + 2);
        } else if c == b'?' {
            i += 1;
            if i < len && bytes[i].is_ascii_digit() {
                numbered += 1;
                while i < len && bytes[i].is_ascii_digit() {
                    i += 1;
                }
            } else {
                positional += 1;
            }
        } else {
            i += 1;
        }
    }

    PlaceholderScan {
        positional,
        numbered,
    }
}

/// Number of anonymous `?` placeholders in `sql`
pub const fn count(sql: &str) -> usize {
    scan(sql).positional
}
