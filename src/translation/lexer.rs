// Byte-level helpers for the statement splitter. Every check is bounds-safe.

#[derive(Clone)]
pub(super) enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    LineComment,
    BlockComment(u32),
    DollarQuoted(String),
}

fn pair_at(bytes: &[u8], idx: usize, pair: &[u8; 2]) -> bool {
    bytes.get(idx..idx + 2) == Some(pair.as_slice())
}

pub(super) fn opens_line_comment(bytes: &[u8], idx: usize) -> bool {
    pair_at(bytes, idx, b"--")
}

pub(super) fn opens_block_comment(bytes: &[u8], idx: usize) -> bool {
    pair_at(bytes, idx, b"/*")
}

pub(super) fn closes_block_comment(bytes: &[u8], idx: usize) -> bool {
    pair_at(bytes, idx, b"*/")
}

fn is_identifier_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_identifier_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// `$tag$` (or `$$`) opening at `start`: the tag and the index of its closing `$`.
/// `$1` is a positional marker, not a tag.
pub(super) fn dollar_tag_at(bytes: &[u8], start: usize) -> Option<(&str, usize)> {
    let body = bytes.get(start + 1..)?;
    if body.first().is_some_and(u8::is_ascii_digit) {
        return None;
    }
    let len = body.iter().position(|&b| !is_identifier_char(b))?;
    if body[len] != b'$' {
        return None;
    }
    let tag = std::str::from_utf8(&body[..len]).ok()?;
    Some((tag, start + 1 + len))
}

/// Whether `$tag$` closes the dollar-quoted body at `idx`.
pub(super) fn closes_dollar_tag(bytes: &[u8], idx: usize, tag: &str) -> bool {
    let end = idx + 1 + tag.len();
    bytes.get(idx) == Some(&b'$')
        && bytes.get(idx + 1..end) == Some(tag.as_bytes())
        && bytes.get(end) == Some(&b'$')
}

/// Scan a parameter name starting at `start`. Returns the end index and the name.
pub(super) fn scan_identifier(bytes: &[u8], start: usize) -> Option<(usize, &str)> {
    if !bytes.get(start).copied().is_some_and(is_identifier_start) {
        return None;
    }
    let len = bytes[start..]
        .iter()
        .position(|&b| !is_identifier_char(b))
        .unwrap_or(bytes.len() - start);
    let end = start + len;
    std::str::from_utf8(&bytes[start..end])
        .ok()
        .map(|name| (end, name))
}

/// Whether the byte at `idx` opens a named placeholder (`@name` or `:name`).
///
/// `::` casts, `a:b` slices and operators such as `@>` are left alone.
pub(super) fn is_named_placeholder_start(bytes: &[u8], idx: usize) -> bool {
    let b = bytes[idx];
    if b != b'@' && b != b':' {
        return false;
    }
    let prev = idx.checked_sub(1).map(|p| bytes[p]);
    if prev.is_some_and(|p| is_identifier_char(p) || p == b':' || p == b'@') {
        return false;
    }
    if bytes.get(idx + 1) == Some(&b':') {
        return false;
    }
    bytes.get(idx + 1).copied().is_some_and(is_identifier_start)
}
