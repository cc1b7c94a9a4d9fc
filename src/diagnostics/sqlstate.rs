// SQLSTATE packing: five characters, six bits each, lowest character first.

const SIX_BITS: i32 = 0x3F;

/// Decode an encoded SQLSTATE.
///
/// Returns the native code in decimal when any character falls outside `[0-9A-Z]`.
#[must_use]
pub fn decode_sqlstate(code: i32) -> String {
    let mut state = String::with_capacity(5);
    for i in 0..5 {
        let sixbit = (code >> (6 * i)) & SIX_BITS;
        let ch = u8::try_from(sixbit)
            .ok()
            .and_then(|bits| b'0'.checked_add(bits))
            .map(char::from)
            .filter(|ch| ch.is_ascii_digit() || ch.is_ascii_uppercase());
        match ch {
            Some(ch) => state.push(ch),
            None => return code.to_string(),
        }
    }
    state
}

/// Encode a five-character SQLSTATE. Returns `None` for anything that is not five
/// characters of `[0-9A-Z]`.
#[must_use]
pub fn encode_sqlstate(state: &str) -> Option<i32> {
    let bytes = state.as_bytes();
    if bytes.len() != 5 {
        return None;
    }
    let mut code = 0i32;
    for (i, b) in bytes.iter().enumerate() {
        if !(b.is_ascii_digit() || b.is_ascii_uppercase()) {
            return None;
        }
        code |= (i32::from(*b - b'0') & SIX_BITS) << (6 * i);
    }
    Some(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_undefined_table() {
        assert_eq!(decode_sqlstate(16_908_420), "42P01");
    }

    #[test]
    fn encode_matches_engine_packing() {
        assert_eq!(encode_sqlstate("42P01"), Some(16_908_420));
        assert_eq!(encode_sqlstate("00000"), Some(0));
    }

    #[test]
    fn undecodable_code_is_surfaced_verbatim() {
        // 0x3F in the first slot decodes to 'o', which is not a SQLSTATE character
        assert_eq!(decode_sqlstate(0x3F), "63");
        assert_eq!(decode_sqlstate(-1), "-1");
    }

    #[test]
    fn rejects_malformed_states() {
        assert_eq!(encode_sqlstate("42p01"), None);
        assert_eq!(encode_sqlstate("4201"), None);
    }
}
