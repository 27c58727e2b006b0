//! Scalar and hex conversions used on raw source output.

/// Parses a decimal `i64`, ignoring surrounding whitespace.
pub fn parse_long(s: &str) -> Option<i64> {
    s.trim().parse().ok()
}

/// Parses a decimal `i32`; values outside the 32-bit range fail.
pub fn parse_int(s: &str) -> Option<i32> {
    s.trim().parse().ok()
}

/// Returns the first run of consecutive ASCII digits in `s`.
///
/// `"{ sec = 1500000000, usec = 0 }"` yields `"1500000000"`.
pub fn first_digit_run(s: &str) -> Option<&str> {
    let start = s.find(|c: char| c.is_ascii_digit())?;
    let rest = &s[start..];
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    Some(&rest[..end])
}

/// Reinterprets a native counter as unsigned 32-bit before widening.
///
/// Native per-core tick counters are 32-bit and wrap; read as signed they
/// turn into huge negative values once they pass `i32::MAX`.
pub const fn unsigned_int(value: i32) -> u64 {
    value as u32 as u64
}

/// Decodes a string of hex digit pairs into bytes.
///
/// Upper and lower case are both accepted. An odd trailing nibble is
/// ignored, so `"abc"` decodes to `[0xab]`. Any other non-hex character
/// makes the input malformed and the result is empty.
pub fn hex_to_bytes(hex: &str) -> Vec<u8> {
    let digits = hex.as_bytes();
    let even = digits.len() - digits.len() % 2;
    let mut bytes = Vec::with_capacity(even / 2);
    for pair in digits[..even].chunks_exact(2) {
        match (hex_value(pair[0]), hex_value(pair[1])) {
            (Some(hi), Some(lo)) => bytes.push(hi << 4 | lo),
            _ => return Vec::new(),
        }
    }
    bytes
}

fn hex_value(c: u8) -> Option<u8> {
    (c as char).to_digit(16).map(|d| d as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes_to_hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }

    #[test]
    fn test_parse_long() {
        assert_eq!(parse_long(" 1700000000\n"), Some(1_700_000_000));
        assert_eq!(parse_long("-5"), Some(-5));
        assert_eq!(parse_long("12a"), None);
        assert_eq!(parse_long(""), None);
    }

    #[test]
    fn test_parse_int_range() {
        assert_eq!(parse_int("2147483647"), Some(i32::MAX));
        assert_eq!(parse_int("2147483648"), None);
    }

    #[test]
    fn test_first_digit_run() {
        assert_eq!(
            first_digit_run("{ sec = 1500000000, usec = 123456 } Fri Jul 14"),
            Some("1500000000")
        );
        assert_eq!(first_digit_run("42"), Some("42"));
        assert_eq!(first_digit_run("no digits"), None);
    }

    #[test]
    fn test_unsigned_int_wraparound() {
        assert_eq!(unsigned_int(-1), 4_294_967_295);
        assert_eq!(unsigned_int(i32::MIN), 2_147_483_648);
        assert_eq!(unsigned_int(12345), 12345);
    }

    #[test]
    fn test_hex_to_bytes_all_values() {
        let all: Vec<u8> = (0..=255).collect();
        assert_eq!(hex_to_bytes(&bytes_to_hex(&all)), all);
        assert_eq!(hex_to_bytes(&bytes_to_hex(&all).to_uppercase()), all);
        assert!(hex_to_bytes("").is_empty());
    }

    #[test]
    fn test_hex_to_bytes_odd_length_truncates() {
        assert_eq!(hex_to_bytes("abc"), vec![0xab]);
        assert_eq!(hex_to_bytes("f"), Vec::<u8>::new());
    }

    #[test]
    fn test_hex_to_bytes_rejects_non_hex() {
        assert!(hex_to_bytes("00zz").is_empty());
        assert!(hex_to_bytes("0x12").is_empty());
    }
}
