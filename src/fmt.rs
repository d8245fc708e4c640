//! Formatting helpers for the human-readable rendering of cues.
//!
//! Binary fields are shown as text when they are printable and as
//! truncated hex otherwise; timestamps are shown in seconds.

use data_encoding::HEXLOWER;

/// Formats opaque bytes for display, quoting them when they are printable
/// ASCII and falling back to hex otherwise.
///
/// # Examples
/// ```rust
/// use scte35_cue::fmt::format_private_data;
///
/// assert_eq!(format_private_data(b"test"), "\"test\"");
/// assert_eq!(format_private_data(&[0x01, 0x02, 0x03]), "0x010203");
/// assert_eq!(format_private_data(&[]), "empty");
/// ```
pub fn format_private_data(data: &[u8]) -> String {
    if data.is_empty() {
        return "empty".to_string();
    }

    match std::str::from_utf8(data) {
        Ok(s) if s.chars().all(|c| c.is_ascii_graphic() || c == ' ') => {
            if s.len() <= 50 {
                format!("\"{s}\"")
            } else {
                format!("\"{}...\" ({} bytes)", &s[..47], data.len())
            }
        }
        _ => format_as_hex(data),
    }
}

/// Formats bytes as lowercase hex, truncating anything longer than 8 bytes.
///
/// # Examples
/// ```rust
/// use scte35_cue::fmt::format_as_hex;
///
/// assert_eq!(format_as_hex(&[0x01, 0x02, 0x03]), "0x010203");
/// assert_eq!(format_as_hex(&(0..20).collect::<Vec<u8>>()), "0x000102030405... (20 bytes)");
/// ```
pub fn format_as_hex(data: &[u8]) -> String {
    if data.len() <= 8 {
        format!("0x{}", HEXLOWER.encode(data))
    } else {
        format!("0x{}... ({} bytes)", HEXLOWER.encode(&data[..6]), data.len())
    }
}

/// Formats a 90 kHz derived timestamp in seconds with microsecond precision.
///
/// ```rust
/// use scte35_cue::fmt::format_seconds;
///
/// assert_eq!(format_seconds(307.0), "307.000000s");
/// ```
pub fn format_seconds(seconds: f64) -> String {
    format!("{seconds:.6}s")
}

/// Formats an optional flag-guarded value, using `-` when it is absent.
pub(crate) fn format_optional<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_private_data() {
        assert_eq!(format_private_data(&[]), "empty");
        assert_eq!(format_private_data(b"B0011322192_N"), "\"B0011322192_N\"");
        assert_eq!(format_private_data(b"hello world"), "\"hello world\"");
        assert_eq!(format_private_data(&[0xFF, 0xFE, 0xFD]), "0xfffefd");

        let long_string = "a".repeat(60);
        let result = format_private_data(long_string.as_bytes());
        assert!(result.starts_with("\"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa...\""));
        assert!(result.contains("(60 bytes)"));

        assert_eq!(format_private_data(b"test\x00\x01"), "0x746573740001");
    }

    #[test]
    fn test_format_as_hex() {
        assert_eq!(format_as_hex(&[]), "0x");
        assert_eq!(format_as_hex(&[0x49]), "0x49");
        assert_eq!(
            format_as_hex(&[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]),
            "0x0102030405060708"
        );

        let long_data: Vec<u8> = (0..20).collect();
        assert_eq!(format_as_hex(&long_data), "0x000102030405... (20 bytes)");
    }

    #[test]
    fn test_format_seconds_and_optional() {
        assert_eq!(format_seconds(30.03), "30.030000s");
        assert_eq!(format_seconds(21388.766756), "21388.766756s");
        assert_eq!(format_optional(Some(3)), "3");
        assert_eq!(format_optional::<u8>(None), "-");
    }
}
