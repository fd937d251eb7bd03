//! Text conversion for the fixed-size name buffers embedded in the
//! native capability shapes.
//!
//! Narrow shapes carry the product name in a legacy single-byte encoding;
//! wide shapes carry UTF-16. The narrow encoding is an explicit parameter
//! rather than ambient process state, so conversion behaves the same under
//! test as in production regardless of the active locale.

use encoding_rs::Encoding;

/// Decodes a null-terminated narrow name buffer.
///
/// Bytes past the first null are ignored; undecodable bytes map to the
/// replacement character.
pub fn decode_narrow(buffer: &[u8], encoding: &'static Encoding) -> String {
    let len = buffer.iter().position(|&b| b == 0).unwrap_or(buffer.len());
    let (text, _had_errors) = encoding.decode_without_bom_handling(&buffer[..len]);
    text.into_owned()
}

/// Re-encodes `name` into a narrow buffer.
///
/// The encoded text is truncated to leave room for the terminating null,
/// and the remainder of the buffer is zero-filled so conversion is
/// deterministic and round-trippable.
pub fn encode_narrow(name: &str, buffer: &mut [u8], encoding: &'static Encoding) {
    if buffer.is_empty() {
        return;
    }
    let (bytes, _, _) = encoding.encode(name);
    let len = bytes.len().min(buffer.len() - 1);
    buffer[..len].copy_from_slice(&bytes[..len]);
    buffer[len..].fill(0);
}

/// Decodes a null-terminated UTF-16 name buffer.
pub fn decode_wide(buffer: &[u16]) -> String {
    let len = buffer.iter().position(|&u| u == 0).unwrap_or(buffer.len());
    String::from_utf16_lossy(&buffer[..len])
}

/// Re-encodes `name` into a UTF-16 buffer, truncated to leave room for
/// the terminating null; the tail is zero-filled.
pub fn encode_wide(name: &str, buffer: &mut [u16]) {
    if buffer.is_empty() {
        return;
    }
    let cap = buffer.len() - 1;
    let mut len = 0;
    for unit in name.encode_utf16().take(cap) {
        buffer[len] = unit;
        len += 1;
    }
    buffer[len..].fill(0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::WINDOWS_1252;

    #[test]
    fn test_narrow_round_trip() {
        let mut buffer = [0xAAu8; 16];
        encode_narrow("Caf\u{e9}", &mut buffer, WINDOWS_1252);
        assert_eq!(&buffer[..5], &[b'C', b'a', b'f', 0xE9, 0]);
        assert!(buffer[5..].iter().all(|&b| b == 0));
        assert_eq!(decode_narrow(&buffer, WINDOWS_1252), "Caf\u{e9}");
    }

    #[test]
    fn test_narrow_truncates_and_terminates() {
        let mut buffer = [0u8; 4];
        encode_narrow("longer than four", &mut buffer, WINDOWS_1252);
        assert_eq!(&buffer, b"lon\0");
    }

    #[test]
    fn test_narrow_decode_stops_at_null() {
        let buffer = [b'A', b'B', 0, b'C', b'D'];
        assert_eq!(decode_narrow(&buffer, WINDOWS_1252), "AB");
    }

    #[test]
    fn test_wide_round_trip() {
        let mut buffer = [0xFFFFu16; 16];
        encode_wide("Gr\u{fc}n", &mut buffer);
        assert_eq!(decode_wide(&buffer), "Gr\u{fc}n");
        assert!(buffer[5..].iter().all(|&u| u == 0));
    }

    #[test]
    fn test_wide_truncates_and_terminates() {
        let mut buffer = [0xFFFFu16; 4];
        encode_wide("Virtual", &mut buffer);
        assert_eq!(decode_wide(&buffer), "Vir");
        assert_eq!(buffer[3], 0);
    }

    #[test]
    fn test_empty_buffers_are_left_alone() {
        let mut narrow: [u8; 0] = [];
        encode_narrow("x", &mut narrow, WINDOWS_1252);
        let mut wide: [u16; 0] = [];
        encode_wide("x", &mut wide);
    }

    #[test]
    fn test_unterminated_buffer_decodes_fully() {
        let buffer = [b'F', b'u', b'l', b'l'];
        assert_eq!(decode_narrow(&buffer, WINDOWS_1252), "Full");
    }
}
