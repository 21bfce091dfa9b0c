// Hex codec for digests and Compare To values

use super::error::HexFormatError;

/// Encode bytes as lowercase hex digit pairs with no separators
pub fn encode(bytes: &[u8]) -> String {
    ::hex::encode(bytes)
}

/// Decode a sequence of hexadecimal digit pairs
///
/// When `strict` is false, leading and trailing whitespace is trimmed first.
/// Upper and lower case digits are both accepted. An empty string decodes to
/// an empty byte sequence.
pub fn decode(text: &str, strict: bool) -> Result<Vec<u8>, HexFormatError> {
    let text = if strict { text } else { text.trim() };

    // Check characters first so a stray character is reported by position
    // even when the length is also odd.
    if let Some((index, ch)) = text.chars().enumerate().find(|(_, c)| !c.is_ascii_hexdigit()) {
        return Err(HexFormatError::InvalidCharacter { ch, index });
    }

    ::hex::decode(text).map_err(|e| match e {
        ::hex::FromHexError::InvalidHexCharacter { c, index } => {
            HexFormatError::InvalidCharacter { ch: c, index }
        }
        _ => HexFormatError::OddLength { len: text.len() },
    })
}
