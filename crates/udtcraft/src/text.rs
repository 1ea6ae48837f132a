//! Text encodings for string fields.

/// Character encoding used to convert between text fields and strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Encoding {
    /// ISO-8859-1: every byte maps to the code point of the same value.
    #[default]
    Latin1,
    /// ASCII. Every byte must be in 0..=0x7F.
    Ascii,
    /// UTF-8. Any valid UTF-8 byte sequence is accepted.
    Utf8,
}

impl Encoding {
    /// Decodes `bytes`, or `None` if they are not valid in this encoding.
    pub fn decode(self, bytes: &[u8]) -> Option<String> {
        match self {
            Encoding::Latin1 => Some(bytes.iter().map(|&b| char::from(b)).collect()),
            Encoding::Ascii => bytes
                .is_ascii()
                .then(|| bytes.iter().map(|&b| char::from(b)).collect()),
            Encoding::Utf8 => String::from_utf8(bytes.to_vec()).ok(),
        }
    }

    /// Encodes `text`, or `None` if it holds a character this encoding cannot express.
    pub fn encode(self, text: &str) -> Option<Vec<u8>> {
        match self {
            Encoding::Latin1 => text.chars().map(|c| u8::try_from(c).ok()).collect(),
            Encoding::Ascii => text.is_ascii().then(|| text.as_bytes().to_vec()),
            Encoding::Utf8 => Some(text.as_bytes().to_vec()),
        }
    }
}

/// Returns the bytes before the first zero byte, or all of them.
pub fn until_nul(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|b| *b == 0) {
        Some(pos) => &bytes[..pos],
        None => bytes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latin1_round_trip() {
        let bytes = [b'C', 0xe9, b'!'];
        let text = Encoding::Latin1.decode(&bytes).unwrap();
        assert_eq!(text, "Cé!");
        assert_eq!(Encoding::Latin1.encode(&text).unwrap(), bytes.to_vec());
    }

    #[test]
    fn test_latin1_unrepresentable() {
        assert_eq!(Encoding::Latin1.encode("€"), None);
    }

    #[test]
    fn test_ascii_rejects_high_bytes() {
        assert_eq!(Encoding::Ascii.decode(&[b'a', 0x80]), None);
        assert_eq!(Encoding::Ascii.encode("é"), None);
        assert_eq!(Encoding::Ascii.decode(b"ok").as_deref(), Some("ok"));
    }

    #[test]
    fn test_utf8() {
        assert_eq!(Encoding::Utf8.decode(&[0xff]), None);
        assert_eq!(Encoding::Utf8.encode("€").unwrap().len(), 3);
    }

    #[test]
    fn test_until_nul() {
        assert_eq!(until_nul(b"ab\0cd"), b"ab");
        assert_eq!(until_nul(b"abc"), b"abc");
        assert_eq!(until_nul(b"\0"), b"");
    }
}
