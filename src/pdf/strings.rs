use lopdf::{Object, StringFormat};

/// Decode a PDF text string: UTF-16BE when it starts with a BOM, otherwise
/// PDFDocEncoding (treated as Latin-1).
pub fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let u16_chars: Vec<u16> = bytes[2..]
            .chunks(2)
            .filter_map(|chunk| {
                if chunk.len() == 2 {
                    Some(u16::from_be_bytes([chunk[0], chunk[1]]))
                } else {
                    None
                }
            })
            .collect();
        String::from_utf16_lossy(&u16_chars)
    } else {
        bytes.iter().map(|&b| b as char).collect()
    }
}

/// Encode a title as a PDF text string. ASCII stays a literal string, anything
/// else becomes UTF-16BE with a BOM.
pub fn encode_pdf_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::String(text.as_bytes().to_vec(), StringFormat::Literal);
    }

    let mut bytes = Vec::with_capacity(2 + text.len() * 2);
    bytes.extend_from_slice(&[0xFE, 0xFF]);
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes_of(obj: &Object) -> &[u8] {
        match obj {
            Object::String(bytes, _) => bytes,
            other => panic!("expected string, got {:?}", other),
        }
    }

    #[test]
    fn test_ascii_stays_literal() {
        let obj = encode_pdf_string("Chapter 1");
        assert!(matches!(obj, Object::String(_, StringFormat::Literal)));
        assert_eq!(decode_pdf_string(bytes_of(&obj)), "Chapter 1");
    }

    #[test]
    fn test_unicode_uses_utf16() {
        let obj = encode_pdf_string("Глава 𝄞");
        assert_eq!(&bytes_of(&obj)[..2], &[0xFE, 0xFF]);
        assert_eq!(decode_pdf_string(bytes_of(&obj)), "Глава 𝄞");
    }

    #[test]
    fn test_latin1_fallback() {
        assert_eq!(decode_pdf_string(&[0x43, 0x61, 0x66, 0xE9]), "Café");
    }
}
