//! Berkeley term identifiers.
//!
//! A term id is four digits: `2`, a two-digit year, and a season digit
//! (`2` Spring, `5` Summer, `8` Fall). `2198` is Fall 2019.

/// Returns a display name such as "Fall 2019", or `None` for malformed ids.
pub fn term_name_for_id(term_id: &str) -> Option<String> {
    let bytes = term_id.as_bytes();
    if bytes.len() != 4 || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let century = 1800 + 100 * u32::from(bytes[0] - b'0');
    let year = century + u32::from(bytes[1] - b'0') * 10 + u32::from(bytes[2] - b'0');
    let season = match bytes[3] {
        b'0' => "Winter",
        b'2' => "Spring",
        b'5' => "Summer",
        b'8' => "Fall",
        _ => return None,
    };
    Some(format!("{season} {year}"))
}
