use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColumnRefError {
    #[error("empty column reference")]
    Empty,
    #[error("invalid column letter {0:?}")]
    InvalidLetter(char),
    #[error("column reference out of range: {0}")]
    OutOfRange(String),
}

/// Excel's column cap (`XFD`).
const MAX_COLUMN: u32 = 16_384;

/// Parse an A1-style column letter run (`"A"`, `"AB"`, ...) into a 1-based
/// column index. Lowercase letters are accepted.
pub fn column_index_from_letter(letters: &str) -> Result<u32, ColumnRefError> {
    if letters.is_empty() {
        return Err(ColumnRefError::Empty);
    }

    let mut index: u32 = 0;
    for ch in letters.chars() {
        let digit = match ch {
            'A'..='Z' => ch as u32 - 'A' as u32 + 1,
            'a'..='z' => ch as u32 - 'a' as u32 + 1,
            _ => return Err(ColumnRefError::InvalidLetter(ch)),
        };
        index = index
            .checked_mul(26)
            .and_then(|v| v.checked_add(digit))
            .ok_or_else(|| ColumnRefError::OutOfRange(letters.to_string()))?;
    }

    if index > MAX_COLUMN {
        return Err(ColumnRefError::OutOfRange(letters.to_string()));
    }

    Ok(index)
}

/// Render a 1-based column index as its A1-style letter run.
pub fn column_letter(mut index: u32) -> String {
    debug_assert!(index >= 1, "column indices are 1-based");
    let mut out = Vec::new();
    while index > 0 {
        index -= 1;
        out.push(b'A' + (index % 26) as u8);
        index /= 26;
    }
    out.reverse();
    String::from_utf8(out).expect("column letters are ASCII")
}
