//! Base-26 option letter codes: `A`…`Z`, then `AA`…`ZZ`.
//!
//! Two-letter codes start only after the one-letter codes are exhausted,
//! so the scheme addresses 26 + 26·26 = 702 options. For every index in
//! that range, `index_of(letter_of(i)) == i`.

use crate::error::{PromptError, Result};

const LETTERS: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Letter code for a zero-based option index.
pub fn letter_of(index: usize) -> Result<String> {
    if index < 26 {
        return Ok((LETTERS[index] as char).to_string());
    }
    let rest = index - 26;
    let (first, second) = (rest / 26, rest % 26);
    if first >= 26 {
        return Err(PromptError::MalformedLetterCode(format!(
            "option index {index} is outside the two-letter code space"
        )));
    }
    Ok(format!(
        "{}{}",
        LETTERS[first] as char,
        LETTERS[second] as char
    ))
}

/// Zero-based option index for a letter code.
pub fn index_of(code: &str) -> Result<usize> {
    let malformed = || PromptError::MalformedLetterCode(code.to_string());
    let digits = code
        .chars()
        .map(|c| {
            if c.is_ascii_uppercase() {
                Ok((c as u8 - b'A') as usize)
            } else {
                Err(malformed())
            }
        })
        .collect::<Result<Vec<_>>>()?;
    match digits.as_slice() {
        [single] => Ok(*single),
        [first, second] => Ok(26 + first * 26 + second),
        _ => Err(malformed()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes() {
        assert_eq!(letter_of(0).unwrap(), "A");
        assert_eq!(letter_of(25).unwrap(), "Z");
        assert_eq!(letter_of(26).unwrap(), "AA");
        assert_eq!(letter_of(51).unwrap(), "AZ");
        assert_eq!(letter_of(52).unwrap(), "BA");
        assert_eq!(letter_of(701).unwrap(), "ZZ");
    }

    #[test]
    fn round_trip_whole_code_space() {
        for index in 0..702 {
            let code = letter_of(index).unwrap();
            assert_eq!(index_of(&code).unwrap(), index, "code {code}");
        }
    }

    #[test]
    fn rejects_out_of_range_index() {
        assert!(matches!(
            letter_of(702),
            Err(PromptError::MalformedLetterCode(_))
        ));
    }

    #[test]
    fn rejects_bad_codes() {
        for code in ["", "a", "5", "A1", "AAA", "Ab", "!Z"] {
            assert!(
                matches!(index_of(code), Err(PromptError::MalformedLetterCode(_))),
                "code {code:?} should be rejected"
            );
        }
    }
}
