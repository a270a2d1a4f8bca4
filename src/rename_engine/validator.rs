use serde::Serialize;

use crate::error::ValidationError;

pub const ILLEGAL_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

pub const MAX_NAME_LENGTH: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub error_message: Option<String>,
}

impl From<Result<(), ValidationError>> for ValidationResult {
    fn from(result: Result<(), ValidationError>) -> Self {
        match result {
            Ok(()) => ValidationResult {
                is_valid: true,
                error_message: None,
            },
            Err(e) => ValidationResult {
                is_valid: false,
                error_message: Some(e.to_string()),
            },
        }
    }
}

pub(crate) fn is_illegal_char(c: char) -> bool {
    ILLEGAL_CHARS.contains(&c) || (c as u32) < 32
}

pub fn validate(name: &str) -> ValidationResult {
    validate_name(name).into()
}

pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::Blank);
    }

    if let Some(c) = name.chars().find(|c| is_illegal_char(*c)) {
        return Err(ValidationError::IllegalCharacter(c));
    }

    if let Some(reserved) = RESERVED_NAMES
        .iter()
        .find(|reserved| reserved.eq_ignore_ascii_case(name))
    {
        return Err(ValidationError::ReservedName(reserved.to_string()));
    }

    let len = name.len();
    if !(1..=MAX_NAME_LENGTH).contains(&len) {
        return Err(ValidationError::BadLength {
            len,
            max: MAX_NAME_LENGTH,
        });
    }

    if name.ends_with(' ') || name.ends_with('.') {
        return Err(ValidationError::TrailingSpaceOrPeriod);
    }

    // Shadowed by the trailing-period rule today.
    if name.chars().all(|c| c == '.') {
        return Err(ValidationError::OnlyDots);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_names() {
        assert!(validate("My File_01.png").is_valid);
        assert!(validate(".hidden").is_valid);
        assert!(validate("日本語ファイル.txt").is_valid);
        assert!(validate("CON.txt").is_valid);
        assert!(validate("COM10").is_valid);
    }

    #[test]
    fn blank_names() {
        assert_eq!(validate_name(""), Err(ValidationError::Blank));
        assert_eq!(validate_name("   "), Err(ValidationError::Blank));
        assert_eq!(validate_name("\t"), Err(ValidationError::Blank));
    }

    #[test]
    fn illegal_characters() {
        for c in ILLEGAL_CHARS {
            let name = format!("a{c}b");
            assert_eq!(
                validate_name(&name),
                Err(ValidationError::IllegalCharacter(*c)),
                "{name}"
            );
        }
        assert_eq!(
            validate_name("bell\u{7}"),
            Err(ValidationError::IllegalCharacter('\u{7}'))
        );
        // DEL is not in the control range the rule covers.
        assert!(validate("del\u{7f}x").is_valid);
    }

    #[test]
    fn reserved_names_ignore_case() {
        assert_eq!(
            validate_name("CON"),
            Err(ValidationError::ReservedName("CON".to_string()))
        );
        assert_eq!(
            validate_name("lpt9"),
            Err(ValidationError::ReservedName("LPT9".to_string()))
        );
        assert!(!validate("Nul").is_valid);
    }

    #[test]
    fn length_limit_counts_bytes() {
        assert!(validate(&"a".repeat(255)).is_valid);
        assert_eq!(
            validate_name(&"a".repeat(300)),
            Err(ValidationError::BadLength { len: 300, max: 255 })
        );
        // 200 characters, 400 bytes in UTF-8.
        assert_eq!(
            validate_name(&"é".repeat(200)),
            Err(ValidationError::BadLength { len: 400, max: 255 })
        );
        assert!(validate(&"é".repeat(127)).is_valid);
    }

    #[test]
    fn trailing_space_or_period() {
        assert_eq!(
            validate_name("name "),
            Err(ValidationError::TrailingSpaceOrPeriod)
        );
        assert_eq!(
            validate_name("name."),
            Err(ValidationError::TrailingSpaceOrPeriod)
        );
        assert!(!validate("....").is_valid);
        assert!(!validate("..").is_valid);
    }

    #[test]
    fn first_violation_wins() {
        // Illegal char beats length.
        let long_bad = format!("{}?", "a".repeat(300));
        assert_eq!(
            validate_name(&long_bad),
            Err(ValidationError::IllegalCharacter('?'))
        );
        assert_eq!(
            validate("   ").error_message.as_deref(),
            Some("Filename cannot be empty or blank")
        );
    }
}
