//! Trimmed, length-bounded text fields
//!
//! Names, titles and review bodies are all validated the same way: surrounding
//! whitespace is dropped, blanks are rejected and length is counted in chars.

use super::ValidationError;

/// Maximum length for names (category, country, pokemon, people, gyms)
pub const MAX_NAME_LEN: usize = 100;

/// Maximum length for review titles
pub const MAX_TITLE_LEN: usize = 200;

/// Maximum length for review bodies
pub const MAX_BODY_LEN: usize = 4000;

/// Validated, trimmed text
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Text(String);

impl Text {
    /// Create text for `field`, trimming and enforcing `max` characters.
    ///
    /// # Example
    /// ```
    /// use pokereview_server::models::Text;
    ///
    /// assert_eq!(Text::new("name", "  Pikachu ", 100).unwrap().as_str(), "Pikachu");
    /// assert!(Text::new("name", "   ", 100).is_err());
    /// ```
    pub fn new(field: &'static str, raw: &str, max: usize) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field });
        }

        if trimmed.chars().count() > max {
            return Err(ValidationError::TooLong { field, max });
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Shorthand for a name-sized field.
    pub fn name(field: &'static str, raw: &str) -> Result<Self, ValidationError> {
        Self::new(field, raw, MAX_NAME_LEN)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for Text {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Case-insensitive, trimmed comparison key. Matches `UPPER(TRIM(name))` in SQL.
pub fn natural_key(raw: &str) -> String {
    raw.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_surrounding_whitespace() {
        let text = Text::name("name", "\t Bulbasaur  ").unwrap();
        assert_eq!(text.as_str(), "Bulbasaur");
    }

    #[test]
    fn rejects_blank() {
        let err = Text::name("name", "   ").unwrap_err();
        assert_eq!(err, ValidationError::Empty { field: "name" });
    }

    #[test]
    fn counts_chars_not_bytes() {
        // 100 multi-byte chars still fit
        let name = "é".repeat(MAX_NAME_LEN);
        assert!(Text::name("name", &name).is_ok());

        let too_long = "é".repeat(MAX_NAME_LEN + 1);
        let err = Text::name("name", &too_long).unwrap_err();
        assert!(matches!(err, ValidationError::TooLong { max: 100, .. }));
    }

    #[test]
    fn natural_key_ignores_case_and_padding() {
        assert_eq!(natural_key("  pikachu "), natural_key("PIKACHU"));
        assert_ne!(natural_key("pikachu"), natural_key("raichu"));
    }
}
