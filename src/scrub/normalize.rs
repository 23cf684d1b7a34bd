//! Digit and alphanumeric normalisation
//!
//! Used to compare and match numbers and codes independently of how they
//! were formatted ("01223 123456" vs "01223-123456", "CB2 3EB" vs "cb23eb").

/// Keep only the ASCII digits 0-9
pub fn digits_of(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// Keep only letters and digits
pub fn alphanumeric_of(value: &str) -> String {
    value.chars().filter(|c| c.is_alphanumeric()).collect()
}

/// Case-folded alphanumeric content, the form fuzzy comparison works on
pub fn folded_alphanumeric(value: &str) -> String {
    alphanumeric_of(value).to_lowercase()
}

/// Split on anything that is not a letter or digit, dropping empty pieces
pub fn alphanumeric_runs(value: &str) -> impl Iterator<Item = &str> {
    value
        .split(|c: char| !c.is_alphanumeric())
        .filter(|piece| !piece.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digits_of() {
        assert_eq!(digits_of("01223 123-456"), "01223123456");
        assert_eq!(digits_of("(555) 123.4567"), "5551234567");
        assert_eq!(digits_of("no digits"), "");
    }

    #[test]
    fn test_alphanumeric_of() {
        assert_eq!(alphanumeric_of("CB2 3EB"), "CB23EB");
        assert_eq!(alphanumeric_of("D'Souza"), "DSouza");
        assert_eq!(alphanumeric_of("  -- "), "");
    }

    #[test]
    fn test_folded_alphanumeric() {
        assert_eq!(folded_alphanumeric("O'Brien-Smith"), "obriensmith");
    }

    #[test]
    fn test_alphanumeric_runs() {
        let runs: Vec<&str> = alphanumeric_runs("D'Souza, 5b").collect();
        assert_eq!(runs, vec!["D", "Souza", "5b"]);
    }
}
