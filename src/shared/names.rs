pub const MAX_PLAYER_NAME_LENGTH: usize = 20;

pub fn validate_player_name(name: &str) -> Option<String> {
    let cleaned = name.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() {
        return None;
    }
    Some(cleaned.chars().take(MAX_PLAYER_NAME_LENGTH).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_collapses_whitespace() {
        assert_eq!(validate_player_name("  Ada   Lovelace "), Some("Ada Lovelace".to_string()));
    }

    #[test]
    fn rejects_empty_and_whitespace_only() {
        assert_eq!(validate_player_name(""), None);
        assert_eq!(validate_player_name("   \t  "), None);
    }

    #[test]
    fn caps_length() {
        let long = "x".repeat(50);
        assert_eq!(validate_player_name(&long).unwrap().len(), MAX_PLAYER_NAME_LENGTH);
    }
}
