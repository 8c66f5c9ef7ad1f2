/// Game ids that are never served, regardless of format.
const BANNED_GAME_IDS: [&str; 2] = ["000000000", "111111111"];

fn is_numeric_with_len(value: &str, min: usize, max: usize) -> bool {
    (min..=max).contains(&value.len()) && value.bytes().all(|b| b.is_ascii_digit())
}

/// MLBB game id: 6 to 10 digits.
pub fn is_valid_game_id(game_id: &str) -> bool {
    is_numeric_with_len(game_id, 6, 10)
}

/// MLBB server id: 3 to 5 digits.
pub fn is_valid_server_id(server_id: &str) -> bool {
    is_numeric_with_len(server_id, 3, 5)
}

/// PUBG player id: 7 to 11 digits.
pub fn is_valid_pubg_id(player_id: &str) -> bool {
    is_numeric_with_len(player_id, 7, 11)
}

/// Deny-listed ids and ids made of one repeated digit are treated as
/// throwaway accounts.
pub fn is_banned_account(game_id: &str) -> bool {
    if BANNED_GAME_IDS.contains(&game_id) {
        return true;
    }
    let mut bytes = game_id.bytes();
    match bytes.next() {
        Some(first) => bytes.all(|b| b == first),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banned_account_heuristic() {
        assert!(is_banned_account("111111111"));
        assert!(is_banned_account("00000000"));
        assert!(!is_banned_account("123456789"));
        assert!(!is_banned_account("123456780"));
        assert!(!is_banned_account("987654321"));
        assert!(!is_banned_account(""));
    }

    #[test]
    fn test_id_bounds() {
        assert!(is_valid_game_id("123456"));
        assert!(is_valid_game_id("1234567890"));
        assert!(!is_valid_game_id("12345"));
        assert!(!is_valid_game_id("12345678901"));
        assert!(!is_valid_game_id("12345a"));
        assert!(!is_valid_game_id("-12345"));

        assert!(is_valid_server_id("123"));
        assert!(is_valid_server_id("12345"));
        assert!(!is_valid_server_id("12"));
        assert!(!is_valid_server_id("123456"));

        assert!(is_valid_pubg_id("1234567"));
        assert!(!is_valid_pubg_id("123456"));
    }
}
