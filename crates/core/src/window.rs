//! Splits long text into bounded word-count windows so each fits one
//! relevance-extraction call.

/// Partitions `text` into consecutive windows of at most `max_tokens`
/// whitespace-delimited tokens. Windows are contiguous and non-overlapping;
/// the final window may be shorter. Empty or whitespace-only text yields no
/// windows.
pub fn window_tokens(text: &str, max_tokens: usize) -> Vec<String> {
    let tokens: Vec<&str> = text.split_whitespace().collect();

    tokens
        .chunks(max_tokens.max(1))
        .map(|window| window.join(" "))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_yields_no_windows() {
        assert!(window_tokens("", 10).is_empty());
        assert!(window_tokens("   \n\t ", 10).is_empty());
    }

    #[test]
    fn short_text_yields_one_window() {
        let windows = window_tokens("alpha beta gamma", 10);
        assert_eq!(windows, vec!["alpha beta gamma".to_string()]);
    }

    #[test]
    fn window_count_is_ceil_of_token_count_over_cap() {
        let text = (0..25).map(|n| n.to_string()).collect::<Vec<_>>().join(" ");

        let windows = window_tokens(&text, 10);
        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0].split_whitespace().count(), 10);
        assert_eq!(windows[1].split_whitespace().count(), 10);
        assert_eq!(windows[2].split_whitespace().count(), 5);
    }

    #[test]
    fn windows_round_trip_the_token_sequence() {
        let text = "one  two\tthree\nfour five six seven";
        let original: Vec<&str> = text.split_whitespace().collect();

        let windows = window_tokens(text, 3);
        let rejoined: Vec<String> = windows
            .iter()
            .flat_map(|window| window.split_whitespace().map(str::to_string))
            .collect();

        assert_eq!(rejoined, original);
    }

    #[test]
    fn zero_cap_is_clamped_rather_than_panicking() {
        let windows = window_tokens("a b c", 0);
        assert_eq!(windows.len(), 3);
    }
}
