//! Reverse scans over ordered histories.

use super::state::{Role, Turn};

/// Return the most recent item matching `pred`, scanning from the end.
pub fn find_last<T, P>(items: &[T], pred: P) -> Option<&T>
where
    P: Fn(&T) -> bool,
{
    items.iter().rev().find(|item| pred(item))
}

/// Most recent user-authored turn, if any.
pub fn last_user_turn(messages: &[Turn]) -> Option<&Turn> {
    find_last(messages, |turn| turn.role == Role::User)
}

/// Trailing window of at most `limit` turns.
pub fn recent_turns(messages: &[Turn], limit: usize) -> &[Turn] {
    let start = messages.len().saturating_sub(limit);
    &messages[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_last_scans_from_the_end() {
        let items = [1, 2, 3, 4];
        assert_eq!(find_last(&items, |n| n % 2 == 1), Some(&3));
        assert_eq!(find_last(&items, |n| *n > 10), None);
    }

    #[test]
    fn last_user_turn_skips_agent_turns() {
        let messages = vec![
            Turn::user("first"),
            Turn::agent("q1"),
            Turn::user("second"),
            Turn::agent("q2"),
        ];
        assert_eq!(last_user_turn(&messages).map(|t| t.content.as_str()), Some("second"));
        assert!(last_user_turn(&[Turn::agent("only agent")]).is_none());
    }

    #[test]
    fn recent_turns_caps_window() {
        let messages: Vec<Turn> = (0..8).map(|i| Turn::user(i.to_string())).collect();
        let window = recent_turns(&messages, 6);
        assert_eq!(window.len(), 6);
        assert_eq!(window[0].content, "2");
        assert_eq!(recent_turns(&messages[..3], 6).len(), 3);
    }
}
