//! Analysis verdicts and bounded difficulty adjustment.

use crate::core::keywords::{
    CORRECT_MARKER, FINISHED_TOKEN, INCORRECT_MARKERS, PARTIAL_MARKER, contains_any,
};
use crate::core::state::{MAX_DIFFICULTY, MIN_DIFFICULTY};

/// Grade of a single answer as read from free-text analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Incorrect,
    Correct,
    Neutral,
}

/// Classify an analysis.
///
/// Incorrect markers are checked first, so text mentioning both
/// "неправильно" and "правильно" is `Incorrect`. "Correct" only counts when
/// no partial marker is present.
pub fn classify_analysis(analysis: &str) -> Verdict {
    if contains_any(analysis, INCORRECT_MARKERS) {
        return Verdict::Incorrect;
    }
    let lowered = analysis.to_lowercase();
    if lowered.contains(CORRECT_MARKER) && !lowered.contains(PARTIAL_MARKER) {
        return Verdict::Correct;
    }
    Verdict::Neutral
}

/// Next difficulty for a verdict, saturating at the bounds.
///
/// An out-of-range `current` is clamped into bounds first.
pub fn adjust_difficulty(current: u8, verdict: Verdict) -> u8 {
    let current = current.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY);
    match verdict {
        Verdict::Incorrect => current.saturating_sub(1).max(MIN_DIFFICULTY),
        Verdict::Correct => current.saturating_add(1).min(MAX_DIFFICULTY),
        Verdict::Neutral => current,
    }
}

/// True when the analysis opens with the finish token.
pub fn signals_finished(analysis: &str) -> bool {
    analysis.trim_start().to_lowercase().starts_with(FINISHED_TOKEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incorrect_decrements_with_floor() {
        for d in MIN_DIFFICULTY..=MAX_DIFFICULTY {
            let next = adjust_difficulty(d, classify_analysis("Ответ неправильный"));
            assert_eq!(next, d.saturating_sub(1).max(MIN_DIFFICULTY));
        }
    }

    #[test]
    fn correct_increments_with_ceiling() {
        for d in MIN_DIFFICULTY..=MAX_DIFFICULTY {
            let next = adjust_difficulty(d, classify_analysis("Всё правильно"));
            assert_eq!(next, (d + 1).min(MAX_DIFFICULTY));
        }
    }

    #[test]
    fn partial_or_unmarked_keeps_difficulty() {
        for d in MIN_DIFFICULTY..=MAX_DIFFICULTY {
            assert_eq!(
                adjust_difficulty(d, classify_analysis("Частично правильно")),
                d
            );
            assert_eq!(adjust_difficulty(d, classify_analysis("Interesting answer")), d);
        }
    }

    #[test]
    fn out_of_range_input_is_clamped() {
        assert_eq!(adjust_difficulty(u8::MAX, Verdict::Correct), MAX_DIFFICULTY);
        assert_eq!(adjust_difficulty(u8::MAX, Verdict::Incorrect), MAX_DIFFICULTY - 1);
        assert_eq!(adjust_difficulty(0, Verdict::Neutral), MIN_DIFFICULTY);
        assert_eq!(adjust_difficulty(0, Verdict::Incorrect), MIN_DIFFICULTY);
    }

    #[test]
    fn incorrect_wins_over_correct() {
        let analysis = "Первая часть правильная, но дальше ошибка";
        assert_eq!(classify_analysis(analysis), Verdict::Incorrect);
        // "неправильно" contains "правиль" as well.
        assert_eq!(classify_analysis("НЕПРАВИЛЬНО"), Verdict::Incorrect);
    }

    #[test]
    fn finished_token_must_lead_after_whitespace() {
        assert!(signals_finished("  Finished: enough material"));
        assert!(signals_finished("finished"));
        assert!(!signals_finished("The candidate has not finished"));
    }
}
