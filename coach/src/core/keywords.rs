//! Fixed keyword sets for stop requests and answer grading.
//!
//! Matching is case-insensitive substring containment; any hit counts.

/// Phrases that ask to end the interview. Shared by the router and the console.
pub const STOP_KEYWORDS: &[&str] = &[
    "стоп",
    "фидбэк",
    "хватит",
    "заверши",
    "закончи",
    "стоп игра",
    "давай фидбэк",
    "хочу завершить",
    "завершить интервью",
    "закончить интервью",
    "стоп интервью",
];

/// The single term Observer checks before calling the model.
///
/// Narrower than [`STOP_KEYWORDS`]: "хватит" reaches Manager through the
/// router but still gets analyzed by Observer first.
pub const OBSERVER_STOP_KEYWORD: &str = "стоп";

/// Verdict markers meaning the answer was wrong ("неправильно", "ошибка", "бред").
pub const INCORRECT_MARKERS: &[&str] = &["неправ", "ошиб", "бред"];
/// Verdict marker meaning the answer was right ("правильно").
pub const CORRECT_MARKER: &str = "правиль";
/// Verdict marker meaning the answer was only partially right ("частично").
pub const PARTIAL_MARKER: &str = "частич";
/// Leading token an analysis uses to end the interview.
pub const FINISHED_TOKEN: &str = "finished";

/// True when `text` contains any of `keywords`, ignoring case.
pub fn contains_any(text: &str, keywords: &[&str]) -> bool {
    let lowered = text.to_lowercase();
    keywords.iter().any(|keyword| lowered.contains(keyword))
}

/// True when `text` asks to end the interview.
pub fn is_stop_request(text: &str) -> bool {
    contains_any(text.trim(), STOP_KEYWORDS)
}
