//! Game state extraction from raw OCR text.
//!
//! The chat window shows a stack of bot messages, oldest at the top. OCR text
//! order is taken as ground truth: whenever a pattern matches more than once,
//! the last (newest) match wins. The stay and destroyed flags describe the
//! newest result message only; older results scrolled up in the history are
//! ignored.

use regex::Regex;
use std::sync::OnceLock;

/// Gold line: "보유 골드: 1,234 G", "남은 골드 : 577", "사용 골드: 300".
const GOLD_PATTERN: &str = r"(?:남은|보유|사용)\s*골드\s*[:：]?\s*(\d[\d,.]*)";

/// Enhancement level: "+7", "[+12]". Longer digit runs are gold amounts.
const LEVEL_PATTERN: &str = r"\+\s?(\d{1,2})(?:[^\d,]|$)";

const DESTROYED_KEYWORDS: &[&str] = &["파괴", "부서졌", "산산조각"];
const STAY_KEYWORDS: &[&str] = &["유지"];
const INSUFFICIENT_KEYWORDS: &[&str] = &["부족", "모아오"];
/// Words that only appear in a reinforcement result message.
const RESULT_KEYWORDS: &[&str] = &["성공", "실패", "유지", "파괴", "부서졌", "산산조각"];

/// OCR reads the "G" unit glued to the amount as a trailing 6.
const GOLD_MISREAD_SUFFIX: char = '6';

fn gold_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(GOLD_PATTERN).expect("gold pattern is valid"))
}

fn level_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(LEVEL_PATTERN).expect("level pattern is valid"))
}

/// One parsed snapshot of the chat window.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GameObservation {
    pub gold: u64,
    pub level: u32,
    pub is_stay: bool,
    pub is_destroyed: bool,
    pub is_gold_insufficient: bool,
    pub raw_text: String,
}

/// Parses raw OCR text into a `GameObservation`.
///
/// Never fails: anything that doesn't match degrades to 0 / false.
pub fn parse_observation(text: &str) -> GameObservation {
    let result_line = latest_result_line(text).unwrap_or("");
    GameObservation {
        gold: extract_gold(text),
        level: extract_level(text),
        is_stay: contains_any(result_line, STAY_KEYWORDS),
        is_destroyed: contains_any(result_line, DESTROYED_KEYWORDS),
        is_gold_insufficient: detect_gold_insufficient(text),
        raw_text: text.to_string(),
    }
}

/// Gold amount from the last gold line, 0 if none.
pub fn extract_gold(text: &str) -> u64 {
    let Some(raw) = gold_regex()
        .captures_iter(text)
        .last()
        .and_then(|caps| caps.get(1))
    else {
        return 0;
    };

    let digits: String = raw.as_str().chars().filter(|c| c.is_ascii_digit()).collect();
    correct_gold_misread(&digits).parse().unwrap_or(0)
}

/// Drops a spurious trailing `6` from reads longer than three digits.
///
/// Heuristic, not guaranteed correct: a genuine amount such as 1,236 is also
/// shortened. Only the observed misread ("577G" read as "5776") is targeted.
pub fn correct_gold_misread(digits: &str) -> &str {
    if digits.chars().count() > 3 && digits.ends_with(GOLD_MISREAD_SUFFIX) {
        &digits[..digits.len() - GOLD_MISREAD_SUFFIX.len_utf8()]
    } else {
        digits
    }
}

/// Enhancement level from the last "+N" match, 0 if none.
///
/// A destruction capture can hold both the old level and the new "+0"; the
/// later one is authoritative.
pub fn extract_level(text: &str) -> u32 {
    level_regex()
        .captures_iter(text)
        .last()
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// The newest line that reports a reinforcement result, if any.
pub fn latest_result_line(text: &str) -> Option<&str> {
    text.lines()
        .rev()
        .find(|line| contains_any(line, RESULT_KEYWORDS))
}

/// Scans lines bottom-up for an insufficient-gold message.
///
/// A newer reinforcement result below the message means it is stale.
pub fn detect_gold_insufficient(text: &str) -> bool {
    for line in text.lines().rev() {
        if contains_any(line, INSUFFICIENT_KEYWORDS) {
            return true;
        }
        if level_regex().is_match(line) || contains_any(line, RESULT_KEYWORDS) {
            return false;
        }
    }
    false
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}
