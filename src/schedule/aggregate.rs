//! Schedule aggregation — derives a canonical schedule from medication
//! free text when the parser returned no explicit schedule.
//!
//! Keyword parses are deliberately forgiving: any medication that yields a
//! number contributes, the max across medications wins, and everything
//! falls back to safe defaults rather than failing.

use regex::Regex;

use crate::models::{FoodTiming, ParsedMedication, Schedule};

/// Keyword → dose count, checked in order before the numeric fallback.
const FREQUENCY_KEYWORDS: &[(&str, i32)] = &[
    ("once", 1),
    ("1x", 1),
    ("twice", 2),
    ("two", 2),
    ("2x", 2),
    ("three", 3),
    ("thrice", 3),
    ("3x", 3),
    ("four", 4),
    ("4x", 4),
    ("daily", 1),
];

/// Latin shorthand (bid = twice, tid = thrice, qid = four times) is matched
/// on word boundaries so it cannot fire inside ordinary words.
const FREQUENCY_ABBREVIATIONS: &[(&str, i32)] = &[(r"\bbid\b", 2), (r"\btid\b", 3), (r"\bqid\b", 4)];

/// Dose count from a free-text frequency ("twice daily", "3x a day", "bid").
pub fn parse_frequency_times(text: &str) -> Option<i32> {
    let lower = text.to_lowercase();

    for (keyword, times) in FREQUENCY_KEYWORDS {
        if lower.contains(keyword) {
            return Some(*times);
        }
    }
    for (pattern, times) in FREQUENCY_ABBREVIATIONS {
        if Regex::new(pattern).unwrap().is_match(&lower) {
            return Some(*times);
        }
    }
    first_integer(&lower)
}

/// Day count from a free-text duration ("10 days", "2 weeks", "until finished").
pub fn parse_duration_days(text: &str) -> Option<i32> {
    let lower = text.to_lowercase();
    let number = first_integer(&lower);

    if lower.contains("day") {
        if let Some(n) = number {
            return Some(n);
        }
    }
    if lower.contains("week") {
        if let Some(n) = number {
            return Some(n * 7);
        }
    }
    if lower.contains("month") {
        if let Some(n) = number {
            return Some(n * 30);
        }
    }
    if lower.contains("until finished") || lower.contains("as needed") {
        return Some(30);
    }
    number
}

/// Conventional preferred-time labels for a dose count.
fn preferred_times_for(times_per_day: i32) -> Vec<String> {
    let labels: &[&str] = match times_per_day {
        1 => &["morning"],
        2 => &["morning", "evening"],
        _ => &["morning", "afternoon", "evening"],
    };
    labels.iter().map(|s| s.to_string()).collect()
}

/// Scan instructions + dosage text for meal-relation cues. The first
/// matching family wins: before, then during, then after.
pub fn detect_food_timing(text: &str) -> FoodTiming {
    let lower = text.to_lowercase();
    let word = |pattern: &str| Regex::new(pattern).unwrap().is_match(&lower);

    if lower.contains("before meal")
        || lower.contains("before food")
        || lower.contains("on empty stomach")
        || word(r"\bac\b")
    {
        return FoodTiming::BeforeMeal;
    }
    if lower.contains("with meal")
        || lower.contains("with food")
        || lower.contains("during meal")
        || word(r"\bpc\b")
    {
        return FoodTiming::DuringMeal;
    }
    if lower.contains("after meal") || lower.contains("after food") {
        return FoodTiming::AfterMeal;
    }
    FoodTiming::Neutral
}

/// Build a schedule from medication free text. Empty input yields the
/// fixed default course: one dose a day, mornings, seven days.
pub fn aggregate(medications: &[ParsedMedication]) -> Schedule {
    if medications.is_empty() {
        return Schedule::default();
    }

    let times_per_day = medications
        .iter()
        .filter_map(|med| parse_frequency_times(&med.frequency))
        .max()
        .unwrap_or(1);

    let duration_days = medications
        .iter()
        .filter_map(|med| parse_duration_days(&med.duration))
        .max()
        .unwrap_or(7);

    let combined: String = medications
        .iter()
        .map(|med| format!("{} {}", med.instructions, med.dosage))
        .collect::<Vec<_>>()
        .join(" ");

    Schedule {
        times_per_day,
        preferred_times: preferred_times_for(times_per_day),
        food_timing: detect_food_timing(&combined),
        duration_days,
        ..Schedule::default()
    }
}

fn first_integer(text: &str) -> Option<i32> {
    Regex::new(r"\d+")
        .unwrap()
        .find(text)
        .and_then(|m| m.as_str().parse().ok())
}
