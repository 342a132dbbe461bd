//! Event materialization — expands a prescription into concrete
//! timestamped intake events, one per dose per dosing day.
//!
//! Deterministic given the same prescription and settings: identical
//! titles, descriptions, and timestamps (generated ids aside).

use crate::config::{MILLIS_PER_DAY, MILLIS_PER_MINUTE};
use crate::models::{MedicationEvent, ParsedMedication, Prescription, UserSettings};

use super::resolve::{resolve_food_timing, resolve_window};
use super::slots::allocate;

/// Truncate an epoch-millis timestamp to UTC midnight of its day.
pub fn midnight_utc(millis: i64) -> i64 {
    millis - millis.rem_euclid(MILLIS_PER_DAY)
}

/// Expand a prescription into its full chronological event list.
pub fn materialize(
    prescription: &Prescription,
    settings: &UserSettings,
    now_millis: i64,
) -> Vec<MedicationEvent> {
    let duration_days = prescription.schedule.duration_days.max(1);
    let interval_days = prescription.schedule.interval_days.max(1);
    let total_dose_days = (duration_days + interval_days - 1) / interval_days;

    let (window_start, window_end) = resolve_window(&prescription.schedule, settings);
    let slots = allocate(
        prescription.schedule.times_per_day,
        window_start,
        window_end,
        &prescription.schedule.preferred_times,
    );

    let title = build_event_title(&prescription.medications);
    let description = build_event_description(prescription, settings);

    let mut events = Vec::with_capacity(total_dose_days as usize * slots.len());
    for dose_index in 0..total_dose_days {
        let day_millis = prescription.start_date_millis
            + i64::from(dose_index) * i64::from(interval_days) * MILLIS_PER_DAY;

        for slot in &slots {
            let start = day_millis + i64::from(*slot) * MILLIS_PER_MINUTE;
            let end = start + i64::from(settings.event_duration_minutes) * MILLIS_PER_MINUTE;
            events.push(MedicationEvent::new(
                prescription.id,
                &title,
                &description,
                start,
                end,
                now_millis,
            ));
        }
    }
    events
}

/// Every medication appears in every event of the day.
pub fn build_event_title(medications: &[ParsedMedication]) -> String {
    if medications.is_empty() {
        return "Medication".to_string();
    }
    medications
        .iter()
        .map(|med| med.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn build_event_description(prescription: &Prescription, settings: &UserSettings) -> String {
    let medications = prescription
        .medications
        .iter()
        .map(|med| format!("• {}: {} - {}", med.name, med.dosage, med.frequency))
        .collect::<Vec<_>>()
        .join("\n");

    let food_timing = resolve_food_timing(&prescription.schedule, settings);

    let mut schedule_info = format!(
        "Schedule: {} times per day{}",
        prescription.schedule.times_per_day,
        food_timing.description_suffix()
    );

    if !prescription.schedule.preferred_times.is_empty() {
        schedule_info.push_str(&format!(
            "\nPreferred times: {}",
            prescription.schedule.preferred_times.join(", ")
        ));
    }

    if settings.reminder_minutes > 0 {
        schedule_info.push_str(&format!(
            "\nReminder: {} minutes before",
            settings.reminder_minutes
        ));
    }

    format!("{medications}\n\n{schedule_info}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FoodTiming, ParsedMedication, Prescription, Schedule};

    const DAY: i64 = MILLIS_PER_DAY;

    fn prescription(schedule: Schedule, medications: Vec<ParsedMedication>) -> Prescription {
        Prescription::new("Course", medications, schedule, 10 * DAY, 0)
    }

    #[test]
    fn midnight_truncation() {
        assert_eq!(midnight_utc(0), 0);
        assert_eq!(midnight_utc(DAY - 1), 0);
        assert_eq!(midnight_utc(DAY), DAY);
        assert_eq!(midnight_utc(3 * DAY + 12 * 3_600_000), 3 * DAY);
    }

    #[test]
    fn interval_dosing_produces_ceiling_of_days() {
        // 7 days every 2 days → doses on days 0, 2, 4, 6.
        let rx = prescription(
            Schedule {
                times_per_day: 1,
                preferred_times: vec![],
                duration_days: 7,
                interval_days: 2,
                ..Schedule::default()
            },
            vec![ParsedMedication::new("MedA", "1 tab", "daily", "7 days")],
        );
        let events = materialize(&rx, &UserSettings::default(), 0);

        assert_eq!(events.len(), 4);
        for (i, event) in events.iter().enumerate() {
            let expected_day = rx.start_date_millis + (i as i64) * 2 * DAY;
            assert_eq!(midnight_utc(event.start_time_millis), expected_day);
        }
        // All dosing days fall inside the course.
        let course_end = rx.start_date_millis + 7 * DAY;
        assert!(events.iter().all(|e| e.start_time_millis < course_end));
    }

    #[test]
    fn three_daily_doses_for_three_days_with_two_medications() {
        let rx = prescription(
            Schedule {
                times_per_day: 3,
                preferred_times: vec![],
                duration_days: 3,
                interval_days: 1,
                ..Schedule::default()
            },
            vec![
                ParsedMedication::new("MedA", "500mg", "three times daily", "3 days"),
                ParsedMedication::new("MedB", "250mg", "three times daily", "3 days"),
            ],
        );
        let events = materialize(&rx, &UserSettings::default(), 0);

        assert_eq!(events.len(), 9);
        for day in 0..3 {
            let day_start = rx.start_date_millis + day * DAY;
            let on_day = events
                .iter()
                .filter(|e| midnight_utc(e.start_time_millis) == day_start)
                .count();
            assert_eq!(on_day, 3, "3 events on day {day}");
        }
        assert!(events.iter().all(|e| e.title == "MedA, MedB"));
    }

    #[test]
    fn events_are_chronological_with_zeroed_seconds() {
        let rx = prescription(
            Schedule {
                times_per_day: 3,
                preferred_times: vec![],
                duration_days: 2,
                ..Schedule::default()
            },
            vec![ParsedMedication::new("MedA", "1 tab", "tid", "2 days")],
        );
        let events = materialize(&rx, &UserSettings::default(), 0);

        for pair in events.windows(2) {
            assert!(pair[0].start_time_millis < pair[1].start_time_millis);
        }
        for event in &events {
            assert_eq!(event.start_time_millis % MILLIS_PER_MINUTE, 0);
        }
    }

    #[test]
    fn slot_minutes_stay_inside_resolved_window() {
        let settings = UserSettings {
            earliest_time_minutes: 540,
            latest_time_minutes: 1140,
            ..UserSettings::default()
        };
        let rx = prescription(
            Schedule {
                times_per_day: 4,
                preferred_times: vec![],
                duration_days: 1,
                ..Schedule::default()
            },
            vec![ParsedMedication::new("MedA", "1 tab", "qid", "1 day")],
        );
        let events = materialize(&rx, &settings, 0);

        for event in &events {
            let minute = (event.start_time_millis - midnight_utc(event.start_time_millis))
                / MILLIS_PER_MINUTE;
            assert!((540..=1140).contains(&(minute as i32)));
        }
    }

    #[test]
    fn event_length_comes_from_settings() {
        let settings = UserSettings {
            event_duration_minutes: 45,
            ..UserSettings::default()
        };
        let rx = prescription(
            Schedule::default(),
            vec![ParsedMedication::new("MedA", "1 tab", "daily", "7 days")],
        );
        let events = materialize(&rx, &settings, 0);
        for event in &events {
            assert_eq!(
                event.end_time_millis - event.start_time_millis,
                45 * MILLIS_PER_MINUTE
            );
        }
    }

    #[test]
    fn description_lists_medications_and_schedule() {
        let settings = UserSettings {
            reminder_minutes: 15,
            food_timing_default: FoodTiming::Neutral,
            ..UserSettings::default()
        };
        let rx = prescription(
            Schedule {
                times_per_day: 2,
                preferred_times: vec!["morning".into(), "evening".into()],
                food_timing: FoodTiming::DuringMeal,
                duration_days: 5,
                ..Schedule::default()
            },
            vec![
                ParsedMedication::new("MedA", "500mg", "twice daily", "5 days"),
                ParsedMedication::new("MedB", "1 tab", "twice daily", "5 days"),
            ],
        );
        let description = build_event_description(&rx, &settings);

        assert!(description.contains("• MedA: 500mg - twice daily"));
        assert!(description.contains("• MedB: 1 tab - twice daily"));
        assert!(description.contains("Schedule: 2 times per day (during meal)"));
        assert!(description.contains("Preferred times: morning, evening"));
        assert!(description.contains("Reminder: 15 minutes before"));
    }

    #[test]
    fn neutral_prescription_shows_user_default_food_timing() {
        let settings = UserSettings {
            food_timing_default: FoodTiming::BeforeMeal,
            reminder_minutes: 0,
            ..UserSettings::default()
        };
        let rx = prescription(
            Schedule {
                preferred_times: vec![],
                ..Schedule::default()
            },
            vec![ParsedMedication::new("MedA", "1 tab", "daily", "7 days")],
        );
        let description = build_event_description(&rx, &settings);

        assert!(description.contains("Schedule: 1 times per day (before meal)"));
        assert!(!description.contains("Reminder:"));
        assert!(!description.contains("Preferred times:"));
    }

    #[test]
    fn empty_medication_list_uses_generic_title() {
        assert_eq!(build_event_title(&[]), "Medication");
    }

    #[test]
    fn materialization_is_pure() {
        let rx = prescription(
            Schedule {
                times_per_day: 3,
                preferred_times: vec!["morning".into()],
                duration_days: 4,
                ..Schedule::default()
            },
            vec![ParsedMedication::new("MedA", "500mg", "tid", "4 days")],
        );
        let settings = UserSettings::default();

        let first = materialize(&rx, &settings, 0);
        let second = materialize(&rx, &settings, 0);

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.title, b.title);
            assert_eq!(a.description, b.description);
            assert_eq!(a.start_time_millis, b.start_time_millis);
            assert_eq!(a.end_time_millis, b.end_time_millis);
        }
    }
}
