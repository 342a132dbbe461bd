//! Time-slot allocation — minute-of-day slots for one dosing day.
//!
//! One canonical algorithm is used everywhere (ad-hoc previews and
//! persisted materialization): preferred labels when any fall inside the
//! window, then the clinical two/three-dose conventions, then even
//! distribution. Integer division truncates toward zero, so identical
//! inputs always produce identical slots.

/// Minute-of-day for each recognized preferred-time label.
/// Unrecognized labels fall back to the window start.
fn label_minute(label: &str, window_start: i32) -> i32 {
    match label.to_lowercase().as_str() {
        "morning" => 8 * 60,
        "afternoon" => 14 * 60,
        "evening" => 20 * 60,
        "night" => 22 * 60,
        _ => window_start,
    }
}

/// Allocate `times_per_day` sorted minute-of-day slots within
/// `[window_start, window_end]`.
pub fn allocate(
    times_per_day: i32,
    window_start: i32,
    window_end: i32,
    preferred_labels: &[String],
) -> Vec<i32> {
    if times_per_day <= 1 {
        return vec![window_start];
    }

    if !preferred_labels.is_empty() {
        let in_window: Vec<i32> = preferred_labels
            .iter()
            .map(|label| label_minute(label, window_start))
            .filter(|minute| *minute >= window_start && *minute <= window_end)
            .collect();

        if in_window.len() >= times_per_day as usize {
            let mut slots: Vec<i32> =
                in_window.into_iter().take(times_per_day as usize).collect();
            slots.sort_unstable();
            return slots;
        }

        if !in_window.is_empty() {
            // Keep the usable labels and fill the remainder at the interior
            // boundaries of an even (remaining+1)-way split of the window.
            let remaining = times_per_day - in_window.len() as i32;
            let interval = (window_end - window_start) / (remaining + 1);

            let mut slots = in_window;
            for index in 1..=remaining {
                slots.push(window_start + interval * index);
            }
            slots.sort_unstable();
            return slots;
        }
    }

    match times_per_day {
        2 => {
            // Morning and evening doses: 7:30 and 22:00, clamped to the window.
            let morning = window_start.max(7 * 60 + 30);
            let evening = window_end.min(22 * 60);
            let mut slots = vec![morning, evening];
            slots.sort_unstable();
            slots
        }
        3 => {
            // Morning, midday, evening: 8:00 and 20:00 clamped, midpoint between.
            let morning = window_start.max(8 * 60);
            let midday = (window_start + window_end) / 2;
            let evening = window_end.min(20 * 60);
            let mut slots = vec![morning, midday, evening];
            slots.sort_unstable();
            slots
        }
        _ => {
            let interval = (window_end - window_start) / (times_per_day - 1);
            (0..times_per_day)
                .map(|index| window_start + interval * index)
                .collect()
        }
    }
}
