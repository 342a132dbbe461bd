use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::MedicationEvent;

const EVENT_COLUMNS: &str =
    "id, prescription_id, title, description, start_time_millis, end_time_millis,
     is_completed, completed_at_millis, reminder_sent, calendar_event_id, notes,
     created_at_millis";

pub fn insert_events(conn: &Connection, events: &[MedicationEvent]) -> Result<(), DatabaseError> {
    let mut stmt = conn.prepare(
        "INSERT INTO medication_events (id, prescription_id, title, description,
         start_time_millis, end_time_millis, is_completed, completed_at_millis,
         reminder_sent, calendar_event_id, notes, created_at_millis)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
    )?;

    for event in events {
        stmt.execute(params![
            event.id.to_string(),
            event.prescription_id.to_string(),
            event.title,
            event.description,
            event.start_time_millis,
            event.end_time_millis,
            event.is_completed as i32,
            event.completed_at_millis,
            event.reminder_sent as i32,
            event.calendar_event_id,
            event.notes,
            event.created_at_millis,
        ])?;
    }
    Ok(())
}

pub fn get_event_by_id(
    conn: &Connection,
    id: &Uuid,
) -> Result<Option<MedicationEvent>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {EVENT_COLUMNS} FROM medication_events WHERE id = ?1"
    ))?;

    let mut rows = stmt.query_map(params![id.to_string()], |row| {
        Ok(event_row_from_rusqlite(row))
    })?;

    match rows.next() {
        Some(row) => Ok(Some(event_from_row(row??)?)),
        None => Ok(None),
    }
}

pub fn get_events_by_prescription(
    conn: &Connection,
    prescription_id: &Uuid,
) -> Result<Vec<MedicationEvent>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {EVENT_COLUMNS} FROM medication_events
         WHERE prescription_id = ?1 ORDER BY start_time_millis ASC"
    ))?;

    let rows = stmt.query_map(params![prescription_id.to_string()], |row| {
        Ok(event_row_from_rusqlite(row))
    })?;

    collect_events(rows)
}

pub fn get_events_in_range(
    conn: &Connection,
    start_millis: i64,
    end_millis: i64,
) -> Result<Vec<MedicationEvent>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {EVENT_COLUMNS} FROM medication_events
         WHERE start_time_millis >= ?1 AND start_time_millis <= ?2
         ORDER BY start_time_millis ASC"
    ))?;

    let rows = stmt.query_map(params![start_millis, end_millis], |row| {
        Ok(event_row_from_rusqlite(row))
    })?;

    collect_events(rows)
}

/// Incomplete, unclaimed events of active prescriptions starting inside the
/// lookahead window. This is the query both the periodic rescan and the
/// foreground monitor run.
pub fn get_due_unreminded_events(
    conn: &Connection,
    now_millis: i64,
    until_millis: i64,
) -> Result<Vec<MedicationEvent>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT e.id, e.prescription_id, e.title, e.description, e.start_time_millis,
                e.end_time_millis, e.is_completed, e.completed_at_millis, e.reminder_sent,
                e.calendar_event_id, e.notes, e.created_at_millis
         FROM medication_events e
         JOIN prescriptions p ON p.id = e.prescription_id
         WHERE e.start_time_millis >= ?1 AND e.start_time_millis <= ?2
           AND e.is_completed = 0 AND e.reminder_sent = 0
           AND p.status = 'active'
         ORDER BY e.start_time_millis ASC",
    )?;

    let rows = stmt.query_map(params![now_millis, until_millis], |row| {
        Ok(event_row_from_rusqlite(row))
    })?;

    collect_events(rows)
}

pub fn get_completed_events(conn: &Connection) -> Result<Vec<MedicationEvent>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {EVENT_COLUMNS} FROM medication_events
         WHERE is_completed = 1 ORDER BY start_time_millis DESC"
    ))?;

    let rows = stmt.query_map([], |row| Ok(event_row_from_rusqlite(row)))?;
    collect_events(rows)
}

/// Claim the reminder for an event: compare-and-set on the reminder_sent
/// flag. Returns true when this caller won the claim; false when another
/// mechanism already owns it (or the event was completed/deleted meanwhile).
pub fn claim_reminder(conn: &Connection, id: &Uuid) -> Result<bool, DatabaseError> {
    let updated = conn.execute(
        "UPDATE medication_events SET reminder_sent = 1
         WHERE id = ?1 AND reminder_sent = 0 AND is_completed = 0",
        params![id.to_string()],
    )?;
    Ok(updated == 1)
}

pub fn mark_event_completed(
    conn: &Connection,
    id: &Uuid,
    now_millis: i64,
) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE medication_events SET is_completed = 1, completed_at_millis = ?2
         WHERE id = ?1",
        params![id.to_string(), now_millis],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "medication_event".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn mark_event_incomplete(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE medication_events SET is_completed = 0, completed_at_millis = NULL
         WHERE id = ?1",
        params![id.to_string()],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "medication_event".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn update_event_notes(
    conn: &Connection,
    id: &Uuid,
    notes: Option<&str>,
) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE medication_events SET notes = ?2 WHERE id = ?1",
        params![id.to_string(), notes],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "medication_event".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn update_calendar_event_id(
    conn: &Connection,
    id: &Uuid,
    calendar_event_id: i64,
) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE medication_events SET calendar_event_id = ?2 WHERE id = ?1",
        params![id.to_string(), calendar_event_id],
    )?;
    Ok(())
}

pub fn delete_event(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    conn.execute(
        "DELETE FROM medication_events WHERE id = ?1",
        params![id.to_string()],
    )?;
    Ok(())
}

pub fn delete_events_by_prescription(
    conn: &Connection,
    prescription_id: &Uuid,
) -> Result<(), DatabaseError> {
    conn.execute(
        "DELETE FROM medication_events WHERE prescription_id = ?1",
        params![prescription_id.to_string()],
    )?;
    Ok(())
}

pub fn count_events_by_prescription(
    conn: &Connection,
    prescription_id: &Uuid,
) -> Result<u32, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM medication_events WHERE prescription_id = ?1",
        params![prescription_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn count_completed_events_by_prescription(
    conn: &Connection,
    prescription_id: &Uuid,
) -> Result<u32, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM medication_events
         WHERE prescription_id = ?1 AND is_completed = 1",
        params![prescription_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count)
}

fn collect_events<I>(rows: I) -> Result<Vec<MedicationEvent>, DatabaseError>
where
    I: Iterator<Item = Result<Result<EventRow, rusqlite::Error>, rusqlite::Error>>,
{
    let mut events = Vec::new();
    for row in rows {
        events.push(event_from_row(row??)?);
    }
    Ok(events)
}

// Internal row type for MedicationEvent mapping
struct EventRow {
    id: String,
    prescription_id: String,
    title: String,
    description: String,
    start_time_millis: i64,
    end_time_millis: i64,
    is_completed: i32,
    completed_at_millis: Option<i64>,
    reminder_sent: i32,
    calendar_event_id: Option<i64>,
    notes: Option<String>,
    created_at_millis: i64,
}

fn event_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<EventRow, rusqlite::Error> {
    Ok(EventRow {
        id: row.get(0)?,
        prescription_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        start_time_millis: row.get(4)?,
        end_time_millis: row.get(5)?,
        is_completed: row.get(6)?,
        completed_at_millis: row.get(7)?,
        reminder_sent: row.get(8)?,
        calendar_event_id: row.get(9)?,
        notes: row.get(10)?,
        created_at_millis: row.get(11)?,
    })
}

fn event_from_row(row: EventRow) -> Result<MedicationEvent, DatabaseError> {
    Ok(MedicationEvent {
        id: Uuid::parse_str(&row.id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        prescription_id: Uuid::parse_str(&row.prescription_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        title: row.title,
        description: row.description,
        start_time_millis: row.start_time_millis,
        end_time_millis: row.end_time_millis,
        is_completed: row.is_completed != 0,
        completed_at_millis: row.completed_at_millis,
        reminder_sent: row.reminder_sent != 0,
        calendar_event_id: row.calendar_event_id,
        notes: row.notes,
        created_at_millis: row.created_at_millis,
    })
}
