use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{
    FoodTiming, ParsedMedication, Prescription, PrescriptionStatus, Schedule,
};

const PRESCRIPTION_COLUMNS: &str =
    "id, title, medications, times_per_day, preferred_times, food_timing, duration_days,
     start_time_minutes, end_time_minutes, window_specified, interval_days,
     start_date_millis, status, created_at_millis";

pub fn insert_prescription(conn: &Connection, rx: &Prescription) -> Result<(), DatabaseError> {
    let medications = serde_json::to_string(&rx.medications)
        .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?;
    let preferred = serde_json::to_string(&rx.schedule.preferred_times)
        .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?;

    conn.execute(
        "INSERT INTO prescriptions (id, title, medications, times_per_day, preferred_times,
         food_timing, duration_days, start_time_minutes, end_time_minutes, window_specified,
         interval_days, start_date_millis, status, created_at_millis)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            rx.id.to_string(),
            rx.title,
            medications,
            rx.schedule.times_per_day,
            preferred,
            rx.schedule.food_timing.as_str(),
            rx.schedule.duration_days,
            rx.schedule.start_time_minutes,
            rx.schedule.end_time_minutes,
            rx.schedule.window_specified as i32,
            rx.schedule.interval_days,
            rx.start_date_millis,
            rx.status.as_str(),
            rx.created_at_millis,
        ],
    )?;
    Ok(())
}

pub fn update_prescription(conn: &Connection, rx: &Prescription) -> Result<(), DatabaseError> {
    let medications = serde_json::to_string(&rx.medications)
        .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?;
    let preferred = serde_json::to_string(&rx.schedule.preferred_times)
        .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?;

    let updated = conn.execute(
        "UPDATE prescriptions SET title = ?2, medications = ?3, times_per_day = ?4,
         preferred_times = ?5, food_timing = ?6, duration_days = ?7, start_time_minutes = ?8,
         end_time_minutes = ?9, window_specified = ?10, interval_days = ?11,
         start_date_millis = ?12, status = ?13
         WHERE id = ?1",
        params![
            rx.id.to_string(),
            rx.title,
            medications,
            rx.schedule.times_per_day,
            preferred,
            rx.schedule.food_timing.as_str(),
            rx.schedule.duration_days,
            rx.schedule.start_time_minutes,
            rx.schedule.end_time_minutes,
            rx.schedule.window_specified as i32,
            rx.schedule.interval_days,
            rx.start_date_millis,
            rx.status.as_str(),
        ],
    )?;

    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "prescription".into(),
            id: rx.id.to_string(),
        });
    }
    Ok(())
}

pub fn get_prescription_by_id(
    conn: &Connection,
    id: &Uuid,
) -> Result<Option<Prescription>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PRESCRIPTION_COLUMNS} FROM prescriptions WHERE id = ?1"
    ))?;

    let mut rows = stmt.query_map(params![id.to_string()], |row| {
        Ok(prescription_row_from_rusqlite(row))
    })?;

    match rows.next() {
        Some(row) => Ok(Some(prescription_from_row(row??)?)),
        None => Ok(None),
    }
}

pub fn get_active_prescriptions(conn: &Connection) -> Result<Vec<Prescription>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PRESCRIPTION_COLUMNS} FROM prescriptions
         WHERE status = 'active' ORDER BY created_at_millis DESC"
    ))?;

    let rows = stmt.query_map([], |row| Ok(prescription_row_from_rusqlite(row)))?;

    let mut prescriptions = Vec::new();
    for row in rows {
        prescriptions.push(prescription_from_row(row??)?);
    }
    Ok(prescriptions)
}

pub fn get_all_prescriptions(conn: &Connection) -> Result<Vec<Prescription>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PRESCRIPTION_COLUMNS} FROM prescriptions ORDER BY created_at_millis DESC"
    ))?;

    let rows = stmt.query_map([], |row| Ok(prescription_row_from_rusqlite(row)))?;

    let mut prescriptions = Vec::new();
    for row in rows {
        prescriptions.push(prescription_from_row(row??)?);
    }
    Ok(prescriptions)
}

/// Narrow status flip; Active ⇄ Archived.
pub fn set_prescription_status(
    conn: &Connection,
    id: &Uuid,
    status: PrescriptionStatus,
) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE prescriptions SET status = ?2 WHERE id = ?1",
        params![id.to_string(), status.as_str()],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "prescription".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Hard delete of the row itself. Event cascade is handled by the caller
/// (alarms must be cancelled before rows disappear).
pub fn delete_prescription(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    conn.execute(
        "DELETE FROM prescriptions WHERE id = ?1",
        params![id.to_string()],
    )?;
    Ok(())
}

// Internal row type for Prescription mapping
struct PrescriptionRow {
    id: String,
    title: String,
    medications: String,
    times_per_day: i32,
    preferred_times: String,
    food_timing: String,
    duration_days: i32,
    start_time_minutes: i32,
    end_time_minutes: i32,
    window_specified: i32,
    interval_days: i32,
    start_date_millis: i64,
    status: String,
    created_at_millis: i64,
}

fn prescription_row_from_rusqlite(
    row: &rusqlite::Row<'_>,
) -> Result<PrescriptionRow, rusqlite::Error> {
    Ok(PrescriptionRow {
        id: row.get(0)?,
        title: row.get(1)?,
        medications: row.get(2)?,
        times_per_day: row.get(3)?,
        preferred_times: row.get(4)?,
        food_timing: row.get(5)?,
        duration_days: row.get(6)?,
        start_time_minutes: row.get(7)?,
        end_time_minutes: row.get(8)?,
        window_specified: row.get(9)?,
        interval_days: row.get(10)?,
        start_date_millis: row.get(11)?,
        status: row.get(12)?,
        created_at_millis: row.get(13)?,
    })
}

fn prescription_from_row(row: PrescriptionRow) -> Result<Prescription, DatabaseError> {
    let medications: Vec<ParsedMedication> = serde_json::from_str(&row.medications)
        .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?;
    let preferred_times: Vec<String> = serde_json::from_str(&row.preferred_times)
        .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?;

    Ok(Prescription {
        id: Uuid::parse_str(&row.id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        title: row.title,
        medications,
        schedule: Schedule {
            times_per_day: row.times_per_day,
            preferred_times,
            food_timing: FoodTiming::from_str(&row.food_timing)?,
            duration_days: row.duration_days,
            start_time_minutes: row.start_time_minutes,
            end_time_minutes: row.end_time_minutes,
            window_specified: row.window_specified != 0,
            interval_days: row.interval_days,
        },
        start_date_millis: row.start_date_millis,
        status: PrescriptionStatus::from_str(&row.status)?,
        created_at_millis: row.created_at_millis,
    })
}
