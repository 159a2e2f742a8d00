use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::*;

/// The caller's achievements, most recently earned first.
pub fn get_achievements(conn: &Connection, user_id: i64) -> Result<Vec<Achievement>, DatabaseError> {
    let Some(patient) = super::get_patient_by_user_id(conn, user_id)? else {
        return Ok(Vec::new());
    };
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, title, description, icon, earned_at
         FROM achievements WHERE patient_id = ?1
         ORDER BY earned_at DESC, id DESC",
    )?;
    let rows = stmt.query_map(params![patient.id], |row| {
        Ok(Achievement {
            id: row.get(0)?,
            patient_id: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            icon: row.get(4)?,
            earned_at: row.get(5)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}
