use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::DatabaseError;
use crate::models::*;

fn row_to_prosthesis(row: &Row<'_>) -> rusqlite::Result<Prosthesis> {
    Ok(Prosthesis {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        serial_number: row.get(2)?,
        model: row.get(3)?,
        manufacturer: row.get(4)?,
        side: row.get(5)?,
        implant_date: row.get(6)?,
        warranty_expires_at: row.get(7)?,
        created_at: row.get(8)?,
    })
}

pub fn get_prosthesis_for_patient(
    conn: &Connection,
    patient_id: i64,
) -> Result<Option<Prosthesis>, DatabaseError> {
    let prosthesis = conn
        .query_row(
            "SELECT id, patient_id, serial_number, model, manufacturer, side, implant_date,
                    warranty_expires_at, created_at
             FROM prostheses WHERE patient_id = ?1 ORDER BY id LIMIT 1",
            params![patient_id],
            row_to_prosthesis,
        )
        .optional()?;
    Ok(prosthesis)
}

pub fn get_patient_prosthesis(
    conn: &Connection,
    user_id: i64,
) -> Result<Option<Prosthesis>, DatabaseError> {
    match super::get_patient_by_user_id(conn, user_id)? {
        Some(patient) => get_prosthesis_for_patient(conn, patient.id),
        None => Ok(None),
    }
}

/// Paperwork issued with every implant, dated from the implant record.
pub fn prosthesis_documents(prosthesis: &Prosthesis) -> Vec<ProsthesisDocument> {
    let implanted = prosthesis.implant_date;
    let registered = implanted.and_then(|d| d.succ_opt());
    [
        ("Implant Certificate", implanted),
        ("Warranty Registration", registered),
        ("Surgical Report", implanted),
        ("Post-Op Instructions", implanted),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, (name, date))| ProsthesisDocument {
        id: i as i64 + 1,
        name: name.to_string(),
        date,
        format: "PDF".to_string(),
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures::*;
    use crate::db::sqlite::open_memory_database;
    use chrono::NaiveDate;

    #[test]
    fn prosthesis_resolves_through_user() {
        let conn = open_memory_database().unwrap();
        let (user_id, patient_id) = seed_patient(&conn, "u-1");
        seed_prosthesis(&conn, patient_id);

        let prosthesis = get_patient_prosthesis(&conn, user_id).unwrap().unwrap();
        assert_eq!(prosthesis.patient_id, patient_id);
        assert_eq!(prosthesis.serial_number, "SN-0001");
    }

    #[test]
    fn no_patient_means_no_prosthesis() {
        let conn = open_memory_database().unwrap();
        let user_id = seed_user(&conn, "u-1");
        assert!(get_patient_prosthesis(&conn, user_id).unwrap().is_none());
    }

    #[test]
    fn documents_follow_implant_date() {
        let conn = open_memory_database().unwrap();
        let (_, patient_id) = seed_patient(&conn, "u-1");
        seed_prosthesis(&conn, patient_id);
        let prosthesis = get_prosthesis_for_patient(&conn, patient_id).unwrap().unwrap();

        let docs = prosthesis_documents(&prosthesis);
        assert_eq!(docs.len(), 4);
        assert_eq!(docs[0].name, "Implant Certificate");
        assert_eq!(docs[0].date, NaiveDate::from_ymd_opt(2024, 10, 15));
        assert_eq!(docs[1].date, NaiveDate::from_ymd_opt(2024, 10, 16));
    }
}
