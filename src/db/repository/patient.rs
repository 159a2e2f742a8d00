use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use crate::db::{now_utc, DatabaseError};
use crate::models::enums::PatientStatus;
use crate::models::*;

use super::escape_like;

const PATIENT_COLUMNS: &str = "id, user_id, first_name, last_name, date_of_birth, phone, address,
     emergency_contact_name, emergency_contact_phone, status, created_at, updated_at";

fn row_to_patient(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: row.get(0)?,
        user_id: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        date_of_birth: row.get(4)?,
        phone: row.get(5)?,
        address: row.get(6)?,
        emergency_contact_name: row.get(7)?,
        emergency_contact_phone: row.get(8)?,
        status: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

/// Resolve the patient record linked to a user. Every patient-scoped
/// operation goes through here first.
pub fn get_patient_by_user_id(
    conn: &Connection,
    user_id: i64,
) -> Result<Option<Patient>, DatabaseError> {
    let patient = conn
        .query_row(
            &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE user_id = ?1 LIMIT 1"),
            params![user_id],
            row_to_patient,
        )
        .optional()?;
    Ok(patient)
}

pub fn get_patient_by_id(conn: &Connection, patient_id: i64) -> Result<Option<Patient>, DatabaseError> {
    let patient = conn
        .query_row(
            &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?1"),
            params![patient_id],
            row_to_patient,
        )
        .optional()?;
    Ok(patient)
}

/// Update contact fields of the caller's patient record.
///
/// Returns `None` when the user has no patient record.
pub fn update_patient_profile(
    conn: &Connection,
    user_id: i64,
    update: &PatientProfileUpdate,
) -> Result<Option<Patient>, DatabaseError> {
    let Some(patient) = get_patient_by_user_id(conn, user_id)? else {
        return Ok(None);
    };
    if update.is_empty() {
        return Ok(Some(patient));
    }

    conn.execute(
        "UPDATE patients SET
            phone = COALESCE(?1, phone),
            address = COALESCE(?2, address),
            emergency_contact_name = COALESCE(?3, emergency_contact_name),
            emergency_contact_phone = COALESCE(?4, emergency_contact_phone),
            updated_at = ?5
         WHERE id = ?6",
        params![
            update.phone,
            update.address,
            update.emergency_contact_name,
            update.emergency_contact_phone,
            now_utc(),
            patient.id,
        ],
    )?;

    get_patient_by_user_id(conn, user_id)
}

/// Onboard a patient for an existing user. Returns `None` when the user
/// does not exist.
pub fn create_patient(conn: &Connection, new: &NewPatient) -> Result<Option<Patient>, DatabaseError> {
    let user_exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
        params![new.user_id],
        |row| row.get(0),
    )?;
    if !user_exists {
        return Ok(None);
    }
    if get_patient_by_user_id(conn, new.user_id)?.is_some() {
        return Err(DatabaseError::ConstraintViolation(format!(
            "user {} already has a patient record",
            new.user_id
        )));
    }

    let now = now_utc();
    conn.execute(
        "INSERT INTO patients (user_id, first_name, last_name, date_of_birth, phone, address,
         status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
        params![
            new.user_id,
            new.first_name,
            new.last_name,
            new.date_of_birth,
            new.phone,
            new.address,
            new.status.unwrap_or(PatientStatus::Active),
            now,
        ],
    )?;

    get_patient_by_id(conn, conn.last_insert_rowid())
}

/// Admin patient list with optional name/email/phone search and status filter.
pub fn list_patients(
    conn: &Connection,
    search: Option<&str>,
    status: Option<PatientStatus>,
) -> Result<Vec<PatientSummary>, DatabaseError> {
    let mut sql = String::from(
        "SELECT p.id, p.user_id, p.first_name, p.last_name, u.email, p.phone, p.status,
                (SELECT pr.model FROM prostheses pr WHERE pr.patient_id = p.id ORDER BY pr.id LIMIT 1),
                COALESCE((SELECT CAST(ROUND(AVG(ph.progress)) AS INTEGER)
                          FROM rehabilitation_phases ph
                          WHERE ph.plan_id = (SELECT rp.id FROM rehabilitation_plans rp
                                              WHERE rp.patient_id = p.id AND rp.status = 'active'
                                              ORDER BY rp.id LIMIT 1)), 0)
         FROM patients p
         JOIN users u ON u.id = p.user_id
         WHERE 1 = 1",
    );
    let mut values: Vec<Value> = Vec::new();

    if let Some(status) = status {
        values.push(Value::Text(status.as_str().into()));
        sql.push_str(&format!(" AND p.status = ?{}", values.len()));
    }
    if let Some(term) = search.map(str::trim).filter(|s| !s.is_empty()) {
        values.push(Value::Text(format!("%{}%", escape_like(term))));
        let n = values.len();
        sql.push_str(&format!(
            " AND (p.first_name || ' ' || p.last_name LIKE ?{n} ESCAPE '\\'
                   OR u.email LIKE ?{n} ESCAPE '\\'
                   OR p.phone LIKE ?{n} ESCAPE '\\')"
        ));
    }
    sql.push_str(" ORDER BY p.last_name, p.first_name, p.id");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values), |row| {
        Ok(PatientSummary {
            id: row.get(0)?,
            user_id: row.get(1)?,
            first_name: row.get(2)?,
            last_name: row.get(3)?,
            email: row.get(4)?,
            phone: row.get(5)?,
            status: row.get(6)?,
            prosthesis_model: row.get(7)?,
            plan_progress: row.get(8)?,
        })
    })?;

    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Admin detail view: patient plus login identity and implant.
pub fn get_patient_detail(
    conn: &Connection,
    patient_id: i64,
) -> Result<Option<PatientDetail>, DatabaseError> {
    let Some(patient) = get_patient_by_id(conn, patient_id)? else {
        return Ok(None);
    };
    let Some(user) = super::get_user_by_id(conn, patient.user_id)? else {
        return Ok(None);
    };
    let prosthesis = super::get_prosthesis_for_patient(conn, patient.id)?;

    Ok(Some(PatientDetail {
        patient,
        email: user.email,
        name: user.name,
        last_signed_in: user.last_signed_in,
        prosthesis,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures::*;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn user_without_patient_resolves_to_none() {
        let conn = open_memory_database().unwrap();
        let user_id = seed_user(&conn, "u-1");
        assert!(get_patient_by_user_id(&conn, user_id).unwrap().is_none());
    }

    #[test]
    fn profile_update_changes_only_given_fields() {
        let conn = open_memory_database().unwrap();
        let (user_id, _) = seed_patient(&conn, "u-1");

        let update = PatientProfileUpdate {
            phone: Some("+971 50 000 0000".into()),
            ..Default::default()
        };
        let patient = update_patient_profile(&conn, user_id, &update).unwrap().unwrap();
        assert_eq!(patient.phone.as_deref(), Some("+971 50 000 0000"));
        assert_eq!(patient.address.as_deref(), Some("Dubai Healthcare City"));
    }

    #[test]
    fn profile_update_without_patient_is_noop() {
        let conn = open_memory_database().unwrap();
        let user_id = seed_user(&conn, "u-1");
        let update = PatientProfileUpdate {
            phone: Some("123".into()),
            ..Default::default()
        };
        assert!(update_patient_profile(&conn, user_id, &update).unwrap().is_none());
    }

    #[test]
    fn create_patient_links_user_once() {
        let conn = open_memory_database().unwrap();
        let user_id = seed_user(&conn, "u-1");
        let new = NewPatient {
            user_id,
            first_name: "Omar".into(),
            last_name: "Haddad".into(),
            date_of_birth: None,
            phone: None,
            address: None,
            status: None,
        };
        let patient = create_patient(&conn, &new).unwrap().unwrap();
        assert_eq!(patient.user_id, user_id);
        assert_eq!(patient.status, PatientStatus::Active);

        let again = create_patient(&conn, &new);
        assert!(matches!(again, Err(DatabaseError::ConstraintViolation(_))));
    }

    #[test]
    fn create_patient_for_unknown_user_is_none() {
        let conn = open_memory_database().unwrap();
        let new = NewPatient {
            user_id: 99,
            first_name: "A".into(),
            last_name: "B".into(),
            date_of_birth: None,
            phone: None,
            address: None,
            status: None,
        };
        assert!(create_patient(&conn, &new).unwrap().is_none());
    }

    #[test]
    fn list_patients_filters_and_reports_progress() {
        let conn = open_memory_database().unwrap();
        let (_, first) = seed_patient(&conn, "u-1");
        seed_patient(&conn, "u-2");
        let plan_id = seed_plan(&conn, first, "active");
        seed_phase(&conn, plan_id, 1, 100);
        seed_phase(&conn, plan_id, 2, 50);
        seed_prosthesis(&conn, first);

        let all = list_patients(&conn, None, None).unwrap();
        assert_eq!(all.len(), 2);

        let found = list_patients(&conn, Some("u-1@"), None).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, first);
        assert_eq!(found[0].plan_progress, 75);
        assert_eq!(found[0].prosthesis_model.as_deref(), Some("Genesis II"));

        let inactive = list_patients(&conn, None, Some(PatientStatus::Inactive)).unwrap();
        assert!(inactive.is_empty());
    }

    #[test]
    fn search_treats_wildcards_literally() {
        let conn = open_memory_database().unwrap();
        seed_patient(&conn, "u-1");
        assert!(list_patients(&conn, Some("%"), None).unwrap().is_empty());
    }

    #[test]
    fn patient_detail_includes_identity() {
        let conn = open_memory_database().unwrap();
        let (_, patient_id) = seed_patient(&conn, "u-1");
        let detail = get_patient_detail(&conn, patient_id).unwrap().unwrap();
        assert_eq!(detail.email.as_deref(), Some("u-1@example.com"));
        assert!(detail.prosthesis.is_none());
        assert!(get_patient_detail(&conn, 404).unwrap().is_none());
    }
}
