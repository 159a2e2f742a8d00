use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::DatabaseError;
use crate::models::*;

const PLAN_COLUMNS: &str = "id, patient_id, title, status, start_date, end_date, created_at";

fn row_to_plan(row: &Row<'_>) -> rusqlite::Result<RehabilitationPlan> {
    Ok(RehabilitationPlan {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        title: row.get(2)?,
        status: row.get(3)?,
        start_date: row.get(4)?,
        end_date: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn row_to_phase(row: &Row<'_>) -> rusqlite::Result<RehabilitationPhase> {
    Ok(RehabilitationPhase {
        id: row.get(0)?,
        plan_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        order: row.get(4)?,
        status: row.get(5)?,
        progress: row.get(6)?,
        start_date: row.get(7)?,
        end_date: row.get(8)?,
    })
}

/// The caller's active plan. Uniqueness of the active plan is not enforced
/// by the schema; the oldest active plan wins.
pub fn get_patient_rehab_plan(
    conn: &Connection,
    user_id: i64,
) -> Result<Option<RehabilitationPlan>, DatabaseError> {
    let Some(patient) = super::get_patient_by_user_id(conn, user_id)? else {
        return Ok(None);
    };
    let plan = conn
        .query_row(
            &format!(
                "SELECT {PLAN_COLUMNS} FROM rehabilitation_plans
                 WHERE patient_id = ?1 AND status = 'active'
                 ORDER BY id LIMIT 1"
            ),
            params![patient.id],
            row_to_plan,
        )
        .optional()?;
    Ok(plan)
}

/// Phases of a plan in their explicit order. Plans owned by another
/// patient yield an empty list.
pub fn get_rehab_phases(
    conn: &Connection,
    user_id: i64,
    plan_id: i64,
) -> Result<Vec<RehabilitationPhase>, DatabaseError> {
    let Some(patient) = super::get_patient_by_user_id(conn, user_id)? else {
        return Ok(Vec::new());
    };
    let owned: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM rehabilitation_plans WHERE id = ?1 AND patient_id = ?2)",
        params![plan_id, patient.id],
        |row| row.get(0),
    )?;
    if !owned {
        return Ok(Vec::new());
    }
    get_phases_for_plan(conn, plan_id)
}

pub fn get_phases_for_plan(
    conn: &Connection,
    plan_id: i64,
) -> Result<Vec<RehabilitationPhase>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, plan_id, title, description, phase_order, status, progress, start_date, end_date
         FROM rehabilitation_phases WHERE plan_id = ?1 ORDER BY phase_order, id",
    )?;
    let rows = stmt.query_map(params![plan_id], row_to_phase)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Every plan of a patient, newest first, each with its phases.
pub fn get_patient_rehab_plans(
    conn: &Connection,
    patient_id: i64,
) -> Result<Vec<PlanWithPhases>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PLAN_COLUMNS} FROM rehabilitation_plans WHERE patient_id = ?1
         ORDER BY start_date DESC, id DESC"
    ))?;
    let plans = stmt
        .query_map(params![patient_id], row_to_plan)?
        .collect::<Result<Vec<_>, _>>()?;

    plans
        .into_iter()
        .map(|plan| {
            let phases = get_phases_for_plan(conn, plan.id)?;
            Ok(PlanWithPhases { plan, phases })
        })
        .collect()
}

/// Patient that owns the plan a phase belongs to.
pub fn get_phase_owner(conn: &Connection, phase_id: i64) -> Result<Option<i64>, DatabaseError> {
    let owner = conn
        .query_row(
            "SELECT rp.patient_id FROM rehabilitation_phases ph
             JOIN rehabilitation_plans rp ON rp.id = ph.plan_id
             WHERE ph.id = ?1",
            params![phase_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(owner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures::*;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn active_plan_returns_single_row_even_when_duplicated() {
        let conn = open_memory_database().unwrap();
        let (user_id, patient_id) = seed_patient(&conn, "u-1");
        let first = seed_plan(&conn, patient_id, "active");
        seed_plan(&conn, patient_id, "active");

        let plan = get_patient_rehab_plan(&conn, user_id).unwrap().unwrap();
        assert_eq!(plan.id, first);
    }

    #[test]
    fn completed_plans_are_not_active() {
        let conn = open_memory_database().unwrap();
        let (user_id, patient_id) = seed_patient(&conn, "u-1");
        seed_plan(&conn, patient_id, "completed");
        assert!(get_patient_rehab_plan(&conn, user_id).unwrap().is_none());
    }

    #[test]
    fn phases_come_back_in_order() {
        let conn = open_memory_database().unwrap();
        let (user_id, patient_id) = seed_patient(&conn, "u-1");
        let plan_id = seed_plan(&conn, patient_id, "active");
        seed_phase(&conn, plan_id, 3, 0);
        seed_phase(&conn, plan_id, 1, 100);
        seed_phase(&conn, plan_id, 2, 40);

        let orders: Vec<i64> = get_rehab_phases(&conn, user_id, plan_id)
            .unwrap()
            .iter()
            .map(|p| p.order)
            .collect();
        assert_eq!(orders, vec![1, 2, 3]);
    }

    #[test]
    fn foreign_plan_phases_are_hidden() {
        let conn = open_memory_database().unwrap();
        let (_, owner) = seed_patient(&conn, "u-1");
        let (intruder, _) = seed_patient(&conn, "u-2");
        let plan_id = seed_plan(&conn, owner, "active");
        seed_phase(&conn, plan_id, 1, 10);

        assert!(get_rehab_phases(&conn, intruder, plan_id).unwrap().is_empty());
    }

    #[test]
    fn admin_plan_listing_includes_phases() {
        let conn = open_memory_database().unwrap();
        let (_, patient_id) = seed_patient(&conn, "u-1");
        let plan_id = seed_plan(&conn, patient_id, "completed");
        let phase_id = seed_phase(&conn, plan_id, 1, 100);

        let plans = get_patient_rehab_plans(&conn, patient_id).unwrap();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].phases.len(), 1);
        assert_eq!(get_phase_owner(&conn, phase_id).unwrap(), Some(patient_id));
        assert_eq!(get_phase_owner(&conn, 999).unwrap(), None);
    }
}
