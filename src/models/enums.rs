use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::db::DatabaseError;

/// Macro to generate enum with as_str + std::str::FromStr pattern,
/// stored in SQLite as its string form.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: DatabaseError| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

str_enum!(Role {
    Patient => "patient",
    Admin => "admin",
});

str_enum!(PatientStatus {
    Active => "active",
    Pending => "pending",
    Inactive => "inactive",
});

str_enum!(PlanStatus {
    Active => "active",
    Completed => "completed",
});

str_enum!(PhaseStatus {
    Locked => "locked",
    Active => "active",
    Completed => "completed",
});

str_enum!(TaskType {
    Exercise => "exercise",
    Therapy => "therapy",
    Activity => "activity",
    Medication => "medication",
});

str_enum!(ArticleCategory {
    Exercises => "exercises",
    Nutrition => "nutrition",
    Recovery => "recovery",
    Faq => "faq",
});

str_enum!(ContentType {
    Article => "article",
    Video => "video",
});

str_enum!(ServiceRequestType {
    Adjustment => "adjustment",
    Checkup => "checkup",
    Repair => "repair",
    Consultation => "consultation",
});

str_enum!(ServiceRequestStatus {
    Pending => "pending",
    Scheduled => "scheduled",
    InProgress => "in_progress",
    Completed => "completed",
    Cancelled => "cancelled",
});

str_enum!(AppointmentStatus {
    Scheduled => "scheduled",
    Completed => "completed",
    Cancelled => "cancelled",
});

str_enum!(NotificationType {
    Reminder => "reminder",
    Appointment => "appointment",
    Achievement => "achievement",
    System => "system",
});

str_enum!(ScheduleChangeKind {
    AppointmentCreated => "appointment_created",
    AppointmentUpdated => "appointment_updated",
    TaskCreated => "task_created",
});

impl ServiceRequestStatus {
    /// Whether an admin may move a request from `self` to `next`.
    ///
    /// `pending → scheduled | in_progress`, `scheduled → in_progress |
    /// completed`, `in_progress → completed`; any open request may be
    /// cancelled. Completed and cancelled are terminal.
    pub fn can_transition_to(self, next: ServiceRequestStatus) -> bool {
        use ServiceRequestStatus::*;
        matches!(
            (self, next),
            (Pending, Scheduled)
                | (Pending, InProgress)
                | (Scheduled, InProgress)
                | (Scheduled, Completed)
                | (InProgress, Completed)
                | (Pending | Scheduled | InProgress, Cancelled)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn service_request_status_round_trip() {
        for (variant, s) in [
            (ServiceRequestStatus::Pending, "pending"),
            (ServiceRequestStatus::Scheduled, "scheduled"),
            (ServiceRequestStatus::InProgress, "in_progress"),
            (ServiceRequestStatus::Completed, "completed"),
            (ServiceRequestStatus::Cancelled, "cancelled"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(ServiceRequestStatus::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn unknown_value_is_invalid_enum() {
        let err = TaskType::from_str("yoga").unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidEnum { .. }));
        assert!(err.to_string().contains("TaskType"));
    }

    #[test]
    fn serde_uses_storage_names() {
        let json = serde_json::to_string(&ServiceRequestStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        let parsed: ArticleCategory = serde_json::from_str("\"faq\"").unwrap();
        assert_eq!(parsed, ArticleCategory::Faq);
    }

    #[test]
    fn status_progression() {
        use ServiceRequestStatus::*;
        assert!(Pending.can_transition_to(Scheduled));
        assert!(Pending.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Completed));
        assert!(Scheduled.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Scheduled));
        assert!(!InProgress.can_transition_to(Pending));
    }

    #[test]
    fn enums_store_as_text() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let stored: String = conn
            .query_row("SELECT ?1", [AppointmentStatus::Cancelled], |row| row.get(0))
            .unwrap();
        assert_eq!(stored, "cancelled");
        let read: Role = conn
            .query_row("SELECT 'admin'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(read, Role::Admin);
    }
}
