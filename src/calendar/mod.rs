//! Calendar integration: the iCalendar writer, per-patient subscription
//! feeds kept in step with schedule changes, and single-event export.

pub mod export;
pub mod ics;
pub mod subscription;
pub mod sync;

pub use subscription::CalendarSubscription;
pub use sync::{on_schedule_change, sync_after_change, CalendarSyncStatus};
