mod accounts;
mod common;
mod reminders;

pub use accounts::SqliteAccountRepo;
pub use reminders::SqliteReminderRepo;
