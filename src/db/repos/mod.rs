mod accounts;
mod reminders;

pub use accounts::{AccountDeletionResult, AccountRepo, CreateAccount, CreateSubscription};
pub use reminders::ReminderRepo;
