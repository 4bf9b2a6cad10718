//! Domain types shared across the persistence, email, and cleanup layers.

pub mod account;
pub mod reminder;
pub mod subscription;

pub use account::{Account, DeletionCandidate, ReminderCandidate};
pub use reminder::DeletionReminder;
pub use subscription::{Subscription, SubscriptionStatus};
