//! User accounts and e-mail addresses.

mod models;
pub mod store;

pub use models::{Email, NewUser, Timestamp, User, PASSWORD_UNUSABLE};
