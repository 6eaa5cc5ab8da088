//! Call sequences built on the client

pub mod account;
pub mod directory;
pub mod login;

pub use account::{AccountSetup, ReferenceData};
pub use directory::{PageRequest, PracticeDirectory, UserPage, UserRow};
pub use login::{LoginFlow, PracticeSelection};
