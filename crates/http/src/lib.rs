//! Lumifi HTTP client
//!
//! The [`client`] module holds the authenticated request pipeline and the
//! typed endpoint wrappers; [`services`] sequences those calls the way the
//! practice administration screens use them.

pub mod client;
pub mod services;
pub mod types;

pub use client::error::{ClientError, ErrorClassifier, ErrorKind, SessionExpired};
pub use client::session::{FileSessionPersistence, Session, SessionAction, SessionStore};
pub use client::{LumifiClient, LumifiClientBuilder};

pub type Result<T> = std::result::Result<T, ClientError>;
