pub mod config;
pub mod domain;
pub mod errors;

pub use domain::conversation::{Message, Role, SessionId, Transcript};
pub use errors::{ApplicationError, DomainError, InterfaceError};
