// Repositories module - session storage layer

pub mod session_repository;

pub use session_repository::{InMemorySessionRepository, SessionHandle, SessionRepository};
