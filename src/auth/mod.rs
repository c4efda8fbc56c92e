//! Authentication: the shared session, its file store, the two guard
//! adapters, and the manager that logs users in and out.

pub mod guard;
pub mod manager;
pub mod session;
pub mod token;

pub use guard::{ClientGuard, RouteDecision, RouteGuard};
pub use manager::AuthManager;
pub use session::{Session, SessionHandle, SessionState, SessionStore};
pub use token::TokenClaims;
