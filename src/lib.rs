pub mod auth;
pub mod cli;
pub mod core;
pub mod environment;
pub mod identity;
pub mod notify;
pub mod session;
pub mod types;

pub use session::{AppState, FetchOutcome, SessionManager, StateSnapshot};
pub use types::{Application, CompanyProfile, Job, SearchFilter, UserProfile};
