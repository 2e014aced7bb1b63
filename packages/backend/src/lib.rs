//! # pylearn-backend
//!
//! Application layer around [`pylearn_algo`]: learner records, code
//! execution, grading, practice sessions and the tutor.
//!
//! ```text
//! store ──► services::snapshot ──► pylearn_algo (score, policy)
//!                 │                       │
//!                 ▼                       ▼
//!        services::practice ◄── sandbox   tutor
//! ```

pub mod config;
pub mod logging;
pub mod sandbox;
pub mod services;
pub mod state;
pub mod store;
pub mod tutor;

pub use config::Config;
pub use state::AppState;
