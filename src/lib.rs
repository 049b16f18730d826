// ABOUTME: Client-side orchestration for the import scheduler console
// ABOUTME: New-import wizard, live progress reconciliation and the imports table projection

pub mod bulk;
pub mod config;
pub mod connections;
pub mod display;
pub mod error;
pub mod jobs;
pub mod progress;
pub mod remote;
pub mod session;
pub mod wizard;

pub use config::Config;
pub use error::{ConsoleError, Result};
pub use session::CurrentUser;
