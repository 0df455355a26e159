//! Application bootstrap and graceful shutdown
//!
//! ```text
//! 1. ServerConfig (API_* variables, .env)
//!    ↓
//! 2. Controller registration (routes bound, document fragments merged)
//!    ↓
//! 3. OpenAPI document written to API_SPEC_FILE
//!    ↓
//! 4. Server start
//!    ↓
//! [Running...]
//!    ↓
//! 5. Shutdown signal (SIGTERM/SIGINT)
//! ```

#[allow(clippy::module_inception)]
mod application;
mod shutdown;

pub use application::{Application, ApplicationBuilder};
pub use shutdown::shutdown_signal;
