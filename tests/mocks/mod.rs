//! Mock implementations for testing without a database server.
//!
//! Provides an in-memory host that can stand in for a hardened server, a
//! misconfigured one, or a machine where the server is not installed.


pub use platform::*;
