//! Runtime abstraction for system operations.
//!
//! The pipeline never touches the process environment, the file system or the
//! wall clock directly; it goes through [`Runtime`] so tests can substitute a
//! mock.
//!
//! # Structure
//!
//! - `env` - Environment variables and the clock
//! - `fs` - File system reads and writes

mod env;
mod fs;

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::env as std_env;
use std::path::Path;

#[cfg_attr(test, mockall::automock)]
pub trait Runtime: Send + Sync {
    // Environment
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError>;

    // File System
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Write `contents` to `path`, replacing any existing file.
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;

    // Clock
    fn now(&self) -> DateTime<Utc>;
}

pub struct RealRuntime;

impl Runtime for RealRuntime {
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError> {
        self.env_var_impl(key)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.read_to_string_impl(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.write_impl(path, contents)
    }

    fn now(&self) -> DateTime<Utc> {
        self.now_impl()
    }
}
