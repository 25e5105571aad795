//! Error types for `serotrack-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Malformed titer string rejected at the input boundary. `Unknown` status
  /// is reserved for read-time classification of already-accepted values;
  /// bad input never gets that far.
  #[error(
    "invalid titer {0:?}: expected \"Non-reactive\", \"Reactive\", or \
     \"1:N\" with N a power of two up to 4096"
  )]
  InvalidTiter(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
