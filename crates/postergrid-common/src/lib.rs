//! Postergrid-Common: shared types and error handling.
//!
//! - **Core Types**: catalog kinds, device categories and artifact formats
//! - **Error Handling**: the common [`Error`] enum and [`Result`] alias
//!
//! # Examples
//!
//! ```
//! use postergrid_common::{ArtifactFormat, Error, Result};
//!
//! assert_eq!(ArtifactFormat::Webp.extension(), "webp");
//!
//! fn example() -> Result<()> {
//!     Err(Error::config("missing API key"))
//! }
//! assert!(example().is_err());
//! ```

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
