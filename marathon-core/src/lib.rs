//! # Marathon Core
//!
//! Transport contract shared by the marathon admin console: versioned route
//! constants, the `{success, data, error}` response envelope, and the request
//! bodies the console sends.
//!
//! The data types themselves live in `marathon-model`; this crate only
//! describes how they travel over HTTP and the live event stream.
//!
//! ## Examples
//!
//! ```
//! use marathon_core::api::routes::{utils, v1};
//!
//! let path = utils::replace_param(v1::runners::ITEM, "{id}", "65f1c0ffee");
//! assert_eq!(path, "/api/v1/runners/65f1c0ffee");
//! ```

pub mod api;
pub mod console_prelude;

pub use api::types::{ApiResponse, EnvelopeError};
