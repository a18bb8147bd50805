//! Common types, protocol definitions, and errors shared across the attribute
//! agent crates.

pub mod error;
pub mod profile;
pub mod protocol;

pub use error::{SdkErrorCode, ServiceError};
pub use profile::{IonicAssertion, SecureEnrollmentProfile};
pub use protocol::{AttributeSigningResponse, ErrorResponse};
