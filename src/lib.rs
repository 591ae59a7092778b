//! Typed Rust client for the CDYNE phone notification and SMS web services.
//!
//! Operations are looked up in a fixed registry, their parameters are checked against
//! the exact required set, and the XML answer is decoded into a nested
//! [`DecodedResponse`] with boolean and timestamp fields already converted. The crate
//! is split into a domain layer (registry, parameter rules, value types), a transport
//! layer (request shaping, XML decoding) and a small blocking client layer.
//!
//! ```rust,no_run
//! use cdyne::{CdyneClient, LicenseKey, MessageText, RawPhoneNumber};
//!
//! fn main() -> Result<(), cdyne::CdyneError> {
//!     let client = CdyneClient::new(LicenseKey::new("...")?)?;
//!     let phone = RawPhoneNumber::new("17575449510")?;
//!     let msg = MessageText::new("hello")?;
//!     let resp = client.simple_sms_send(&phone, &msg)?;
//!     println!("{resp:?}");
//!     Ok(())
//! }
//! ```
#![forbid(unsafe_code)]

pub mod client;
pub mod domain;
pub mod transport;

pub use client::{CdyneClient, CdyneClientBuilder, CdyneError};
pub use domain::{
    DecodedResponse, HttpVerb, LicenseKey, MessageId, MessageText, MethodSpec, Operation,
    ParameterMismatch, ParameterSet, PhoneNumber, PostbackUrl, RawPhoneNumber, ReferenceId,
    ServiceFamily, UnknownOperation, ValidationError, Value,
};
pub use transport::{DecodeError, MalformedTimestamp, ServiceEndpoint};
