//! Domain layer: operation registry, parameter rules, value types (no I/O).

mod operation;
mod params;
mod response;
mod validation;
mod value;

pub use operation::{HttpVerb, MethodSpec, Operation, ServiceFamily, UnknownOperation, lookup};
pub use params::{ParameterMismatch, ParameterSet, validate};
pub use response::{DecodedResponse, Value};
pub use validation::ValidationError;
pub use value::{
    LicenseKey, MessageId, MessageText, PhoneNumber, PostbackUrl, RawPhoneNumber, ReferenceId,
};
