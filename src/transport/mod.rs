//! Transport layer: request shaping and XML response decoding (no I/O).

mod coercion;
mod request;
mod xml;

pub use coercion::{FieldKind, MalformedTimestamp, TIMESTAMP_FORMAT, coerce, field_kind};
pub use request::{
    DEFAULT_USER_AGENT, Endpoints, FORM_CONTENT_TYPE, HttpRequest, ServiceEndpoint,
    build_request, encode_form,
};
pub use xml::{DecodeError, decode_xml_bytes, decode_xml_response};
