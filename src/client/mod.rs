//! Client layer: dispatches operations and maps transport ↔ domain.

use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::domain::{
    DecodedResponse, HttpVerb, LicenseKey, MessageId, MessageText, MethodSpec, Operation,
    ParameterMismatch, ParameterSet, PostbackUrl, RawPhoneNumber, ReferenceId, UnknownOperation,
    ValidationError,
};
use crate::transport::{
    DEFAULT_USER_AGENT, DecodeError, Endpoints, HttpRequest, MalformedTimestamp, ServiceEndpoint,
    build_request, decode_xml_bytes,
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const RESPONSE_STATUS_OK: u16 = 200;

#[derive(Debug, Clone)]
struct HttpResponse {
    status: u16,
    body: Vec<u8>,
}

trait HttpTransport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, CdyneError>;
}

#[derive(Debug, Clone)]
struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport for ReqwestTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, CdyneError> {
        let method = match request.verb {
            HttpVerb::Get => reqwest::Method::GET,
            HttpVerb::Post => reqwest::Method::POST,
        };

        let mut builder = self.client.request(method, request.url());
        for (name, value) in &request.headers {
            builder = builder.header(*name, value.as_str());
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let response = builder.send().map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        // Raw bytes; charset handling is left to the decoder, which requires UTF-8.
        let body = response.bytes().map_err(map_reqwest_error)?.to_vec();
        Ok(HttpResponse { status, body })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> CdyneError {
    if err.is_timeout() {
        CdyneError::Timeout
    } else {
        CdyneError::Transport(Box::new(err))
    }
}

#[derive(Debug, thiserror::Error)]
/// Errors returned by [`CdyneClient`].
///
/// None of them are retried by the client.
pub enum CdyneError {
    /// The operation name is not in the registry.
    #[error(transparent)]
    UnknownOperation(#[from] UnknownOperation),

    /// Supplied parameter names differ from the operation's required set.
    /// Raised before any network activity.
    #[error(transparent)]
    ParameterMismatch(#[from] ParameterMismatch),

    /// The service answered with a status other than 200. `body` is the unmodified payload.
    #[error("remote call failed with HTTP status {status}")]
    RemoteCallFailed { status: u16, body: Vec<u8> },

    /// Response body is not valid UTF-8 or not a well-formed XML document.
    #[error("malformed response: {0}")]
    MalformedResponse(#[source] DecodeError),

    /// A timestamp field did not match `YYYY-MM-DDTHH:MM:SS`.
    #[error(transparent)]
    MalformedTimestamp(MalformedTimestamp),

    /// No response within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// HTTP client / transport failure (DNS, TLS, connection refused, etc).
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn StdError + Send + Sync>),

    /// One of the domain constructors rejected an invalid value.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl From<DecodeError> for CdyneError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::Timestamp(err) => Self::MalformedTimestamp(err),
            other => Self::MalformedResponse(other),
        }
    }
}

#[derive(Debug, Clone)]
/// Builder for [`CdyneClient`].
///
/// Use this when you need to customize endpoints, timeout, or user-agent.
pub struct CdyneClientBuilder {
    license: LicenseKey,
    endpoints: Endpoints,
    timeout: Duration,
    user_agent: String,
}

impl CdyneClientBuilder {
    /// Create a builder with the default endpoints, a 10 second timeout and the crate user-agent.
    pub fn new(license: LicenseKey) -> Self {
        Self {
            license,
            endpoints: Endpoints::default(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }

    /// Override the phone notification endpoint (`ws.cdyne.com/NotifyWS/PhoneNotify.asmx`).
    pub fn phone_endpoint(mut self, endpoint: ServiceEndpoint) -> Self {
        self.endpoints.phone = endpoint;
        self
    }

    /// Override the SMS endpoint (`sms2.cdyne.com/sms.svc`).
    pub fn sms_endpoint(mut self, endpoint: ServiceEndpoint) -> Self {
        self.endpoints.sms = endpoint;
        self
    }

    /// URL scheme for both endpoints (`https` by default).
    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.endpoints.scheme = scheme.into();
        self
    }

    /// Set the timeout applied to each request as a whole.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the HTTP `User-Agent` header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Build a [`CdyneClient`].
    pub fn build(self) -> Result<CdyneClient, CdyneError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|err| CdyneError::Transport(Box::new(err)))?;

        Ok(CdyneClient {
            license: self.license,
            endpoints: self.endpoints,
            user_agent: self.user_agent,
            http: Arc::new(ReqwestTransport { client }),
        })
    }
}

#[derive(Clone)]
/// Blocking CDYNE client.
///
/// Every call is self-contained: the client only holds immutable configuration, so
/// a single instance can be shared between threads.
///
/// ```rust,no_run
/// use cdyne::{CdyneClient, LicenseKey, ParameterSet};
///
/// # fn main() -> Result<(), cdyne::CdyneError> {
/// let client = CdyneClient::new(LicenseKey::new("...")?)?;
/// let status = client.invoke(
///     "GetQueueIDStatus",
///     ParameterSet::new().with("QueueID", 1234567890_u64),
/// )?;
/// println!("{status:?}");
/// # Ok(())
/// # }
/// ```
pub struct CdyneClient {
    license: LicenseKey,
    endpoints: Endpoints,
    user_agent: String,
    http: Arc<dyn HttpTransport>,
}

impl CdyneClient {
    /// Create a client with the default settings.
    ///
    /// For more customization, use [`CdyneClient::builder`].
    pub fn new(license: LicenseKey) -> Result<Self, CdyneError> {
        CdyneClientBuilder::new(license).build()
    }

    /// Start building a client with custom settings.
    pub fn builder(license: LicenseKey) -> CdyneClientBuilder {
        CdyneClientBuilder::new(license)
    }

    /// Invoke an operation by name (`GetQueueIDStatus`, or the alias `get_queue_id_status`).
    ///
    /// Errors:
    /// - [`CdyneError::UnknownOperation`] for names outside the registry,
    /// - [`CdyneError::ParameterMismatch`] unless `params` holds exactly the required names,
    /// - [`CdyneError::RemoteCallFailed`] for non-200 responses,
    /// - [`CdyneError::MalformedResponse`] / [`CdyneError::MalformedTimestamp`] for bodies
    ///   that cannot be decoded.
    pub fn invoke(
        &self,
        operation: &str,
        params: ParameterSet,
    ) -> Result<DecodedResponse, CdyneError> {
        let spec = crate::domain::lookup(operation)?;
        self.dispatch(spec, params)
    }

    /// Same as [`CdyneClient::invoke`] for an already resolved [`Operation`].
    pub fn invoke_operation(
        &self,
        operation: Operation,
        params: ParameterSet,
    ) -> Result<DecodedResponse, CdyneError> {
        self.dispatch(operation.spec(), params)
    }

    /// Status of a phone notification queue entry.
    pub fn get_queue_id_status(&self, queue_id: u64) -> Result<DecodedResponse, CdyneError> {
        let params = ParameterSet::new().with("QueueID", queue_id);
        self.invoke_operation(Operation::GetQueueIdStatus, params)
    }

    /// Send an SMS message.
    pub fn simple_sms_send(
        &self,
        phone: &RawPhoneNumber,
        message: &MessageText,
    ) -> Result<DecodedResponse, CdyneError> {
        let params = ParameterSet::new()
            .with(RawPhoneNumber::FIELD, phone.raw())
            .with(MessageText::FIELD, message.as_str());
        self.invoke_operation(Operation::SimpleSmsSend, params)
    }

    /// Send an SMS message and have delivery updates posted to `postback`.
    pub fn simple_sms_send_with_postback(
        &self,
        phone: &RawPhoneNumber,
        message: &MessageText,
        postback: &PostbackUrl,
    ) -> Result<DecodedResponse, CdyneError> {
        let params = ParameterSet::new()
            .with(RawPhoneNumber::FIELD, phone.raw())
            .with(MessageText::FIELD, message.as_str())
            .with(PostbackUrl::FIELD, postback.as_str());
        self.invoke_operation(Operation::SimpleSmsSendWithPostback, params)
    }

    pub fn cancel_message(&self, message_id: &MessageId) -> Result<DecodedResponse, CdyneError> {
        let params = ParameterSet::new().with(MessageId::FIELD, message_id.as_str());
        self.invoke_operation(Operation::CancelMessage, params)
    }

    pub fn get_message_status(
        &self,
        message_id: &MessageId,
    ) -> Result<DecodedResponse, CdyneError> {
        let params = ParameterSet::new().with(MessageId::FIELD, message_id.as_str());
        self.invoke_operation(Operation::GetMessageStatus, params)
    }

    pub fn get_message_status_by_reference_id(
        &self,
        reference_id: &ReferenceId,
    ) -> Result<DecodedResponse, CdyneError> {
        let params = ParameterSet::new().with(ReferenceId::FIELD, reference_id.as_str());
        self.invoke_operation(Operation::GetMessageStatusByReferenceId, params)
    }

    /// Incoming messages not fetched yet.
    pub fn get_unread_incoming_messages(&self) -> Result<DecodedResponse, CdyneError> {
        self.invoke_operation(Operation::GetUnreadIncomingMessages, ParameterSet::new())
    }

    fn dispatch(
        &self,
        spec: &'static MethodSpec,
        params: ParameterSet,
    ) -> Result<DecodedResponse, CdyneError> {
        crate::domain::validate(&params, spec.required)?;

        let request = build_request(
            spec,
            &params,
            &self.license,
            &self.endpoints,
            &self.user_agent,
        );
        // The query string carries the license key, so only the host is logged.
        debug!(
            operation = spec.wire_method,
            verb = spec.verb.as_str(),
            host = %request.host,
            "sending CDYNE request"
        );

        let response = self.http.execute(&request)?;
        debug!(
            operation = spec.wire_method,
            status = response.status,
            bytes = response.body.len(),
            "received CDYNE response"
        );

        if response.status != RESPONSE_STATUS_OK {
            warn!(
                operation = spec.wire_method,
                status = response.status,
                "CDYNE call failed"
            );
            return Err(CdyneError::RemoteCallFailed {
                status: response.status,
                body: response.body,
            });
        }

        Ok(decode_xml_bytes(&response.body)?)
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::sync::Mutex;
    use std::thread;

    use crate::domain::Value;

    use super::*;

    const QUEUE_STATUS_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<QueueIDStatus xmlns="http://ws.cdyne.com/NotifyWS/">
  <QueueID>1234567890</QueueID>
  <Queued>false</Queued>
  <Sent>true</Sent>
  <SentDateTime>2011-09-28T14:05:33</SentDateTime>
  <Details></Details>
</QueueIDStatus>"#;

    const SMS_XML: &str = r#"<SMSResponse xmlns="http://sms2.cdyne.com">
  <Cancelled>true</Cancelled>
  <MessageID>4f0c7b1e-1111-2222-3333-444455556666</MessageID>
</SMSResponse>"#;

    #[derive(Debug, Clone)]
    struct FakeTransport {
        state: Arc<Mutex<FakeTransportState>>,
    }

    #[derive(Debug)]
    struct FakeTransportState {
        last_request: Option<HttpRequest>,
        calls: usize,
        response_status: u16,
        response_body: Vec<u8>,
        timeout: bool,
    }

    impl FakeTransport {
        fn new(response_status: u16, response_body: impl Into<Vec<u8>>) -> Self {
            Self {
                state: Arc::new(Mutex::new(FakeTransportState {
                    last_request: None,
                    calls: 0,
                    response_status,
                    response_body: response_body.into(),
                    timeout: false,
                })),
            }
        }

        fn timing_out() -> Self {
            let transport = Self::new(200, "");
            transport.state.lock().unwrap().timeout = true;
            transport
        }

        fn last_request(&self) -> Option<HttpRequest> {
            self.state.lock().unwrap().last_request.clone()
        }

        fn calls(&self) -> usize {
            self.state.lock().unwrap().calls
        }
    }

    impl HttpTransport for FakeTransport {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, CdyneError> {
            let mut state = self.state.lock().unwrap();
            state.last_request = Some(request.clone());
            state.calls += 1;
            if state.timeout {
                return Err(CdyneError::Timeout);
            }
            Ok(HttpResponse {
                status: state.response_status,
                body: state.response_body.clone(),
            })
        }
    }

    fn make_client(transport: FakeTransport) -> CdyneClient {
        CdyneClient {
            license: LicenseKey::new("test_key").unwrap(),
            endpoints: Endpoints::default(),
            user_agent: "cdyne-tests".to_owned(),
            http: Arc::new(transport),
        }
    }

    #[test]
    fn get_queue_id_status_sends_get_and_decodes_typed_fields() {
        let transport = FakeTransport::new(200, QUEUE_STATUS_XML);
        let client = make_client(transport.clone());

        let response = client
            .invoke(
                "GetQueueIDStatus",
                ParameterSet::new().with("QueueID", 1234567890_u64),
            )
            .unwrap();

        let request = transport.last_request().unwrap();
        assert_eq!(request.verb, HttpVerb::Get);
        assert_eq!(
            request.url(),
            "https://ws.cdyne.com/NotifyWS/PhoneNotify.asmx/GetQueueIDStatus?QueueID=1234567890&LicenseKey=test_key"
        );
        assert_eq!(request.header("User-Agent"), Some("cdyne-tests"));

        assert_eq!(
            response.get_path(&["QueueIDStatus", "QueueID"]),
            Some(&Value::Text("1234567890".to_owned()))
        );
        assert_eq!(
            response.get_path(&["QueueIDStatus", "Sent"]),
            Some(&Value::Bool(true))
        );
        assert_eq!(
            response.get_path(&["QueueIDStatus", "Queued"]),
            Some(&Value::Bool(false))
        );
        assert!(
            response
                .get_path(&["QueueIDStatus", "SentDateTime"])
                .and_then(Value::as_timestamp)
                .is_some()
        );
        assert_eq!(
            response.get_path(&["QueueIDStatus", "Details"]),
            Some(&Value::Map(DecodedResponse::new()))
        );
    }

    #[test]
    fn invoke_accepts_snake_case_alias() {
        let transport = FakeTransport::new(200, SMS_XML);
        let client = make_client(transport.clone());

        client
            .invoke(
                "cancel_message",
                ParameterSet::new().with("MessageID", "m-1"),
            )
            .unwrap();

        let request = transport.last_request().unwrap();
        assert_eq!(request.host, "sms2.cdyne.com");
        assert_eq!(
            request.path,
            "/sms.svc/CancelMessage?MessageID=m-1&LicenseKey=test_key"
        );
    }

    #[test]
    fn missing_parameter_fails_before_any_request() {
        let transport = FakeTransport::new(200, SMS_XML);
        let client = make_client(transport.clone());

        let err = client
            .invoke("SimpleSMSsend", ParameterSet::new().with("PhoneNumber", "555"))
            .unwrap_err();

        match err {
            CdyneError::ParameterMismatch(mismatch) => {
                assert_eq!(mismatch.required, vec!["PhoneNumber", "Message"]);
                assert_eq!(mismatch.missing, vec!["Message".to_owned()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(transport.calls(), 0);
    }

    #[test]
    fn extra_parameter_fails_before_any_request() {
        let transport = FakeTransport::new(200, SMS_XML);
        let client = make_client(transport.clone());

        let params = ParameterSet::new()
            .with("MessageID", "m-1")
            .with("LicenseKey", "other");
        let err = client.invoke("GetMessageStatus", params).unwrap_err();
        assert!(matches!(err, CdyneError::ParameterMismatch(_)));
        assert_eq!(transport.calls(), 0);
    }

    #[test]
    fn unknown_operation_is_rejected() {
        let transport = FakeTransport::new(200, SMS_XML);
        let client = make_client(transport.clone());

        let err = client.invoke("SendFax", ParameterSet::new()).unwrap_err();
        match err {
            CdyneError::UnknownOperation(err) => assert_eq!(err.name, "SendFax"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(transport.calls(), 0);
    }

    #[test]
    fn non_ok_status_maps_to_remote_call_failed_with_raw_body() {
        let transport = FakeTransport::new(500, "<Error>License invalid</Error>");
        let client = make_client(transport);

        let err = client.get_unread_incoming_messages().unwrap_err();
        match err {
            CdyneError::RemoteCallFailed { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, b"<Error>License invalid</Error>".to_vec());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn other_success_statuses_are_not_accepted() {
        let transport = FakeTransport::new(204, "");
        let client = make_client(transport);

        let err = client.get_unread_incoming_messages().unwrap_err();
        assert!(matches!(
            err,
            CdyneError::RemoteCallFailed { status: 204, .. }
        ));
    }

    #[test]
    fn invalid_xml_maps_to_malformed_response() {
        let transport = FakeTransport::new(200, "<SMSResponse><Sent>true</SMSResponse>");
        let client = make_client(transport);

        let err = client.get_unread_incoming_messages().unwrap_err();
        assert!(matches!(err, CdyneError::MalformedResponse(_)));
    }

    #[test]
    fn bad_timestamp_maps_to_malformed_timestamp() {
        let transport = FakeTransport::new(
            200,
            "<SMSResponse><SentDateTime>not a date</SentDateTime></SMSResponse>",
        );
        let client = make_client(transport);

        let err = client
            .get_message_status(&MessageId::new("m-1").unwrap())
            .unwrap_err();
        match err {
            CdyneError::MalformedTimestamp(err) => assert_eq!(err.value, "not a date"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn transport_timeout_is_surfaced() {
        let client = make_client(FakeTransport::timing_out());
        let err = client.get_queue_id_status(1).unwrap_err();
        assert!(matches!(err, CdyneError::Timeout));
    }

    #[test]
    fn typed_sms_methods_fill_required_parameters() {
        let transport = FakeTransport::new(200, SMS_XML);
        let client = make_client(transport.clone());

        let phone = RawPhoneNumber::new("17575449510").unwrap();
        let message = MessageText::new("Hello world").unwrap();
        let postback = PostbackUrl::new("https://example.com/status?id=1").unwrap();

        let response = client
            .simple_sms_send_with_postback(&phone, &message, &postback)
            .unwrap();
        assert_eq!(
            response.get_path(&["SMSResponse", "Cancelled"]),
            Some(&Value::Bool(true))
        );

        let request = transport.last_request().unwrap();
        assert_eq!(
            request.path,
            "/sms.svc/SimpleSMSsendWithPostback?Message=Hello+world&PhoneNumber=17575449510&StatusPostBackURL=https%3A%2F%2Fexample.com%2Fstatus%3Fid%3D1&LicenseKey=test_key"
        );

        client.simple_sms_send(&phone, &message).unwrap();
        let request = transport.last_request().unwrap();
        assert!(request.path.starts_with("/sms.svc/SimpleSMSsend?"));

        client
            .get_message_status_by_reference_id(&ReferenceId::new("order-42").unwrap())
            .unwrap();
        let request = transport.last_request().unwrap();
        assert_eq!(
            request.path,
            "/sms.svc/GetMessageStatusByReferenceID?ReferenceID=order-42&LicenseKey=test_key"
        );

        client
            .cancel_message(&MessageId::new("m-9").unwrap())
            .unwrap();
        let request = transport.last_request().unwrap();
        assert_eq!(
            request.path,
            "/sms.svc/CancelMessage?MessageID=m-9&LicenseKey=test_key"
        );
        assert_eq!(transport.calls(), 4);
    }

    #[test]
    fn client_can_be_shared_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CdyneClient>();

        let transport = FakeTransport::new(200, SMS_XML);
        let client = make_client(transport.clone());

        std::thread::scope(|scope| {
            for idx in 0..4 {
                let client = &client;
                scope.spawn(move || {
                    let id = MessageId::new(format!("m-{idx}")).unwrap();
                    client.get_message_status(&id).unwrap();
                });
            }
        });
        assert_eq!(transport.calls(), 4);
    }

    #[test]
    fn builder_overrides_are_applied() {
        let client = CdyneClient::builder(LicenseKey::new("key").unwrap())
            .scheme("http")
            .phone_endpoint(ServiceEndpoint::new("localhost:8080", "/phone"))
            .sms_endpoint(ServiceEndpoint::new("localhost:8081", "/sms"))
            .timeout(Duration::from_secs(3))
            .user_agent("custom-agent")
            .build()
            .unwrap();

        assert_eq!(client.endpoints.scheme, "http");
        assert_eq!(client.endpoints.phone.host, "localhost:8080");
        assert_eq!(client.endpoints.sms.base_path, "/sms");
        assert_eq!(client.user_agent, "custom-agent");

        let client = CdyneClient::new(LicenseKey::new("key").unwrap()).unwrap();
        assert_eq!(client.endpoints, Endpoints::default());
        assert_eq!(client.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn non_utf8_body_maps_to_malformed_response() {
        let transport = FakeTransport::new(200, b"<R><Message>caf\xe9</Message></R>".to_vec());
        let client = make_client(transport);

        let err = client.get_queue_id_status(1).unwrap_err();
        assert!(matches!(
            err,
            CdyneError::MalformedResponse(DecodeError::Utf8(_))
        ));
    }

    #[test]
    fn remote_call_failed_keeps_body_bytes_unchanged() {
        let body = b"<Error>caf\xe9</Error>".to_vec();
        let transport = FakeTransport::new(502, body.clone());
        let client = make_client(transport);

        match client.get_queue_id_status(1).unwrap_err() {
            CdyneError::RemoteCallFailed { status, body: got } => {
                assert_eq!(status, 502);
                assert_eq!(got, body);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    fn http_reply(status_line: &str, content_type: &str, body: &[u8]) -> Vec<u8> {
        let mut reply = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        )
        .into_bytes();
        reply.extend_from_slice(body);
        reply
    }

    fn read_request_head(stream: &mut TcpStream) -> String {
        let mut head = Vec::new();
        let mut buf = [0_u8; 1024];
        while !head.windows(4).any(|window| window == b"\r\n\r\n") {
            let read = stream.read(&mut buf).unwrap();
            if read == 0 {
                break;
            }
            head.extend_from_slice(&buf[..read]);
        }
        String::from_utf8_lossy(&head).into_owned()
    }

    /// Accept one connection on a local port, write `reply` after the request head and
    /// keep the socket open for `hold`. The handle yields the request head.
    fn serve_once(reply: Vec<u8>, hold: Duration) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let head = read_request_head(&mut stream);
            stream.write_all(&reply).unwrap();
            stream.flush().unwrap();
            thread::sleep(hold);
            head
        });
        (addr, handle)
    }

    fn local_client(addr: &str, timeout: Duration) -> CdyneClient {
        CdyneClient::builder(LicenseKey::new("k").unwrap())
            .scheme("http")
            .phone_endpoint(ServiceEndpoint::new(addr, "/p"))
            .sms_endpoint(ServiceEndpoint::new(addr, "/s"))
            .timeout(timeout)
            .build()
            .unwrap()
    }

    #[test]
    fn reqwest_transport_round_trip() {
        let reply = http_reply(
            "200 OK",
            "text/xml; charset=utf-8",
            b"<QueueIDStatus><Sent>true</Sent></QueueIDStatus>",
        );
        let (addr, server) = serve_once(reply, Duration::ZERO);
        let client = local_client(&addr, Duration::from_secs(5));

        let response = client.get_queue_id_status(7).unwrap();
        assert_eq!(
            response.get_path(&["QueueIDStatus", "Sent"]),
            Some(&Value::Bool(true))
        );

        let head = server.join().unwrap().to_ascii_lowercase();
        assert!(
            head.starts_with("get /p/getqueueidstatus?queueid=7&licensekey=k http/1.1\r\n"),
            "{head}"
        );
        assert!(
            head.contains("content-type: application/x-www-form-urlencoded\r\n"),
            "{head}"
        );
        assert!(head.contains("user-agent: cdyne/"), "{head}");
    }

    #[test]
    fn reqwest_transport_rejects_non_utf8_body() {
        let reply = http_reply(
            "200 OK",
            "text/xml; charset=iso-8859-1",
            b"<R><Message>caf\xe9</Message></R>",
        );
        let (addr, _server) = serve_once(reply, Duration::ZERO);
        let client = local_client(&addr, Duration::from_secs(5));

        let err = client.get_queue_id_status(1).unwrap_err();
        assert!(
            matches!(err, CdyneError::MalformedResponse(DecodeError::Utf8(_))),
            "{err:?}"
        );
    }

    #[test]
    fn reqwest_timeout_before_headers_maps_to_timeout() {
        let (addr, _server) = serve_once(Vec::new(), Duration::from_secs(2));
        let client = local_client(&addr, Duration::from_millis(300));

        let err = client.get_queue_id_status(1).unwrap_err();
        assert!(matches!(err, CdyneError::Timeout), "{err:?}");
    }

    #[test]
    fn reqwest_timeout_during_body_maps_to_timeout() {
        let reply = b"HTTP/1.1 200 OK\r\nContent-Type: text/xml\r\nContent-Length: 100\r\n\r\n<QueueIDStatus>"
            .to_vec();
        let (addr, _server) = serve_once(reply, Duration::from_secs(2));
        let client = local_client(&addr, Duration::from_millis(300));

        let err = client.get_queue_id_status(1).unwrap_err();
        assert!(matches!(err, CdyneError::Timeout), "{err:?}");
    }
}
