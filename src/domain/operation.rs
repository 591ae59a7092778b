use std::fmt;
use std::str::FromStr;

/// Which CDYNE service hosts an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceFamily {
    /// Phone notification service (`PhoneNotify.asmx`).
    Phone,
    /// SMS service (`sms.svc`).
    Sms,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpVerb {
    Get,
    Post,
}

impl HttpVerb {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// Remote-call description of one operation.
///
/// Instances only exist as `'static` entries of the registry.
#[derive(Debug, PartialEq, Eq)]
pub struct MethodSpec {
    pub service_family: ServiceFamily,
    /// Name appended to the service base path.
    pub wire_method: &'static str,
    pub verb: HttpVerb,
    /// Exact set of caller parameters (the license key is not part of it).
    pub required: &'static [&'static str],
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown operation: {name}")]
pub struct UnknownOperation {
    pub name: String,
}

/// The closed set of operations this client can invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetQueueIdStatus,
    SimpleSmsSend,
    SimpleSmsSendWithPostback,
    CancelMessage,
    GetMessageStatus,
    GetMessageStatusByReferenceId,
    GetUnreadIncomingMessages,
}

static GET_QUEUE_ID_STATUS: MethodSpec = MethodSpec {
    service_family: ServiceFamily::Phone,
    wire_method: "GetQueueIDStatus",
    verb: HttpVerb::Get,
    required: &["QueueID"],
};

static SIMPLE_SMS_SEND: MethodSpec = MethodSpec {
    service_family: ServiceFamily::Sms,
    wire_method: "SimpleSMSsend",
    verb: HttpVerb::Get,
    required: &["PhoneNumber", "Message"],
};

static SIMPLE_SMS_SEND_WITH_POSTBACK: MethodSpec = MethodSpec {
    service_family: ServiceFamily::Sms,
    wire_method: "SimpleSMSsendWithPostback",
    verb: HttpVerb::Get,
    required: &["PhoneNumber", "Message", "StatusPostBackURL"],
};

static CANCEL_MESSAGE: MethodSpec = MethodSpec {
    service_family: ServiceFamily::Sms,
    wire_method: "CancelMessage",
    verb: HttpVerb::Get,
    required: &["MessageID"],
};

static GET_MESSAGE_STATUS: MethodSpec = MethodSpec {
    service_family: ServiceFamily::Sms,
    wire_method: "GetMessageStatus",
    verb: HttpVerb::Get,
    required: &["MessageID"],
};

static GET_MESSAGE_STATUS_BY_REFERENCE_ID: MethodSpec = MethodSpec {
    service_family: ServiceFamily::Sms,
    wire_method: "GetMessageStatusByReferenceID",
    verb: HttpVerb::Get,
    required: &["ReferenceID"],
};

static GET_UNREAD_INCOMING_MESSAGES: MethodSpec = MethodSpec {
    service_family: ServiceFamily::Sms,
    wire_method: "GetUnreadIncomingMessages",
    verb: HttpVerb::Get,
    required: &[],
};

impl Operation {
    pub const ALL: [Operation; 7] = [
        Self::GetQueueIdStatus,
        Self::SimpleSmsSend,
        Self::SimpleSmsSendWithPostback,
        Self::CancelMessage,
        Self::GetMessageStatus,
        Self::GetMessageStatusByReferenceId,
        Self::GetUnreadIncomingMessages,
    ];

    /// Registry entry for this operation.
    pub fn spec(self) -> &'static MethodSpec {
        match self {
            Self::GetQueueIdStatus => &GET_QUEUE_ID_STATUS,
            Self::SimpleSmsSend => &SIMPLE_SMS_SEND,
            Self::SimpleSmsSendWithPostback => &SIMPLE_SMS_SEND_WITH_POSTBACK,
            Self::CancelMessage => &CANCEL_MESSAGE,
            Self::GetMessageStatus => &GET_MESSAGE_STATUS,
            Self::GetMessageStatusByReferenceId => &GET_MESSAGE_STATUS_BY_REFERENCE_ID,
            Self::GetUnreadIncomingMessages => &GET_UNREAD_INCOMING_MESSAGES,
        }
    }

    /// Logical operation name, identical to the wire method name.
    pub fn name(self) -> &'static str {
        self.spec().wire_method
    }

    /// Snake-case alias accepted by [`FromStr`].
    pub fn alias(self) -> &'static str {
        match self {
            Self::GetQueueIdStatus => "get_queue_id_status",
            Self::SimpleSmsSend => "simple_sms_send",
            Self::SimpleSmsSendWithPostback => "simple_sms_send_with_postback",
            Self::CancelMessage => "cancel_message",
            Self::GetMessageStatus => "get_message_status",
            Self::GetMessageStatusByReferenceId => "get_message_status_by_reference_id",
            Self::GetUnreadIncomingMessages => "get_unread_incoming_messages",
        }
    }
}

impl FromStr for Operation {
    type Err = UnknownOperation;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.name() == name || op.alias() == name)
            .ok_or_else(|| UnknownOperation {
                name: name.to_owned(),
            })
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolve an operation name to its registry entry.
pub fn lookup(name: &str) -> Result<&'static MethodSpec, UnknownOperation> {
    name.parse::<Operation>().map(Operation::spec)
}
