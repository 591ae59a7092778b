use url::form_urlencoded;

use crate::domain::{HttpVerb, LicenseKey, MethodSpec, ParameterSet, ServiceFamily};

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
pub const DEFAULT_USER_AGENT: &str = concat!("cdyne/", env!("CARGO_PKG_VERSION"));

/// Host and base path of one CDYNE service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoint {
    pub host: String,
    pub base_path: String,
}

impl ServiceEndpoint {
    pub fn new(host: impl Into<String>, base_path: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            base_path: base_path.into(),
        }
    }

    pub fn phone() -> Self {
        Self::new("ws.cdyne.com", "/NotifyWS/PhoneNotify.asmx")
    }

    pub fn sms() -> Self {
        Self::new("sms2.cdyne.com", "/sms.svc")
    }
}

/// Endpoint table keyed by [`ServiceFamily`], plus the URL scheme used for both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub scheme: String,
    pub phone: ServiceEndpoint,
    pub sms: ServiceEndpoint,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            scheme: "https".to_owned(),
            phone: ServiceEndpoint::phone(),
            sms: ServiceEndpoint::sms(),
        }
    }
}

impl Endpoints {
    pub fn resolve(&self, family: ServiceFamily) -> &ServiceEndpoint {
        match family {
            ServiceFamily::Phone => &self.phone,
            ServiceFamily::Sms => &self.sms,
        }
    }
}

/// Fully shaped request, ready for a transport to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub verb: HttpVerb,
    pub scheme: String,
    pub host: String,
    /// Request path; carries the query string for `GET`.
    pub path: String,
    pub body: String,
    pub headers: Vec<(&'static str, String)>,
}

impl HttpRequest {
    pub fn url(&self) -> String {
        format!("{}://{}{}", self.scheme, self.host, self.path)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Form-encode caller parameters (name order) followed by the license key.
pub fn encode_form(params: &ParameterSet, license: &LicenseKey) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    serializer.extend_pairs(params.iter());
    serializer.append_pair(LicenseKey::FIELD, license.as_str());
    serializer.finish()
}

pub fn build_request(
    spec: &MethodSpec,
    params: &ParameterSet,
    license: &LicenseKey,
    endpoints: &Endpoints,
    user_agent: &str,
) -> HttpRequest {
    let endpoint = endpoints.resolve(spec.service_family);
    let path = format!("{}/{}", endpoint.base_path, spec.wire_method);
    let form = encode_form(params, license);

    let (path, body) = match spec.verb {
        HttpVerb::Get => (format!("{path}?{form}"), String::new()),
        HttpVerb::Post => (path, form),
    };

    HttpRequest {
        verb: spec.verb,
        scheme: endpoints.scheme.clone(),
        host: endpoint.host.clone(),
        path,
        body,
        headers: vec![
            ("Content-Type", FORM_CONTENT_TYPE.to_owned()),
            ("User-Agent", user_agent.to_owned()),
        ],
    }
}
