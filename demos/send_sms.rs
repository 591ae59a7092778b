use std::io;

use cdyne::{CdyneClient, LicenseKey, MessageText, PhoneNumber, RawPhoneNumber, Value};
use phonenumber::country::Id;
use tracing_subscriber::EnvFilter;

fn env(name: &str) -> Result<String, io::Error> {
    std::env::var(name).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{name} environment variable is required"),
        )
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let license = LicenseKey::new(env("CDYNE_LICENSE_KEY")?)?;
    let phone: RawPhoneNumber = PhoneNumber::parse(Some(Id::US), env("CDYNE_PHONE")?)?.into();
    let text = std::env::var("CDYNE_MESSAGE").unwrap_or_else(|_| "hello from cdyne".to_owned());
    let message = MessageText::new(text)?;

    let client = CdyneClient::new(license)?;
    let response = client.simple_sms_send(&phone, &message)?;

    let message_id = response
        .get_path(&["SMSResponse", "MessageID"])
        .and_then(Value::as_str);
    println!("message id: {message_id:?}");
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
