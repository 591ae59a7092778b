use std::io;

use cdyne::{CdyneClient, LicenseKey};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let license = std::env::var("CDYNE_LICENSE_KEY").map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "CDYNE_LICENSE_KEY environment variable is required",
        )
    })?;
    let queue_id = std::env::var("CDYNE_QUEUE_ID")
        .unwrap_or_else(|_| "1234567890".to_owned())
        .parse::<u64>()?;

    let client = CdyneClient::new(LicenseKey::new(license)?)?;
    let response = client.get_queue_id_status(queue_id)?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
