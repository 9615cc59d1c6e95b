use tracing::info;

use super::KvApi;
use crate::bytes_to_display;
use crate::Error;
use crate::Result;
use crate::ValidationConfig;

/// Writes one key through `client`, reads it back and requires the value
/// just written.
///
/// # Errors
/// - `Error::Write` / `Error::Read` from the client
/// - `Error::ValueMismatch` if the read returns anything else
pub async fn verify_read_after_write(
    client: &dyn KvApi,
    validation: &ValidationConfig,
) -> Result<()> {
    let key = validation.key.as_bytes().to_vec();
    let value = validation.value.as_bytes().to_vec();

    client.put(key.clone(), value.clone()).await?;
    let observed = client.get(key).await?;

    match observed {
        Some(observed) if observed == value => {
            info!(key = %validation.key, value = %validation.value, "read-after-write verified");
            Ok(())
        }
        observed => Err(Error::ValueMismatch {
            key: validation.key.clone(),
            expected: validation.value.clone(),
            observed: observed
                .as_deref()
                .map(bytes_to_display)
                .unwrap_or_else(|| "<missing>".to_string()),
        }),
    }
}
