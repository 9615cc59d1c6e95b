use crate::ConvertError;
use crate::Result;

/// Big-endian encoding used for every persisted counter
pub const fn safe_kv(num: u64) -> [u8; 8] {
    num.to_be_bytes()
}

pub fn safe_vk<K: AsRef<[u8]>>(bytes: K) -> Result<u64> {
    let bytes = bytes.as_ref();
    let array: [u8; 8] = bytes
        .try_into()
        .map_err(|_| ConvertError::InvalidLength(bytes.len()))?;
    Ok(u64::from_be_bytes(array))
}

/// Lossy rendering of a stored value for logs and error messages
pub fn bytes_to_display(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
