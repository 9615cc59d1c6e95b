use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// The single key/value pair written and read back after startup
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ValidationConfig {
    #[serde(default = "default_key")]
    pub key: String,

    #[serde(default = "default_value")]
    pub value: String,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            key: default_key(),
            value: default_value(),
        }
    }
}

impl ValidationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.key.is_empty() {
            return Err(Error::InvalidConfig("validation key cannot be empty".into()));
        }
        Ok(())
    }
}

fn default_key() -> String {
    "foo".to_string()
}
fn default_value() -> String {
    "bar".to_string()
}
