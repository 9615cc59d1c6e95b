use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Where log lines go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogOutput {
    /// Same as stdout
    Default,
    Stdout,
    Stderr,
    File(PathBuf),
}

impl LogOutput {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim() {
            "" => Err(Error::InvalidConfig("log output cannot be empty".into())),
            "default" => Ok(LogOutput::Default),
            "stdout" => Ok(LogOutput::Stdout),
            "stderr" => Ok(LogOutput::Stderr),
            path => Ok(LogOutput::File(PathBuf::from(path))),
        }
    }
}

impl fmt::Display for LogOutput {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            LogOutput::Default => write!(f, "default"),
            LogOutput::Stdout => write!(f, "stdout"),
            LogOutput::Stderr => write!(f, "stderr"),
            LogOutput::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    /// `stdout`, `stderr`, `default` or a file path
    #[serde(default = "default_outputs")]
    pub outputs: Vec<String>,

    /// Raises the default level to `debug` and makes nodes trace every request
    #[serde(default)]
    pub debug: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            outputs: default_outputs(),
            debug: false,
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.outputs.is_empty() {
            return Err(Error::InvalidConfig("logging.outputs must contain at least one sink".into()));
        }
        self.log_outputs().map(|_| ())
    }

    /// Parsed sink selection, in declaration order
    pub fn log_outputs(&self) -> Result<Vec<LogOutput>> {
        self.outputs.iter().map(|raw| LogOutput::parse(raw)).collect()
    }
}

fn default_outputs() -> Vec<String> {
    vec!["stdout".to_string()]
}
