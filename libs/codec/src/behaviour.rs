//! Policy for record fields present on the wire but absent from the target
//! record definition

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Chosen per deserialise call; compiled routines are shared across both
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnexpectedFieldBehaviour {
    /// Fail with `DeserialiseErrorKind::UnexpectedField`
    #[default]
    Throw,
    /// Skip the field's value and keep reading
    Ignore,
}

impl UnexpectedFieldBehaviour {
    pub fn as_str(self) -> &'static str {
        match self {
            UnexpectedFieldBehaviour::Throw => "throw",
            UnexpectedFieldBehaviour::Ignore => "ignore",
        }
    }
}

impl fmt::Display for UnexpectedFieldBehaviour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnexpectedFieldBehaviour {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "throw" => Ok(UnexpectedFieldBehaviour::Throw),
            "ignore" => Ok(UnexpectedFieldBehaviour::Ignore),
            other => Err(format!(
                "unknown unexpected-field behaviour \"{other}\", expected throw or ignore"
            )),
        }
    }
}
