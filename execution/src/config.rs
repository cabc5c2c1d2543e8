use serde::{Deserialize, Serialize};
use thiserror::Error;
use wallet_types::MAX_INSTANCE_NAME_LENGTH;

/// Identity of one deployed wallet service instance.
///
/// The name scopes every storage key the instance writes, so two instances on
/// the same host never observe each other's wallets.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceSpec {
    pub name: String,
    pub id: u32,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not parse instance config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
    #[error("{field} must be at most {max} bytes (got {len})")]
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
    #[error("{field} contains an invalid character {found:?}: {value}")]
    InvalidCharacter {
        field: &'static str,
        value: String,
        found: char,
    },
}

fn validate_name(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Empty { field });
    }
    if value.len() > MAX_INSTANCE_NAME_LENGTH {
        return Err(ConfigError::TooLong {
            field,
            len: value.len(),
            max: MAX_INSTANCE_NAME_LENGTH,
        });
    }
    if let Some(found) = value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
    {
        return Err(ConfigError::InvalidCharacter {
            field,
            value: value.to_string(),
            found,
        });
    }
    Ok(())
}

impl InstanceSpec {
    pub fn new(name: impl Into<String>, id: u32) -> Result<Self, ConfigError> {
        let spec = Self {
            name: name.into(),
            id,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Parses and validates an instance description such as:
    ///
    /// ```yaml
    /// name: cryptocurrency
    /// id: 42
    /// ```
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let spec: Self = serde_yaml::from_str(contents)?;
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_name("name", &self.name)
    }
}
