//! Model descriptor entity and schema validation

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::network_type::NetworkType;
use crate::domain::DomainError;

/// Errors raised while turning loose JSON into a [`ModelDescriptor`]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DescriptorError {
    #[error("Model name cannot be empty")]
    EmptyName,

    #[error("Model name '{0}' must not contain '/' or surrounding whitespace")]
    InvalidName(String),

    #[error("Model network_type is required")]
    MissingNetworkType,

    #[error("Unknown network type '{0}'")]
    UnknownNetworkType(String),

    #[error("inference_information.inference_args must be a mapping of flag to value")]
    InvalidInferenceArgs,
}

/// Contour label table, either `{label_id: name}` or a plain list of names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContourNames {
    Mapping(Map<String, Value>),
    List(Vec<Value>),
}

impl Default for ContourNames {
    fn default() -> Self {
        Self::Mapping(Map::new())
    }
}

impl ContourNames {
    pub fn len(&self) -> usize {
        match self {
            Self::Mapping(map) => map.len(),
            Self::List(list) => list.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Metadata record describing one deployable inference model.
///
/// Always constructed through validation: `alias` is never empty and
/// `inference_args` has already been synthesized from
/// `inference_information.inference_args` when it was not given explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDescriptor")]
pub struct ModelDescriptor {
    pub name: String,
    pub network_type: NetworkType,
    pub enabled: bool,
    pub alias: String,
    pub description: String,
    pub contour_names: ContourNames,
    pub inference_information: Map<String, Value>,
    pub inference_args: String,
    pub create_date: String,
    pub last_modified_date: String,
    pub version: String,
}

/// Wire shape before defaults and normalization are applied
#[derive(Debug, Deserialize)]
struct RawDescriptor {
    name: Option<String>,
    network_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    enabled: Option<bool>,
    alias: Option<String>,
    description: Option<String>,
    contour_names: Option<ContourNames>,
    inference_information: Option<Map<String, Value>>,
    inference_args: Option<String>,
    create_date: Option<String>,
    last_modified_date: Option<String>,
    version: Option<String>,
}

impl TryFrom<RawDescriptor> for ModelDescriptor {
    type Error = DescriptorError;

    fn try_from(raw: RawDescriptor) -> Result<Self, Self::Error> {
        let name = raw.name.unwrap_or_default();
        validate_model_name(&name)?;

        let network_type = match raw.network_type {
            Some(value) => value
                .parse::<NetworkType>()
                .map_err(|_| DescriptorError::UnknownNetworkType(value))?,
            None => return Err(DescriptorError::MissingNetworkType),
        };

        let inference_information = raw.inference_information.unwrap_or_default();

        let mut inference_args = raw.inference_args.unwrap_or_default();
        if inference_args.is_empty() {
            inference_args = synthesize_inference_args(&inference_information)?;
        }

        let mut alias = raw.alias.unwrap_or_default();
        if alias.is_empty() {
            alias = name.clone();
        }

        Ok(Self {
            name,
            network_type,
            enabled: raw.enabled.unwrap_or(false),
            alias,
            description: raw.description.unwrap_or_default(),
            contour_names: raw.contour_names.unwrap_or_default(),
            inference_information,
            inference_args,
            create_date: raw.create_date.unwrap_or_default(),
            last_modified_date: raw.last_modified_date.unwrap_or_default(),
            version: raw.version.unwrap_or_default(),
        })
    }
}

impl ModelDescriptor {
    /// Validate a loose JSON value into a descriptor
    pub fn from_value(value: Value) -> Result<Self, DomainError> {
        serde_json::from_value(value).map_err(|e| DomainError::schema(e.to_string()))
    }

    /// Validate a UTF-8 JSON document into a descriptor
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DomainError> {
        serde_json::from_slice(bytes).map_err(|e| DomainError::schema(e.to_string()))
    }

    /// Canonical JSON encoding used for storage
    pub fn to_bytes(&self) -> Result<Vec<u8>, DomainError> {
        serde_json::to_vec(self)
            .map_err(|e| DomainError::internal(format!("Failed to encode model descriptor: {}", e)))
    }

    /// Object key in the model bucket: `{network_type}/{name}`
    pub fn storage_key(&self) -> String {
        storage_key(&self.name, self.network_type)
    }

    /// Version reported to API consumers.
    ///
    /// `inference_information.version` wins when it is a string.
    pub fn reported_version(&self) -> &str {
        match self.inference_information.get("version") {
            Some(Value::String(version)) => version.as_str(),
            _ => self.version.as_str(),
        }
    }

    /// Apply a partial JSON object on top of this descriptor and revalidate
    pub fn patched(&self, patch: Map<String, Value>) -> Result<Self, DomainError> {
        let mut current = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            Ok(_) => return Err(DomainError::internal("Model descriptor did not encode as an object")),
            Err(e) => return Err(DomainError::internal(e.to_string())),
        };

        for (key, value) in patch {
            current.insert(key, value);
        }

        Self::from_value(Value::Object(current))
    }
}

pub fn storage_key(name: &str, network_type: NetworkType) -> String {
    format!("{}/{}", network_type, name)
}

/// Split a bucket key into `(network_type, name)`.
///
/// Returns `None` unless the key has exactly two non-empty segments.
pub fn split_storage_key(key: &str) -> Option<(&str, &str)> {
    let mut parts = key.split('/');
    let network_type = parts.next().filter(|s| !s.is_empty())?;
    let name = parts.next().filter(|s| !s.is_empty())?;

    if parts.next().is_some() {
        return None;
    }

    Some((network_type, name))
}

pub fn validate_model_name(name: &str) -> Result<(), DescriptorError> {
    if name.is_empty() {
        return Err(DescriptorError::EmptyName);
    }

    if name.contains('/') || name.trim() != name {
        return Err(DescriptorError::InvalidName(name.to_string()));
    }

    Ok(())
}

/// Accepts `true`/`false`, `1`/`0`, and their common string spellings
fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;

    let parsed = match &value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Bool(b)) => Some(*b),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(f) if f == 1.0 => Some(true),
            Some(f) if f == 0.0 => Some(false),
            _ => None,
        },
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "on" | "1" => Some(true),
            "false" | "f" | "no" | "n" | "off" | "0" => Some(false),
            _ => None,
        },
        Some(_) => None,
    };

    match parsed {
        Some(b) => Ok(Some(b)),
        None => Err(de::Error::custom(format!(
            "enabled must be a boolean, got {}",
            value.unwrap_or(Value::Null)
        ))),
    }
}

/// Build the command-line argument string from `inference_information.inference_args`
fn synthesize_inference_args(info: &Map<String, Value>) -> Result<String, DescriptorError> {
    let args = match info.get("inference_args") {
        None | Some(Value::Null) => return Ok(String::new()),
        Some(Value::Object(args)) => args,
        Some(_) => return Err(DescriptorError::InvalidInferenceArgs),
    };

    let rendered: Vec<String> = args
        .iter()
        .map(|(key, value)| {
            let flag = if key.starts_with('-') {
                key.clone()
            } else {
                format!("--{}", key)
            };

            // Non-flag scalars use the spelling the inference scripts already parse
            match value {
                Value::Bool(true) => flag,
                Value::Bool(false) => format!("{} False", flag),
                Value::Null => format!("{} None", flag),
                Value::String(s) => format!("{} {}", flag, s),
                other => format!("{} {}", flag, other),
            }
        })
        .collect();

    Ok(rendered.join(" "))
}
