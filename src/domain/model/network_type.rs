//! Supported inference network architectures

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Network architecture a model descriptor targets.
///
/// The serialized spelling is the wire form and the first segment of the
/// storage key. New architectures are added as new variants here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NetworkType {
    #[serde(rename = "nnUNet")]
    NnUnet,
    #[serde(rename = "nnUNet_v2")]
    NnUnetV2,
    #[serde(rename = "tensorflow")]
    Tensorflow,
    #[serde(rename = "totalsegmentator")]
    TotalSegmentator,
    #[serde(rename = "TotalSegmentatorV2")]
    TotalSegmentatorV2,
    #[serde(rename = "MIST")]
    Mist,
    #[serde(rename = "vista3d")]
    Vista3d,
}

impl NetworkType {
    pub const ALL: [NetworkType; 7] = [
        NetworkType::NnUnet,
        NetworkType::NnUnetV2,
        NetworkType::Tensorflow,
        NetworkType::TotalSegmentator,
        NetworkType::TotalSegmentatorV2,
        NetworkType::Mist,
        NetworkType::Vista3d,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NnUnet => "nnUNet",
            Self::NnUnetV2 => "nnUNet_v2",
            Self::Tensorflow => "tensorflow",
            Self::TotalSegmentator => "totalsegmentator",
            Self::TotalSegmentatorV2 => "TotalSegmentatorV2",
            Self::Mist => "MIST",
            Self::Vista3d => "vista3d",
        }
    }
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|candidate| candidate.as_str() == s)
            .copied()
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|t| t.as_str()).collect();
                DomainError::schema(format!(
                    "Unknown network type '{}'. Expected one of: {}",
                    s,
                    known.join(", ")
                ))
            })
    }
}

// Listing order follows the wire string, not declaration order.
impl Ord for NetworkType {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl PartialOrd for NetworkType {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_through_wire_string() {
        for network_type in NetworkType::ALL {
            let parsed: NetworkType = network_type.as_str().parse().unwrap();
            assert_eq!(parsed, network_type);
        }
    }

    #[test]
    fn test_serde_uses_wire_spelling() {
        let json = serde_json::to_string(&NetworkType::NnUnetV2).unwrap();
        assert_eq!(json, "\"nnUNet_v2\"");

        let parsed: NetworkType = serde_json::from_str("\"TotalSegmentatorV2\"").unwrap();
        assert_eq!(parsed, NetworkType::TotalSegmentatorV2);
    }

    #[test]
    fn test_unknown_network_type_is_schema_error() {
        let err = "nnunet".parse::<NetworkType>().unwrap_err();
        assert!(matches!(err, DomainError::SchemaValidation { .. }));
        assert!(err.to_string().contains("nnUNet_v2"));
    }

    #[test]
    fn test_ordering_is_by_wire_string() {
        let mut types = NetworkType::ALL.to_vec();
        types.sort();

        let names: Vec<&str> = types.iter().map(|t| t.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "MIST",
                "TotalSegmentatorV2",
                "nnUNet",
                "nnUNet_v2",
                "tensorflow",
                "totalsegmentator",
                "vista3d",
            ]
        );
    }
}
