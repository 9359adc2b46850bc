use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "F")]
    Female,
    #[serde(rename = "M")]
    Male,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Female => "F",
            Gender::Male => "M",
        }
    }

    /// Parse the stored representation; the empty string means "not given".
    pub fn from_db(value: &str) -> Option<Gender> {
        match value {
            "F" => Some(Gender::Female),
            "M" => Some(Gender::Male),
            _ => None,
        }
    }
}

/// Serialize `Option<Gender>` as `""` / `"F"` / `"M"`, the representation
/// used by entry lists and the database.
pub mod gender_str {
    use super::Gender;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Gender>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(value.map_or("", Gender::as_str))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Gender>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.as_str() {
            "" => Ok(None),
            "F" => Ok(Some(Gender::Female)),
            "M" => Ok(Some(Gender::Male)),
            other => Err(serde::de::Error::custom(format!("invalid gender: {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClubType {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorType {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    #[serde(with = "gender_str")]
    pub gender: Option<Gender>,
    pub year: Option<i32>,
    /// Control card number; empty when the competitor has none registered.
    pub chip: String,
    pub club_id: Option<i64>,
    pub club_name: Option<String>,
}
