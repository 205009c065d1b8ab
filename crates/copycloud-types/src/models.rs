use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How long a room stays readable after creation. Never extended.
pub const ROOM_TTL_SECS: i64 = 5 * 60;

/// Semantic category of a shared item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Text,
    Url,
    Youtube,
    Map,
    Image,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Text => "text",
            ContentType::Url => "url",
            ContentType::Youtube => "youtube",
            ContentType::Map => "map",
            ContentType::Image => "image",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownContentType(pub String);

impl fmt::Display for UnknownContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown content type: {}", self.0)
    }
}

impl std::error::Error for UnknownContentType {}

impl FromStr for ContentType {
    type Err = UnknownContentType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(ContentType::Text),
            "url" => Ok(ContentType::Url),
            "youtube" => Ok(ContentType::Youtube),
            "map" => Ok(ContentType::Map),
            "image" => Ok(ContentType::Image),
            other => Err(UnknownContentType(other.to_string())),
        }
    }
}
