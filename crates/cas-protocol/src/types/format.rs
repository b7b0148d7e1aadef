//! Response body formats.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Body format of a CAS validation response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseFormat {
    /// CAS 2.0/3.0 `cas:serviceResponse` document.
    #[default]
    Xml,
    /// CAS 3.0 JSON rendering of the XML schema.
    Json,
    /// CAS 1.0 two-line `yes`/`no` answer.
    Text,
}

impl ResponseFormat {
    /// Parses the value of a `format` parameter (case-insensitive).
    #[must_use]
    pub fn from_param(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "XML" => Some(Self::Xml),
            "JSON" => Some(Self::Json),
            "TEXT" => Some(Self::Text),
            _ => None,
        }
    }

    /// Derives the format from a `Content-Type` header value.
    #[must_use]
    pub fn from_content_type(value: &str) -> Option<Self> {
        let mime = value
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if mime.ends_with("json") {
            Some(Self::Json)
        } else if mime.ends_with("xml") {
            Some(Self::Xml)
        } else if mime == "text/plain" {
            Some(Self::Text)
        } else {
            None
        }
    }

    /// Media type asked for in the `Accept` header.
    #[must_use]
    pub const fn media_type(&self) -> &'static str {
        match self {
            Self::Xml => "application/xml",
            Self::Json => "application/json",
            Self::Text => "text/plain",
        }
    }

    /// The value sent in the `format` parameter.
    #[must_use]
    pub const fn as_param(&self) -> &'static str {
        match self {
            Self::Xml => "XML",
            Self::Json => "JSON",
            Self::Text => "TEXT",
        }
    }
}

impl fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_param())
    }
}
