//! API kind and payload format

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Kind of API under test, as written in config files (`REST` / `SOAP`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ApiKind {
    Rest,
    Soap,
}

/// Structured format of request and response bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadFormat {
    Json,
    Xml,
}

#[derive(Debug, Error)]
#[error("unknown API kind '{0}', expected REST or SOAP")]
pub struct ApiKindError(pub String);

impl ApiKind {
    /// Payload format carried by this kind of API
    pub fn format(self) -> PayloadFormat {
        match self {
            ApiKind::Rest => PayloadFormat::Json,
            ApiKind::Soap => PayloadFormat::Xml,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ApiKind::Rest => "REST",
            ApiKind::Soap => "SOAP",
        }
    }
}

impl FromStr for ApiKind {
    type Err = ApiKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("REST") {
            Ok(ApiKind::Rest)
        } else if s.eq_ignore_ascii_case("SOAP") {
            Ok(ApiKind::Soap)
        } else {
            Err(ApiKindError(s.to_string()))
        }
    }
}

impl fmt::Display for ApiKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PayloadFormat {
    /// File extension used for stored payloads
    pub fn extension(self) -> &'static str {
        match self {
            PayloadFormat::Json => "json",
            PayloadFormat::Xml => "xml",
        }
    }

    /// Content type recorded alongside captured responses
    pub fn content_type(self) -> &'static str {
        match self {
            PayloadFormat::Json => "application/json",
            PayloadFormat::Xml => "text/xml;charset=UTF-8",
        }
    }
}

impl fmt::Display for PayloadFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadFormat::Json => write!(f, "JSON"),
            PayloadFormat::Xml => write!(f, "XML"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_kind_parse_is_case_insensitive() {
        assert_eq!("rest".parse::<ApiKind>().unwrap(), ApiKind::Rest);
        assert_eq!("Soap".parse::<ApiKind>().unwrap(), ApiKind::Soap);
        assert!("graphql".parse::<ApiKind>().is_err());
    }

    #[test]
    fn test_api_kind_format() {
        assert_eq!(ApiKind::Rest.format(), PayloadFormat::Json);
        assert_eq!(ApiKind::Soap.format().extension(), "xml");
    }
}
