use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Backend endpoint variant selected by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMode {
    #[default]
    Quick,
    Deep,
}

impl QueryMode {
    pub fn endpoint_path(self) -> &'static str {
        match self {
            Self::Quick => "/query",
            Self::Deep => "/research",
        }
    }

    /// Upper bound communicated to the user while a request runs. Not enforced.
    pub fn latency_hint(self) -> Option<&'static str> {
        match self {
            Self::Quick => None,
            Self::Deep => Some("Deep research can take up to 2 minutes."),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quick => "quick",
            Self::Deep => "deep",
        }
    }
}

impl fmt::Display for QueryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown query mode '{0}', expected 'quick' or 'deep'")]
pub struct UnknownQueryMode(pub String);

impl FromStr for QueryMode {
    type Err = UnknownQueryMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quick" => Ok(Self::Quick),
            "deep" => Ok(Self::Deep),
            _ => Err(UnknownQueryMode(s.to_string())),
        }
    }
}

/// Lifecycle stage of the current query session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Submitting,
    Success,
    Error,
}

/// A cited page backing an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub url: String,
    pub domain: String,
    pub score: f64,
}

impl Source {
    pub fn new(url: impl Into<String>, domain: impl Into<String>, score: f64) -> Self {
        Self {
            url: url.into(),
            domain: domain.into(),
            score: clamp_unit(score).unwrap_or(0.0),
        }
    }
}

/// Clamps a finite value into `[0, 1]`; non-finite input yields `None`.
pub fn clamp_unit(value: f64) -> Option<f64> {
    value.is_finite().then(|| value.clamp(0.0, 1.0))
}
