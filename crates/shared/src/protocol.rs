use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::{clamp_unit, Source};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
        }
    }
}

/// Reads a field as `T`, treating a value of the wrong type like an absent one.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Reads a source list, dropping entries that are not objects.
fn lenient_sources<'de, D>(deserializer: D) -> Result<Option<Vec<SourcePayload>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(entries) = value else {
        return Ok(None);
    };
    Ok(Some(
        entries
            .into_iter()
            .filter(Value::is_object)
            .filter_map(|entry| serde_json::from_value(entry).ok())
            .collect(),
    ))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourcePayload {
    #[serde(default, deserialize_with = "lenient")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub domain: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub score: Option<f64>,
}

/// Success body as the query service sends it. Field casing follows the wire.
///
/// Fields of the wrong type read as absent; only a body that is not a JSON
/// object is rejected (see [`QueryResponseBody::from_slice`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResponseBody {
    #[serde(default, deserialize_with = "lenient")]
    pub response: Option<String>,
    #[serde(rename = "Sources", default, deserialize_with = "lenient_sources")]
    pub sources: Option<Vec<SourcePayload>>,
    #[serde(rename = "Confidence_score", default, deserialize_with = "lenient")]
    pub confidence_score: Option<f64>,
}

/// Normalized success payload used by the client.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryAnswer {
    pub response_html: String,
    pub sources: Vec<Source>,
    pub confidence_score: Option<f64>,
}

impl QueryResponseBody {
    /// Parses a success body. Fails only when the bytes are not a JSON object.
    pub fn from_slice(raw: &[u8]) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_slice(raw)?;
        if !value.is_object() {
            return Err(serde::de::Error::custom(
                "expected a JSON object as the response body",
            ));
        }
        serde_json::from_value(value)
    }

    pub fn into_answer(self) -> QueryAnswer {
        let sources = self
            .sources
            .unwrap_or_default()
            .into_iter()
            .filter_map(|source| {
                let url = source.url.filter(|url| !url.trim().is_empty())?;
                Some(Source::new(
                    url,
                    source.domain.unwrap_or_default(),
                    source.score.unwrap_or(0.0),
                ))
            })
            .collect();

        QueryAnswer {
            response_html: self.response.unwrap_or_default(),
            sources,
            confidence_score: self.confidence_score.and_then(clamp_unit),
        }
    }
}
