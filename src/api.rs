//! Parcel attribute API client

use crate::{layers::style::FeatureId, tiles::loader, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Attributes shown in the parcel popup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParcelAttributes {
    pub parcel_number: String,
    pub area: String,
}

impl ParcelAttributes {
    /// Parses an attribute API response body. Both fields are required; the
    /// service sends them either as strings or as numbers.
    pub fn from_json(body: &[u8]) -> Result<Self> {
        let response: ParcelResponse = serde_json::from_slice(body)?;
        Ok(Self {
            parcel_number: response.properties.parcel_number.into_text(),
            area: response.properties.area.into_text(),
        })
    }
}

#[derive(Deserialize)]
struct ParcelResponse {
    properties: ParcelProperties,
}

#[derive(Deserialize)]
struct ParcelProperties {
    parcel_number: TextValue,
    area: TextValue,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextValue {
    Text(String),
    Number(serde_json::Number),
}

impl TextValue {
    fn into_text(self) -> String {
        match self {
            TextValue::Text(text) => text,
            TextValue::Number(number) => number.to_string(),
        }
    }
}

/// Source of parcel attributes. The view only talks to this trait so tests
/// can script responses.
#[async_trait]
pub trait ParcelApi: Send + Sync {
    async fn fetch_parcel(&self, id: &FeatureId) -> Result<ParcelAttributes>;
}

/// HTTP implementation against `{base}/api/dkp/parcels/{id}`
#[derive(Debug, Clone)]
pub struct HttpParcelApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpParcelApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(loader::HTTP_CLIENT.clone(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn parcel_url(&self, id: &FeatureId) -> String {
        format!("{}/api/dkp/parcels/{}", self.base_url, id)
    }
}

#[async_trait]
impl ParcelApi for HttpParcelApi {
    async fn fetch_parcel(&self, id: &FeatureId) -> Result<ParcelAttributes> {
        let url = self.parcel_url(id);
        log::debug!("fetching parcel attributes from {}", url);
        let body = loader::fetch_bytes(&self.client, &url, None).await?;
        ParcelAttributes::from_json(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MapError;

    #[test]
    fn test_parcel_url() {
        let api = HttpParcelApi::new("https://gis-dev.listlabs.net/");
        assert_eq!(
            api.parcel_url(&FeatureId::from("42")),
            "https://gis-dev.listlabs.net/api/dkp/parcels/42"
        );
    }

    #[test]
    fn test_parse_string_fields() {
        let body = br#"{"type":"Feature","properties":{"parcel_number":"123-45","area":"1500"}}"#;
        let attributes = ParcelAttributes::from_json(body).unwrap();
        assert_eq!(attributes.parcel_number, "123-45");
        assert_eq!(attributes.area, "1500");
    }

    #[test]
    fn test_parse_numeric_fields() {
        let body = br#"{"properties":{"parcel_number":881,"area":1532.5}}"#;
        let attributes = ParcelAttributes::from_json(body).unwrap();
        assert_eq!(attributes.parcel_number, "881");
        assert_eq!(attributes.area, "1532.5");
    }

    #[test]
    fn test_malformed_body_is_error() {
        assert!(matches!(
            ParcelAttributes::from_json(b"<html>502</html>"),
            Err(MapError::Serialization(_))
        ));
        assert!(ParcelAttributes::from_json(br#"{"properties":{"area":"1"}}"#).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let api = HttpParcelApi::new("http://127.0.0.1:9");
        let result = api.fetch_parcel(&FeatureId::from("1")).await;
        assert!(matches!(result, Err(MapError::Network(_))));
    }
}
