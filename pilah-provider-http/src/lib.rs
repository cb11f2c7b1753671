//! Pilah collaborators backed by HTTP: a JSON REST backend for facilities and
//! requests, and a Nominatim-compatible reverse geocoder.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use pilah_core::{
    collaborators::Collaborators,
    config::PilahConfig,
    model::{Coordinate, Facility, FacilityId, PickupRequest, StoredRequestId},
    ports::{FacilityCriteria, FacilityPort, GeocodePort, LocationPort, PortError, RequestStore},
};

/// Response wrapper from `GET /facilities`
#[derive(Debug, Deserialize)]
struct FacilitiesResponse {
    data: Vec<FacilityEntry>,
}

/// Single facility from `GET /facilities`
#[derive(Debug, Deserialize)]
struct FacilityEntry {
    id: String,
    name: String,

    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,

    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    address: Option<String>,
}

impl From<FacilityEntry> for Facility {
    fn from(entry: FacilityEntry) -> Self {
        // a facility without both components has no usable position
        let coordinate = match (entry.latitude, entry.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinate::new(latitude, longitude)),
            _ => None,
        };
        Facility {
            id: FacilityId(entry.id),
            name: entry.name,
            coordinate,
            contact_phone: entry.phone.filter(|phone| !phone.trim().is_empty()),
            address: entry.address.filter(|address| !address.trim().is_empty()),
        }
    }
}

/// Response from `POST /pickup-requests`
#[derive(Debug, Deserialize)]
struct StoredResponse {
    data: StoredEntry,
}

#[derive(Debug, Deserialize)]
struct StoredEntry {
    id: String,
}

/// Response from Nominatim `/reverse`
#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    display_name: Option<String>,
}

/// Facility directory served by the pilah backend.
pub struct HttpFacilityPort {
    client: Client,
    base_url: String,
}

impl HttpFacilityPort {
    /// Create a new facility port bound to the given HTTP client.
    #[must_use]
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl FacilityPort for HttpFacilityPort {
    async fn list_facilities(&self, criteria: &FacilityCriteria) -> Result<Vec<Facility>, PortError> {
        if criteria.limit == 0 {
            return Ok(Vec::new());
        }

        let mut req = self
            .client
            .get(format!("{}/facilities", self.base_url))
            .query(&[("limit", criteria.limit.to_string())]);

        // the backend returns its own order without a position
        if let Some(reference) = criteria.reference {
            req = req.query(&[
                ("lat", reference.latitude.to_string()),
                ("lon", reference.longitude.to_string()),
            ]);
        }

        let resp = fetch_json::<FacilitiesResponse>(req).await?;

        Ok(resp
            .data
            .into_iter()
            .take(criteria.limit)
            .map(Facility::from)
            .collect())
    }
}

/// Request store served by the pilah backend.
pub struct HttpRequestStore {
    client: Client,
    base_url: String,
}

impl HttpRequestStore {
    /// Create a new request store bound to the given HTTP client.
    #[must_use]
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl RequestStore for HttpRequestStore {
    async fn persist(&self, request: &PickupRequest) -> Result<StoredRequestId, PortError> {
        let req = self
            .client
            .post(format!("{}/pickup-requests", self.base_url))
            .json(request);

        let stored = fetch_json::<StoredResponse>(req).await?;
        if stored.data.id.trim().is_empty() {
            return Err(PortError::Decode("backend returned an empty request id".into()));
        }
        Ok(StoredRequestId(stored.data.id))
    }
}

/// Reverse geocoder speaking the Nominatim `/reverse` API.
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
}

impl NominatimGeocoder {
    /// Create a new geocoder bound to the given HTTP client.
    #[must_use]
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl GeocodePort for NominatimGeocoder {
    async fn reverse_geocode(&self, at: &Coordinate) -> Result<String, PortError> {
        let req = self.client.get(format!("{}/reverse", self.base_url)).query(&[
            ("format", "jsonv2".to_owned()),
            ("lat", at.latitude.to_string()),
            ("lon", at.longitude.to_string()),
        ]);

        let resp = fetch_json::<ReverseResponse>(req).await?;
        Ok(resp.display_name.unwrap_or_default())
    }
}

/// Device position taken from configuration, for hosts without positioning
/// hardware. Without a configured position every request is denied.
pub struct ConfiguredLocation {
    coordinate: Option<Coordinate>,
}

impl ConfiguredLocation {
    /// Create a location source answering with `coordinate`.
    #[must_use]
    pub fn new(coordinate: Option<Coordinate>) -> Self {
        Self { coordinate }
    }
}

#[async_trait]
impl LocationPort for ConfiguredLocation {
    async fn current_coordinate(&self) -> Result<Coordinate, PortError> {
        self.coordinate.ok_or(PortError::PermissionDenied)
    }
}

/// Build the collaborator bundle for the HTTP backend.
#[must_use]
pub fn plugin(client: Client, config: &PilahConfig) -> Collaborators {
    let facilities = Arc::new(HttpFacilityPort::new(client.clone(), config.api_url.clone()));
    let store = Arc::new(HttpRequestStore::new(client.clone(), config.api_url.clone()));
    let geocoder = Arc::new(NominatimGeocoder::new(client, config.geocoder_url.clone()));
    let location = Arc::new(ConfiguredLocation::new(config.device_coordinate));

    Collaborators {
        location,
        geocoder,
        facilities,
        store,
    }
}

// Small helper to fetch and decode JSON with status handling.
async fn fetch_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, PortError> {
    let resp = req.send().await.map_err(PortError::from)?;

    let status = resp.status();
    if !status.is_success() {
        let message = resp.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), %message, "backend rejected request");
        return Err(PortError::Rejected {
            status: status.as_u16(),
            message,
        });
    }

    let body = resp.bytes().await.map_err(PortError::from)?;
    serde_json::from_slice(&body).map_err(|err| PortError::Decode(err.to_string()))
}
