//! Room service API client for REST endpoints

use crate::catalog::ProductRepository;
use crate::error::{ClientError, Result};
use crate::models::{CreateRoomRequest, EndRoomRequest, Product, RoomCode, RoomResponse};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

/// Request/response half of the room service.
#[allow(async_fn_in_trait)]
pub trait RoomService {
    /// Create a room hosted by `username`, returning its code
    async fn create_room(&self, username: &str) -> Result<RoomCode>;

    /// Existence probe; fails if the room is unknown
    async fn lookup_room(&self, room_code: &RoomCode) -> Result<RoomCode>;

    /// Ask the service to terminate the room for everyone
    async fn end_room(&self, room_code: &RoomCode) -> Result<()>;
}

/// Room service API client
#[derive(Clone)]
pub struct ServerApi {
    client: Client,
    base_url: Url,
}

impl ServerApi {
    /// Create a new API client. No request timeout unless one is given.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ClientError::ConfigError(format!("Invalid server URL {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::ConfigError(format!(
                "Server URL cannot be used as a base: {}",
                base_url
            )));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::ConfigError(format!("Invalid server URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Fetch the product feed
    pub async fn fetch_products(&self) -> Result<Vec<Product>> {
        let response = self
            .client
            .get(self.endpoint(&["api", "products"])?)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ClientError::ServerError(format!(
                "Product fetch failed: {}",
                response.status()
            )));
        }

        // Parse separately so a malformed feed surfaces as a data error
        let body = response.text().await?;
        let products: Vec<Product> = serde_json::from_str(&body)?;
        log::debug!("Fetched {} products", products.len());
        Ok(products)
    }
}

impl RoomService for ServerApi {
    async fn create_room(&self, username: &str) -> Result<RoomCode> {
        let request = CreateRoomRequest {
            username: username.to_string(),
        };

        let response = self
            .client
            .post(self.endpoint(&["api", "rooms", "create"])?)
            .json(&request)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                let created: RoomResponse = response.json().await?;
                log::info!("Room {} created for {}", created.room_code, username);
                Ok(created.room_code)
            }
            status => {
                log::error!("Room creation failed for {}: {}", username, status);
                Err(ClientError::ServerError(format!(
                    "Room creation failed: {}",
                    status
                )))
            }
        }
    }

    async fn lookup_room(&self, room_code: &RoomCode) -> Result<RoomCode> {
        let response = self
            .client
            .get(self.endpoint(&["api", "rooms", room_code.as_str()])?)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                let found: RoomResponse = response.json().await?;
                Ok(found.room_code)
            }
            StatusCode::NOT_FOUND => Err(ClientError::InvalidRoom(room_code.to_string())),
            status => Err(ClientError::ServerError(format!(
                "Room lookup failed: {}",
                status
            ))),
        }
    }

    async fn end_room(&self, room_code: &RoomCode) -> Result<()> {
        let request = EndRoomRequest {
            room_code: room_code.clone(),
        };

        let response = self
            .client
            .post(self.endpoint(&["api", "rooms", "end"])?)
            .json(&request)
            .send()
            .await?;

        if response.status().is_success() {
            log::info!("Room {} ended", room_code);
            Ok(())
        } else {
            Err(ClientError::ServerError(format!(
                "Ending room failed: {}",
                response.status()
            )))
        }
    }
}

impl ProductRepository for ServerApi {
    async fn load(&self) -> Result<Vec<Product>> {
        self.fetch_products().await
    }
}
