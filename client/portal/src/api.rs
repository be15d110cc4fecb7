use reqwest::Client;
use serde_json::Value;
use std::{future::Future, pin::Pin, time::Duration};

use crate::{
    error::ApiError,
    models::{Book, RegistrationPayload},
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The two backend calls the portal makes. Boxed futures keep the trait
/// object-safe so the portal can hold `Arc<dyn Backend>`.
pub trait Backend: Send + Sync {
    fn submit_registration<'a>(
        &'a self,
        payload: &'a RegistrationPayload,
    ) -> BoxFuture<'a, Result<Value, ApiError>>;

    fn fetch_books(&self) -> BoxFuture<'_, Result<Vec<Book>, ApiError>>;
}

#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_registration(&self, payload: &RegistrationPayload) -> Result<Value, ApiError> {
        let url = format!("{}/registrations", self.base_url);
        let response = self.client.post(url).json(payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "registration rejected");
            return Err(ApiError::Status {
                status: status.as_u16(),
            });
        }

        // Body must parse, its content is not inspected.
        let body: Value = response
            .json()
            .await
            .map_err(|err| ApiError::Decode(err.to_string()))?;
        tracing::info!(email = %payload.email, "registration accepted");
        Ok(body)
    }

    async fn get_books(&self) -> Result<Vec<Book>, ApiError> {
        let url = format!("{}/books", self.base_url);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "book list rejected");
            return Err(ApiError::Status {
                status: status.as_u16(),
            });
        }

        let books: Vec<Book> = response
            .json()
            .await
            .map_err(|err| ApiError::Decode(err.to_string()))?;
        tracing::debug!(count = books.len(), "books fetched");
        Ok(books)
    }
}

impl Backend for HttpBackend {
    fn submit_registration<'a>(
        &'a self,
        payload: &'a RegistrationPayload,
    ) -> BoxFuture<'a, Result<Value, ApiError>> {
        Box::pin(self.post_registration(payload))
    }

    fn fetch_books(&self) -> BoxFuture<'_, Result<Vec<Book>, ApiError>> {
        Box::pin(self.get_books())
    }
}
