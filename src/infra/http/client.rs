use std::path::Path;
use std::time::Instant;

use loumo_api_types::ErrorBody;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::config::BackendSettings;
use crate::infra::error::InfraError;

use super::error::ApiError;

/// Successful response with its decoded body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    pub status: u16,
    pub data: T,
}

/// REST collaborator for the Loumo backend.
///
/// Paths are relative to the configured base URL (`"orders/12/status"`).
#[derive(Clone, Debug)]
pub struct BackendClient {
    client: Client,
    base: Url,
    token: Option<String>,
}

impl BackendClient {
    pub fn new(settings: &BackendSettings) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(settings.timeout)
            .build()
            .map_err(|err| InfraError::http_client(err.to_string()))?;

        Ok(Self {
            client,
            base: settings.base_url.clone(),
            token: settings.api_token.clone(),
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("loumo-admin/", env!("CARGO_PKG_VERSION"))
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|_| ApiError::Url(path.to_string()))
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = self.url(path)?;
        let mut builder = self.client.request(method, url);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        Ok(builder)
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<ApiResponse<T>, ApiError> {
        let mut builder = self.request(Method::GET, path)?;
        if !query.is_empty() {
            builder = builder.query(query);
        }
        self.send(Method::GET, path, builder).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse<T>, ApiError> {
        let builder = self.request(Method::POST, path)?.json(body);
        self.send(Method::POST, path, builder).await
    }

    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse<T>, ApiError> {
        let builder = self.request(Method::PUT, path)?.json(body);
        self.send(Method::PUT, path, builder).await
    }

    pub async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse<T>, ApiError> {
        let builder = self.request(Method::PATCH, path)?.json(body);
        self.send(Method::PATCH, path, builder).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<ApiResponse<T>, ApiError> {
        let builder = self.request(Method::DELETE, path)?;
        self.send(Method::DELETE, path, builder).await
    }

    /// Multipart upload: the file goes in the `file` part, `fields` as text parts.
    pub async fn upload<T: DeserializeOwned>(
        &self,
        path: &str,
        file: &Path,
        fields: &[(&str, String)],
    ) -> Result<ApiResponse<T>, ApiError> {
        let bytes = tokio::fs::read(file)
            .await
            .map_err(|err| ApiError::Io(format!("{}: {err}", file.display())))?;
        let file_name = file
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("upload.bin")
            .to_string();
        let mime = mime_guess::from_path(file).first_or_octet_stream();

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime.essence_str())
            .map_err(ApiError::from_reqwest)?;
        let mut form = Form::new().part("file", part);
        for (name, value) in fields {
            form = form.text(name.to_string(), value.clone());
        }

        let builder = self.request(Method::POST, path)?.multipart(form);
        self.send(Method::POST, path, builder).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        builder: RequestBuilder,
    ) -> Result<ApiResponse<T>, ApiError> {
        let started = Instant::now();
        let response = builder.send().await.map_err(|err| {
            let err = ApiError::from_reqwest(err);
            warn!(%method, path, error = %err, "Backend request failed");
            err
        })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(ApiError::from_reqwest)?;
        debug!(
            %method,
            path,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Backend request completed"
        );

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&bytes)
                .ok()
                .map(|body| body.message);
            return Err(ApiError::Backend {
                status: status.as_u16(),
                message,
            });
        }

        // Empty bodies decode as JSON null so unit-like responses still parse.
        let body: &[u8] = if bytes.is_empty() { b"null" } else { &bytes };
        let data = serde_json::from_slice(body).map_err(|err| ApiError::Decode(err.to_string()))?;

        Ok(ApiResponse {
            status: status.as_u16(),
            data,
        })
    }
}
