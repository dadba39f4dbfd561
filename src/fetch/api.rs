//! HTTP backend for the dashboard REST API.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use url::Url;

use crate::domain::{Record, RemoteListResult, ResourceKind, StatusChange};
use crate::fetch::backend::{Backend, UploadedFile};
use crate::fetch::{FetchError, QueryKey};
use crate::worker::TraceContext;

/// reqwest-based [`Backend`] talking JSON to `{base_url}/{resource}`.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    token: Option<String>,
}

impl ApiClient {
    /// Builds a client rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Transport`] when the base URL cannot carry path
    /// segments or the HTTP client fails to build.
    pub fn new(base_url: Url, token: Option<String>, timeout: Duration) -> Result<Self, FetchError> {
        if base_url.cannot_be_a_base() {
            return Err(FetchError::Transport(format!("invalid api base url '{base_url}'")));
        }

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("rentadmin/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self { http, base_url, token })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| FetchError::Transport(format!("invalid api base url '{}'", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let mut builder = self.http.request(method, url);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        if let Some(context) = TraceContext::from_current() {
            builder = builder.header("traceparent", context.traceparent());
        }
        builder
    }

    async fn send(&self, builder: RequestBuilder, what: &str) -> Result<Response, FetchError> {
        let res = builder.send().await.map_err(map_reqwest_error)?;

        match res.status() {
            s if s.is_success() => Ok(res),
            StatusCode::NOT_FOUND => Err(FetchError::NotFound(what.to_string())),
            StatusCode::TOO_MANY_REQUESTS => Err(FetchError::RateLimited),
            s => {
                let status = s.as_u16();
                let body = res.text().await.unwrap_or_default();
                Err(FetchError::Http { status, body })
            }
        }
    }
}

#[async_trait]
impl Backend for ApiClient {
    async fn fetch_list(&self, key: &QueryKey) -> Result<RemoteListResult<Record>, FetchError> {
        let mut url = self.endpoint(&[key.resource.slug()])?;
        url.query_pairs_mut().extend_pairs(key.params.iter());

        tracing::debug!(url = %url, "fetching list");

        let res = self.send(self.request(Method::GET, url), key.resource.title()).await?;
        let raw: RemoteListResult<serde_json::Value> = res
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        raw.try_map(|item| key.resource.decode(item)).map_err(FetchError::from)
    }

    async fn update_status(&self, resource: ResourceKind, change: &StatusChange) -> Result<(), FetchError> {
        let url = self.endpoint(&[resource.slug(), "status"])?;
        tracing::debug!(url = %url, id = %change.id, status = %change.approval_status, "updating status");

        self.send(self.request(Method::PUT, url).json(change), resource.title())
            .await
            .map(drop)
    }

    async fn delete_record(&self, resource: ResourceKind, id: &str) -> Result<(), FetchError> {
        let url = self.endpoint(&[resource.slug(), id])?;
        tracing::debug!(url = %url, "deleting record");

        self.send(self.request(Method::DELETE, url), resource.title())
            .await
            .map(drop)
    }

    async fn upload_file(&self, field: &str, path: &Path) -> Result<UploadedFile, FetchError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| FetchError::Transport(format!("read {}: {e}", path.display())))?;
        let file_name = path
            .file_name()
            .map_or_else(|| "upload".to_string(), |name| name.to_string_lossy().into_owned());

        let form = Form::new()
            .text("field", field.to_string())
            .part("file", Part::bytes(bytes).file_name(file_name));

        let url = self.endpoint(&["files", "upload"])?;
        let res = self
            .send(self.request(Method::POST, url).multipart(form), "upload endpoint")
            .await?;

        res.json::<UploadedFile>()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }

    async fn delete_file(&self, url: &str) -> Result<(), FetchError> {
        let mut endpoint = self.endpoint(&["files"])?;
        endpoint.query_pairs_mut().append_pair("url", url);
        tracing::debug!(url = %url, "deleting uploaded file");

        self.send(self.request(Method::DELETE, endpoint), "file")
            .await
            .map(drop)
    }
}

fn map_reqwest_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Transport(e.to_string())
    }
}
