//! Remote project/locale API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, Client, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Locale, Project, ProjectId},
    error::ApiException,
    protocol::{authorization_header, locales_segments, projects_segments, PageQuery},
};
use storage::StorageError;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::persisted::PersistedOptions;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_MAX_PAGES: u32 = 20;
const USER_AGENT: &str = concat!("phrase-options/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("no access token has been saved")]
    MissingToken,
    #[error("access token rejected: {0}")]
    Unauthorized(String),
    #[error(transparent)]
    Api(#[from] ApiException),
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid API url: {0}")]
    Url(#[from] url::ParseError),
    #[error("API url cannot carry a path: {0}")]
    BaseUrl(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[async_trait]
pub trait RemoteClient: Send + Sync {
    async fn list_projects(&self) -> Result<Vec<Project>, RemoteError>;
    async fn list_locales(&self, project_id: &ProjectId) -> Result<Vec<Locale>, RemoteError>;
}

/// HTTP client for the Phrase v2 API. The access token is read from the
/// settings store on every call, so it always uses the last saved credential.
/// Endpoint paths are appended to any path already in the base url.
pub struct PhraseClient {
    http: Client,
    api_base: Url,
    settings: PersistedOptions,
    max_pages: u32,
}

impl PhraseClient {
    pub fn new(api_base: &str, settings: PersistedOptions) -> Result<Self, RemoteError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        let api_base = Url::parse(api_base)?;
        if api_base.cannot_be_a_base() {
            return Err(RemoteError::BaseUrl(api_base.to_string()));
        }
        Ok(Self {
            http,
            api_base,
            settings,
            max_pages: DEFAULT_MAX_PAGES,
        })
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    async fn access_token(&self) -> Result<String, RemoteError> {
        self.settings
            .token()
            .await?
            .filter(|token| !token.is_empty())
            .ok_or(RemoteError::MissingToken)
    }

    fn endpoint(&self, segments: &[String]) -> Result<Url, RemoteError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|()| RemoteError::BaseUrl(self.api_base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn fetch_all<T: DeserializeOwned>(
        &self,
        segments: &[String],
    ) -> Result<Vec<T>, RemoteError> {
        let token = self.access_token().await?;
        let url = self.endpoint(segments)?;
        let mut query = PageQuery::first();
        let mut items = Vec::new();

        loop {
            let response = self
                .http
                .get(url.clone())
                .header(AUTHORIZATION, authorization_header(&token))
                .query(&query)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let exception = ApiException::from_body(status.as_u16(), &body);
                if status == StatusCode::UNAUTHORIZED {
                    return Err(RemoteError::Unauthorized(exception.message));
                }
                return Err(exception.into());
            }

            let page: Vec<T> = response.json().await?;
            let fetched = page.len();
            items.extend(page);
            debug!(path = url.path(), page = query.page, fetched, "fetched page");

            if fetched < query.per_page as usize || query.page >= self.max_pages {
                break;
            }
            query = query.next();
        }

        Ok(items)
    }
}

#[async_trait]
impl RemoteClient for PhraseClient {
    async fn list_projects(&self) -> Result<Vec<Project>, RemoteError> {
        self.fetch_all(&projects_segments()).await
    }

    async fn list_locales(&self, project_id: &ProjectId) -> Result<Vec<Locale>, RemoteError> {
        self.fetch_all(&locales_segments(project_id)).await
    }
}

#[cfg(test)]
#[path = "tests/remote_tests.rs"]
mod tests;
