use serde::de::DeserializeOwned;
use url::Url;

use crate::error::FetchError;
use crate::model::{DynamicSnapshot, StaticInfo};

pub const STATIC_PATH: &str = "/api/static";
pub const DYNAMIC_PATH: &str = "/api/dynamic";

/// Fetches the two dashboard documents from the resolver API.
///
/// No timeout is configured and nothing is retried: a request that never
/// completes keeps its panel loading.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base: Url,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base: Url) -> Self {
        Self {
            base,
            client: reqwest::Client::new(),
        }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        Ok(self.base.join(path)?)
    }

    pub async fn fetch_static(&self) -> Result<StaticInfo, FetchError> {
        self.get_json(STATIC_PATH).await
    }

    pub async fn fetch_dynamic(&self) -> Result<DynamicSnapshot, FetchError> {
        self.get_json(DYNAMIC_PATH).await
    }

    /// URL for `/api/<path>` on the upstream. Each `/`-separated piece of
    /// `path` becomes one percent-encoded segment, so `?` and `#` stay in the
    /// path and dot segments are refused.
    pub fn api_url(&self, path: &str, query: Option<&str>) -> Result<Url, FetchError> {
        if path.split('/').any(|seg| seg == "." || seg == "..") {
            return Err(FetchError::InvalidPath(path.to_string()));
        }

        let mut url = self.base.clone();
        url.set_path("/api");
        url.path_segments_mut()
            .map_err(|_| FetchError::NotABase(self.base.to_string()))?
            .extend(path.split('/'));
        url.set_query(query);
        url.set_fragment(None);
        Ok(url)
    }

    /// Plain GET against the API, used to pass `/api/*` through unchanged.
    pub async fn forward(
        &self,
        path: &str,
        query: Option<&str>,
    ) -> Result<reqwest::Response, FetchError> {
        let url = self.api_url(path, query)?;
        self.client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let url = self.endpoint(path)?;
        tracing::debug!(%url, "fetching");

        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        resp.json().await.map_err(|source| FetchError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_replace_base_path() {
        let client = ApiClient::new(Url::parse("http://localhost:8080/some/prefix").unwrap());
        assert_eq!(
            client.endpoint(STATIC_PATH).unwrap().as_str(),
            "http://localhost:8080/api/static"
        );
        assert_eq!(
            client.endpoint(DYNAMIC_PATH).unwrap().as_str(),
            "http://localhost:8080/api/dynamic"
        );
    }

    #[test]
    fn api_url_stays_under_api() {
        let client = ApiClient::new(Url::parse("http://localhost:8080/prefix").unwrap());

        assert_eq!(
            client.api_url("static", None).unwrap().as_str(),
            "http://localhost:8080/api/static"
        );
        assert_eq!(
            client.api_url("stats/hourly", Some("since=5")).unwrap().as_str(),
            "http://localhost:8080/api/stats/hourly?since=5"
        );
        assert_eq!(
            client.api_url("a?b#c", None).unwrap().as_str(),
            "http://localhost:8080/api/a%3Fb%23c"
        );

        for path in ["../secret", "x/../../secret", "./static", ".."] {
            assert!(
                matches!(client.api_url(path, None), Err(FetchError::InvalidPath(_))),
                "{path} was accepted"
            );
        }
    }
}
