//! Generic release feed source: a JSON array of version strings served
//! from an arbitrary URL (spec.md §4.2's "upstream release feed"),
//! grounded in `vx-version-fetcher::fetchers::custom::CustomFetcher`'s
//! shape (a plain JSON endpoint, no vendor-specific schema).

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::{ResolverError, Result};
use crate::source::{VersionList, VersionSource};

pub struct ReleaseFeedSource {
    client: reqwest::Client,
}

impl ReleaseFeedSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl VersionSource for ReleaseFeedSource {
    async fn fetch_versions(
        &self,
        recipe_name: &str,
        source_config: &BTreeMap<String, toml::Value>,
    ) -> Result<VersionList> {
        let url = source_config
            .get("url")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ResolverError::InvalidSourceConfig {
                recipe: recipe_name.to_string(),
                message: "release_feed source requires `url` in [version].source_config".to_string(),
            })?;
        let json_pointer = source_config.get("json_pointer").and_then(|v| v.as_str());

        let body: serde_json::Value = self.client.get(url).send().await?.error_for_status()?.json().await?;

        let array = match json_pointer {
            Some(pointer) => body.pointer(pointer),
            None => Some(&body),
        }
        .and_then(|v| v.as_array())
        .ok_or_else(|| ResolverError::InvalidSourceConfig {
            recipe: recipe_name.to_string(),
            message: format!("release feed at {url} did not contain a JSON array of versions"),
        })?;

        let versions: Vec<String> = array.iter().filter_map(|v| v.as_str().map(str::to_string)).collect();

        if versions.is_empty() {
            return Err(ResolverError::NoVersionsAvailable {
                recipe: recipe_name.to_string(),
                source: "release_feed".to_string(),
            });
        }

        Ok(VersionList {
            versions,
            source_description: format!("release_feed:{url}"),
        })
    }

    fn name(&self) -> &str {
        "release_feed"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn fetches_flat_version_array() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/versions.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!(["2.1.0", "2.0.0"])))
            .mount(&server)
            .await;

        let source = ReleaseFeedSource::new(reqwest::Client::new());
        let mut config = BTreeMap::new();
        config.insert(
            "url".to_string(),
            toml::Value::String(format!("{}/versions.json", server.uri())),
        );

        let list = source.fetch_versions("tool", &config).await.unwrap();
        assert_eq!(list.versions, vec!["2.1.0", "2.0.0"]);
    }

    #[tokio::test]
    async fn honors_json_pointer_into_nested_object() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {"releases": ["3.0.0"]}
            })))
            .mount(&server)
            .await;

        let source = ReleaseFeedSource::new(reqwest::Client::new());
        let mut config = BTreeMap::new();
        config.insert("url".to_string(), toml::Value::String(format!("{}/feed.json", server.uri())));
        config.insert(
            "json_pointer".to_string(),
            toml::Value::String("/data/releases".to_string()),
        );

        let list = source.fetch_versions("tool", &config).await.unwrap();
        assert_eq!(list.versions, vec!["3.0.0"]);
    }
}
