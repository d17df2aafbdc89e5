//! LMS REST client
//!
//! Thin wrapper over the catalog endpoints. Every non-2xx status, transport
//! failure or undecodable body becomes a [`FetchError`]; nothing is swallowed
//! into an empty page.

use std::collections::HashMap;

use anyhow::{Context, Result};
use coursectl_core::config::LmsConfig;
use coursectl_core::{Cursor, FetchError};
use futures::future::join_all;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::model::{ListDocument, SingleDocument, CURSOR_PARAM};
use crate::skills::SkillCache;

const JSON_API: &str = "application/vnd.api+json";

/// LMS API client with a bounded skill-name cache
pub struct LmsClient {
    http: Client,
    base_url: String,
    token: Option<String>,
    auth_scheme: String,
    page_limit: u32,
    language: String,
    skills: SkillCache,
}

impl LmsClient {
    pub fn new(config: &LmsConfig, skill_capacity: usize) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            auth_scheme: config.auth_scheme.clone(),
            page_limit: config.page_limit,
            language: config.language.clone(),
            skills: SkillCache::new(skill_capacity),
        })
    }

    pub fn skills(&self) -> &SkillCache {
        &self.skills
    }

    /// URL of a catalog listing page (no search term)
    pub fn listing_url(&self, lo_types: &[String], cursor: Option<&Cursor>) -> Result<Url, FetchError> {
        let mut params = vec![
            ("page[limit]", self.page_limit.to_string()),
            ("sort", "name".to_string()),
            ("filter.ignoreEnhancedLP", "true".to_string()),
            ("include", "instances,skills".to_string()),
        ];
        if !lo_types.is_empty() {
            params.push(("filter.loTypes", lo_types.join(",")));
        }
        if let Some(cursor) = cursor {
            params.push((CURSOR_PARAM, cursor.to_string()));
        }
        self.url("learningObjects", &params)
    }

    /// URL of a relevance search page
    pub fn search_url(
        &self,
        term: &str,
        lo_types: &[String],
        cursor: Option<&Cursor>,
    ) -> Result<Url, FetchError> {
        let mut params = vec![
            ("query", term.to_string()),
            ("page[limit]", self.page_limit.to_string()),
            ("sort", "relevance".to_string()),
            ("filter.ignoreEnhancedLP", "false".to_string()),
            ("include", "model.instances,model.skills".to_string()),
            ("language", self.language.clone()),
        ];
        if !lo_types.is_empty() {
            params.push(("filter.loTypes", lo_types.join(",")));
        }
        if let Some(cursor) = cursor {
            params.push((CURSOR_PARAM, cursor.to_string()));
        }
        self.url("search", &params)
    }

    fn url(&self, path: &str, params: &[(&str, String)]) -> Result<Url, FetchError> {
        let base = format!("{}/{}", self.base_url, path);
        Url::parse_with_params(&base, params)
            .map_err(|e| FetchError::transport(format!("invalid URL {}: {}", base, e)))
    }

    /// One page of the catalog, sorted by name
    #[instrument(skip_all, fields(types = ?lo_types, cursor = ?cursor))]
    pub async fn list_learning_objects(
        &self,
        lo_types: &[String],
        cursor: Option<&Cursor>,
    ) -> Result<ListDocument, FetchError> {
        let url = self.listing_url(lo_types, cursor)?;
        self.get_json(url, "learning objects page").await
    }

    /// One page of relevance-ranked search hits
    #[instrument(skip_all, fields(term = %term, types = ?lo_types, cursor = ?cursor))]
    pub async fn search(
        &self,
        term: &str,
        lo_types: &[String],
        cursor: Option<&Cursor>,
    ) -> Result<ListDocument, FetchError> {
        let url = self.search_url(term, lo_types, cursor)?;
        self.get_json(url, "search page").await
    }

    /// A single learning object with its instance modules, skills and enrollment
    #[instrument(skip(self))]
    pub async fn learning_object(&self, id: &str) -> Result<SingleDocument, FetchError> {
        let url = self.url(
            &format!("learningObjects/{}", id),
            &[("include", "instances.loResources,skills,enrollment".to_string())],
        )?;
        self.get_json(url, "learning object").await
    }

    /// Resolve skill ids to names, fetching uncached ids concurrently.
    ///
    /// Ids whose lookup fails are left out of the result.
    pub async fn skill_names(&self, ids: &[&str]) -> HashMap<String, String> {
        let mut names = HashMap::new();
        let mut missing: Vec<&str> = Vec::new();

        for &id in ids {
            if names.contains_key(id) || missing.contains(&id) {
                continue;
            }
            match self.skills.get(id).await {
                Some(name) => {
                    names.insert(id.to_string(), name);
                }
                None => missing.push(id),
            }
        }

        if missing.is_empty() {
            return names;
        }

        debug!(count = missing.len(), "Fetching skill names");
        let fetched = join_all(missing.iter().map(|&id| self.skill_name(id))).await;

        for (id, result) in missing.into_iter().zip(fetched) {
            match result {
                Ok(Some(name)) => {
                    self.skills.insert(id, name.clone()).await;
                    names.insert(id.to_string(), name);
                }
                Ok(None) => debug!(skill_id = id, "Skill has no name"),
                Err(e) => warn!(skill_id = id, error = %e, "Skill lookup failed"),
            }
        }

        names
    }

    async fn skill_name(&self, id: &str) -> Result<Option<String>, FetchError> {
        let url = self.url(&format!("skills/{}", id), &[])?;
        let doc: SingleDocument = self.get_json(url, "skill").await?;
        Ok(doc.data.attributes.name)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, context: &str) -> Result<T, FetchError> {
        debug!(url = %url, "GET");

        let mut request = self.http.get(url).header("Accept", JSON_API);
        if let Some(ref token) = self.token {
            request = request.header("Authorization", format!("{} {}", self.auth_scheme, token));
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::status(status.as_u16(), body));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::transport(e.to_string()))?;

        serde_json::from_slice(&bytes).map_err(|e| FetchError::decode(context, e.to_string()))
    }
}
