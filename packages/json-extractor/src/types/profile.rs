//! Per-store configuration: search endpoint, query parameters, and the
//! extraction rule set applied to that store's search responses.
//!
//! Profiles are plain data: they deserialize from JSON configuration and
//! carry no executable code. The embedded rule set compiles into an
//! [`Extractor`] once, when the store is loaded.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::engine::Extractor;
use crate::error::RuleResult;

/// Supported store regions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreRegion {
    #[default]
    #[serde(rename = "au")]
    Australia,
    #[serde(rename = "us")]
    UnitedStates,
    #[serde(rename = "uk")]
    UnitedKingdom,
    #[serde(rename = "ca")]
    Canada,
}

/// Configuration for one grocery store's search integration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreProfile {
    /// Stable identifier (e.g. "aldi")
    pub store_id: String,

    /// Store name
    pub name: String,

    /// Human-facing name (e.g. "ALDI Australia")
    pub display_name: String,

    #[serde(default)]
    pub region: StoreRegion,

    /// Store homepage
    pub base_url: String,

    /// Search endpoint the query parameter is appended to
    pub search_url: String,

    /// Name of the search query parameter
    #[serde(default = "default_query_param")]
    pub query_param: String,

    /// Extra query parameters sent with every search, in order
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub search_params: IndexMap<String, Value>,

    /// Extraction rule set applied to this store's search responses
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub rules: Value,

    /// Delay between requests, for the embedding system's pacing
    #[serde(default = "default_rate_limit_ms")]
    pub rate_limit_ms: u64,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Override the default user agent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

fn default_query_param() -> String {
    "q".to_string()
}

fn default_rate_limit_ms() -> u64 {
    1000
}

fn default_timeout_secs() -> u64 {
    30
}

impl StoreProfile {
    /// Create a profile with default search settings.
    pub fn new(
        store_id: impl Into<String>,
        name: impl Into<String>,
        base_url: impl Into<String>,
        search_url: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            store_id: store_id.into(),
            display_name: name.clone(),
            name,
            region: StoreRegion::default(),
            base_url: base_url.into(),
            search_url: search_url.into(),
            query_param: default_query_param(),
            search_params: IndexMap::new(),
            rules: Value::Null,
            rate_limit_ms: default_rate_limit_ms(),
            timeout_secs: default_timeout_secs(),
            user_agent: None,
        }
    }

    /// Set the human-facing name.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Set the region.
    pub fn with_region(mut self, region: StoreRegion) -> Self {
        self.region = region;
        self
    }

    /// Set the search query parameter name.
    pub fn with_query_param(mut self, param: impl Into<String>) -> Self {
        self.query_param = param.into();
        self
    }

    /// Add a fixed search parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.search_params.insert(key.into(), value.into());
        self
    }

    /// Set the extraction rule set for search responses.
    pub fn with_rules(mut self, rules: Value) -> Self {
        self.rules = rules;
        self
    }

    /// Set the request pacing delay.
    pub fn with_rate_limit_ms(mut self, ms: u64) -> Self {
        self.rate_limit_ms = ms;
        self
    }

    /// Set the user agent.
    pub fn with_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the search URL for a query, with all parameters encoded.
    pub fn build_search_url(&self, query: &str) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&self.search_url)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair(&self.query_param, query);
            for (key, value) in &self.search_params {
                match value {
                    Value::String(s) => pairs.append_pair(key, s),
                    other => pairs.append_pair(key, &other.to_string()),
                };
            }
        }
        Ok(url)
    }

    /// Compile this store's rule set into an extractor.
    ///
    /// Surfaces malformed rules when the profile is loaded, not on the
    /// first search response.
    pub fn extractor(&self) -> RuleResult<Extractor> {
        Extractor::new(&self.rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn aldi() -> StoreProfile {
        StoreProfile::new(
            "aldi",
            "ALDI",
            "https://www.aldi.com.au",
            "https://api.aldi.com.au/v3/product-search",
        )
        .with_display_name("ALDI Australia")
        .with_param("currency", "AUD")
        .with_param("limit", 12)
        .with_rules(json!({
            "data": {
                "fields": ["name", "brandName", "quantityUnit", "sellingSize"],
                "price": {"fields": ["amount", "amountRelevantDisplay", "comparisonDisplay"]},
                "categories[*].name": true,
                "assets": {"limit": 1, "fields": ["url"]}
            }
        }))
        .with_rate_limit_ms(2000)
    }

    #[test]
    fn test_build_search_url_encodes_params() {
        let url = aldi().build_search_url("cherry tomatoes").unwrap();
        assert_eq!(url.host_str(), Some("api.aldi.com.au"));

        let query = url.query().unwrap();
        assert!(query.contains("q=cherry+tomatoes"));
        assert!(query.contains("currency=AUD"));
        assert!(query.contains("limit=12"));
    }

    #[test]
    fn test_profile_compiles_extractor() {
        let extractor = aldi().extractor().unwrap();
        let output = extractor.extract(&json!({
            "data": [{
                "name": "Cherry Tomatoes in Tomato Juice 400g",
                "brandName": "CASA BARELLI",
                "price": {"amount": 139, "amountRelevantDisplay": "$1.39"},
                "categories": [{"name": "Pantry", "id": "pantry"}],
                "assets": [{"url": "u1", "type": "image"}, {"url": "u2", "type": "thumb"}]
            }]
        }));

        assert_eq!(
            output,
            json!({
                "data": [{
                    "name": "Cherry Tomatoes in Tomato Juice 400g",
                    "brandName": "CASA BARELLI",
                    "price": {"amount": 139, "amountRelevantDisplay": "$1.39"},
                    "categories": ["Pantry"],
                    "assets": [{"url": "u1"}]
                }]
            })
        );
    }

    #[test]
    fn test_malformed_rules_surface_at_load() {
        let profile = aldi().with_rules(json!({"items": {"fields": ["x"], "filter": "nope"}}));
        assert!(profile.extractor().is_err());
    }

    #[test]
    fn test_region_serde_codes() {
        assert_eq!(serde_json::to_string(&StoreRegion::Australia).unwrap(), "\"au\"");
        let region: StoreRegion = serde_json::from_str("\"uk\"").unwrap();
        assert_eq!(region, StoreRegion::UnitedKingdom);
    }

    #[test]
    fn test_profile_deserializes_with_defaults() {
        let profile: StoreProfile = serde_json::from_value(json!({
            "store_id": "iga",
            "name": "IGA",
            "display_name": "IGA (Independent Grocers of Australia)",
            "base_url": "https://www.iga.com.au",
            "search_url": "https://www.iga.com.au/search",
            "query_param": "term"
        }))
        .unwrap();

        assert_eq!(profile.region, StoreRegion::Australia);
        assert_eq!(profile.rate_limit_ms, 1000);
        assert_eq!(profile.timeout_secs, 30);
        assert!(profile.rules.is_null());
        // A profile without rules still yields a (failing) compile attempt
        assert!(profile.extractor().is_err());
    }
}
