use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A cloud site the OAuth token may act on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudResource {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl CloudResource {
    /// Whether any granted scope belongs to the given product.
    pub fn serves(&self, service: super::ServiceKind) -> bool {
        let needle = format!(":{}", service.as_str());
        self.scopes.iter().any(|scope| scope.contains(&needle))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub project_type_key: Option<String>,
    #[serde(default)]
    pub simplified: Option<bool>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub avatar_urls: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Space {
    pub id: String,
    pub key: String,
    pub name: String,
    #[serde(rename = "type")]
    pub space_type: Option<String>,
    pub status: Option<String>,
    /// Plain-text description, empty when the space has none.
    pub description: String,
    pub icon: serde_json::Value,
    #[serde(rename = "_links")]
    pub links: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentItem {
    pub id: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub title: String,
    pub status: Option<String>,
    pub version: Option<u64>,
    #[serde(rename = "_links")]
    pub links: serde_json::Value,
}
