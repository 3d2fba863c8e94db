use serde::{Deserialize, Serialize};

/// Community record stored in Redis under `community:{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Community {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Community {
    pub fn url(&self, app_url: &str) -> String {
        format!("{}/c/{}", app_url, self.slug)
    }
}
