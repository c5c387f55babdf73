//! Remote data hydration
//!
//! Fetches the company-data payload and writes its values into elements
//! carrying a bind attribute, e.g. `data-bind="benefits.cost_reduction"` or
//! `data-bind="achievements.0.title"`. Every field is optional; paths that
//! do not resolve to a scalar leave their element untouched.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use square_platform::Page;

use crate::error::{InteractError, Result};

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// The company-data payload
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CompanyData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem_statement: Option<String>,
    pub achievements: Vec<Achievement>,
    pub team_members: Vec<TeamMember>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_data: Option<MarketData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benefits: Option<Benefits>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Achievement {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TeamMember {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MarketData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_addressable_market: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serviceable_addressable_market: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serviceable_obtainable_market: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Benefits {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_reduction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy_reduction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carbon_reduction: Option<String>,
}

impl CompanyData {
    /// Decode a payload
    ///
    /// The body must be a JSON object. Each top-level section decodes on its
    /// own: a null or mistyped section is logged and skipped while the other
    /// sections still bind.
    pub fn from_json(body: &str) -> Result<Self> {
        let mut map = match serde_json::from_str::<Value>(body)? {
            Value::Object(map) => map,
            other => {
                return Err(InteractError::Decode(serde::de::Error::custom(format!(
                    "expected a JSON object, found {}",
                    kind_of(&other)
                ))))
            }
        };
        Ok(Self {
            problem_statement: section(&mut map, "problem_statement"),
            achievements: section(&mut map, "achievements").unwrap_or_default(),
            team_members: section(&mut map, "team_members").unwrap_or_default(),
            market_data: section(&mut map, "market_data"),
            benefits: section(&mut map, "benefits"),
        })
    }

    /// Resolve a dotted bind path to display text
    ///
    /// Array elements are addressed by index. Objects, arrays and nulls have
    /// no text.
    pub fn lookup(&self, path: &str) -> Option<String> {
        let value = serde_json::to_value(self).ok()?;
        lookup_path(&value, path)
    }
}

fn section<T: DeserializeOwned>(map: &mut Map<String, Value>, key: &str) -> Option<T> {
    let value = map.remove(key).filter(|v| !v.is_null())?;
    match serde_json::from_value(value) {
        Ok(decoded) => Some(decoded),
        Err(err) => {
            tracing::warn!("skipping company data section '{}': {}", key, err);
            None
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn lookup_path(root: &Value, path: &str) -> Option<String> {
    let mut current = root;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    match current {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Where company data comes from
#[async_trait::async_trait]
pub trait DataSource: Send + Sync {
    /// Human-readable origin for logs
    fn describe(&self) -> String;

    /// Fetch and decode the payload
    async fn fetch(&self) -> Result<CompanyData>;
}

/// Fetches company data over HTTP
pub struct HttpDataSource {
    client: Client,
    url: String,
}

impl HttpDataSource {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self::with_client(client, url))
    }

    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Source for the configured endpoint on `origin`
    pub fn for_origin(origin: &str, endpoint: &str) -> Result<Self> {
        Self::new(format!("{}{}", origin.trim_end_matches('/'), endpoint))
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl DataSource for HttpDataSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn fetch(&self) -> Result<CompanyData> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(InteractError::Status(status.as_u16()));
        }
        let body = response.text().await?;
        CompanyData::from_json(&body)
    }
}

/// Write payload values into bound elements
///
/// Returns the number of elements updated.
pub fn apply_company_data(page: &dyn Page, data: &CompanyData, bind_attribute: &str) -> usize {
    let value = match serde_json::to_value(data) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!("company data could not be bound: {}", err);
            return 0;
        }
    };

    let selector = format!("[{}]", bind_attribute);
    let mut updated = 0;
    for element in page.query_all(&selector) {
        let Some(path) = page.attribute(element, bind_attribute) else {
            continue;
        };
        match lookup_path(&value, path.trim()) {
            Some(text) => {
                page.set_text(element, &text);
                updated += 1;
            }
            None => tracing::debug!("no company data for bind path {:?}", path),
        }
    }
    updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use square_platform::MemoryPage;

    const PAYLOAD: &str = r#"{
        "problem_statement": "Last-mile delivery accounts for 53% of total shipping costs.",
        "achievements": [
            {"title": "NVIDIA Inception Program", "description": "Selected member", "url": "https://example.com"}
        ],
        "team_members": [{"role": "CEO", "url": "https://example.com/ceo"}],
        "market_data": {
            "total_addressable_market": "$500M",
            "serviceable_addressable_market": "$200M",
            "serviceable_obtainable_market": "$15M"
        },
        "benefits": {"cost_reduction": "70%", "energy_reduction": "80%", "carbon_reduction": "90%"}
    }"#;

    fn bound_page() -> (MemoryPage, Vec<square_platform::ElementId>) {
        let page = MemoryPage::new("/");
        let paths = [
            "benefits.cost_reduction",
            "market_data.total_addressable_market",
            "achievements.0.title",
            "team_members.0.role",
            "problem_statement",
            "achievements.3.title",
        ];
        let els = paths
            .iter()
            .map(|p| page.build("span").attr("data-bind", p).text("--").finish())
            .collect();
        (page, els)
    }

    #[test]
    fn test_full_payload_binds() {
        let (page, els) = bound_page();
        let data = CompanyData::from_json(PAYLOAD).unwrap();
        assert_eq!(apply_company_data(&page, &data, "data-bind"), 5);
        assert_eq!(page.text(els[0]), "70%");
        assert_eq!(page.text(els[1]), "$500M");
        assert_eq!(page.text(els[2]), "NVIDIA Inception Program");
        assert_eq!(page.text(els[3]), "CEO");
        assert!(page.text(els[4]).starts_with("Last-mile"));
        // Out-of-range index is left alone
        assert_eq!(page.text(els[5]), "--");
    }

    #[test]
    fn test_empty_payload_is_harmless() {
        let (page, els) = bound_page();
        let data = CompanyData::from_json("{}").unwrap();
        assert_eq!(data, CompanyData::default());
        assert_eq!(apply_company_data(&page, &data, "data-bind"), 0);
        for el in els {
            assert_eq!(page.text(el), "--");
        }
    }

    #[test]
    fn test_partial_sections() {
        let data = CompanyData::from_json(r#"{"benefits": {"energy_reduction": "80%"}}"#).unwrap();
        assert_eq!(data.lookup("benefits.energy_reduction").as_deref(), Some("80%"));
        assert_eq!(data.lookup("benefits.cost_reduction"), None);
        assert_eq!(data.lookup("benefits"), None);
    }

    #[test]
    fn test_malformed_payload_is_an_error() {
        assert!(matches!(
            CompanyData::from_json("[1, 2]"),
            Err(InteractError::Decode(_))
        ));
        assert!(CompanyData::from_json("not json").is_err());
    }

    #[test]
    fn test_bad_section_does_not_spoil_the_rest() {
        let (page, els) = bound_page();
        let data = CompanyData::from_json(
            r#"{"achievements": null, "market_data": 7, "benefits": {"cost_reduction": "70%"}}"#,
        )
        .unwrap();
        assert!(data.achievements.is_empty());
        assert_eq!(data.market_data, None);
        assert_eq!(apply_company_data(&page, &data, "data-bind"), 1);
        assert_eq!(page.text(els[0]), "70%");
        assert_eq!(page.text(els[1]), "--");

        let data = CompanyData::from_json(
            r#"{"achievements": [{"description": "no title"}], "team_members": [{"role": "CEO"}]}"#,
        )
        .unwrap();
        assert!(data.achievements.is_empty());
        assert_eq!(data.lookup("team_members.0.role").as_deref(), Some("CEO"));
    }

    #[test]
    fn test_lookup_path_scalars() {
        let value = serde_json::json!({"a": [{"n": 3}, {"flag": true}]});
        assert_eq!(lookup_path(&value, "a.0.n").as_deref(), Some("3"));
        assert_eq!(lookup_path(&value, "a.1.flag").as_deref(), Some("true"));
        assert_eq!(lookup_path(&value, "a.x"), None);
    }
}
