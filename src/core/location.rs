//! Site record as it arrives from the research fixtures.
//!
//! Every field is optional and leniently typed: a value of the wrong shape is
//! read as absent instead of failing the whole record. Fields that can come
//! from more than one place are resolved by the accessor methods, each of
//! which lists its sources in priority order.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LocationStatus {
    Existing,
    #[default]
    Planned,
}

impl LocationStatus {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "existing" | "open" | "operating" => Some(Self::Existing),
            "planned" | "proposed" | "candidate" => Some(Self::Planned),
            _ => None,
        }
    }
}

impl fmt::Display for LocationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Existing => write!(f, "Existing"),
            Self::Planned => write!(f, "Planned"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CoTenant {
    #[serde(rename = "type", deserialize_with = "lenient_text")]
    pub kind: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub role: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub name: Option<String>,
}

impl CoTenant {
    pub fn is_anchor(&self) -> bool {
        self.role
            .as_deref()
            .is_some_and(|role| role.trim().eq_ignore_ascii_case("anchor"))
    }

    pub fn is_grocery_anchor(&self) -> bool {
        self.is_anchor()
            && self
                .kind
                .as_deref()
                .is_some_and(|kind| kind.trim().eq_ignore_ascii_case("grocery"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PopulationBreakdown {
    #[serde(deserialize_with = "lenient_number")]
    pub total: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub children: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Demographics {
    #[serde(deserialize_with = "lenient_number")]
    pub children_in_trade_area: Option<f64>,
    #[serde(deserialize_with = "lenient_text")]
    pub median_household_income: Option<String>,
    #[serde(deserialize_with = "lenient_nested")]
    pub population: Option<PopulationBreakdown>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SiteDetails {
    #[serde(deserialize_with = "lenient_text")]
    pub daily_traffic: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompetitionDetails {
    #[serde(deserialize_with = "lenient_text")]
    pub market_gap: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LocationRecord {
    #[serde(deserialize_with = "lenient_text")]
    pub id: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub address: Option<String>,
    #[serde(deserialize_with = "lenient_status")]
    pub status: Option<LocationStatus>,

    #[serde(deserialize_with = "lenient_number")]
    pub children_in_trade_area: Option<f64>,
    #[serde(deserialize_with = "lenient_text")]
    pub median_household_income: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub base_rent_text: Option<String>,
    #[serde(deserialize_with = "lenient_number")]
    pub square_footage: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub direct_competitor_count: Option<f64>,
    #[serde(deserialize_with = "lenient_text")]
    pub daily_traffic_text: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub co_anchor_text: Option<String>,
    #[serde(deserialize_with = "lenient_tenants")]
    pub co_tenants: Vec<CoTenant>,
    #[serde(deserialize_with = "lenient_text")]
    pub market_gap_text: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub membership_price_range_text: Option<String>,

    #[serde(deserialize_with = "lenient_nested")]
    pub demographics: Option<Demographics>,
    #[serde(deserialize_with = "lenient_nested")]
    pub site_details: Option<SiteDetails>,
    #[serde(deserialize_with = "lenient_nested")]
    pub competition: Option<CompetitionDetails>,
}

impl LocationRecord {
    /// `childrenInTradeArea`, then `demographics.childrenInTradeArea`, then
    /// `demographics.population.children`. Absent resolves to 0.
    pub fn children(&self) -> f64 {
        let demographics = self.demographics.as_ref();
        first_number([
            self.children_in_trade_area,
            demographics.and_then(|d| d.children_in_trade_area),
            demographics
                .and_then(|d| d.population.as_ref())
                .and_then(|p| p.children),
        ])
        .unwrap_or(0.0)
    }

    /// `medianHouseholdIncome`, then `demographics.medianHouseholdIncome`.
    pub fn income_text(&self) -> &str {
        first_text([
            self.median_household_income.as_deref(),
            self.demographics
                .as_ref()
                .and_then(|d| d.median_household_income.as_deref()),
        ])
    }

    pub fn rent_text(&self) -> &str {
        first_text([self.base_rent_text.as_deref()])
    }

    /// Stated square footage; zero or absent falls back to `default`.
    pub fn square_footage_or(&self, default: f64) -> f64 {
        first_number([self.square_footage])
            .filter(|sqft| *sqft > 0.0)
            .unwrap_or(default)
    }

    /// Whole number of direct competitors; absent means none.
    pub fn competitor_count(&self) -> u32 {
        first_number([self.direct_competitor_count])
            .map_or(0, |count| count.floor().min(f64::from(u32::MAX)) as u32)
    }

    /// `dailyTrafficText`, then `siteDetails.dailyTraffic`.
    pub fn traffic_text(&self) -> &str {
        first_text([
            self.daily_traffic_text.as_deref(),
            self.site_details
                .as_ref()
                .and_then(|s| s.daily_traffic.as_deref()),
        ])
    }

    pub fn anchor_text(&self) -> &str {
        first_text([self.co_anchor_text.as_deref()])
    }

    /// `marketGapText`, then `competition.marketGap`.
    pub fn market_gap_text(&self) -> &str {
        first_text([
            self.market_gap_text.as_deref(),
            self.competition
                .as_ref()
                .and_then(|c| c.market_gap.as_deref()),
        ])
    }

    pub fn price_range_text(&self) -> &str {
        first_text([self.membership_price_range_text.as_deref()])
    }

    pub fn status(&self) -> LocationStatus {
        self.status.unwrap_or_default()
    }

    pub fn is_planned(&self) -> bool {
        self.status() == LocationStatus::Planned
    }

    pub fn display_name(&self) -> Option<&str> {
        first_text_opt([self.name.as_deref(), self.id.as_deref()])
    }
}

fn first_text<'a, const N: usize>(candidates: [Option<&'a str>; N]) -> &'a str {
    first_text_opt(candidates).unwrap_or("")
}

fn first_text_opt<'a, const N: usize>(candidates: [Option<&'a str>; N]) -> Option<&'a str> {
    candidates
        .into_iter()
        .flatten()
        .find(|text| !text.trim().is_empty())
}

fn first_number<const N: usize>(candidates: [Option<f64>; N]) -> Option<f64> {
    candidates
        .into_iter()
        .flatten()
        .find(|value| value.is_finite() && *value >= 0.0)
}

fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) => raw.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    }
    .filter(|number| number.is_finite())
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from_value))
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}

fn lenient_status<'de, D>(deserializer: D) -> Result<Option<LocationStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = lenient_text(deserializer)?;
    Ok(text.as_deref().and_then(LocationStatus::parse))
}

fn lenient_nested<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| serde_json::from_value(value).ok()))
}

fn lenient_tenants<'de, D>(deserializer: D) -> Result<Vec<CoTenant>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let Some(Value::Array(items)) = value else {
        return Ok(Vec::new());
    };

    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}
