//! Scoring policy: category caps, bucket boundaries and risk cutoffs.
//!
//! The built-in numbers live in the constants below. [`ScoringPolicy`] carries
//! the same table in a form the config file can override.

use crate::core::score::RiskLevel;
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// A step-function bucket: values `>= min` earn `points`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    pub min: f64,
    pub points: f64,
}

impl Tier {
    pub const fn new(min: f64, points: f64) -> Self {
        Self { min, points }
    }
}

/// Totals `>= min` classify as `level`; anything below every tier is `Avoid`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskTier {
    pub min: f64,
    pub level: RiskLevel,
}

impl RiskTier {
    pub const fn new(min: f64, level: RiskLevel) -> Self {
        Self { min, level }
    }
}

// Market potential (35)
pub const CHILDREN_SATURATION: f64 = 75_000.0;
pub const CHILDREN_POINTS: f64 = 20.0;
pub const INCOME_TIERS: [Tier; 3] = [
    Tier::new(150_000.0, 15.0),
    Tier::new(100_000.0, 12.0),
    Tier::new(80_000.0, 8.0),
];
pub const INCOME_FLOOR: f64 = 4.0;

// Financial viability (30)
pub const PROJECTED_ANNUAL_REVENUE: f64 = 1_800_000.0;
pub const DEFAULT_SQUARE_FOOTAGE: f64 = 15_000.0;
pub const RENT_RATIO_POINTS: f64 = 20.0;
pub const CHILDREN_PER_COMPETITOR_SATURATION: f64 = 5_000.0;
pub const SATURATION_POINTS: f64 = 10.0;

// Location quality (20)
pub const TRAFFIC_TIERS: [Tier; 2] = [Tier::new(50_000.0, 10.0), Tier::new(25_000.0, 7.0)];
pub const TRAFFIC_FLOOR: f64 = 4.0;
pub const GROCERY_ANCHOR_POINTS: f64 = 10.0;
pub const ANCHOR_POINTS: f64 = 6.0;
pub const NO_ANCHOR_POINTS: f64 = 2.0;

// Competition dynamics (15)
pub const STRONG_GAP_PHRASES: [&str; 3] = ["no current competitor", "no direct", "unique"];
pub const STRONG_GAP_POINTS: f64 = 8.0;
pub const MODERATE_GAP_PHRASES: [&str; 2] = ["gap", "limited"];
pub const MODERATE_GAP_POINTS: f64 = 6.0;
pub const GAP_FLOOR: f64 = 2.0;
pub const GAP_CAP: f64 = 10.0;
pub const PRICE_TIERS: [Tier; 3] = [
    Tier::new(180.0, 5.0),
    Tier::new(150.0, 4.0),
    Tier::new(120.0, 3.0),
];
pub const PRICE_FLOOR: f64 = 2.0;

pub const RISK_TIERS: [RiskTier; 4] = [
    RiskTier::new(90.0, RiskLevel::Exceptional),
    RiskTier::new(80.0, RiskLevel::Strong),
    RiskTier::new(70.0, RiskLevel::Viable),
    RiskTier::new(60.0, RiskLevel::HighRisk),
];

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringPolicy {
    pub market: MarketPolicy,
    pub financial: FinancialPolicy,
    pub location: LocationPolicy,
    pub competition: CompetitionPolicy,
    pub risk: RiskPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketPolicy {
    pub children_saturation: f64,
    pub children_points: f64,
    pub income_floor: f64,
    pub income_tiers: Vec<Tier>,
}

impl Default for MarketPolicy {
    fn default() -> Self {
        Self {
            children_saturation: CHILDREN_SATURATION,
            children_points: CHILDREN_POINTS,
            income_floor: INCOME_FLOOR,
            income_tiers: INCOME_TIERS.to_vec(),
        }
    }
}

impl MarketPolicy {
    pub fn income_max(&self) -> f64 {
        top_points(&self.income_tiers, self.income_floor)
    }

    pub fn max_points(&self) -> f64 {
        self.children_points + self.income_max()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinancialPolicy {
    pub projected_annual_revenue: f64,
    pub default_square_footage: f64,
    pub rent_ratio_points: f64,
    pub children_per_competitor_saturation: f64,
    pub saturation_points: f64,
}

impl Default for FinancialPolicy {
    fn default() -> Self {
        Self {
            projected_annual_revenue: PROJECTED_ANNUAL_REVENUE,
            default_square_footage: DEFAULT_SQUARE_FOOTAGE,
            rent_ratio_points: RENT_RATIO_POINTS,
            children_per_competitor_saturation: CHILDREN_PER_COMPETITOR_SATURATION,
            saturation_points: SATURATION_POINTS,
        }
    }
}

impl FinancialPolicy {
    pub fn max_points(&self) -> f64 {
        self.rent_ratio_points + self.saturation_points
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationPolicy {
    pub traffic_floor: f64,
    pub grocery_anchor_points: f64,
    pub anchor_points: f64,
    pub no_anchor_points: f64,
    pub traffic_tiers: Vec<Tier>,
}

impl Default for LocationPolicy {
    fn default() -> Self {
        Self {
            traffic_floor: TRAFFIC_FLOOR,
            grocery_anchor_points: GROCERY_ANCHOR_POINTS,
            anchor_points: ANCHOR_POINTS,
            no_anchor_points: NO_ANCHOR_POINTS,
            traffic_tiers: TRAFFIC_TIERS.to_vec(),
        }
    }
}

impl LocationPolicy {
    pub fn traffic_max(&self) -> f64 {
        top_points(&self.traffic_tiers, self.traffic_floor)
    }

    pub fn anchor_max(&self) -> f64 {
        self.grocery_anchor_points
            .max(self.anchor_points)
            .max(self.no_anchor_points)
    }

    pub fn max_points(&self) -> f64 {
        self.traffic_max() + self.anchor_max()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompetitionPolicy {
    pub strong_gap_phrases: Vec<String>,
    pub strong_gap_points: f64,
    pub moderate_gap_phrases: Vec<String>,
    pub moderate_gap_points: f64,
    pub gap_floor: f64,
    /// Declared maximum of the gap component; the best phrase bucket may sit below it.
    pub gap_cap: f64,
    pub price_floor: f64,
    pub price_tiers: Vec<Tier>,
}

impl Default for CompetitionPolicy {
    fn default() -> Self {
        Self {
            strong_gap_phrases: STRONG_GAP_PHRASES.iter().map(|p| p.to_string()).collect(),
            strong_gap_points: STRONG_GAP_POINTS,
            moderate_gap_phrases: MODERATE_GAP_PHRASES
                .iter()
                .map(|p| p.to_string())
                .collect(),
            moderate_gap_points: MODERATE_GAP_POINTS,
            gap_floor: GAP_FLOOR,
            gap_cap: GAP_CAP,
            price_floor: PRICE_FLOOR,
            price_tiers: PRICE_TIERS.to_vec(),
        }
    }
}

impl CompetitionPolicy {
    pub fn gap_max(&self) -> f64 {
        self.gap_cap
            .max(self.strong_gap_points)
            .max(self.moderate_gap_points)
            .max(self.gap_floor)
    }

    pub fn price_max(&self) -> f64 {
        top_points(&self.price_tiers, self.price_floor)
    }

    pub fn max_points(&self) -> f64 {
        self.gap_max() + self.price_max()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskPolicy {
    pub tiers: Vec<RiskTier>,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self {
            tiers: RISK_TIERS.to_vec(),
        }
    }
}

impl ScoringPolicy {
    pub fn max_points(&self) -> f64 {
        self.market.max_points()
            + self.financial.max_points()
            + self.location.max_points()
            + self.competition.max_points()
    }

    pub fn validate(&self) -> Result<()> {
        check_tiers("policy.market.income_tiers", &self.market.income_tiers)?;
        check_tiers("policy.location.traffic_tiers", &self.location.traffic_tiers)?;
        check_tiers("policy.competition.price_tiers", &self.competition.price_tiers)?;

        let risk_mins: Vec<f64> = self.risk.tiers.iter().map(|tier| tier.min).collect();
        check_descending("policy.risk.tiers", &risk_mins)?;

        check_positive(
            "policy.market.children_saturation",
            self.market.children_saturation,
        )?;
        check_positive(
            "policy.financial.projected_annual_revenue",
            self.financial.projected_annual_revenue,
        )?;
        check_positive(
            "policy.financial.default_square_footage",
            self.financial.default_square_footage,
        )?;
        check_positive(
            "policy.financial.children_per_competitor_saturation",
            self.financial.children_per_competitor_saturation,
        )?;

        let points = [
            ("policy.market.children_points", self.market.children_points),
            ("policy.market.income_floor", self.market.income_floor),
            (
                "policy.financial.rent_ratio_points",
                self.financial.rent_ratio_points,
            ),
            (
                "policy.financial.saturation_points",
                self.financial.saturation_points,
            ),
            ("policy.location.traffic_floor", self.location.traffic_floor),
            (
                "policy.location.grocery_anchor_points",
                self.location.grocery_anchor_points,
            ),
            ("policy.location.anchor_points", self.location.anchor_points),
            (
                "policy.location.no_anchor_points",
                self.location.no_anchor_points,
            ),
            (
                "policy.competition.strong_gap_points",
                self.competition.strong_gap_points,
            ),
            (
                "policy.competition.moderate_gap_points",
                self.competition.moderate_gap_points,
            ),
            ("policy.competition.gap_floor", self.competition.gap_floor),
            ("policy.competition.gap_cap", self.competition.gap_cap),
            ("policy.competition.price_floor", self.competition.price_floor),
        ];
        for (name, value) in points {
            check_non_negative(name, value)?;
        }

        Ok(())
    }
}

/// Points for the first tier (highest threshold first) that `value` reaches.
pub fn tier_points(tiers: &[Tier], value: f64, floor: f64) -> f64 {
    tiers
        .iter()
        .find(|tier| value >= tier.min)
        .map_or(floor, |tier| tier.points)
}

fn top_points(tiers: &[Tier], floor: f64) -> f64 {
    tiers.iter().map(|tier| tier.points).fold(floor, f64::max)
}

fn check_tiers(name: &str, tiers: &[Tier]) -> Result<()> {
    let mins: Vec<f64> = tiers.iter().map(|tier| tier.min).collect();
    check_descending(name, &mins)?;
    for tier in tiers {
        check_non_negative(name, tier.points)?;
    }
    Ok(())
}

fn check_descending(name: &str, mins: &[f64]) -> Result<()> {
    if mins.iter().any(|min| !min.is_finite()) {
        bail!("{name} contains a non-finite threshold");
    }
    if mins.windows(2).any(|pair| pair[0] <= pair[1]) {
        bail!("{name} must be listed from highest to lowest threshold");
    }
    Ok(())
}

fn check_positive(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        bail!("{name} must be a positive number (got {value})");
    }
    Ok(())
}

fn check_non_negative(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        bail!("{name} must not be negative (got {value})");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_caps_sum_to_one_hundred() {
        let policy = ScoringPolicy::default();
        assert_eq!(policy.market.max_points(), 35.0);
        assert_eq!(policy.financial.max_points(), 30.0);
        assert_eq!(policy.location.max_points(), 20.0);
        assert_eq!(policy.competition.max_points(), 15.0);
        assert_eq!(policy.max_points(), 100.0);
    }

    #[test]
    fn tier_lookup_is_inclusive_on_lower_bound() {
        assert_eq!(tier_points(&INCOME_TIERS, 150_000.0, INCOME_FLOOR), 15.0);
        assert_eq!(tier_points(&INCOME_TIERS, 149_999.0, INCOME_FLOOR), 12.0);
        assert_eq!(tier_points(&INCOME_TIERS, 80_000.0, INCOME_FLOOR), 8.0);
        assert_eq!(tier_points(&INCOME_TIERS, 0.0, INCOME_FLOOR), 4.0);
    }

    #[test]
    fn default_policy_validates() {
        assert!(ScoringPolicy::default().validate().is_ok());
    }

    #[test]
    fn rejects_ascending_tiers() {
        let mut policy = ScoringPolicy::default();
        policy.competition.price_tiers = vec![Tier::new(120.0, 3.0), Tier::new(180.0, 5.0)];
        let err = policy.validate().expect_err("ascending tiers should fail");
        assert!(err.to_string().contains("price_tiers"));
    }

    #[test]
    fn rejects_zero_revenue_benchmark() {
        let mut policy = ScoringPolicy::default();
        policy.financial.projected_annual_revenue = 0.0;
        assert!(policy.validate().is_err());
    }

    #[test]
    fn rejects_negative_points() {
        let mut policy = ScoringPolicy::default();
        policy.location.anchor_points = -1.0;
        assert!(policy.validate().is_err());
    }
}
