use crate::core::extract::{
    extract_currency_midpoint, extract_income_value, extract_max_price, extract_traffic_value,
};
use crate::core::location::{CoTenant, LocationRecord};
use crate::core::policy::{
    CompetitionPolicy, FinancialPolicy, LocationPolicy, MarketPolicy, RiskTier, ScoringPolicy,
    tier_points,
};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;

static DEFAULT_POLICY: Lazy<ScoringPolicy> = Lazy::new(ScoringPolicy::default);

/// Five-tier viability classification, ordered from worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(alias = "avoid")]
    Avoid,
    #[serde(rename = "High-Risk", alias = "high-risk", alias = "HighRisk")]
    HighRisk,
    #[serde(alias = "viable")]
    Viable,
    #[serde(alias = "strong")]
    Strong,
    #[serde(alias = "exceptional")]
    Exceptional,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 5] = [
        Self::Exceptional,
        Self::Strong,
        Self::Viable,
        Self::HighRisk,
        Self::Avoid,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Exceptional => "Exceptional",
            Self::Strong => "Strong",
            Self::Viable => "Viable",
            Self::HighRisk => "High-Risk",
            Self::Avoid => "Avoid",
        }
    }

    pub fn explanation(self) -> &'static str {
        match self {
            Self::Exceptional => "Outstanding opportunity with minimal risks across all categories",
            Self::Strong => "Solid opportunity with manageable risks and strong fundamentals",
            Self::Viable => "Acceptable opportunity with some concerns requiring monitoring",
            Self::HighRisk => {
                "Significant risks identified requiring specific mitigation strategies"
            }
            Self::Avoid => "Multiple high-risk factors make this location unsuitable",
        }
    }

    /// First tier whose threshold `total` reaches, checked top-down.
    pub fn for_score(total: f64, tiers: &[RiskTier]) -> Self {
        tiers
            .iter()
            .find(|tier| total >= tier.min)
            .map_or(Self::Avoid, |tier| tier.level)
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One scored input inside a category, with its declared maximum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Component {
    pub score: f64,
    pub max: f64,
}

impl Component {
    fn new(raw: f64, max: f64) -> Self {
        Self {
            score: round1(raw),
            max,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AnchorKind {
    Grocery,
    Anchor,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketPotential {
    pub score: f64,
    pub max: f64,
    pub percent: f64,
    pub child_population: Component,
    pub income: Component,
    pub children: f64,
    pub median_income: f64,
    #[serde(skip)]
    raw: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialViability {
    pub score: f64,
    pub max: f64,
    pub percent: f64,
    pub rent_ratio: Component,
    pub saturation: Component,
    pub rent_per_sqft: f64,
    pub square_footage: f64,
    pub annual_rent: f64,
    /// Annual rent over the revenue benchmark, as a percentage.
    pub rent_ratio_percent: f64,
    pub children_per_competitor: f64,
    #[serde(skip)]
    raw: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationQuality {
    pub score: f64,
    pub max: f64,
    pub percent: f64,
    pub traffic: Component,
    pub anchor: Component,
    pub daily_traffic: f64,
    pub anchor_kind: AnchorKind,
    #[serde(skip)]
    raw: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitionDynamics {
    pub score: f64,
    pub max: f64,
    pub percent: f64,
    pub gap: Component,
    pub pricing: Component,
    pub max_price: f64,
    #[serde(skip)]
    raw: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakdown {
    pub market_potential: MarketPotential,
    pub financial_viability: FinancialViability,
    pub location_quality: LocationQuality,
    pub competition_dynamics: CompetitionDynamics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    pub total_score: f64,
    pub risk_level: RiskLevel,
    pub breakdown: Breakdown,
    pub explanation: &'static str,
}

/// Scores a site with the built-in policy.
pub fn score_location(location: &LocationRecord) -> ScoreResult {
    score_location_with(location, &DEFAULT_POLICY)
}

/// Scores a site with the given policy. Pure and total: missing or malformed
/// fields fall back to their floors.
pub fn score_location_with(location: &LocationRecord, policy: &ScoringPolicy) -> ScoreResult {
    let market_potential = market_potential(location, &policy.market);
    let financial_viability = financial_viability(location, &policy.financial);
    let location_quality = location_quality(location, &policy.location);
    let competition_dynamics = competition_dynamics(location, &policy.competition);

    let total_score = round1(
        market_potential.raw
            + financial_viability.raw
            + location_quality.raw
            + competition_dynamics.raw,
    );
    let risk_level = RiskLevel::for_score(total_score, &policy.risk.tiers);

    ScoreResult {
        total_score,
        risk_level,
        breakdown: Breakdown {
            market_potential,
            financial_viability,
            location_quality,
            competition_dynamics,
        },
        explanation: risk_level.explanation(),
    }
}

pub fn market_potential(location: &LocationRecord, policy: &MarketPolicy) -> MarketPotential {
    let children = location.children();
    let child_points = clamp_points(
        children / policy.children_saturation * policy.children_points,
        policy.children_points,
    );

    let median_income = extract_income_value(location.income_text());
    let income_max = policy.income_max();
    let income_points = clamp_points(
        tier_points(&policy.income_tiers, median_income, policy.income_floor),
        income_max,
    );

    let raw = child_points + income_points;
    let max = policy.max_points();
    MarketPotential {
        score: round1(raw),
        max,
        percent: percent(raw, max),
        child_population: Component::new(child_points, policy.children_points),
        income: Component::new(income_points, income_max),
        children,
        median_income,
        raw,
    }
}

pub fn financial_viability(
    location: &LocationRecord,
    policy: &FinancialPolicy,
) -> FinancialViability {
    let rent_per_sqft = extract_currency_midpoint(location.rent_text());
    let square_footage = location.square_footage_or(policy.default_square_footage);
    let annual_rent = rent_per_sqft * square_footage;
    let rent_ratio = annual_rent / policy.projected_annual_revenue;
    let rent_points = clamp_points(
        policy.rent_ratio_points - rent_ratio * 100.0,
        policy.rent_ratio_points,
    );

    let children = location.children();
    let competitors = location.competitor_count();
    let children_per_competitor = if competitors > 0 {
        children / f64::from(competitors)
    } else {
        children
    };
    let saturation_points = clamp_points(
        children_per_competitor / policy.children_per_competitor_saturation
            * policy.saturation_points,
        policy.saturation_points,
    );

    let raw = rent_points + saturation_points;
    let max = policy.max_points();
    FinancialViability {
        score: round1(raw),
        max,
        percent: percent(raw, max),
        rent_ratio: Component::new(rent_points, policy.rent_ratio_points),
        saturation: Component::new(saturation_points, policy.saturation_points),
        rent_per_sqft,
        square_footage,
        annual_rent: round1(annual_rent),
        rent_ratio_percent: round1(rent_ratio * 100.0),
        children_per_competitor: round1(children_per_competitor),
        raw,
    }
}

pub fn location_quality(location: &LocationRecord, policy: &LocationPolicy) -> LocationQuality {
    let daily_traffic = extract_traffic_value(location.traffic_text());
    let traffic_max = policy.traffic_max();
    let traffic_points = clamp_points(
        tier_points(&policy.traffic_tiers, daily_traffic, policy.traffic_floor),
        traffic_max,
    );

    let anchor_kind = classify_anchor(location.anchor_text(), &location.co_tenants);
    let anchor_points = match anchor_kind {
        AnchorKind::Grocery => policy.grocery_anchor_points,
        AnchorKind::Anchor => policy.anchor_points,
        AnchorKind::None => policy.no_anchor_points,
    };

    let raw = traffic_points + anchor_points;
    let max = policy.max_points();
    LocationQuality {
        score: round1(raw),
        max,
        percent: percent(raw, max),
        traffic: Component::new(traffic_points, traffic_max),
        anchor: Component::new(anchor_points, policy.anchor_max()),
        daily_traffic,
        anchor_kind,
        raw,
    }
}

pub fn competition_dynamics(
    location: &LocationRecord,
    policy: &CompetitionPolicy,
) -> CompetitionDynamics {
    let gap_points = clamp_points(
        gap_points(location.market_gap_text(), policy),
        policy.gap_max(),
    );

    let max_price = extract_max_price(location.price_range_text());
    let price_max = policy.price_max();
    let pricing_points = clamp_points(
        tier_points(&policy.price_tiers, max_price, policy.price_floor),
        price_max,
    );

    let raw = gap_points + pricing_points;
    let max = policy.max_points();
    CompetitionDynamics {
        score: round1(raw),
        max,
        percent: percent(raw, max),
        gap: Component::new(gap_points, policy.gap_max()),
        pricing: Component::new(pricing_points, price_max),
        max_price,
        raw,
    }
}

fn classify_anchor(anchor_text: &str, tenants: &[CoTenant]) -> AnchorKind {
    if anchor_text.to_lowercase().contains("grocery")
        || tenants.iter().any(CoTenant::is_grocery_anchor)
    {
        AnchorKind::Grocery
    } else if !anchor_text.trim().is_empty() || tenants.iter().any(CoTenant::is_anchor) {
        AnchorKind::Anchor
    } else {
        AnchorKind::None
    }
}

fn gap_points(gap_text: &str, policy: &CompetitionPolicy) -> f64 {
    let lowered = gap_text.to_lowercase();
    let mentions = |phrases: &[String]| {
        phrases
            .iter()
            .any(|phrase| !phrase.is_empty() && lowered.contains(&phrase.to_lowercase()))
    };

    if mentions(&policy.strong_gap_phrases) {
        policy.strong_gap_points
    } else if mentions(&policy.moderate_gap_phrases) {
        policy.moderate_gap_points
    } else {
        policy.gap_floor
    }
}

fn clamp_points(value: f64, max: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, max)
}

fn percent(raw: f64, max: f64) -> f64 {
    if max > 0.0 {
        round1(raw / max * 100.0)
    } else {
        0.0
    }
}

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::policy::{RISK_TIERS, Tier};
    use serde_json::json;

    fn record(value: serde_json::Value) -> LocationRecord {
        serde_json::from_value(value).expect("record should deserialize")
    }

    fn ashburn() -> LocationRecord {
        record(json!({
            "name": "Ashburn",
            "status": "Planned",
            "childrenInTradeArea": 54088,
            "medianHouseholdIncome": "approximately $150–$200K",
            "baseRentText": "$23.08/sqft",
            "squareFootage": 19555,
            "directCompetitorCount": 6,
            "dailyTrafficText": "~89,000 vehicles/day",
            "coAnchorText": "busy Harris Teeter grocery",
            "marketGapText": "no competitor offering the same comprehensive program under one roof",
            "membershipPriceRangeText": "roughly from $120 to $180 per month"
        }))
    }

    #[test]
    fn scores_reference_site() {
        let result = score_location(&ashburn());
        let breakdown = &result.breakdown;

        assert_eq!(breakdown.market_potential.child_population.score, 14.4);
        assert_eq!(breakdown.market_potential.income.score, 15.0);
        assert_eq!(breakdown.market_potential.median_income, 175_000.0);
        assert_eq!(breakdown.market_potential.score, 29.4);

        assert_eq!(breakdown.financial_viability.rent_ratio_percent, 25.1);
        assert_eq!(breakdown.financial_viability.rent_ratio.score, 0.0);
        assert_eq!(breakdown.financial_viability.children_per_competitor, 9014.7);
        assert_eq!(breakdown.financial_viability.saturation.score, 10.0);
        assert_eq!(breakdown.financial_viability.score, 10.0);

        assert_eq!(breakdown.location_quality.traffic.score, 10.0);
        assert_eq!(breakdown.location_quality.anchor.score, 10.0);
        assert_eq!(breakdown.location_quality.anchor_kind, AnchorKind::Grocery);
        assert_eq!(breakdown.location_quality.score, 20.0);

        // "no competitor" is not one of the strong phrases
        assert_eq!(breakdown.competition_dynamics.gap.score, 2.0);
        assert_eq!(breakdown.competition_dynamics.max_price, 180.0);
        assert_eq!(breakdown.competition_dynamics.pricing.score, 5.0);
        assert_eq!(breakdown.competition_dynamics.score, 7.0);

        assert_eq!(result.total_score, 66.4);
        assert_eq!(result.risk_level, RiskLevel::HighRisk);
        assert_eq!(
            result.explanation,
            "Significant risks identified requiring specific mitigation strategies"
        );
    }

    #[test]
    fn scoring_is_deterministic_and_leaves_input_untouched() {
        let site = ashburn();
        let before = site.clone();
        let first = score_location(&site);
        let second = score_location(&site);
        assert_eq!(first, second);
        assert_eq!(site, before);
    }

    #[test]
    fn empty_record_scores_floors() {
        let result = score_location(&LocationRecord::default());
        let breakdown = &result.breakdown;

        assert_eq!(breakdown.market_potential.score, 4.0);
        // no rent text means no rent burden
        assert_eq!(breakdown.financial_viability.rent_ratio.score, 20.0);
        assert_eq!(breakdown.financial_viability.saturation.score, 0.0);
        assert_eq!(breakdown.location_quality.score, 6.0);
        assert_eq!(breakdown.competition_dynamics.score, 4.0);
        assert_eq!(result.total_score, 34.0);
        assert_eq!(result.risk_level, RiskLevel::Avoid);
    }

    #[test]
    fn zero_competitors_credit_full_population() {
        let site = record(json!({
            "childrenInTradeArea": 3000,
            "directCompetitorCount": 0
        }));
        let financial = score_location(&site).breakdown.financial_viability;
        assert_eq!(financial.children_per_competitor, 3000.0);
        assert_eq!(financial.saturation.score, 6.0);
    }

    #[test]
    fn child_population_is_monotonic_then_flat() {
        let policy = MarketPolicy::default();
        let mut previous = 0.0;
        for children in (0..=100_000).step_by(5_000) {
            let site = record(json!({ "childrenInTradeArea": children }));
            let score = market_potential(&site, &policy).child_population.score;
            assert!(score >= previous, "dropped at {children}");
            if children >= 75_000 {
                assert_eq!(score, 20.0);
            }
            previous = score;
        }
    }

    #[test]
    fn income_buckets_are_inclusive() {
        let policy = MarketPolicy::default();
        let cases = [
            ("$150,000", 15.0),
            ("$149,999", 12.0),
            ("$100K", 12.0),
            ("$80,000", 8.0),
            ("$79,999", 4.0),
            ("not reported", 4.0),
        ];
        for (text, expected) in cases {
            let site = record(json!({ "medianHouseholdIncome": text }));
            assert_eq!(market_potential(&site, &policy).income.score, expected, "{text}");
        }
    }

    #[test]
    fn rent_ratio_costs_one_point_per_percent() {
        let policy = FinancialPolicy::default();
        // 18 * 10000 = 180000 -> 10% of the benchmark
        let site = record(json!({ "baseRentText": "$18/sqft", "squareFootage": 10000 }));
        let financial = financial_viability(&site, &policy);
        assert_eq!(financial.rent_ratio_percent, 10.0);
        assert_eq!(financial.rent_ratio.score, 10.0);

        let default_sqft = record(json!({ "baseRentText": "$12/sqft" }));
        let financial = financial_viability(&default_sqft, &policy);
        assert_eq!(financial.square_footage, 15_000.0);
        assert_eq!(financial.rent_ratio.score, 10.0);
    }

    #[test]
    fn traffic_buckets() {
        let policy = LocationPolicy::default();
        let cases = [
            ("50,000 vehicles/day", 10.0),
            ("49,999 vehicles/day", 7.0),
            ("25K vehicles per day", 7.0),
            ("12,000 vehicles", 4.0),
            ("heavy", 4.0),
        ];
        for (text, expected) in cases {
            let site = record(json!({ "dailyTrafficText": text }));
            assert_eq!(location_quality(&site, &policy).traffic.score, expected, "{text}");
        }
    }

    #[test]
    fn anchor_detection_prefers_grocery() {
        let policy = LocationPolicy::default();

        let tenant_grocery = record(json!({
            "coTenants": [{ "type": "grocery", "role": "anchor" }]
        }));
        assert_eq!(location_quality(&tenant_grocery, &policy).anchor.score, 10.0);

        let text_anchor = record(json!({ "coAnchorText": "Target" }));
        assert_eq!(location_quality(&text_anchor, &policy).anchor.score, 6.0);

        let tenant_anchor = record(json!({
            "coTenants": [{ "type": "grocery", "role": "inline" }, { "type": "retail", "role": "anchor" }]
        }));
        assert_eq!(location_quality(&tenant_anchor, &policy).anchor.score, 6.0);

        let nothing = record(json!({ "coTenants": [{ "type": "cafe", "role": "inline" }] }));
        assert_eq!(location_quality(&nothing, &policy).anchor.score, 2.0);
    }

    #[test]
    fn gap_phrases_match_case_insensitively() {
        let policy = CompetitionPolicy::default();
        let cases = [
            ("No Current Competitor in the trade area", 8.0),
            ("no direct rivals", 8.0),
            ("A UNIQUE concept", 8.0),
            ("clear gap for indoor play", 6.0),
            ("Limited options", 6.0),
            ("crowded market", 2.0),
            ("", 2.0),
        ];
        for (text, expected) in cases {
            let site = record(json!({ "marketGapText": text }));
            assert_eq!(competition_dynamics(&site, &policy).gap.score, expected, "{text}");
        }
    }

    #[test]
    fn pricing_power_buckets() {
        let policy = CompetitionPolicy::default();
        let cases = [
            ("$120 to $180", 5.0),
            ("$150-$179", 4.0),
            ("$99 to $120", 3.0),
            ("$99", 2.0),
            ("", 2.0),
        ];
        for (text, expected) in cases {
            let site = record(json!({ "membershipPriceRangeText": text }));
            assert_eq!(
                competition_dynamics(&site, &policy).pricing.score,
                expected,
                "{text}"
            );
        }
    }

    #[test]
    fn risk_thresholds_have_no_off_by_one() {
        assert_eq!(RiskLevel::for_score(100.0, &RISK_TIERS), RiskLevel::Exceptional);
        assert_eq!(RiskLevel::for_score(90.0, &RISK_TIERS), RiskLevel::Exceptional);
        assert_eq!(RiskLevel::for_score(89.9, &RISK_TIERS), RiskLevel::Strong);
        assert_eq!(RiskLevel::for_score(80.0, &RISK_TIERS), RiskLevel::Strong);
        assert_eq!(RiskLevel::for_score(79.9, &RISK_TIERS), RiskLevel::Viable);
        assert_eq!(RiskLevel::for_score(70.0, &RISK_TIERS), RiskLevel::Viable);
        assert_eq!(RiskLevel::for_score(69.9, &RISK_TIERS), RiskLevel::HighRisk);
        assert_eq!(RiskLevel::for_score(60.0, &RISK_TIERS), RiskLevel::HighRisk);
        assert_eq!(RiskLevel::for_score(59.9, &RISK_TIERS), RiskLevel::Avoid);
        assert_eq!(RiskLevel::for_score(0.0, &RISK_TIERS), RiskLevel::Avoid);
    }

    #[test]
    fn classifies_the_rounded_total() {
        let site = record(json!({
            "childrenInTradeArea": 74850,
            "medianHouseholdIncome": "$210,000",
            "directCompetitorCount": 2,
            "dailyTrafficText": "60,000 vehicles/day",
            "coAnchorText": "Wegmans grocery",
            "marketGapText": "crowded market",
            "membershipPriceRangeText": "$99 to $120"
        }));
        let result = score_location_with(&site, &ScoringPolicy::default());

        let raw = result.breakdown.market_potential.raw
            + result.breakdown.financial_viability.raw
            + result.breakdown.location_quality.raw
            + result.breakdown.competition_dynamics.raw;
        assert!((raw - 89.96).abs() < 1e-9, "raw total {raw}");
        assert_eq!(RiskLevel::for_score(raw, &RISK_TIERS), RiskLevel::Strong);

        assert_eq!(result.total_score, 90.0);
        assert_eq!(result.risk_level, RiskLevel::Exceptional);
        assert_eq!(result.breakdown.market_potential.child_population.score, 20.0);
    }

    #[test]
    fn best_case_site_reaches_exactly_one_hundred() {
        let site = record(json!({
            "childrenInTradeArea": 90000,
            "medianHouseholdIncome": "$210,000",
            "baseRentText": "",
            "directCompetitorCount": 2,
            "dailyTrafficText": "60,000 vehicles/day",
            "coAnchorText": "Wegmans grocery",
            "marketGapText": "unique concept",
            "membershipPriceRangeText": "$150 to $220"
        }));
        let result = score_location(&site);
        // the best phrase bucket is 8 of the 10-point gap cap
        assert_eq!(result.total_score, 98.0);
        assert_eq!(result.risk_level, RiskLevel::Exceptional);

        let mut policy = ScoringPolicy::default();
        policy.competition.strong_gap_points = 10.0;
        let result = score_location_with(&site, &policy);
        assert_eq!(result.total_score, 100.0);
    }

    #[test]
    fn total_stays_within_bounds_for_extreme_inputs() {
        let sites = [
            record(json!({
                "childrenInTradeArea": 1e12,
                "medianHouseholdIncome": "999999999999999999999999",
                "baseRentText": "-5",
                "squareFootage": 1e9,
                "directCompetitorCount": 1
            })),
            record(json!({
                "childrenInTradeArea": -20,
                "baseRentText": "$9999999k/sqft",
                "directCompetitorCount": 4294967296u64
            })),
        ];
        for site in &sites {
            let result = score_location(site);
            assert!((0.0..=100.0).contains(&result.total_score));
            assert_eq!(
                result.risk_level,
                RiskLevel::for_score(result.total_score, &RISK_TIERS)
            );
        }
    }

    #[test]
    fn breakdown_carries_percentages_for_bars() {
        let result = score_location(&ashburn());
        let breakdown = &result.breakdown;
        assert_eq!(breakdown.market_potential.max, 35.0);
        assert_eq!(breakdown.market_potential.percent, 84.1);
        assert_eq!(breakdown.financial_viability.percent, 33.3);
        assert_eq!(breakdown.location_quality.percent, 100.0);
        assert_eq!(breakdown.competition_dynamics.max, 15.0);
        assert_eq!(breakdown.competition_dynamics.percent, 46.7);
    }

    #[test]
    fn configured_tiers_change_buckets() {
        let mut policy = ScoringPolicy::default();
        policy.competition.price_tiers = vec![Tier::new(200.0, 5.0), Tier::new(100.0, 3.0)];
        let result = score_location_with(&ashburn(), &policy);
        assert_eq!(result.breakdown.competition_dynamics.pricing.score, 3.0);
    }

    #[test]
    fn risk_level_serializes_as_label() {
        let value = serde_json::to_value(RiskLevel::HighRisk).expect("serialize risk level");
        assert_eq!(value, json!("High-Risk"));
        let parsed: RiskLevel = serde_json::from_value(json!("viable")).expect("parse alias");
        assert_eq!(parsed, RiskLevel::Viable);
    }
}
