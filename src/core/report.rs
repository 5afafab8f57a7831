use crate::config::Config;
use crate::core::location::LocationStatus;
use crate::core::score::{Component, RiskLevel, ScoreResult};
use colored::Colorize;
use serde::Serialize;

impl RiskLevel {
    fn colored(self) -> String {
        let label = self.label();
        match self {
            Self::Exceptional => label.green().bold().to_string(),
            Self::Strong => label.green().to_string(),
            Self::Viable => label.yellow().bold().to_string(),
            Self::HighRisk => label.red().to_string(),
            Self::Avoid => label.red().bold().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredLocation {
    pub name: String,
    pub file: String,
    pub status: LocationStatus,
    pub result: ScoreResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadError {
    pub file: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Counts {
    pub exceptional: usize,
    pub strong: usize,
    pub viable: usize,
    pub high_risk: usize,
    pub avoid: usize,
    pub total: usize,
}

impl Counts {
    pub fn from_locations(locations: &[ScoredLocation]) -> Self {
        let mut counts = Self::default();
        for location in locations {
            match location.result.risk_level {
                RiskLevel::Exceptional => counts.exceptional += 1,
                RiskLevel::Strong => counts.strong += 1,
                RiskLevel::Viable => counts.viable += 1,
                RiskLevel::HighRisk => counts.high_risk += 1,
                RiskLevel::Avoid => counts.avoid += 1,
            }
        }
        counts.total = locations.len();
        counts
    }

    pub fn for_level(&self, level: RiskLevel) -> usize {
        match level {
            RiskLevel::Exceptional => self.exceptional,
            RiskLevel::Strong => self.strong,
            RiskLevel::Viable => self.viable,
            RiskLevel::HighRisk => self.high_risk,
            RiskLevel::Avoid => self.avoid,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExitStatus {
    pub ok: bool,
    pub reasons: Vec<String>,
}

impl ExitStatus {
    pub fn reason_line(&self) -> String {
        self.reasons.join("; ")
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSummary {
    pub fail_below: RiskLevel,
    pub include_existing: bool,
}

#[derive(Debug, Clone)]
pub struct FinalReport {
    pub locations: Vec<ScoredLocation>,
    pub skipped_existing: usize,
    pub errors: Vec<LoadError>,
    pub counts: Counts,
    pub config: ConfigSummary,
    pub exit: ExitStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonReport {
    pub counts: Counts,
    pub locations: Vec<ScoredLocation>,
    pub skipped_existing: usize,
    pub errors: Vec<LoadError>,
    pub config: ConfigSummary,
    pub ok: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<String>,
}

impl From<&FinalReport> for JsonReport {
    fn from(report: &FinalReport) -> Self {
        Self {
            counts: report.counts.clone(),
            locations: report.locations.clone(),
            skipped_existing: report.skipped_existing,
            errors: report.errors.clone(),
            config: report.config.clone(),
            ok: report.exit.ok,
            reasons: report.exit.reasons.clone(),
        }
    }
}

pub fn evaluate_exit(
    locations: &[ScoredLocation],
    errors: &[LoadError],
    cfg: &Config,
) -> ExitStatus {
    let mut reasons = Vec::new();

    let below: Vec<&ScoredLocation> = locations
        .iter()
        .filter(|location| location.result.risk_level < cfg.general.fail_below)
        .collect();
    if !below.is_empty() {
        reasons.push(format!(
            "{} location(s) below {}: {}",
            below.len(),
            cfg.general.fail_below,
            below
                .iter()
                .map(|location| location.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }

    if cfg.general.fail_on_load_errors && !errors.is_empty() {
        reasons.push(format!("{} file(s) could not be loaded", errors.len()));
    }

    if cfg.general.require_locations && locations.is_empty() {
        reasons.push("no locations were scored".to_string());
    }

    ExitStatus {
        ok: reasons.is_empty(),
        reasons,
    }
}

/// Highest total first; ties keep a stable order by name.
pub fn rank_locations(locations: &mut [ScoredLocation]) {
    locations.sort_by(|a, b| {
        b.result
            .total_score
            .total_cmp(&a.result.total_score)
            .then_with(|| a.name.cmp(&b.name))
    });
}

pub fn print_human(report: &FinalReport) {
    println!(
        "Scored {} location(s){}",
        report.counts.total,
        if report.skipped_existing > 0 {
            format!(" ({} existing skipped)", report.skipped_existing)
        } else {
            String::new()
        }
    );

    for level in RiskLevel::ALL {
        let count = report.counts.for_level(level);
        if count > 0 {
            println!("  {}: {}", level.colored(), count);
        }
    }

    for location in &report.locations {
        let result = &location.result;
        let breakdown = &result.breakdown;

        println!();
        println!(
            "{} [{}] {:.1}/100 - {}",
            location.name.bold(),
            result.risk_level.colored(),
            result.total_score,
            location.file
        );
        println!("  {}", result.explanation);
        println!(
            "  market potential      {:>5.1}/{:<4} children {} | income {}",
            breakdown.market_potential.score,
            breakdown.market_potential.max,
            component(breakdown.market_potential.child_population),
            component(breakdown.market_potential.income),
        );
        println!(
            "  financial viability   {:>5.1}/{:<4} rent ratio {} ({:.1}%) | saturation {}",
            breakdown.financial_viability.score,
            breakdown.financial_viability.max,
            component(breakdown.financial_viability.rent_ratio),
            breakdown.financial_viability.rent_ratio_percent,
            component(breakdown.financial_viability.saturation),
        );
        println!(
            "  location quality      {:>5.1}/{:<4} traffic {} | anchor {}",
            breakdown.location_quality.score,
            breakdown.location_quality.max,
            component(breakdown.location_quality.traffic),
            component(breakdown.location_quality.anchor),
        );
        println!(
            "  competition dynamics  {:>5.1}/{:<4} gap {} | pricing {}",
            breakdown.competition_dynamics.score,
            breakdown.competition_dynamics.max,
            component(breakdown.competition_dynamics.gap),
            component(breakdown.competition_dynamics.pricing),
        );
    }

    if !report.errors.is_empty() {
        println!();
        println!("{} ({})", "LOAD ERRORS".red().bold(), report.errors.len());
        for error in &report.errors {
            println!("{} - {}", error.file, error.message);
        }
    }

    println!();
    if report.exit.ok {
        println!("exit: OK");
    } else {
        println!("exit: FAILED ({})", report.exit.reason_line());
    }
}

fn component(value: Component) -> String {
    format!("{:.1}/{}", value.score, value.max)
}
