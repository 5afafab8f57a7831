pub mod extract;
pub mod location;
pub mod policy;
pub mod report;
pub mod score;

use crate::config::Config;
use crate::core::location::LocationRecord;
use crate::core::report::{ConfigSummary, FinalReport, LoadError, ScoredLocation};
use crate::utils::fs as fs_utils;
use anyhow::{Context, Result, bail};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub include_existing: bool,
}

/// Scores every record found under `path` (a fixture file or a directory of them).
pub fn run_scoring(path: &Path, cfg: &Config, options: RunOptions) -> Result<FinalReport> {
    let files = fs_utils::collect_json_files(path, &cfg.scan.exclude)?;
    let root = if path.is_dir() {
        path
    } else {
        path.parent().unwrap_or(path)
    };

    let include_existing = options.include_existing || cfg.general.include_existing;
    let mut locations = Vec::new();
    let mut errors = Vec::new();
    let mut skipped_existing = 0;

    for file in &files {
        let relative_file = fs_utils::relative_path(root, file);
        let records = match load_records(file) {
            Ok(Some(records)) => records,
            Ok(None) => {
                tracing::debug!(file = %relative_file, "not a location fixture, skipping");
                continue;
            }
            Err(err) => {
                tracing::warn!(file = %relative_file, error = %format!("{err:#}"), "skipping unreadable fixture");
                errors.push(LoadError {
                    file: relative_file,
                    message: format!("{err:#}"),
                });
                continue;
            }
        };

        for (index, record) in records.into_iter().enumerate() {
            if !record.is_planned() && !include_existing {
                skipped_existing += 1;
                continue;
            }

            let name = record
                .display_name()
                .map_or_else(|| format!("{relative_file}#{index}"), str::to_string);
            let result = score::score_location_with(&record, &cfg.policy);
            tracing::debug!(
                location = %name,
                total = result.total_score,
                risk = %result.risk_level,
                "scored location"
            );

            locations.push(ScoredLocation {
                name,
                file: relative_file.clone(),
                status: record.status(),
                result,
            });
        }
    }

    report::rank_locations(&mut locations);
    let counts = report::Counts::from_locations(&locations);
    let exit = report::evaluate_exit(&locations, &errors, cfg);

    Ok(FinalReport {
        locations,
        skipped_existing,
        errors,
        counts,
        config: ConfigSummary {
            fail_below: cfg.general.fail_below,
            include_existing,
        },
        exit,
    })
}

/// Keys that mark a bare JSON object as a location record. `name` and `id`
/// are left out since unrelated JSON files (package.json) carry them too.
const LOCATION_KEYS: [&str; 16] = [
    "status",
    "address",
    "childrenInTradeArea",
    "medianHouseholdIncome",
    "baseRentText",
    "squareFootage",
    "directCompetitorCount",
    "dailyTrafficText",
    "coAnchorText",
    "coTenants",
    "marketGapText",
    "membershipPriceRangeText",
    "demographics",
    "siteDetails",
    "competition",
    "locations",
];

/// Reads one record, an array of records, or an object wrapping a
/// `locations` array. `None` means the file is JSON but not a location
/// fixture.
pub fn load_records(path: &Path) -> Result<Option<Vec<LocationRecord>>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed reading {}", path.display()))?;
    let value = serde_json::from_str::<Value>(&raw)
        .with_context(|| format!("failed parsing {}", path.display()))?;
    records_from_value(value)
}

fn records_from_value(value: Value) -> Result<Option<Vec<LocationRecord>>> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(map) if !is_location_object(&map) => return Ok(None),
        Value::Object(mut map) => match map.remove("locations") {
            Some(Value::Array(items)) => items,
            Some(_) => bail!("`locations` must be an array of location records"),
            None => vec![Value::Object(map)],
        },
        _ => bail!("expected a location record or an array of location records"),
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value::<LocationRecord>(item)
                .with_context(|| format!("record {index} is not a location object"))
        })
        .collect::<Result<Vec<_>>>()
        .map(Some)
}

fn is_location_object(map: &Map<String, Value>) -> bool {
    LOCATION_KEYS.iter().any(|key| map.contains_key(*key))
}
