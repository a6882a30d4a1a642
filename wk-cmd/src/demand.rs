//! Monthly water right demand, split by right type.

use log::info;
use std::path::Path;
use wk_rights::demand::{DemandRecord, DemandTable};
use wk_rights::merge::{add_rights_info, ag_demand, merge_ag_structure, structure_demand};
use wk_rights::profile::{UseProfiles, MONTH_ABBREVIATIONS};
use wk_utils::dates::format_date;

use crate::loader;

/// Raw CSV text of every demand input.
pub struct DemandInputs<'a> {
    pub uses: &'a str,
    pub pods: &'a str,
    pub structures: &'a str,
    pub structure_pods: &'a str,
    pub rights: &'a str,
}

/// Load use profiles from JSON, or the built-in profiles when no file is
/// given.
pub fn load_profiles(json: Option<&str>) -> anyhow::Result<UseProfiles> {
    let profiles = match json {
        Some(json) => serde_json::from_str(json)?,
        None => UseProfiles::default(),
    };
    profiles.validate()?;
    Ok(profiles)
}

/// Joined, priority-sorted and disaggregated demand table.
pub fn compute_demand(
    inputs: &DemandInputs,
    profiles: &UseProfiles,
) -> anyhow::Result<DemandTable> {
    let ag = ag_demand(
        &loader::parse_pods(inputs.pods)?,
        &loader::parse_uses(inputs.uses)?,
    );
    let structures = structure_demand(
        &loader::parse_structure_pods(inputs.structure_pods)?,
        &loader::parse_structures(inputs.structures)?,
    );
    let merged = merge_ag_structure(&ag, &structures);
    info!(
        "{} applications ({} with agricultural use, {} with structures)",
        merged.len(),
        ag.len(),
        structures.len()
    );
    let rights = loader::parse_rights(inputs.rights)?;
    Ok(add_rights_info(&merged, &rights)?.disaggregate_monthly(profiles))
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn write_demand(path: &Path, records: &[&DemandRecord]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    let mut header = vec![
        "APPL_ID",
        "FEATUREID",
        "Status Date",
        "Riparian",
        "Pre 1914",
        "Vine_Water",
        "Orch_Water",
        "SummerAF",
        "WinterAF",
    ];
    header.extend(MONTH_ABBREVIATIONS);
    wtr.write_record(&header)?;

    for r in records {
        let mut row = vec![
            r.application_id.clone(),
            r.feature_id.clone().unwrap_or_default(),
            r.status_date.as_ref().map(format_date).unwrap_or_default(),
            r.riparian.to_string(),
            r.pre_1914.to_string(),
            optional(r.vineyard_water),
            optional(r.orchard_water),
            optional(r.summer_water),
            optional(r.winter_water),
        ];
        match &r.monthly {
            Some(monthly) => row.extend(monthly.iter().map(|v| v.to_string())),
            None => row.extend(std::iter::repeat(String::new()).take(12)),
        }
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    info!("Wrote {} rights to {}", records.len(), path.display());
    Ok(())
}

pub fn run_demand(
    inputs: &DemandInputs,
    profiles_json: Option<&str>,
    output_dir: &str,
) -> anyhow::Result<()> {
    let profiles = load_profiles(profiles_json)?;
    let table = compute_demand(inputs, &profiles)?;

    let dir = Path::new(output_dir);
    std::fs::create_dir_all(dir)?;
    let (_, riparian) = table.split_appropriative_riparian();
    let (pre_1914, post_1914) = table.split_pre_1914();
    write_demand(&dir.join("riparian.csv"), &riparian)?;
    write_demand(&dir.join("app_pre1914.csv"), &pre_1914)?;
    write_demand(&dir.join("app_post1914.csv"), &post_1914)?;
    Ok(())
}
