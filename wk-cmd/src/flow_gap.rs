//! Gap between observed flow and an instream flow target.

use chrono::NaiveDate;
use log::info;
use serde::Deserialize;
use wk_flow::analysis::{
    annual_deficit_pct, annual_minimum_trend, annual_volume_deficit, annual_volume_deficit_pct,
    low_flow_trend_pct,
};
use wk_flow::gap::{FlowTable, TargetSource, CFS_DAY_TO_AF, DEFICIT_COLUMN};
use wk_flow::target::{FlatFlowTarget, FlowTarget, GradedFlowTarget};
use wk_utils::dates::format_date;

use crate::loader;

const FLOW_COLUMN: &str = "flow";
const TARGET_INPUT_COLUMN: &str = "target";
/// Days in the rolling mean behind the annual low flow.
const LOW_FLOW_PERIOD: usize = 7;

/// Flow target as written in a target JSON file.
///
/// ```json
/// {"type": "graded", "intervals": [{"start": "10-01", "end": "05-15", "flow": 400.0}]}
/// {"type": "flat", "value": 12.5}
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TargetSpec {
    Graded { intervals: Vec<IntervalSpec> },
    Flat { value: f64 },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IntervalSpec {
    /// "MM-DD"
    pub start: String,
    /// "MM-DD", inclusive
    pub end: String,
    pub flow: f64,
}

impl TargetSpec {
    pub fn into_target(self) -> anyhow::Result<FlowTarget> {
        Ok(match self {
            TargetSpec::Graded { intervals } => {
                let mut graded = GradedFlowTarget::new();
                for i in &intervals {
                    graded.add((i.start.as_str(), i.end.as_str()), i.flow)?;
                }
                FlowTarget::from(graded)
            }
            TargetSpec::Flat { value } => FlowTarget::from(FlatFlowTarget::new(value)),
        })
    }
}

/// Inputs of one flow gap run.
#[derive(Debug, Clone)]
pub struct FlowGapRequest {
    pub begin: NaiveDate,
    pub end: NaiveDate,
    pub effective_date: Option<NaiveDate>,
    pub term: Option<u32>,
    pub season: Option<(String, String)>,
}

/// Observed flow, target and gap attributes over `[begin, end]`.
///
/// Only days with an observation appear in the table.
pub fn compute_flow_gap(
    flow_csv: &str,
    target_json: &str,
    request: &FlowGapRequest,
) -> anyhow::Result<FlowTable> {
    let observed = loader::parse_flow(flow_csv)?.slice(request.begin, request.end);
    let spec: TargetSpec = serde_json::from_str(target_json)?;
    let target = spec.into_target()?.as_daily_timeseries(
        request.begin,
        request.end,
        request.effective_date,
        request.term,
    )?;

    let table = FlowTable::from_series(FLOW_COLUMN, &observed)
        .with_column(TARGET_INPUT_COLUMN, &target)
        .with_gap_attributes(
            FLOW_COLUMN,
            &TargetSource::Column(TARGET_INPUT_COLUMN.to_string()),
            1.0,
        )?;
    Ok(match &request.season {
        Some((start, end)) => table.filter_season((start.as_str(), end.as_str()))?,
        None => table,
    })
}

fn format_value(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

fn log_summary(table: &FlowTable) {
    if let Some(flow) = table.series(FLOW_COLUMN) {
        let fitted = annual_minimum_trend(&flow, LOW_FLOW_PERIOD, true);
        if let (Some(trend), Some((year, low))) = (
            low_flow_trend_pct(&flow, LOW_FLOW_PERIOD, true),
            fitted.last_key_value(),
        ) {
            info!(
                "{}-day low flow trend {:+.1}% per year, fitted {:.1} in WY {}",
                LOW_FLOW_PERIOD,
                trend * 100.0,
                low,
                year
            );
        }
    }

    let gap_column = format!("{FLOW_COLUMN}-gap");
    let target_column = format!("{FLOW_COLUMN}-target");
    let (Some(gap), Some(target)) = (table.series(&gap_column), table.series(&target_column))
    else {
        return;
    };
    let deficit_days = table
        .column(DEFICIT_COLUMN)
        .map(|d| d.iter().filter(|v| **v > 0.0).count())
        .unwrap_or(0);
    info!("{} of {} days below target", deficit_days, table.len());

    let volume = annual_volume_deficit(&gap, CFS_DAY_TO_AF);
    let volume_pct = annual_volume_deficit_pct(&gap, &target, CFS_DAY_TO_AF);
    for (year, pct) in annual_deficit_pct(&gap) {
        info!(
            "WY {}: {:.1}% of days in deficit, {:.1} AF short ({:.1}% of target volume)",
            year,
            pct * 100.0,
            volume.get(&year).copied().unwrap_or(0.0).abs(),
            volume_pct.get(&year).copied().unwrap_or(0.0) * 100.0
        );
    }
}

pub fn run_flow_gap(
    flow: &str,
    target: &str,
    output: &str,
    request: &FlowGapRequest,
) -> anyhow::Result<()> {
    let flow_csv = std::fs::read_to_string(flow)?;
    let target_json = std::fs::read_to_string(target)?;
    let table = compute_flow_gap(&flow_csv, &target_json, request)?;
    log_summary(&table);

    let columns: Vec<&str> = table
        .column_names()
        .filter(|name| *name != TARGET_INPUT_COLUMN)
        .collect();
    let mut wtr = csv::Writer::from_path(output)?;
    let mut header = vec!["date"];
    header.extend(&columns);
    wtr.write_record(&header)?;
    for row in table.rows() {
        let mut record = vec![format_date(&row.date())];
        record.extend(
            columns
                .iter()
                .map(|name| format_value(row.get(name).unwrap_or(f64::NAN))),
        );
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    info!("Flow gap for {} days written to {}", table.len(), output);
    Ok(())
}
