//! CSV parsing for the command inputs.
//!
//! Every loader takes the CSV text and looks columns up by header name, so
//! column order in the input files does not matter and extra columns are
//! ignored.
//!
//! # CSV Formats
//!
//! - **Flow edges**: `FROMCOMID,TOCOMID`
//! - **Catchments**: `FEATUREID,AreaSqKM`
//! - **Flow observations**: `date,flow` (`YYYY-MM-DD` or `MM/DD/YYYY`)
//! - **Agricultural use**: `POD_ID,Vine_Water,Orch_Water`
//! - **Points of diversion**: `POD_ID,APPL_ID,FEATUREID`
//! - **Structures**: `JOIN_FID,TARGET_FID,SummerAF,WinterAF`
//! - **Structure PODs**: `JOIN_FID,APPL_ID`
//! - **Rights**: `Application ID,Status Date,Riparian,Pre 1914`

use anyhow::{anyhow, bail, Context};
use csv::StringRecord;
use log::{info, warn};
use wk_flow::series::DailySeries;
use wk_network::connectivity::FlowEdge;
use wk_rights::merge::{PodRecord, RightRecord, StructurePodRecord, StructureRecord, UseRecord};
use wk_utils::dates::parse_date_lenient;

/// Header positions of the columns a loader needs.
struct Columns(Vec<usize>);

impl Columns {
    fn find(headers: &StringRecord, names: &[&str]) -> anyhow::Result<Columns> {
        let positions = names
            .iter()
            .map(|name| {
                headers
                    .iter()
                    .position(|h| h.trim() == *name)
                    .ok_or_else(|| anyhow!("missing column {name:?}"))
            })
            .collect::<anyhow::Result<Vec<usize>>>()?;
        Ok(Columns(positions))
    }

    fn text<'r>(&self, record: &'r StringRecord, column: usize) -> &'r str {
        record.get(self.0[column]).unwrap_or("").trim()
    }

    fn optional_text(&self, record: &StringRecord, column: usize) -> Option<String> {
        let value = self.text(record, column);
        (!value.is_empty()).then(|| value.to_string())
    }

    fn optional_number(&self, record: &StringRecord, column: usize) -> anyhow::Result<Option<f64>> {
        match self.text(record, column) {
            "" => Ok(None),
            value => Ok(Some(
                value
                    .parse()
                    .with_context(|| format!("not a number: {value:?}"))?,
            )),
        }
    }

    fn number(&self, record: &StringRecord, column: usize) -> anyhow::Result<f64> {
        self.optional_number(record, column)?
            .ok_or_else(|| anyhow!("empty value in numeric column"))
    }
}

fn reader(csv_data: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_data.as_bytes())
}

fn parse_comid(value: &str) -> anyhow::Result<i64> {
    // dBASE exports often write integer ids as "1234.0"
    let trimmed = value.strip_suffix(".0").unwrap_or(value);
    trimmed
        .parse()
        .with_context(|| format!("not a feature id: {value:?}"))
}

/// Load the flow network edge list.
///
/// # Example CSV
/// ```text
/// FROMCOMID,TOCOMID
/// 948010091,948010092
/// ```
pub fn parse_edges(csv_data: &str) -> anyhow::Result<Vec<FlowEdge<i64>>> {
    let mut rdr = reader(csv_data);
    let columns = Columns::find(rdr.headers()?, &["FROMCOMID", "TOCOMID"])?;
    let mut edges = Vec::new();
    for result in rdr.records() {
        let r = result?;
        edges.push(FlowEdge::new(
            parse_comid(columns.text(&r, 0))?,
            parse_comid(columns.text(&r, 1))?,
        ));
    }
    info!("loader: Loaded {} flow edges", edges.len());
    Ok(edges)
}

/// Load catchment areas. A blank area is kept as `None`.
pub fn parse_catchments(csv_data: &str) -> anyhow::Result<Vec<(i64, Option<f64>)>> {
    let mut rdr = reader(csv_data);
    let columns = Columns::find(rdr.headers()?, &["FEATUREID", "AreaSqKM"])?;
    let mut catchments = Vec::new();
    for result in rdr.records() {
        let r = result?;
        catchments.push((
            parse_comid(columns.text(&r, 0))?,
            columns.optional_number(&r, 1)?,
        ));
    }
    let blank = catchments.iter().filter(|(_, area)| area.is_none()).count();
    info!(
        "loader: Loaded {} catchments ({} without area)",
        catchments.len(),
        blank
    );
    Ok(catchments)
}

/// Load a daily flow series.
///
/// Rows with an unparseable date are an error. Non-numeric or non-finite
/// flow values (blank, "ice", "---", "NaN") are skipped and leave a gap in
/// the series.
pub fn parse_flow(csv_data: &str) -> anyhow::Result<DailySeries> {
    let mut rdr = reader(csv_data);
    let columns = Columns::find(rdr.headers()?, &["date", "flow"])?;
    let mut series = DailySeries::new();
    let mut skipped = 0u32;
    for result in rdr.records() {
        let r = result?;
        let raw_date = columns.text(&r, 0);
        let date =
            parse_date_lenient(raw_date).ok_or_else(|| anyhow!("not a date: {raw_date:?}"))?;
        match columns.text(&r, 1).parse::<f64>() {
            Ok(flow) if flow.is_finite() => {
                if series.insert(date, flow).is_some() {
                    warn!("loader: duplicate flow for {date}, keeping the last value");
                }
            }
            _ => skipped += 1,
        }
    }
    info!(
        "loader: Loaded {} flow observations ({} non-numeric skipped)",
        series.len(),
        skipped
    );
    Ok(series)
}

pub fn parse_uses(csv_data: &str) -> anyhow::Result<Vec<UseRecord>> {
    let mut rdr = reader(csv_data);
    let columns = Columns::find(rdr.headers()?, &["POD_ID", "Vine_Water", "Orch_Water"])?;
    let mut records = Vec::new();
    for result in rdr.records() {
        let r = result?;
        records.push(UseRecord {
            pod_id: columns.text(&r, 0).to_string(),
            vineyard_water: columns.optional_number(&r, 1)?,
            orchard_water: columns.optional_number(&r, 2)?,
        });
    }
    info!("loader: Loaded {} use records", records.len());
    Ok(records)
}

pub fn parse_pods(csv_data: &str) -> anyhow::Result<Vec<PodRecord>> {
    let mut rdr = reader(csv_data);
    let columns = Columns::find(rdr.headers()?, &["POD_ID", "APPL_ID", "FEATUREID"])?;
    let mut records = Vec::new();
    for result in rdr.records() {
        let r = result?;
        let application_id = columns.text(&r, 1);
        if application_id.is_empty() {
            bail!("POD {} has no application id", columns.text(&r, 0));
        }
        records.push(PodRecord {
            pod_id: columns.text(&r, 0).to_string(),
            application_id: application_id.to_string(),
            feature_id: columns.optional_text(&r, 2),
        });
    }
    info!("loader: Loaded {} points of diversion", records.len());
    Ok(records)
}

pub fn parse_structures(csv_data: &str) -> anyhow::Result<Vec<StructureRecord>> {
    let mut rdr = reader(csv_data);
    let columns = Columns::find(
        rdr.headers()?,
        &["JOIN_FID", "TARGET_FID", "SummerAF", "WinterAF"],
    )?;
    let mut records = Vec::new();
    for result in rdr.records() {
        let r = result?;
        records.push(StructureRecord {
            parcel_id: columns.text(&r, 0).to_string(),
            structure_id: columns.text(&r, 1).to_string(),
            summer_af: columns.number(&r, 2)?,
            winter_af: columns.number(&r, 3)?,
        });
    }
    info!("loader: Loaded {} structures", records.len());
    Ok(records)
}

pub fn parse_structure_pods(csv_data: &str) -> anyhow::Result<Vec<StructurePodRecord>> {
    let mut rdr = reader(csv_data);
    let columns = Columns::find(rdr.headers()?, &["JOIN_FID", "APPL_ID"])?;
    let mut records = Vec::new();
    for result in rdr.records() {
        let r = result?;
        records.push(StructurePodRecord {
            parcel_id: columns.text(&r, 0).to_string(),
            application_id: columns.text(&r, 1).to_string(),
        });
    }
    info!("loader: Loaded {} structure PODs", records.len());
    Ok(records)
}

pub fn parse_rights(csv_data: &str) -> anyhow::Result<Vec<RightRecord>> {
    let mut rdr = reader(csv_data);
    let columns = Columns::find(
        rdr.headers()?,
        &["Application ID", "Status Date", "Riparian", "Pre 1914"],
    )?;
    let mut records = Vec::new();
    for result in rdr.records() {
        let r = result?;
        records.push(RightRecord {
            application_id: columns.text(&r, 0).to_string(),
            status_date: columns.optional_text(&r, 1),
            riparian: columns.optional_text(&r, 2),
            pre_1914: columns.optional_text(&r, 3),
        });
    }
    info!("loader: Loaded {} water rights", records.len());
    Ok(records)
}
