//! Command implementations for the waterkit CLI.
//!
//! Provides subcommands for drainage areas over a stream network, flow
//! gaps against an instream flow target and monthly water right demand.

use anyhow::bail;
use chrono::NaiveDate;
use clap::{Subcommand, ValueEnum};
use wk_network::closure::ClosureStrategy;
use wk_utils::dates::parse_date;

pub mod demand;
pub mod drainage;
pub mod flow_gap;
pub mod loader;

/// How global connectivity is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Strategy {
    /// Dense below 2000 features, sparse above
    #[default]
    Auto,
    Dense,
    DenseParallel,
    Sparse,
}

impl From<Strategy> for ClosureStrategy {
    fn from(value: Strategy) -> Self {
        match value {
            Strategy::Auto => ClosureStrategy::Auto,
            Strategy::Dense => ClosureStrategy::Dense,
            Strategy::DenseParallel => ClosureStrategy::DenseParallel,
            Strategy::Sparse => ClosureStrategy::Sparse,
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Total upstream area of every catchment in a catchment table
    DrainageArea {
        /// Flow network edges CSV (FROMCOMID,TOCOMID)
        #[arg(short = 'e', long)]
        edges: String,

        /// Catchment areas CSV (FEATUREID,AreaSqKM)
        #[arg(short = 'c', long)]
        catchments: String,

        /// Output path for the drainage area CSV
        #[arg(short = 'o', long)]
        output: String,

        #[arg(long, value_enum, default_value_t = Strategy::Auto)]
        strategy: Strategy,

        /// Fail when an upstream catchment has no area instead of counting it as 0
        #[arg(long)]
        strict: bool,
    },

    /// Daily gap between observed flow and an instream flow target
    FlowGap {
        /// Observed flow CSV (date,flow)
        #[arg(short = 'f', long)]
        flow: String,

        /// Flow target JSON (graded or flat)
        #[arg(short = 't', long)]
        target: String,

        /// First day, YYYY-MM-DD
        #[arg(long)]
        begin: String,

        /// Last day, YYYY-MM-DD
        #[arg(long)]
        end: String,

        /// Date the target takes effect; earlier days have a zero target
        #[arg(long)]
        effective_date: Option<String>,

        /// Years the target stays in effect
        #[arg(long)]
        term: Option<u32>,

        /// Only keep days strictly inside a season, as MM-DD:MM-DD
        #[arg(long)]
        season: Option<String>,

        /// Output path for the flow gap CSV
        #[arg(short = 'o', long)]
        output: String,
    },

    /// Monthly demand per water right, split into riparian, pre-1914 and post-1914
    Demand {
        /// Agricultural use CSV (POD_ID,Vine_Water,Orch_Water)
        #[arg(long)]
        uses: String,

        /// Points of diversion CSV (POD_ID,APPL_ID,FEATUREID)
        #[arg(long)]
        pods: String,

        /// Structures CSV (JOIN_FID,TARGET_FID,SummerAF,WinterAF)
        #[arg(long)]
        structures: String,

        /// Parcel PODs CSV (JOIN_FID,APPL_ID)
        #[arg(long)]
        structure_pods: String,

        /// Water rights CSV (Application ID,Status Date,Riparian,Pre 1914)
        #[arg(long)]
        rights: String,

        /// Replacement seasonal use profiles JSON
        #[arg(long)]
        profiles: Option<String>,

        /// Directory for riparian.csv, app_pre1914.csv and app_post1914.csv
        #[arg(short = 'o', long)]
        output_dir: String,
    },
}

fn parse_season(season: &str) -> anyhow::Result<(String, String)> {
    match season.split_once(':') {
        Some((start, end)) => Ok((start.trim().to_string(), end.trim().to_string())),
        None => bail!("season must look like MM-DD:MM-DD, got {season:?}"),
    }
}

fn parse_optional_date(value: Option<String>) -> anyhow::Result<Option<NaiveDate>> {
    value.as_deref().map(parse_date).transpose()
}

pub fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::DrainageArea {
            edges,
            catchments,
            output,
            strategy,
            strict,
        } => drainage::run_drainage_area(&edges, &catchments, &output, strategy.into(), strict),
        Command::FlowGap {
            flow,
            target,
            begin,
            end,
            effective_date,
            term,
            season,
            output,
        } => {
            let request = flow_gap::FlowGapRequest {
                begin: parse_date(&begin)?,
                end: parse_date(&end)?,
                effective_date: parse_optional_date(effective_date)?,
                term,
                season: season.as_deref().map(parse_season).transpose()?,
            };
            flow_gap::run_flow_gap(&flow, &target, &output, &request)
        }
        Command::Demand {
            uses,
            pods,
            structures,
            structure_pods,
            rights,
            profiles,
            output_dir,
        } => {
            let uses = std::fs::read_to_string(uses)?;
            let pods = std::fs::read_to_string(pods)?;
            let structures = std::fs::read_to_string(structures)?;
            let structure_pods = std::fs::read_to_string(structure_pods)?;
            let rights = std::fs::read_to_string(rights)?;
            let profiles = profiles.map(std::fs::read_to_string).transpose()?;
            let inputs = demand::DemandInputs {
                uses: &uses,
                pods: &pods,
                structures: &structures,
                structure_pods: &structure_pods,
                rights: &rights,
            };
            demand::run_demand(&inputs, profiles.as_deref(), &output_dir)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_season() {
        assert_eq!(
            parse_season("05-15:10-01").unwrap(),
            ("05-15".to_string(), "10-01".to_string())
        );
        assert!(parse_season("05-15").is_err());
    }

    #[test]
    fn test_strategy_maps_to_closure_strategy() {
        assert_eq!(ClosureStrategy::from(Strategy::default()), ClosureStrategy::Auto);
        assert_eq!(
            ClosureStrategy::from(Strategy::DenseParallel),
            ClosureStrategy::DenseParallel
        );
    }

    #[test]
    fn test_optional_date() {
        assert_eq!(parse_optional_date(None).unwrap(), None);
        assert_eq!(
            parse_optional_date(Some("2010-10-01".to_string())).unwrap(),
            NaiveDate::from_ymd_opt(2010, 10, 1)
        );
        assert!(parse_optional_date(Some("10/01/2010".to_string())).is_err());
    }
}
