//! Drainage area of every catchment in a catchment table.

use anyhow::bail;
use log::{debug, info};
use std::collections::BTreeSet;
use wk_network::closure::{ClosureStrategy, TransitiveClosure};
use wk_network::connectivity::{subset_edges, ConnectivityMatrix};
use wk_network::drainage::{Catchment, DrainageAreaAggregator, MissingAreaPolicy};

use crate::loader;

/// Drainage area for each catchment, in catchment table order, as
/// `(id, own area, drainage area)`.
///
/// Only edges leaving a catchment of the table take part. A catchment with
/// no edge at all drains only itself.
pub fn compute_drainage_areas(
    edges_csv: &str,
    catchments_csv: &str,
    strategy: ClosureStrategy,
    policy: MissingAreaPolicy,
) -> anyhow::Result<Vec<(i64, Option<f64>, f64)>> {
    let edges = loader::parse_edges(edges_csv)?;
    let rows = loader::parse_catchments(catchments_csv)?;

    let ids: Vec<i64> = rows.iter().map(|(id, _)| *id).collect();
    let edges = subset_edges(&edges, &ids);
    let local = ConnectivityMatrix::from_edges(edges);
    info!("Computing global connectivity for {} features", local.len());
    let global = TransitiveClosure::compute(&local, strategy);

    let in_network: BTreeSet<i64> = global.ids().iter().copied().collect();
    let connected: Vec<Catchment<i64>> = rows
        .iter()
        .filter(|(id, _)| in_network.contains(id))
        .filter_map(|(id, area)| area.map(|a| Catchment::new(*id, a)))
        .collect();
    debug!(
        "{} of {} catchments lie on the flow network",
        rows.iter().filter(|(id, _)| in_network.contains(id)).count(),
        rows.len()
    );

    let aggregator = if connected.is_empty() {
        None
    } else {
        Some(DrainageAreaAggregator::new(&global, connected, policy)?)
    };

    rows.iter()
        .map(|&(id, area)| -> anyhow::Result<(i64, Option<f64>, f64)> {
            let total = match (&aggregator, area) {
                (Some(aggregator), _) if in_network.contains(&id) => {
                    aggregator.drainage_area(&id)?
                }
                (_, Some(area)) => area,
                (_, None) if policy == MissingAreaPolicy::Strict => {
                    bail!("No area recorded for catchment {id}")
                }
                (_, None) => 0.0,
            };
            Ok((id, area, total))
        })
        .collect()
}

pub fn run_drainage_area(
    edges: &str,
    catchments: &str,
    output: &str,
    strategy: ClosureStrategy,
    strict: bool,
) -> anyhow::Result<()> {
    let policy = if strict {
        MissingAreaPolicy::Strict
    } else {
        MissingAreaPolicy::Lenient
    };
    let edges_csv = std::fs::read_to_string(edges)?;
    let catchments_csv = std::fs::read_to_string(catchments)?;
    let areas = compute_drainage_areas(&edges_csv, &catchments_csv, strategy, policy)?;

    let mut wtr = csv::Writer::from_path(output)?;
    wtr.write_record(["FEATUREID", "AreaSqKM", "DrainageAreaSqKM"])?;
    for (id, area, total) in &areas {
        let area = area.map(|a| a.to_string()).unwrap_or_default();
        wtr.write_record([id.to_string(), area, total.to_string()])?;
    }
    wtr.flush()?;
    info!("Drainage areas for {} catchments written to {}", areas.len(), output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EDGES: &str = "FROMCOMID,TOCOMID\n1,2\n2,3\n1,3\n3,99\n";
    const CATCHMENTS: &str = "FEATUREID,AreaSqKM\n3,3.0\n1,1.0\n2,2.0\n50,5.0\n";

    #[test]
    fn test_drainage_areas_in_table_order() {
        let areas = compute_drainage_areas(
            EDGES,
            CATCHMENTS,
            ClosureStrategy::Auto,
            MissingAreaPolicy::Lenient,
        )
        .unwrap();
        assert_eq!(
            areas,
            vec![
                (3, Some(3.0), 6.0),
                (1, Some(1.0), 1.0),
                (2, Some(2.0), 3.0),
                (50, Some(5.0), 5.0)
            ]
        );
    }

    #[test]
    fn test_strict_ignores_features_downstream_of_table() {
        // 99 has no catchment row but drains nothing in the table
        let result = compute_drainage_areas(
            EDGES,
            CATCHMENTS,
            ClosureStrategy::Sparse,
            MissingAreaPolicy::Strict,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_strict_fails_on_upstream_catchment_without_area() {
        let catchments = "FEATUREID,AreaSqKM\n3,3.0\n1,1.0\n2,\n";
        let lenient = compute_drainage_areas(
            EDGES,
            catchments,
            ClosureStrategy::Dense,
            MissingAreaPolicy::Lenient,
        )
        .unwrap();
        assert_eq!(lenient[0], (3, Some(3.0), 4.0));
        assert_eq!(lenient[2], (2, None, 1.0));
        let err = compute_drainage_areas(
            EDGES,
            catchments,
            ClosureStrategy::Dense,
            MissingAreaPolicy::Strict,
        )
        .unwrap_err();
        assert!(err.to_string().contains('2'));
    }

    #[test]
    fn test_strategies_give_same_areas() {
        let dense = compute_drainage_areas(
            EDGES,
            CATCHMENTS,
            ClosureStrategy::Dense,
            MissingAreaPolicy::Lenient,
        )
        .unwrap();
        let parallel = compute_drainage_areas(
            EDGES,
            CATCHMENTS,
            ClosureStrategy::DenseParallel,
            MissingAreaPolicy::Lenient,
        )
        .unwrap();
        assert_eq!(dense, parallel);
    }
}
