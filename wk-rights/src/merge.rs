//! Builds the demand table from its source tables: agricultural use per
//! point of diversion, structures on the parcels holding a diversion, and
//! right records from the state rights database.

use crate::demand::{DemandRecord, DemandTable};
use crate::error::Result;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use wk_utils::dates::parse_date_lenient;

/// A point of diversion and the catchment it lies in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodRecord {
    pub pod_id: String,
    pub application_id: String,
    pub feature_id: Option<String>,
}

/// Agricultural use estimate attached to a point of diversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UseRecord {
    pub pod_id: String,
    pub vineyard_water: Option<f64>,
    pub orchard_water: Option<f64>,
}

/// A point of diversion located on a parcel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructurePodRecord {
    pub parcel_id: String,
    pub application_id: String,
}

/// A structure on a parcel and its seasonal domestic use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureRecord {
    pub parcel_id: String,
    pub structure_id: String,
    pub summer_af: f64,
    pub winter_af: f64,
}

/// Priority and type of a right, with flags as exported ("Y" or blank).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RightRecord {
    pub application_id: String,
    pub status_date: Option<String>,
    pub riparian: Option<String>,
    pub pre_1914: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AgDemand {
    pub feature_id: Option<String>,
    pub vineyard_water: Option<f64>,
    pub orchard_water: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StructureDemand {
    pub summer_af: f64,
    pub winter_af: f64,
}

/// Amended applications carry a trailing `R`; they share the demand of
/// the original application.
pub fn normalize_application_id(id: &str) -> &str {
    id.strip_suffix('R').unwrap_or(id)
}

/// Agricultural demand per application.
///
/// Every POD is joined with the use records sharing its POD id (a POD
/// without use keeps empty quantities). Per application the first joined
/// row wins.
pub fn ag_demand(pods: &[PodRecord], uses: &[UseRecord]) -> BTreeMap<String, AgDemand> {
    let mut by_pod: BTreeMap<&str, Vec<&UseRecord>> = BTreeMap::new();
    for u in uses {
        by_pod.entry(u.pod_id.as_str()).or_default().push(u);
    }

    let mut result: BTreeMap<String, AgDemand> = BTreeMap::new();
    for pod in pods {
        let id = normalize_application_id(&pod.application_id);
        if result.contains_key(id) {
            continue;
        }
        let first_use = by_pod.get(pod.pod_id.as_str()).and_then(|u| u.first());
        result.insert(
            id.to_string(),
            AgDemand {
                feature_id: pod.feature_id.clone(),
                vineyard_water: first_use.and_then(|u| u.vineyard_water),
                orchard_water: first_use.and_then(|u| u.orchard_water),
            },
        );
    }
    debug!("ag demand: {} applications from {} PODs", result.len(), pods.len());
    result
}

/// Structure demand per application.
///
/// PODs and structures are joined on parcel id. A structure counted under
/// several PODs is kept once, with the first application it joined; the
/// seasonal demand of the remaining structures is summed per application.
pub fn structure_demand(
    pods: &[StructurePodRecord],
    structures: &[StructureRecord],
) -> BTreeMap<String, StructureDemand> {
    let mut by_parcel: BTreeMap<&str, Vec<&StructureRecord>> = BTreeMap::new();
    for s in structures {
        by_parcel.entry(s.parcel_id.as_str()).or_default().push(s);
    }

    let mut owner: BTreeMap<&str, (&str, &StructureRecord)> = BTreeMap::new();
    for pod in pods {
        let Some(on_parcel) = by_parcel.get(pod.parcel_id.as_str()) else {
            continue;
        };
        let id = normalize_application_id(&pod.application_id);
        for s in on_parcel {
            owner.entry(s.structure_id.as_str()).or_insert((id, *s));
        }
    }

    let mut result: BTreeMap<String, StructureDemand> = BTreeMap::new();
    for (id, s) in owner.into_values() {
        let demand = result.entry(id.to_string()).or_default();
        demand.summer_af += s.summer_af;
        demand.winter_af += s.winter_af;
    }
    result
}

/// Outer join of agricultural and structure demand on application id,
/// ordered by id.
pub fn merge_ag_structure(
    ag: &BTreeMap<String, AgDemand>,
    structures: &BTreeMap<String, StructureDemand>,
) -> DemandTable {
    let mut records: BTreeMap<&str, DemandRecord> = BTreeMap::new();
    for (id, demand) in ag {
        records.insert(
            id.as_str(),
            DemandRecord {
                feature_id: demand.feature_id.clone(),
                vineyard_water: demand.vineyard_water,
                orchard_water: demand.orchard_water,
                ..DemandRecord::new(id.as_str())
            },
        );
    }
    for (id, demand) in structures {
        let record = records
            .entry(id.as_str())
            .or_insert_with(|| DemandRecord::new(id.as_str()));
        record.summer_water = Some(demand.summer_af);
        record.winter_water = Some(demand.winter_af);
    }
    DemandTable::from_keyed(records)
}

fn is_yes(flag: &Option<String>) -> bool {
    flag.as_deref().map(str::trim) == Some("Y")
}

/// Left join of right metadata onto the demand table, then sorted by
/// status date (oldest first, undated last).
///
/// Only the first right record per application id is used. Status dates
/// that cannot be parsed are logged and treated as missing.
pub fn add_rights_info(demand: &DemandTable, rights: &[RightRecord]) -> Result<DemandTable> {
    let mut by_id: BTreeMap<&str, &RightRecord> = BTreeMap::new();
    for right in rights {
        by_id.entry(right.application_id.as_str()).or_insert(right);
    }

    let records = demand
        .records()
        .iter()
        .map(|record| {
            let Some(right) = by_id.get(record.application_id.as_str()) else {
                return DemandRecord {
                    status_date: None,
                    riparian: false,
                    pre_1914: false,
                    ..record.clone()
                };
            };
            let status_date = match right.status_date.as_deref().map(str::trim) {
                None | Some("") => None,
                Some(raw) => {
                    let parsed = parse_date_lenient(raw);
                    if parsed.is_none() {
                        warn!(
                            "rights: unparseable status date {raw:?} for {}",
                            record.application_id
                        );
                    }
                    parsed
                }
            };
            DemandRecord {
                status_date,
                riparian: is_yes(&right.riparian),
                pre_1914: is_yes(&right.pre_1914),
                ..record.clone()
            }
        })
        .collect();
    Ok(DemandTable::new(records)?.sorted_by_status_date())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn pod(pod_id: &str, application_id: &str, feature_id: &str) -> PodRecord {
        PodRecord {
            pod_id: pod_id.to_string(),
            application_id: application_id.to_string(),
            feature_id: Some(feature_id.to_string()),
        }
    }

    fn use_record(pod_id: &str, vine: Option<f64>, orch: Option<f64>) -> UseRecord {
        UseRecord {
            pod_id: pod_id.to_string(),
            vineyard_water: vine,
            orchard_water: orch,
        }
    }

    fn structure_pod(parcel_id: &str, application_id: &str) -> StructurePodRecord {
        StructurePodRecord {
            parcel_id: parcel_id.to_string(),
            application_id: application_id.to_string(),
        }
    }

    fn structure(parcel_id: &str, structure_id: &str, summer: f64, winter: f64) -> StructureRecord {
        StructureRecord {
            parcel_id: parcel_id.to_string(),
            structure_id: structure_id.to_string(),
            summer_af: summer,
            winter_af: winter,
        }
    }

    fn right(id: &str, date: &str, riparian: &str, pre_1914: &str) -> RightRecord {
        let field = |s: &str| (!s.is_empty()).then(|| s.to_string());
        RightRecord {
            application_id: id.to_string(),
            status_date: field(date),
            riparian: field(riparian),
            pre_1914: field(pre_1914),
        }
    }

    #[test]
    fn test_normalize_application_id() {
        assert_eq!(normalize_application_id("S012345R"), "S012345");
        assert_eq!(normalize_application_id("S012345"), "S012345");
        assert_eq!(normalize_application_id("A1RR"), "A1R");
    }

    #[test]
    fn test_ag_demand_first_row_wins() {
        let pods = vec![
            pod("P1", "A1", "100"),
            pod("P2", "A1R", "200"),
            pod("P3", "A2", "300"),
        ];
        let uses = vec![
            use_record("P1", Some(10.0), None),
            use_record("P1", Some(99.0), Some(99.0)),
            use_record("P2", Some(5.0), Some(5.0)),
        ];
        let result = ag_demand(&pods, &uses);
        assert_eq!(result.len(), 2);
        assert_eq!(
            result["A1"],
            AgDemand {
                feature_id: Some("100".to_string()),
                vineyard_water: Some(10.0),
                orchard_water: None,
            }
        );
        // left join: a POD without use is kept with empty quantities
        assert_eq!(result["A2"].vineyard_water, None);
        assert_eq!(result["A2"].feature_id.as_deref(), Some("300"));
    }

    #[test]
    fn test_structure_demand_counts_each_structure_once() {
        let pods = vec![
            structure_pod("parcel-1", "A1"),
            structure_pod("parcel-1", "A2R"),
            structure_pod("parcel-2", "A2"),
            structure_pod("parcel-9", "A3"),
        ];
        let structures = vec![
            structure("parcel-1", "s1", 1.0, 0.5),
            structure("parcel-1", "s2", 2.0, 1.0),
            structure("parcel-2", "s3", 4.0, 2.0),
        ];
        let result = structure_demand(&pods, &structures);
        assert_eq!(
            result["A1"],
            StructureDemand {
                summer_af: 3.0,
                winter_af: 1.5
            }
        );
        assert_eq!(
            result["A2"],
            StructureDemand {
                summer_af: 4.0,
                winter_af: 2.0
            }
        );
        // inner join: no structures on parcel-9
        assert!(!result.contains_key("A3"));
    }

    #[test]
    fn test_merge_is_outer_join_sorted_by_id() {
        let mut ag = BTreeMap::new();
        ag.insert(
            "B".to_string(),
            AgDemand {
                vineyard_water: Some(1.0),
                ..Default::default()
            },
        );
        ag.insert("A".to_string(), AgDemand::default());
        let mut structures = BTreeMap::new();
        structures.insert(
            "C".to_string(),
            StructureDemand {
                summer_af: 2.0,
                winter_af: 3.0,
            },
        );
        structures.insert("B".to_string(), StructureDemand::default());
        let table = merge_ag_structure(&ag, &structures);
        let ids: Vec<&str> = table.records().iter().map(|r| r.application_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
        let b = table.get("B").unwrap();
        assert_eq!(b.vineyard_water, Some(1.0));
        assert_eq!(b.summer_water, Some(0.0));
        let c = table.get("C").unwrap();
        assert_eq!(c.vineyard_water, None);
        assert_eq!(c.winter_water, Some(3.0));
    }

    #[test]
    fn test_add_rights_info() {
        let demand = DemandTable::new(vec![
            DemandRecord::new("A1"),
            DemandRecord::new("A2"),
            DemandRecord::new("A3"),
            DemandRecord::new("A4"),
        ])
        .unwrap();
        let rights = vec![
            right("A1", "2001-06-15", "", ""),
            right("A2", "03/01/1910", "", "Y"),
            right("A3", "not a date", "Y", ""),
            right("A2", "1800-01-01", "Y", "Y"),
        ];
        let table = add_rights_info(&demand, &rights).unwrap();
        let ids: Vec<&str> = table.records().iter().map(|r| r.application_id.as_str()).collect();
        // A3 has an unparseable date and A4 no right, so both sort last
        assert_eq!(ids, vec!["A2", "A1", "A3", "A4"]);

        let a2 = table.get("A2").unwrap();
        assert_eq!(a2.status_date, NaiveDate::from_ymd_opt(1910, 3, 1));
        assert!(a2.pre_1914);
        assert!(!a2.riparian);
        assert!(table.get("A3").unwrap().riparian);
        assert_eq!(table.get("A4").unwrap().status_date, None);
    }

    #[test]
    fn test_full_demand_pipeline() {
        let ag = ag_demand(
            &[pod("P1", "A1", "100")],
            &[use_record("P1", Some(120.0), None)],
        );
        let structures = structure_demand(
            &[structure_pod("parcel-1", "A2")],
            &[structure("parcel-1", "s1", 6.0, 6.0)],
        );
        let merged = merge_ag_structure(&ag, &structures);
        let table = add_rights_info(
            &merged,
            &[right("A1", "1950-01-01", "", ""), right("A2", "1905-01-01", "Y", "Y")],
        )
        .unwrap()
        .disaggregate_monthly(&crate::profile::UseProfiles::default());

        let (appropriative, riparian) = table.split_appropriative_riparian();
        assert_eq!(appropriative[0].application_id, "A1");
        assert!((appropriative[0].monthly.unwrap()[6] - 20.0).abs() < 1e-9);
        assert_eq!(riparian[0].application_id, "A2");
        assert!((riparian[0].monthly.unwrap()[0] - 1.0).abs() < 1e-9);
        assert!((riparian[0].monthly.unwrap()[5] - 1.0).abs() < 1e-9);
    }
}
