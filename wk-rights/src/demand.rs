//! Demand table keyed by water right application id, and its monthly
//! disaggregation.

use crate::error::{Result, RightsError};
use crate::profile::UseProfiles;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Annual use estimates and right metadata for one application.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DemandRecord {
    pub application_id: String,
    /// Catchment the point of diversion lies in.
    pub feature_id: Option<String>,
    pub vineyard_water: Option<f64>,
    pub orchard_water: Option<f64>,
    /// Structure use, summer half of the year (AF).
    pub summer_water: Option<f64>,
    /// Structure use, winter half of the year (AF).
    pub winter_water: Option<f64>,
    pub status_date: Option<NaiveDate>,
    pub riparian: bool,
    pub pre_1914: bool,
    /// Demand per calendar month, January first. Set by
    /// [`DemandTable::disaggregate_monthly`].
    pub monthly: Option<[f64; 12]>,
}

impl DemandRecord {
    pub fn new(application_id: impl Into<String>) -> Self {
        DemandRecord {
            application_id: application_id.into(),
            ..Default::default()
        }
    }

    /// Appropriative rights are every right that is not riparian.
    pub fn is_appropriative(&self) -> bool {
        !self.riparian
    }

    fn disaggregated(&self, profiles: &UseProfiles) -> DemandRecord {
        let vineyard = self.vineyard_water.unwrap_or(0.0);
        let orchard = self.orchard_water.unwrap_or(0.0);
        let summer = self.summer_water.unwrap_or(0.0);
        let winter = self.winter_water.unwrap_or(0.0);
        let mut monthly = [0.0; 12];
        for (m, value) in monthly.iter_mut().enumerate() {
            *value = profiles.vineyard.0[m] * vineyard
                + profiles.orchard.0[m] * orchard
                + profiles.winter_domestic.0[m] * winter
                + profiles.summer_domestic.0[m] * summer;
        }
        DemandRecord {
            vineyard_water: Some(vineyard),
            orchard_water: Some(orchard),
            summer_water: Some(summer),
            winter_water: Some(winter),
            monthly: Some(monthly),
            ..self.clone()
        }
    }
}

/// Ordered demand records with unique application ids.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DemandTable {
    records: Vec<DemandRecord>,
}

impl DemandTable {
    pub fn new(records: Vec<DemandRecord>) -> Result<Self> {
        let mut seen = BTreeSet::new();
        for record in &records {
            if !seen.insert(record.application_id.as_str()) {
                return Err(RightsError::DuplicateKey(record.application_id.clone()));
            }
        }
        Ok(DemandTable { records })
    }

    /// Table from records keyed by their own application id, in key order.
    pub(crate) fn from_keyed<K: Ord>(records: BTreeMap<K, DemandRecord>) -> Self {
        DemandTable {
            records: records.into_values().collect(),
        }
    }

    pub fn records(&self) -> &[DemandRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, application_id: &str) -> Option<&DemandRecord> {
        self.records
            .iter()
            .find(|r| r.application_id == application_id)
    }

    /// Spread each record's annual estimates over the calendar months.
    ///
    /// Missing raw quantities count as 0 and are filled with 0 in the
    /// result. Row order is kept.
    pub fn disaggregate_monthly(&self, profiles: &UseProfiles) -> DemandTable {
        DemandTable {
            records: self
                .records
                .iter()
                .map(|r| r.disaggregated(profiles))
                .collect(),
        }
    }

    /// Stable sort by status date, records without a date last.
    pub fn sorted_by_status_date(&self) -> DemandTable {
        let mut records = self.records.clone();
        records.sort_by_key(|r| (r.status_date.is_none(), r.status_date));
        DemandTable { records }
    }

    /// Records matching a predicate, in table order.
    pub fn filter<F>(&self, predicate: F) -> Vec<&DemandRecord>
    where
        F: Fn(&DemandRecord) -> bool,
    {
        self.records.iter().filter(|r| predicate(r)).collect()
    }

    /// `(appropriative, riparian)`
    pub fn split_appropriative_riparian(&self) -> (Vec<&DemandRecord>, Vec<&DemandRecord>) {
        self.records.iter().partition(|r| r.is_appropriative())
    }

    /// Appropriative rights as `(pre_1914, post_1914)`.
    pub fn split_pre_1914(&self) -> (Vec<&DemandRecord>, Vec<&DemandRecord>) {
        self.records
            .iter()
            .filter(|r| r.is_appropriative())
            .partition(|r| r.pre_1914)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{MONTH_ABBREVIATIONS, VINEYARD_STORAGE_USE_PROFILE};

    fn record(id: &str, riparian: bool, pre_1914: bool) -> DemandRecord {
        DemandRecord {
            riparian,
            pre_1914,
            ..DemandRecord::new(id)
        }
    }

    #[test]
    fn test_vineyard_only_disaggregation() {
        let table = DemandTable::new(vec![DemandRecord {
            vineyard_water: Some(120.0),
            ..DemandRecord::new("A001")
        }])
        .unwrap();
        let result = table.disaggregate_monthly(&UseProfiles::default());
        let monthly = result.records()[0].monthly.unwrap();
        let july = MONTH_ABBREVIATIONS.iter().position(|m| *m == "Jul").unwrap();
        assert!((monthly[july] - 20.0).abs() < 1e-9);
        assert!((monthly[7] - 40.0).abs() < 1e-9);
        assert_eq!(monthly[0], 0.0);
        assert!((monthly.iter().sum::<f64>() - 120.0).abs() < 1e-9);
        // the input table is left alone
        assert_eq!(table.records()[0].monthly, None);
        assert_eq!(result.records()[0].orchard_water, Some(0.0));
    }

    #[test]
    fn test_all_categories_combine() {
        let table = DemandTable::new(vec![DemandRecord {
            vineyard_water: Some(6.0),
            orchard_water: Some(10.0),
            summer_water: Some(12.0),
            winter_water: Some(18.0),
            ..DemandRecord::new("A002")
        }])
        .unwrap();
        let monthly = table.disaggregate_monthly(&UseProfiles::default()).records()[0]
            .monthly
            .unwrap();
        // Jan: winter only
        assert!((monthly[0] - 3.0).abs() < 1e-9);
        // Jul: vineyard 1 + orchard 2 + summer 2
        assert!((monthly[6] - 5.0).abs() < 1e-9);
        // Oct: vineyard 1 + orchard 1 + winter 3
        assert!((monthly[9] - 5.0).abs() < 1e-9);
        assert!((monthly.iter().sum::<f64>() - 46.0).abs() < 1e-9);
    }

    #[test]
    fn test_storage_profile_moves_vineyard_demand_to_winter() {
        let profiles = UseProfiles {
            vineyard: VINEYARD_STORAGE_USE_PROFILE,
            ..UseProfiles::default()
        };
        let table = DemandTable::new(vec![DemandRecord {
            vineyard_water: Some(90.0),
            ..DemandRecord::new("A003")
        }])
        .unwrap();
        let monthly = table.disaggregate_monthly(&profiles).records()[0]
            .monthly
            .unwrap();
        assert!((monthly[0] - 30.0).abs() < 1e-9);
        assert!((monthly[11] - 30.0).abs() < 1e-9);
        assert_eq!(monthly[6], 0.0);
    }

    #[test]
    fn test_duplicate_application_id() {
        let err =
            DemandTable::new(vec![DemandRecord::new("A"), DemandRecord::new("A")]).unwrap_err();
        assert_eq!(err, RightsError::DuplicateKey("A".to_string()));
    }

    #[test]
    fn test_sort_by_status_date_puts_missing_last() {
        let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d);
        let table = DemandTable::new(vec![
            DemandRecord::new("none-1"),
            DemandRecord {
                status_date: date(1990, 5, 1),
                ..DemandRecord::new("late")
            },
            DemandRecord::new("none-2"),
            DemandRecord {
                status_date: date(1910, 1, 1),
                ..DemandRecord::new("early")
            },
        ])
        .unwrap();
        let sorted = table.sorted_by_status_date();
        let ids: Vec<&str> = sorted
            .records()
            .iter()
            .map(|r| r.application_id.as_str())
            .collect();
        assert_eq!(ids, vec!["early", "late", "none-1", "none-2"]);
    }

    #[test]
    fn test_from_keyed_follows_key_order() {
        let mut keyed = BTreeMap::new();
        keyed.insert("S002", DemandRecord::new("S002"));
        keyed.insert("S001", DemandRecord::new("S001"));
        let table = DemandTable::from_keyed(keyed);
        assert_eq!(table.len(), 2);
        assert_eq!(table.records()[0].application_id, "S001");
        assert!(table.get("S002").is_some());
    }

    #[test]
    fn test_splits() {
        let table = DemandTable::new(vec![
            record("rip", true, false),
            record("pre", false, true),
            record("post", false, false),
            record("rip-pre", true, true),
        ])
        .unwrap();
        let (appropriative, riparian) = table.split_appropriative_riparian();
        assert_eq!(appropriative.len(), 2);
        assert_eq!(riparian.len(), 2);
        let (pre, post) = table.split_pre_1914();
        assert_eq!(pre.len(), 1);
        assert_eq!(pre[0].application_id, "pre");
        assert_eq!(post[0].application_id, "post");
        assert_eq!(table.filter(|r| r.pre_1914).len(), 2);
        assert_eq!(table.len(), 4);
    }
}
