//! Drainage area: the total area of every catchment that drains into a
//! given catchment, the catchment itself included.

use crate::closure::TransitiveClosure;
use crate::connectivity::NodeId;
use crate::error::{NetworkError, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A catchment and its own (local) area in square kilometres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catchment<Id> {
    pub id: Id,
    pub area_sq_km: f64,
}

impl<Id> Catchment<Id> {
    pub fn new(id: Id, area_sq_km: f64) -> Self {
        Self { id, area_sq_km }
    }
}

/// What to do with upstream catchments that have no recorded area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MissingAreaPolicy {
    /// Contribute zero.
    #[default]
    Lenient,
    /// Fail with [`NetworkError::MissingArea`].
    Strict,
}

/// Sums catchment areas over the reachability sets of a closure.
#[derive(Debug, Clone)]
pub struct DrainageAreaAggregator<'a, Id> {
    closure: &'a TransitiveClosure<Id>,
    // indexed like the closure ids
    areas: Vec<Option<f64>>,
    policy: MissingAreaPolicy,
}

impl<'a, Id: NodeId> DrainageAreaAggregator<'a, Id> {
    /// Pair a closure with per-catchment areas.
    ///
    /// Areas for ids outside the closure are ignored. Fails with
    /// [`NetworkError::DimensionMismatch`] when the closure is non-empty but
    /// none of its ids has an area.
    pub fn new<I>(
        closure: &'a TransitiveClosure<Id>,
        catchments: I,
        policy: MissingAreaPolicy,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = Catchment<Id>>,
    {
        let mut areas = vec![None; closure.len()];
        let mut provided = 0usize;
        let mut matched = 0usize;
        for catchment in catchments {
            provided += 1;
            if let Some(i) = closure.index_of(&catchment.id) {
                if areas[i].is_none() {
                    matched += 1;
                }
                areas[i] = Some(catchment.area_sq_km);
            }
        }
        if !closure.is_empty() && matched == 0 {
            return Err(NetworkError::DimensionMismatch {
                nodes: closure.len(),
                areas: provided,
            });
        }
        let missing = closure.len() - matched;
        if missing > 0 {
            match policy {
                MissingAreaPolicy::Lenient => warn!(
                    "drainage: {missing} of {} catchments have no area and contribute 0",
                    closure.len()
                ),
                MissingAreaPolicy::Strict => info!(
                    "drainage: {missing} of {} catchments have no area",
                    closure.len()
                ),
            }
        }
        Ok(DrainageAreaAggregator {
            closure,
            areas,
            policy,
        })
    }

    fn area_at(&self, j: usize) -> Result<f64> {
        match (self.areas[j], self.policy) {
            (Some(area), _) => Ok(area),
            (None, MissingAreaPolicy::Lenient) => Ok(0.0),
            (None, MissingAreaPolicy::Strict) => Err(NetworkError::MissingArea(
                self.closure.ids()[j].to_string(),
            )),
        }
    }

    fn drainage_area_at(&self, c: usize) -> Result<f64> {
        self.closure
            .upstream_indices(c)
            .map(|j| self.area_at(j))
            .sum()
    }

    /// Drainage area of one catchment.
    pub fn drainage_area(&self, id: &Id) -> Result<f64> {
        let c = self
            .closure
            .index_of(id)
            .ok_or_else(|| NetworkError::UnknownIdentifier(id.to_string()))?;
        self.drainage_area_at(c)
    }

    /// Drainage area of every catchment in the closure.
    pub fn drainage_areas(&self) -> Result<BTreeMap<Id, f64>> {
        self.closure
            .ids()
            .iter()
            .enumerate()
            .map(|(c, id)| Ok((id.clone(), self.drainage_area_at(c)?)))
            .collect()
    }

    /// Drainage areas for a catchment table, in table order, as
    /// catchments carrying their total area.
    pub fn drainage_areas_for(&self, catchments: &[Catchment<Id>]) -> Result<Vec<Catchment<Id>>> {
        catchments
            .iter()
            .map(|c| Ok(Catchment::new(c.id.clone(), self.drainage_area(&c.id)?)))
            .collect()
    }
}
