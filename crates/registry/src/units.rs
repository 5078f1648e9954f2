//! The unit roster.

use std::collections::{HashMap, VecDeque};

use lifelink_domain::{LocationReport, TrackPoint, Unit, UnitStatus};
use lifelink_geo::Coordinate;

use crate::error::RegistryError;

/// Roster of field units, keyed by unit id.
///
/// A plain single-threaded structure; concurrent access goes through the
/// dispatch board. Alongside each unit the roster keeps a bounded trail
/// of recent location reports for the operator console's movement view.
#[derive(Debug)]
pub struct UnitRegistry {
    units: HashMap<String, Unit>,
    trails: HashMap<String, VecDeque<TrackPoint>>,
    trail_depth: usize,
}

impl UnitRegistry {
    /// Create an empty roster keeping up to `trail_depth` track points
    /// per unit (0 disables trails).
    pub fn new(trail_depth: usize) -> Self {
        Self {
            units: HashMap::new(),
            trails: HashMap::new(),
            trail_depth,
        }
    }

    /// Add a unit to the roster.
    pub fn register(&mut self, unit: Unit) -> Result<(), RegistryError> {
        if self.units.contains_key(&unit.id) {
            return Err(RegistryError::DuplicateUnit(unit.id.clone()));
        }
        self.units.insert(unit.id.clone(), unit);
        Ok(())
    }

    /// Look up a unit.
    pub fn get(&self, unit_id: &str) -> Result<&Unit, RegistryError> {
        self.units
            .get(unit_id)
            .ok_or_else(|| RegistryError::UnitNotFound(unit_id.to_string()))
    }

    /// All registered units, in no particular order.
    pub fn all(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    /// Units the assignment engine may currently claim: active, on duty,
    /// unassigned, and with a known position. Order is unspecified.
    pub fn list_available(&self) -> Vec<&Unit> {
        self.units
            .values()
            .filter(|unit| unit.can_accept_dispatch())
            .collect()
    }

    /// Record a location report for a unit.
    ///
    /// Valid in every duty status; overwrites the last-known position and
    /// appends to the unit's bounded trail.
    pub fn update_location(
        &mut self,
        unit_id: &str,
        coordinate: Coordinate,
        report: LocationReport,
    ) -> Result<(), RegistryError> {
        let unit = self.get_mut(unit_id)?;
        unit.update_location(coordinate, report);

        if self.trail_depth > 0 {
            let trail = self.trails.entry(unit_id.to_string()).or_default();
            trail.push_back(TrackPoint { coordinate, report });
            while trail.len() > self.trail_depth {
                trail.pop_front();
            }
        }
        Ok(())
    }

    /// Recent track points for a unit, oldest first.
    pub fn trail(&self, unit_id: &str) -> Result<Vec<TrackPoint>, RegistryError> {
        // Distinguish "unknown unit" from "no reports yet".
        self.get(unit_id)?;
        Ok(self
            .trails
            .get(unit_id)
            .map(|trail| trail.iter().copied().collect())
            .unwrap_or_default())
    }

    /// Sign a unit on or off duty.
    pub fn set_duty(
        &mut self,
        unit_id: &str,
        on_duty: bool,
        timestamp: u64,
    ) -> Result<(), RegistryError> {
        let unit = self.get_mut(unit_id)?;
        if !unit.active {
            return Err(RegistryError::UnitInactive(unit_id.to_string()));
        }
        if on_duty {
            unit.go_on_duty(timestamp)?;
        } else {
            unit.go_off_duty(timestamp)?;
        }
        Ok(())
    }

    /// Claim a unit for an emergency (Available → EnRoute).
    ///
    /// This is the commit-time re-validation of the assignment loop: the
    /// candidate was chosen from an earlier snapshot, so any change since
    /// then surfaces as `ClaimConflict` and the caller re-ranks.
    pub fn claim_for_dispatch(
        &mut self,
        unit_id: &str,
        emergency_id: &str,
        timestamp: u64,
    ) -> Result<(), RegistryError> {
        let unit = self.get_mut(unit_id)?;
        if !unit.can_accept_dispatch() {
            return Err(RegistryError::ClaimConflict {
                unit_id: unit_id.to_string(),
                emergency_id: emergency_id.to_string(),
            });
        }
        unit.claim(emergency_id, timestamp)
            .map_err(|_| RegistryError::ClaimConflict {
                unit_id: unit_id.to_string(),
                emergency_id: emergency_id.to_string(),
            })
    }

    /// Record a unit's arrival on scene (EnRoute → AtScene).
    pub fn mark_at_scene(&mut self, unit_id: &str, timestamp: u64) -> Result<(), RegistryError> {
        let unit = self.get_mut(unit_id)?;
        unit.mark_at_scene(timestamp)?;
        Ok(())
    }

    /// Release a unit back to the available pool, clearing its
    /// assignment (EnRoute/AtScene → Available).
    pub fn release(&mut self, unit_id: &str, timestamp: u64) -> Result<(), RegistryError> {
        let unit = self.get_mut(unit_id)?;
        unit.release(timestamp)?;
        Ok(())
    }

    /// Soft-delete a unit. Fails with `UnitBusy` while assigned.
    pub fn deactivate(&mut self, unit_id: &str, timestamp: u64) -> Result<(), RegistryError> {
        let unit = self.get_mut(unit_id)?;
        unit.deactivate(timestamp)?;
        Ok(())
    }

    /// Number of registered units.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// True when no units are registered.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    fn get_mut(&mut self, unit_id: &str) -> Result<&mut Unit, RegistryError> {
        self.units
            .get_mut(unit_id)
            .ok_or_else(|| RegistryError::UnitNotFound(unit_id.to_string()))
    }
}

impl Default for UnitRegistry {
    fn default() -> Self {
        Self::new(50)
    }
}
