//! The emergency log.

use std::collections::HashMap;

use lifelink_domain::{Emergency, EmergencyStatus};

use crate::error::RegistryError;

/// Log of emergency incidents, keyed by emergency id.
///
/// Records are never removed: terminal incidents stay queryable for the
/// operator console and post-incident review. Like the unit roster this
/// is a plain structure; the dispatch board owns all locking.
#[derive(Debug, Default)]
pub struct EmergencyStore {
    emergencies: HashMap<String, Emergency>,
}

impl EmergencyStore {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new pending emergency.
    pub fn insert_pending(&mut self, emergency: Emergency) -> Result<(), RegistryError> {
        if self.emergencies.contains_key(&emergency.id) {
            return Err(RegistryError::DuplicateEmergency(emergency.id.clone()));
        }
        self.emergencies.insert(emergency.id.clone(), emergency);
        Ok(())
    }

    /// True when an emergency with this id is already recorded.
    pub fn contains(&self, emergency_id: &str) -> bool {
        self.emergencies.contains_key(emergency_id)
    }

    /// Look up an emergency.
    pub fn get(&self, emergency_id: &str) -> Result<&Emergency, RegistryError> {
        self.emergencies
            .get(emergency_id)
            .ok_or_else(|| RegistryError::EmergencyNotFound(emergency_id.to_string()))
    }

    /// All recorded emergencies, in no particular order.
    pub fn all(&self) -> impl Iterator<Item = &Emergency> {
        self.emergencies.values()
    }

    /// Non-terminal emergencies.
    pub fn active(&self) -> Vec<&Emergency> {
        self.emergencies.values().filter(|e| !e.is_terminal()).collect()
    }

    /// Emergencies still waiting for a unit.
    pub fn pending(&self) -> Vec<&Emergency> {
        self.emergencies
            .values()
            .filter(|e| e.status == EmergencyStatus::Pending)
            .collect()
    }

    /// The non-terminal emergency a unit is assigned to, if any.
    ///
    /// The one-active-emergency-per-unit invariant means there is never
    /// more than one.
    pub fn for_unit(&self, unit_id: &str) -> Option<&Emergency> {
        self.emergencies
            .values()
            .find(|e| !e.is_terminal() && e.assigned_unit_id.as_deref() == Some(unit_id))
    }

    /// Assign a unit (Pending → Dispatched).
    pub fn mark_dispatched(
        &mut self,
        emergency_id: &str,
        unit_id: &str,
        timestamp: u64,
    ) -> Result<(), RegistryError> {
        self.get_mut(emergency_id)?.assign(unit_id, timestamp)?;
        Ok(())
    }

    /// Swap the assignee while Dispatched (decline reassignment).
    pub fn reassign(
        &mut self,
        emergency_id: &str,
        unit_id: &str,
        timestamp: u64,
    ) -> Result<(), RegistryError> {
        self.get_mut(emergency_id)?.reassign(unit_id, timestamp)?;
        Ok(())
    }

    /// Return a dispatched emergency to the pending pool.
    pub fn revert_to_pending(
        &mut self,
        emergency_id: &str,
        timestamp: u64,
    ) -> Result<(), RegistryError> {
        self.get_mut(emergency_id)?.revert_to_pending(timestamp)?;
        Ok(())
    }

    /// Record that a unit declined this emergency.
    pub fn record_decline(
        &mut self,
        emergency_id: &str,
        unit_id: &str,
    ) -> Result<(), RegistryError> {
        self.get_mut(emergency_id)?.record_decline(unit_id);
        Ok(())
    }

    /// The assigned unit acknowledged (Dispatched → EnRoute).
    pub fn mark_en_route(
        &mut self,
        emergency_id: &str,
        timestamp: u64,
    ) -> Result<(), RegistryError> {
        self.get_mut(emergency_id)?.mark_en_route(timestamp)?;
        Ok(())
    }

    /// The assigned unit arrived (Dispatched/EnRoute → AtScene).
    pub fn mark_arrived(
        &mut self,
        emergency_id: &str,
        timestamp: u64,
    ) -> Result<(), RegistryError> {
        self.get_mut(emergency_id)?.mark_arrived(timestamp)?;
        Ok(())
    }

    /// Resolve the incident (AtScene → Completed).
    pub fn mark_completed(
        &mut self,
        emergency_id: &str,
        timestamp: u64,
    ) -> Result<(), RegistryError> {
        self.get_mut(emergency_id)?.mark_completed(timestamp)?;
        Ok(())
    }

    /// Terminally decline the incident (Dispatched → Declined).
    pub fn mark_declined(
        &mut self,
        emergency_id: &str,
        timestamp: u64,
    ) -> Result<(), RegistryError> {
        self.get_mut(emergency_id)?.mark_declined(timestamp)?;
        Ok(())
    }

    /// Withdraw the incident (Pending/Dispatched → Cancelled).
    pub fn mark_cancelled(
        &mut self,
        emergency_id: &str,
        timestamp: u64,
    ) -> Result<(), RegistryError> {
        self.get_mut(emergency_id)?.mark_cancelled(timestamp)?;
        Ok(())
    }

    /// Number of recorded emergencies, terminal included.
    pub fn len(&self) -> usize {
        self.emergencies.len()
    }

    /// True when nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.emergencies.is_empty()
    }

    fn get_mut(&mut self, emergency_id: &str) -> Result<&mut Emergency, RegistryError> {
        self.emergencies
            .get_mut(emergency_id)
            .ok_or_else(|| RegistryError::EmergencyNotFound(emergency_id.to_string()))
    }
}
