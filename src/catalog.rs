use chrono::{Duration, NaiveTime, Timelike};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotDefinition {
    pub id: String,
    pub label: String,
    pub description: String,
    pub start_hour: u32,
    pub start_minute: u32,
    pub duration: Duration,
}

impl SlotDefinition {
    pub fn new(
        id: &str,
        label: &str,
        description: &str,
        start_hour: u32,
        start_minute: u32,
        duration: Duration,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: description.into(),
            start_hour,
            start_minute,
            duration,
        }
    }

    pub fn start_time(&self) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(self.start_hour, self.start_minute, 0)
    }

    /// Human readable length, e.g. "3 hrs".
    pub fn duration_label(&self) -> String {
        format!("{} hrs", self.duration.num_hours())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("slot id `{0}` is defined more than once")]
    DuplicateId(String),
    #[error("slot `{0}` must have a positive duration")]
    NonPositiveDuration(String),
    #[error("slot `{0}` has an invalid start time")]
    InvalidStartTime(String),
}

/// Ordered set of the service slots offered every day.
#[derive(Debug, Clone)]
pub struct SlotCatalog {
    definitions: Vec<SlotDefinition>,
    lookup: HashMap<String, usize>,
}

impl SlotCatalog {
    pub fn new(definitions: Vec<SlotDefinition>) -> Result<Self, CatalogError> {
        let mut lookup = HashMap::with_capacity(definitions.len());
        for (index, slot) in definitions.iter().enumerate() {
            if slot.duration <= Duration::zero() {
                return Err(CatalogError::NonPositiveDuration(slot.id.clone()));
            }
            if slot.start_time().is_none() {
                return Err(CatalogError::InvalidStartTime(slot.id.clone()));
            }
            if lookup.insert(slot.id.clone(), index).is_some() {
                return Err(CatalogError::DuplicateId(slot.id.clone()));
            }
        }
        Ok(Self {
            definitions,
            lookup,
        })
    }

    pub fn definitions(&self) -> &[SlotDefinition] {
        &self.definitions
    }

    pub fn by_id(&self, id: &str) -> Option<&SlotDefinition> {
        self.lookup
            .get(id)
            .and_then(|index| self.definitions.get(*index))
    }

    /// Finds the slot starting at the given local time of day, if any.
    pub fn matching_start<T: Timelike>(&self, local: &T) -> Option<&SlotDefinition> {
        self.definitions
            .iter()
            .find(|slot| slot.start_hour == local.hour() && slot.start_minute == local.minute())
    }
}

/// The sessions offered every day.
pub fn default_slots() -> Vec<SlotDefinition> {
    vec![
        SlotDefinition::new(
            "morning-detail",
            "Morning Detail",
            "Kick off the day with a full refresh.",
            8,
            0,
            Duration::hours(3),
        ),
        SlotDefinition::new(
            "midday-refresh",
            "Midday Refresh",
            "Great for exterior + interior combos.",
            12,
            30,
            Duration::hours(3),
        ),
        SlotDefinition::new(
            "late-day-polish",
            "Late Day Polish",
            "Perfect for after-work drop-offs.",
            16,
            0,
            Duration::hours(3),
        ),
    ]
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_catalog_order_and_lookup() {
        let catalog = SlotCatalog::new(default_slots()).unwrap();
        let ids: Vec<&str> = catalog
            .definitions()
            .iter()
            .map(|slot| slot.id.as_str())
            .collect();
        assert_eq!(ids, vec!["morning-detail", "midday-refresh", "late-day-polish"]);

        let midday = catalog.by_id("midday-refresh").unwrap();
        assert_eq!(midday.start_hour, 12);
        assert_eq!(midday.start_minute, 30);
        assert_eq!(midday.duration_label(), "3 hrs");
        assert!(catalog.by_id("evening-wax").is_none());
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let slot = SlotDefinition::new("a", "A", "", 9, 0, Duration::hours(1));
        let result = SlotCatalog::new(vec![slot.clone(), slot]);
        assert_eq!(result.unwrap_err(), CatalogError::DuplicateId("a".into()));
    }

    #[test]
    fn test_non_positive_duration_is_rejected() {
        let slot = SlotDefinition::new("a", "A", "", 9, 0, Duration::zero());
        assert_eq!(
            SlotCatalog::new(vec![slot]).unwrap_err(),
            CatalogError::NonPositiveDuration("a".into())
        );
    }

    #[test]
    fn test_matching_start() {
        let catalog = SlotCatalog::new(default_slots()).unwrap();
        let time = NaiveTime::from_hms_opt(16, 0, 0).unwrap();
        assert_eq!(catalog.matching_start(&time).unwrap().id, "late-day-polish");

        let time = NaiveTime::from_hms_opt(16, 15, 0).unwrap();
        assert!(catalog.matching_start(&time).is_none());
    }
}
