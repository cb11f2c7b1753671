//! Fixed reference data: the waste taxonomy and the daily time slots.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::model::{CategoryId, GroupId, TimeSlotId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Top level of the waste taxonomy.
pub struct WasteGroup {
    /// Unique identifier.
    pub id: GroupId,
    /// Display label.
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A selectable waste category.
pub struct WasteCategory {
    /// Unique identifier.
    pub id: CategoryId,
    /// Display label.
    pub display_label: String,
    /// Group this category belongs to.
    pub parent_group_id: Option<GroupId>,
}

/// The waste taxonomy offered to users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WasteCatalog {
    groups: Vec<WasteGroup>,
    categories: Vec<WasteCategory>,
}

impl WasteCatalog {
    /// Build a catalog from explicit groups and categories.
    #[must_use]
    pub fn new(groups: Vec<WasteGroup>, categories: Vec<WasteCategory>) -> Self {
        Self { groups, categories }
    }

    /// The standard recyclables taxonomy.
    #[must_use]
    pub fn standard() -> Self {
        const GROUPS: [(&str, &str); 5] = [
            ("paper", "Kertas"),
            ("plastic", "Plastik"),
            ("metal", "Logam"),
            ("glass", "Kaca"),
            ("electronic", "Elektronik"),
        ];
        const CATEGORIES: [(&str, &str, &str); 12] = [
            ("paper-koran", "Koran", "paper"),
            ("paper-kardus", "Kardus", "paper"),
            ("paper-hvs", "Kertas HVS", "paper"),
            ("plastic-pet-bening", "Botol PET bening", "plastic"),
            ("plastic-pet-warna", "Botol PET warna", "plastic"),
            ("plastic-hdpe", "Jerigen / HDPE", "plastic"),
            ("plastic-gelas", "Gelas plastik", "plastic"),
            ("metal-kaleng", "Kaleng aluminium", "metal"),
            ("metal-besi", "Besi", "metal"),
            ("glass-botol", "Botol kaca", "glass"),
            ("electronic-kecil", "Elektronik kecil", "electronic"),
            ("electronic-baterai", "Baterai", "electronic"),
        ];

        let groups = GROUPS
            .iter()
            .map(|(id, label)| WasteGroup {
                id: GroupId((*id).to_owned()),
                label: (*label).to_owned(),
            })
            .collect();
        let categories = CATEGORIES
            .iter()
            .map(|(id, label, group)| WasteCategory {
                id: CategoryId::new(*id),
                display_label: (*label).to_owned(),
                parent_group_id: Some(GroupId((*group).to_owned())),
            })
            .collect();
        Self::new(groups, categories)
    }

    /// All categories in catalog order.
    #[must_use]
    pub fn categories(&self) -> &[WasteCategory] {
        &self.categories
    }

    /// All groups in catalog order.
    #[must_use]
    pub fn groups(&self) -> &[WasteGroup] {
        &self.groups
    }

    /// Look up a category.
    #[must_use]
    pub fn category(&self, id: &CategoryId) -> Option<&WasteCategory> {
        self.categories.iter().find(|category| &category.id == id)
    }

    /// Categories belonging to one group.
    pub fn categories_in<'catalog>(
        &'catalog self,
        group: &'catalog GroupId,
    ) -> impl Iterator<Item = &'catalog WasteCategory> {
        self.categories
            .iter()
            .filter(move |category| category.parent_group_id.as_ref() == Some(group))
    }

    /// Whether the id names a known category.
    #[must_use]
    pub fn contains(&self, id: &CategoryId) -> bool {
        self.category(id).is_some()
    }
}

impl Default for WasteCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A fixed window of the day during which pickups and drop-offs happen.
pub struct TimeSlot {
    /// Unique identifier.
    pub id: TimeSlotId,
    /// Display label such as `08:00 - 10:00`.
    pub label: String,
    /// Start of the window.
    pub start: NaiveTime,
    /// End of the window.
    pub end: NaiveTime,
    /// Disabled slots are listed but never bookable.
    pub enabled: bool,
}

/// The slots offered every day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSlotCatalog {
    slots: Vec<TimeSlot>,
}

impl TimeSlotCatalog {
    /// Build a catalog from explicit slots.
    #[must_use]
    pub fn new(slots: Vec<TimeSlot>) -> Self {
        Self { slots }
    }

    /// Four two-hour windows between 08:00 and 17:00 with a lunch break.
    #[must_use]
    pub fn standard() -> Self {
        const WINDOWS: [(u32, u32); 4] = [(8, 10), (10, 12), (13, 15), (15, 17)];

        let slots = WINDOWS
            .iter()
            .map(|&(start, end)| TimeSlot {
                id: TimeSlotId(format!("slot-{start:02}00")),
                label: format!("{start:02}:00 - {end:02}:00"),
                start: on_the_hour(start),
                end: on_the_hour(end),
                enabled: true,
            })
            .collect();
        Self::new(slots)
    }

    /// All slots in chronological order.
    #[must_use]
    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    /// Look up a slot.
    #[must_use]
    pub fn slot(&self, id: &TimeSlotId) -> Option<&TimeSlot> {
        self.slots.iter().find(|slot| &slot.id == id)
    }

    /// A slot is bookable when it exists, is enabled, and has not yet started
    /// if `date` is the current day.
    #[must_use]
    pub fn is_available(&self, id: &TimeSlotId, date: NaiveDate, now: NaiveDateTime) -> bool {
        self.slot(id).is_some_and(|slot| {
            slot.enabled && (date != now.date() || now.time() < slot.start)
        })
    }
}

impl Default for TimeSlotCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

fn on_the_hour(hour: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, day)
            .and_then(|date| date.and_hms_opt(hour, 30, 0))
            .unwrap()
    }

    #[test]
    fn standard_catalog_has_expected_ids() {
        let catalog = WasteCatalog::standard();
        assert!(catalog.contains(&CategoryId::new("paper-koran")), "paper-koran");
        assert!(catalog.contains(&CategoryId::new("plastic-pet-bening")), "plastic-pet-bening");
        assert!(!catalog.contains(&CategoryId::new("nuclear")), "unknown id");
    }

    #[test]
    fn every_category_belongs_to_a_known_group() {
        let catalog = WasteCatalog::standard();
        for category in catalog.categories() {
            let group = category.parent_group_id.as_ref().unwrap();
            assert!(
                catalog.groups().iter().any(|known| &known.id == group),
                "{} has unknown group",
                category.id
            );
        }
        let paper = GroupId("paper".to_owned());
        assert_eq!(catalog.categories_in(&paper).count(), 3);
    }

    #[test]
    fn slots_that_already_started_today_are_unavailable() {
        let slots = TimeSlotCatalog::standard();
        let morning = TimeSlotId("slot-0800".to_owned());
        let afternoon = TimeSlotId("slot-1300".to_owned());
        let now = at(10, 9);

        assert!(!slots.is_available(&morning, now.date(), now), "08:00 slot already started");
        assert!(slots.is_available(&afternoon, now.date(), now), "13:00 slot still open");
        assert!(slots.is_available(&morning, at(11, 9).date(), now), "tomorrow is open");
    }

    #[test]
    fn disabled_and_unknown_slots_are_unavailable() {
        let mut slots = TimeSlotCatalog::standard().slots().to_vec();
        if let Some(first) = slots.first_mut() {
            first.enabled = false;
        }
        let catalog = TimeSlotCatalog::new(slots);
        let now = at(10, 6);

        assert!(!catalog.is_available(&TimeSlotId("slot-0800".to_owned()), at(12, 0).date(), now), "disabled");
        assert!(!catalog.is_available(&TimeSlotId("slot-2300".to_owned()), at(12, 0).date(), now), "unknown");
    }
}
