//! In-memory schedule store
//!
//! Reference [`ScheduleRepository`] implementation for tests and embedding.
//! Besides direct inserts it can ingest a provider-shaped JSON document,
//! where each schedule carries its rate rows grouped under the upstream
//! table names. Rows that do not decode are skipped and logged; the rest of
//! the schedule still loads.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::schedule::{
    ChargeCategory, ComponentRow, RateKind, RateSchedule, ScheduleRepository, ScheduleSummary,
};
use crate::domain::{DomainError, DomainResult};

/// In-memory storage for development and testing
pub struct InMemoryScheduleStore {
    schedules: DashMap<String, RateSchedule>,
}

impl InMemoryScheduleStore {
    pub fn new() -> Self {
        Self {
            schedules: DashMap::new(),
        }
    }

    pub fn insert_schedule(&self, schedule: RateSchedule) {
        self.schedules.insert(schedule.schedule_id.clone(), schedule);
    }

    /// Ingest a provider-shaped JSON document (an array of schedules with
    /// per-table rate rows). Returns the number of schedules loaded.
    pub fn load_provider_document(&self, json: &str) -> DomainResult<usize> {
        let schedules: Vec<ProviderSchedule> =
            serde_json::from_str(json).map_err(|e| DomainError::MalformedData(e.to_string()))?;
        let count = schedules.len();
        for provider_schedule in schedules {
            self.insert_schedule(provider_schedule.into_schedule());
        }
        Ok(count)
    }
}

impl Default for InMemoryScheduleStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScheduleRepository for InMemoryScheduleStore {
    async fn load_schedule(&self, schedule_id: &str) -> DomainResult<Option<RateSchedule>> {
        debug!("Loading schedule {}", schedule_id);
        Ok(self
            .schedules
            .get(schedule_id)
            .map(|entry| entry.value().clone()))
    }

    async fn list_schedules(&self) -> DomainResult<Vec<ScheduleSummary>> {
        let mut summaries: Vec<ScheduleSummary> = self
            .schedules
            .iter()
            .map(|entry| entry.value().summary())
            .collect();
        summaries.sort_by(|a, b| a.schedule_id.cmp(&b.schedule_id));
        Ok(summaries)
    }
}

// ── Provider document shape ────────────────────────────────────

#[derive(Deserialize)]
struct ProviderSchedule {
    #[serde(alias = "ScheduleID")]
    schedule_id: String,
    #[serde(alias = "ScheduleName")]
    name: String,
    #[serde(default, alias = "ScheduleDescription")]
    description: Option<String>,
    #[serde(flatten)]
    sections: ProviderSections,
}

/// Per-table rate rows, named as the upstream provider names its tables
#[derive(Default, Deserialize)]
#[serde(default)]
struct ProviderSections {
    #[serde(alias = "ServiceCharge")]
    service_charge: Vec<Value>,
    #[serde(alias = "Energy")]
    energy: Vec<Value>,
    #[serde(alias = "IncrementalEnergy")]
    incremental_energy: Vec<Value>,
    #[serde(alias = "EnergyTime")]
    energy_time: Vec<Value>,
    #[serde(alias = "Demand")]
    demand: Vec<Value>,
    #[serde(alias = "IncrementalDemand")]
    incremental_demand: Vec<Value>,
    #[serde(alias = "DemandTime")]
    demand_time: Vec<Value>,
    #[serde(alias = "ReactiveDemand")]
    reactive_demand: Vec<Value>,
    #[serde(alias = "OtherCharges")]
    other_charges: Vec<Value>,
    #[serde(alias = "Percentages")]
    percentages: Vec<Value>,
    #[serde(alias = "TaxInfo")]
    tax_info: Vec<Value>,
}

impl ProviderSchedule {
    fn into_schedule(self) -> RateSchedule {
        let mut schedule = RateSchedule::new(self.schedule_id, self.name);
        schedule.description = self.description;

        let sections = self.sections;
        ingest(&mut schedule, sections.service_charge, ChargeCategory::Service, RateKind::Flat);
        ingest(&mut schedule, sections.energy, ChargeCategory::Energy, RateKind::Flat);
        ingest(&mut schedule, sections.incremental_energy, ChargeCategory::Energy, RateKind::Tiered);
        ingest(&mut schedule, sections.energy_time, ChargeCategory::Energy, RateKind::TimeOfUse);
        ingest(&mut schedule, sections.demand, ChargeCategory::Demand, RateKind::Flat);
        ingest(&mut schedule, sections.incremental_demand, ChargeCategory::Demand, RateKind::Tiered);
        ingest(&mut schedule, sections.demand_time, ChargeCategory::Demand, RateKind::TimeOfUse);
        ingest(&mut schedule, sections.reactive_demand, ChargeCategory::Demand, RateKind::Reactive);
        ingest(&mut schedule, sections.other_charges, ChargeCategory::Other, RateKind::Flat);
        ingest(&mut schedule, sections.percentages, ChargeCategory::Percentage, RateKind::Flat);
        ingest(&mut schedule, sections.tax_info, ChargeCategory::Tax, RateKind::Flat);

        schedule
    }
}

fn ingest(
    schedule: &mut RateSchedule,
    rows: Vec<Value>,
    category: ChargeCategory,
    kind: RateKind,
) {
    for row in rows {
        match serde_json::from_value::<ComponentRow>(row) {
            Ok(row) => schedule.push(row.into_component(category, kind)),
            Err(e) => warn!(
                "Skipping undecodable {} row for schedule {}: {}",
                category, schedule.schedule_id, e
            ),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &str = r#"[
        {
            "ScheduleID": "EV2-A",
            "ScheduleName": "Residential EV Time-of-Use",
            "ScheduleDescription": "Overnight EV charging rate",
            "ServiceCharge": [
                {"Description": "Customer Charge", "Rate": 15.0, "ChargeUnit": "per_month"}
            ],
            "EnergyTime": [
                {"Description": "Off-Peak", "RatekWh": 0.24, "StartTime": "21:00", "EndTime": "16:00"},
                {"Description": "Peak", "RatekWh": 0.61, "StartTime": "16:00", "EndTime": "21:00"}
            ],
            "TaxInfo": [
                {"Type": "Utility Users Tax", "City": "Oakland", "Per_cent": 7.5}
            ]
        },
        {
            "ScheduleID": "GS-2",
            "ScheduleName": "General Service Demand",
            "Demand": [
                {"Description": "Demand", "RatekW": 18.0}
            ],
            "ReactiveDemand": [
                {"Description": "Reactive Demand", "RatekVAR": 0.5}
            ],
            "IncrementalDemand": [
                {"Description": "First Block", "RatekW": "12.0", "StepMin": 0, "StepMax": 50},
                {"Description": "Excess", "RatekW": "9.5", "StepMin": 50}
            ]
        }
    ]"#;

    #[test]
    fn ingests_provider_document() {
        let store = InMemoryScheduleStore::new();
        assert_eq!(store.load_provider_document(SEED).unwrap(), 2);
    }

    #[tokio::test]
    async fn loaded_schedules_round_trip() {
        let store = InMemoryScheduleStore::new();
        store.load_provider_document(SEED).unwrap();

        let ev = store.load_schedule("EV2-A").await.unwrap().unwrap();
        assert_eq!(ev.name, "Residential EV Time-of-Use");
        assert_eq!(ev.components.len(), 4);
        assert_eq!(
            ev.of_kind(ChargeCategory::Energy, RateKind::TimeOfUse).count(),
            2
        );
        assert_eq!(
            ev.in_category(ChargeCategory::Tax).next().unwrap().description,
            "Utility Users Tax (Oakland)"
        );

        let gs = store.load_schedule("GS-2").await.unwrap().unwrap();
        assert_eq!(
            gs.of_kind(ChargeCategory::Demand, RateKind::Tiered).count(),
            2
        );
        assert_eq!(
            gs.of_kind(ChargeCategory::Demand, RateKind::Reactive).count(),
            1
        );
    }

    #[tokio::test]
    async fn unknown_schedule_loads_as_none() {
        let store = InMemoryScheduleStore::new();
        assert!(store.load_schedule("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn listing_is_sorted_by_id() {
        let store = InMemoryScheduleStore::new();
        store.insert_schedule(RateSchedule::new("B", "Second"));
        store.insert_schedule(RateSchedule::new("A", "First"));

        let summaries = store.list_schedules().await.unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].schedule_id, "A");
        assert_eq!(summaries[1].schedule_id, "B");
    }

    #[test]
    fn undecodable_rows_are_skipped_not_fatal() {
        let store = InMemoryScheduleStore::new();
        let doc = r#"[
            {
                "ScheduleID": "S1",
                "ScheduleName": "Partial",
                "Energy": [
                    {"Description": "Good", "RatekWh": 0.1},
                    {"Description": "Bad", "Pending": "yes"}
                ]
            }
        ]"#;
        store.load_provider_document(doc).unwrap();
        let schedule = store.schedules.get("S1").unwrap();
        assert_eq!(schedule.components.len(), 1);
        assert_eq!(schedule.components[0].description, "Good");
    }

    #[test]
    fn malformed_document_is_fatal() {
        let store = InMemoryScheduleStore::new();
        let err = store.load_provider_document("{not json").unwrap_err();
        assert!(matches!(err, DomainError::MalformedData(_)));
    }
}
