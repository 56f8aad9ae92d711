//! Development fixture: three sample registered modules.
//!
//! `up` is not idempotent; running it twice leaves six rows.

use chrono::Utc;
use tracing::info;

use crate::db::{FeederData, ModuleData, NewModule, RegistryStore, WaterData};
use crate::error::RelayError;

/// The fixture rows, stamped with the current time.
pub fn fixture_modules() -> Vec<NewModule> {
    let now = Utc::now();
    vec![
        NewModule {
            serial: "970121".to_string(),
            type_id: ModuleData::FEEDER_TYPE,
            name: "module1".to_string(),
            data: ModuleData::Feeder(FeederData {
                is_eaten: Some(false),
                time_eaten: Some(now),
                num_eaten: Some(30),
            }),
            reservation: Some(now),
        },
        NewModule {
            serial: "970232".to_string(),
            type_id: ModuleData::WATER_TYPE,
            name: "module2".to_string(),
            data: ModuleData::Water(WaterData {
                time_water: Some(now),
                is_water: Some(true),
            }),
            reservation: None,
        },
        NewModule {
            serial: "970343".to_string(),
            type_id: ModuleData::FEEDER_TYPE,
            name: "module3".to_string(),
            data: ModuleData::Feeder(FeederData {
                is_eaten: Some(true),
                time_eaten: Some(now),
                num_eaten: Some(90),
            }),
            reservation: Some(now),
        },
    ]
}

/// Insert the fixture rows in order. Returns their ids.
pub async fn up(store: &RegistryStore) -> Result<Vec<i64>, RelayError> {
    let mut ids = Vec::with_capacity(3);
    for module in fixture_modules() {
        ids.push(store.create_module(module).await?);
    }
    info!(count = ids.len(), "seeded registered modules");
    Ok(ids)
}

/// Remove every registered module, fixture or not. Returns the deleted count.
pub async fn down(store: &RegistryStore) -> Result<u64, RelayError> {
    let deleted = store.delete_all_modules().await?;
    info!(deleted, "removed registered modules");
    Ok(deleted)
}
