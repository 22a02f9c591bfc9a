use std::sync::RwLock;

use chrono::{DateTime, Utc};

use crate::health::{HealthCheckable, HealthStatus};

pub struct ServeHealth {
    last_supply_failed: RwLock<Option<DateTime<Utc>>>,
    last_supply_served: RwLock<Option<DateTime<Utc>>>,
    started_on: DateTime<Utc>,
}

impl ServeHealth {
    pub fn new(started_on: DateTime<Utc>) -> Self {
        Self {
            last_supply_failed: RwLock::new(None),
            last_supply_served: RwLock::new(None),
            started_on,
        }
    }

    pub fn set_supply_served(&self) {
        *self.last_supply_served.write().unwrap() = Some(Utc::now());
    }

    pub fn set_supply_failed(&self) {
        *self.last_supply_failed.write().unwrap() = Some(Utc::now());
    }
}

impl HealthCheckable for ServeHealth {
    // Healthy until a supply request fails, and again once one succeeds after that.
    fn health_status(&self) -> HealthStatus {
        let last_failed = *self.last_supply_failed.read().unwrap();
        let last_served = self
            .last_supply_served
            .read()
            .unwrap()
            .unwrap_or(self.started_on);

        match last_failed {
            Some(last_failed) if last_failed > last_served => HealthStatus::Unhealthy(Some(
                format!("last supply request failed at {}", last_failed.to_rfc3339()),
            )),
            _ => HealthStatus::Healthy,
        }
    }
}
