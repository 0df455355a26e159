use oasbind::prelude::*;
use std::time::Instant;

#[derive(Debug, Serialize, ToSchema)]
pub struct Health {
    pub status: String,
    pub uptime_seconds: u64,
}

#[controller(path = "/health")]
pub struct HealthController {
    started: Instant,
}

impl HealthController {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Default for HealthController {
    fn default() -> Self {
        Self::new()
    }
}

#[routes]
impl HealthController {
    /// Liveness probe
    #[get]
    #[response(200, Health)]
    fn health(&self) -> Json<Health> {
        Json(Health {
            status: "ok".to_string(),
            uptime_seconds: self.started.elapsed().as_secs(),
        })
    }
}
