//! Per-service circuit breaker registry.

use dashmap::DashMap;
use std::sync::Arc;

use crate::config::ServiceConfig;
use crate::resilience::circuit_breaker::{BreakerMode, BreakerSettings, CircuitBreaker};

/// Maps downstream service names to their independently owned breakers.
///
/// Built once at startup from the service table; lookups are lock-free reads
/// and breakers synchronize internally, so unrelated services never contend.
#[derive(Clone, Default)]
pub struct CircuitBreakerRegistry {
    breakers: Arc<DashMap<String, Arc<CircuitBreaker>>>,
}

impl CircuitBreakerRegistry {
    pub fn from_services(services: &[ServiceConfig]) -> Self {
        let breakers = DashMap::new();
        for service in services {
            breakers.insert(
                service.name.clone(),
                Arc::new(CircuitBreaker::new(
                    service.name.clone(),
                    BreakerSettings::from(service),
                )),
            );
        }
        Self {
            breakers: Arc::new(breakers),
        }
    }

    /// The breaker guarding `service`, if one is configured.
    pub fn get(&self, service: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.get(service).map(|entry| entry.value().clone())
    }

    /// Mode of every registered breaker, for health/metrics reporting.
    pub fn snapshot(&self) -> Vec<(String, BreakerMode)> {
        let mut modes: Vec<_> = self
            .breakers
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().mode()))
            .collect();
        modes.sort_by(|a, b| a.0.cmp(&b.0));
        modes
    }
}
