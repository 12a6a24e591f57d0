//! Prometheus metrics for simulation runs

use std::fmt;

use prometheus::{Encoder, Gauge, IntCounter, IntGauge, Registry, TextEncoder};

use crate::metrics::PeriodMetrics;
use crate::strategy::PostRunInfo;

/// Gauges of the latest period plus run-wide counters
pub struct SimulationTelemetry {
    registry: Registry,
    pub gini_total: Gauge,
    pub coverage_sufficiency: Gauge,
    pub coverage_floor: Gauge,
    pub count_sufficient: IntGauge,
    pub count_poor: IntGauge,
    pub granted_total: Gauge,
    pub periods_total: IntCounter,
    pub conservation_drifts_total: IntCounter,
}

impl SimulationTelemetry {
    pub fn new() -> Result<Self, prometheus::Error> {
        let telemetry = Self {
            registry: Registry::new(),
            gini_total: Gauge::new("becas_gini_total", "Gini of post-grant income")?,
            coverage_sufficiency: Gauge::new(
                "becas_coverage_sufficiency",
                "Share of individuals at or above floor + cost of study",
            )?,
            coverage_floor: Gauge::new(
                "becas_coverage_floor",
                "Share of individuals at or above the poverty floor",
            )?,
            count_sufficient: IntGauge::new(
                "becas_count_sufficient",
                "Individuals able to keep studying",
            )?,
            count_poor: IntGauge::new("becas_count_poor", "Individuals under the poverty floor")?,
            granted_total: Gauge::new("becas_granted_total", "Grants paid in the last allocation")?,
            periods_total: IntCounter::new("becas_periods_total", "Periods measured")?,
            conservation_drifts_total: IntCounter::new(
                "becas_conservation_drifts_total",
                "Allocations whose grants missed the budget",
            )?,
        };
        telemetry.register()?;
        Ok(telemetry)
    }

    fn register(&self) -> Result<(), prometheus::Error> {
        self.registry.register(Box::new(self.gini_total.clone()))?;
        self.registry
            .register(Box::new(self.coverage_sufficiency.clone()))?;
        self.registry.register(Box::new(self.coverage_floor.clone()))?;
        self.registry.register(Box::new(self.count_sufficient.clone()))?;
        self.registry.register(Box::new(self.count_poor.clone()))?;
        self.registry.register(Box::new(self.granted_total.clone()))?;
        self.registry.register(Box::new(self.periods_total.clone()))?;
        self.registry
            .register(Box::new(self.conservation_drifts_total.clone()))?;
        Ok(())
    }

    pub fn record_allocation(&self, info: &PostRunInfo) {
        self.granted_total.set(info.distributed);
        if info.drift.is_some() {
            self.conservation_drifts_total.inc();
        }
    }

    pub fn record_period(&self, metrics: &PeriodMetrics) {
        self.gini_total.set(metrics.gini_total);
        self.coverage_sufficiency.set(metrics.coverage_sufficiency.1);
        self.coverage_floor.set(metrics.coverage_floor.1);
        self.count_sufficient.set(metrics.count_sufficient as i64);
        self.count_poor.set(metrics.count_poor as i64);
        self.periods_total.inc();
    }

    /// Text exposition of every registered metric
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl fmt::Debug for SimulationTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulationTelemetry")
            .field("gini_total", &self.gini_total.get())
            .field("count_sufficient", &self.count_sufficient.get())
            .field("count_poor", &self.count_poor.get())
            .field("periods_total", &self.periods_total.get())
            .field("conservation_drifts_total", &self.conservation_drifts_total.get())
            .finish_non_exhaustive()
    }
}
