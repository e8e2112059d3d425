//! Prometheus指标

use anyhow::Result;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

/// 登记与确认页计数器
#[derive(Debug, Clone)]
pub struct Metrics {
    registry: Registry,
    registrations_total: IntCounterVec,
    confirmations_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let registrations_total = IntCounterVec::new(
            Opts::new(
                "carepulse_registrations_total",
                "Patient registration submits by outcome",
            ),
            &["outcome"],
        )?;

        let confirmations_total = IntCounterVec::new(
            Opts::new(
                "carepulse_confirmations_total",
                "Appointment confirmation page loads by result",
            ),
            &["result"],
        )?;

        registry.register(Box::new(registrations_total.clone()))?;
        registry.register(Box::new(confirmations_total.clone()))?;

        Ok(Self {
            registry,
            registrations_total,
            confirmations_total,
        })
    }

    pub fn record_registration(&self, outcome: &str) {
        self.registrations_total.with_label_values(&[outcome]).inc();
    }

    pub fn record_confirmation(&self, result: &str) {
        self.confirmations_total.with_label_values(&[result]).inc();
    }

    pub fn registrations(&self, outcome: &str) -> u64 {
        self.registrations_total.with_label_values(&[outcome]).get()
    }

    pub fn confirmations(&self, result: &str) -> u64 {
        self.confirmations_total.with_label_values(&[result]).get()
    }

    /// Prometheus文本格式输出
    pub fn gather(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;

        Ok(String::from_utf8(buffer)?)
    }
}
