use std::sync::atomic::{AtomicU64, Ordering};

use kiosk_domain::WasteLabel;

#[derive(Debug, Default)]
pub struct Metrics {
    base_measurements: AtomicU64,
    captures: AtomicU64,
    classified_dry: AtomicU64,
    classified_wet: AtomicU64,
    classified_unknown: AtomicU64,
    serial_timeouts: AtomicU64,
    invalid_measurements: AtomicU64,
    records_issued: AtomicU64,
    persistence_failures: AtomicU64,
}

impl Metrics {
    pub fn record_base_measurement(&self) {
        self.base_measurements.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_capture(&self) {
        self.captures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_classification(&self, label: WasteLabel) {
        let counter = match label {
            WasteLabel::Dry => &self.classified_dry,
            WasteLabel::Wet => &self.classified_wet,
            WasteLabel::Unknown => &self.classified_unknown,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_serial_timeout(&self) {
        self.serial_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_invalid_measurement(&self) {
        self.invalid_measurements.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_issued(&self) {
        self.records_issued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_persistence_failure(&self) {
        self.persistence_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn records_issued(&self) -> u64 {
        self.records_issued.load(Ordering::Relaxed)
    }

    pub fn render_prometheus(&self) -> String {
        let base = self.base_measurements.load(Ordering::Relaxed);
        let captures = self.captures.load(Ordering::Relaxed);
        let dry = self.classified_dry.load(Ordering::Relaxed);
        let wet = self.classified_wet.load(Ordering::Relaxed);
        let unknown = self.classified_unknown.load(Ordering::Relaxed);
        let timeouts = self.serial_timeouts.load(Ordering::Relaxed);
        let invalid = self.invalid_measurements.load(Ordering::Relaxed);
        let issued = self.records_issued.load(Ordering::Relaxed);
        let persistence = self.persistence_failures.load(Ordering::Relaxed);

        format!(
            "# TYPE ecosort_base_measurements_total counter\n\
ecosort_base_measurements_total {}\n\
# TYPE ecosort_captures_total counter\n\
ecosort_captures_total {}\n\
# TYPE ecosort_classifications_total counter\n\
ecosort_classifications_total{{label=\"DRY\"}} {}\n\
ecosort_classifications_total{{label=\"WET\"}} {}\n\
ecosort_classifications_total{{label=\"UNKNOWN\"}} {}\n\
# TYPE ecosort_serial_timeouts_total counter\n\
ecosort_serial_timeouts_total {}\n\
# TYPE ecosort_invalid_measurements_total counter\n\
ecosort_invalid_measurements_total {}\n\
# TYPE ecosort_records_issued_total counter\n\
ecosort_records_issued_total {}\n\
# TYPE ecosort_persistence_failures_total counter\n\
ecosort_persistence_failures_total {}\n",
            base, captures, dry, wet, unknown, timeouts, invalid, issued, persistence
        )
    }
}
