use chrono::{DateTime, NaiveDate, Utc};
use dairy_coop::workflows::deductions::{AuditEntry, AuditError, AuditPublisher};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Audit sink that keeps entries in memory and mirrors them to the log.
#[derive(Default, Clone)]
pub(crate) struct InMemoryAuditLog {
    entries: Arc<Mutex<Vec<AuditEntry>>>,
}

impl AuditPublisher for InMemoryAuditLog {
    fn publish(&self, entry: AuditEntry) -> Result<(), AuditError> {
        info!(
            action = ?entry.action,
            actor = entry.actor.as_deref().unwrap_or("anonymous"),
            "deduction audit entry"
        );
        let mut guard = self.entries.lock().expect("audit mutex poisoned");
        guard.push(entry);
        Ok(())
    }
}

impl InMemoryAuditLog {
    pub(crate) fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().expect("audit mutex poisoned").clone()
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

/// Instant used for scoring: the last second of `today`, or now when unset.
pub(crate) fn reference_instant(today: Option<NaiveDate>) -> DateTime<Utc> {
    today
        .and_then(|date| date.and_hms_opt(23, 59, 59))
        .map(|naive| naive.and_utc())
        .unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dairy_coop::workflows::deductions::AuditAction;

    #[test]
    fn parse_date_reports_offending_value() {
        assert_eq!(
            parse_date(" 2024-02-29 "),
            Ok(NaiveDate::from_ymd_opt(2024, 2, 29).expect("valid date"))
        );
        let error = parse_date("2024-13-01").expect_err("invalid month");
        assert!(error.contains("'2024-13-01'"));
    }

    #[test]
    fn reference_instant_pins_end_of_day() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 30).expect("valid date");
        assert_eq!(
            reference_instant(Some(date)).to_rfc3339(),
            "2024-06-30T23:59:59+00:00"
        );
    }

    #[test]
    fn audit_log_retains_entries() {
        let log = InMemoryAuditLog::default();
        log.publish(AuditEntry {
            action: AuditAction::ApplyImmediateDeduction,
            actor: Some("admin-1".to_string()),
            old_data: None,
            new_data: None,
            recorded_at: Utc::now(),
        })
        .expect("publish succeeds");

        assert_eq!(log.entries().len(), 1);
    }
}
