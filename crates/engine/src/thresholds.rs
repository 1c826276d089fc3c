//! Threshold evaluator — classifies an analytics snapshot into health signals.
//!
//! Pure and deterministic. Each rule fires at most once, into exactly one
//! bucket (critical wins over warning); rules are independent, so several
//! can fire for one snapshot. Rate rules are evaluated only when their
//! denominator is non-zero — an empty window is healthy, not critical.

use serde::Serialize;

use crate::analytics::AnalyticsSnapshot;

const DELIVERY_RATE_WARNING: f64 = 95.0;
const DELIVERY_RATE_CRITICAL: f64 = 85.0;
const CLICK_RATE_WARNING: f64 = 5.0;
const CLICK_RATE_CRITICAL: f64 = 2.0;
const RESPONSE_TIME_WARNING_MS: i64 = 5_000;
const RESPONSE_TIME_CRITICAL_MS: i64 = 10_000;
const FAILURE_RATE_WARNING: f64 = 10.0;
const FAILURE_RATE_CRITICAL: f64 = 20.0;

/// Health signals derived from one snapshot.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ThresholdReport {
    pub warnings: Vec<String>,
    pub critical_issues: Vec<String>,
}

impl ThresholdReport {
    pub fn is_healthy(&self) -> bool {
        self.warnings.is_empty() && self.critical_issues.is_empty()
    }
}

/// Evaluate a snapshot against the fixed rule table.
pub fn check_performance_thresholds(snapshot: &AnalyticsSnapshot) -> ThresholdReport {
    let mut report = ThresholdReport::default();

    if snapshot.total_sent > 0 {
        if snapshot.delivery_rate < DELIVERY_RATE_CRITICAL {
            report.critical_issues.push(format!(
                "Delivery rate is {:.2}% (critical threshold {}%)",
                snapshot.delivery_rate, DELIVERY_RATE_CRITICAL
            ));
        } else if snapshot.delivery_rate < DELIVERY_RATE_WARNING {
            report.warnings.push(format!(
                "Delivery rate is {:.2}% (warning threshold {}%)",
                snapshot.delivery_rate, DELIVERY_RATE_WARNING
            ));
        }
    }

    if snapshot.total_delivered > 0 {
        if snapshot.click_rate < CLICK_RATE_CRITICAL {
            report.critical_issues.push(format!(
                "Click rate is {:.2}% (critical threshold {}%)",
                snapshot.click_rate, CLICK_RATE_CRITICAL
            ));
        } else if snapshot.click_rate < CLICK_RATE_WARNING {
            report.warnings.push(format!(
                "Click rate is {:.2}% (warning threshold {}%)",
                snapshot.click_rate, CLICK_RATE_WARNING
            ));
        }
    }

    if snapshot.average_response_time > RESPONSE_TIME_CRITICAL_MS {
        report.critical_issues.push(format!(
            "Average response time is {}ms (critical threshold {}ms)",
            snapshot.average_response_time, RESPONSE_TIME_CRITICAL_MS
        ));
    } else if snapshot.average_response_time > RESPONSE_TIME_WARNING_MS {
        report.warnings.push(format!(
            "Average response time is {}ms (warning threshold {}ms)",
            snapshot.average_response_time, RESPONSE_TIME_WARNING_MS
        ));
    }

    let failure_denominator = snapshot.total_sent + snapshot.total_failed;
    let failure_rate = if failure_denominator > 0 {
        snapshot.total_failed as f64 / failure_denominator as f64 * 100.0
    } else {
        0.0
    };
    if failure_rate > FAILURE_RATE_CRITICAL {
        report.critical_issues.push(format!(
            "Failure rate is {:.2}% (critical threshold {}%)",
            failure_rate, FAILURE_RATE_CRITICAL
        ));
    } else if failure_rate > FAILURE_RATE_WARNING {
        report.warnings.push(format!(
            "Failure rate is {:.2}% (warning threshold {}%)",
            failure_rate, FAILURE_RATE_WARNING
        ));
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn healthy_snapshot() -> AnalyticsSnapshot {
        AnalyticsSnapshot {
            total_sent: 100,
            total_delivered: 98,
            total_clicked: 10,
            total_failed: 2,
            delivery_rate: 98.0,
            click_rate: 10.2,
            average_response_time: 250,
            ..Default::default()
        }
    }

    #[test]
    fn test_healthy_snapshot_is_clean() {
        let report = check_performance_thresholds(&healthy_snapshot());
        assert!(report.is_healthy(), "unexpected: {:?}", report);
    }

    #[test]
    fn test_empty_snapshot_is_clean() {
        let report = check_performance_thresholds(&AnalyticsSnapshot::default());
        assert!(report.warnings.is_empty());
        assert!(report.critical_issues.is_empty());
    }

    #[test]
    fn test_delivery_rate_warning_not_critical() {
        // sent 10, delivered 9, clicked 1, failed 1 → delivery 90%, click 11.11%
        let snapshot = AnalyticsSnapshot {
            total_sent: 10,
            total_delivered: 9,
            total_clicked: 1,
            total_failed: 1,
            delivery_rate: 90.0,
            click_rate: 11.11,
            average_response_time: 0,
            ..Default::default()
        };
        let report = check_performance_thresholds(&snapshot);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("Delivery rate"));
        assert!(report.critical_issues.is_empty());
    }

    #[test]
    fn test_delivery_rate_critical_wins_over_warning() {
        let mut snapshot = healthy_snapshot();
        snapshot.delivery_rate = 80.0;
        let report = check_performance_thresholds(&snapshot);
        assert_eq!(report.critical_issues.len(), 1);
        assert!(report.critical_issues[0].contains("Delivery rate"));
        assert!(
            !report.warnings.iter().any(|w| w.contains("Delivery rate")),
            "a rule must not fire into both buckets"
        );
    }

    #[test]
    fn test_response_time_critical() {
        let mut snapshot = healthy_snapshot();
        snapshot.average_response_time = 12_000;
        let report = check_performance_thresholds(&snapshot);
        assert_eq!(report.critical_issues.len(), 1);
        assert!(report.critical_issues[0].contains("response time"));
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_response_time_warning_band() {
        let mut snapshot = healthy_snapshot();
        snapshot.average_response_time = 7_000;
        let report = check_performance_thresholds(&snapshot);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("response time"));
        assert!(report.critical_issues.is_empty());
    }

    #[test]
    fn test_thresholds_are_exclusive() {
        // Exactly at a boundary → no trigger.
        let mut snapshot = healthy_snapshot();
        snapshot.delivery_rate = 95.0;
        snapshot.click_rate = 5.0;
        snapshot.average_response_time = 5_000;
        let report = check_performance_thresholds(&snapshot);
        assert!(report.is_healthy(), "unexpected: {:?}", report);
    }

    #[test]
    fn test_click_rate_critical() {
        let mut snapshot = healthy_snapshot();
        snapshot.click_rate = 1.5;
        let report = check_performance_thresholds(&snapshot);
        assert_eq!(report.critical_issues.len(), 1);
        assert!(report.critical_issues[0].contains("Click rate"));
    }

    #[test]
    fn test_failure_rate_rules() {
        // 30 failed / (100 sent + 30 failed) = 23.08% → critical
        let mut snapshot = healthy_snapshot();
        snapshot.total_failed = 30;
        let report = check_performance_thresholds(&snapshot);
        assert!(
            report
                .critical_issues
                .iter()
                .any(|c| c.contains("Failure rate"))
        );

        // 15 failed / 115 = 13.04% → warning only
        snapshot.total_failed = 15;
        let report = check_performance_thresholds(&snapshot);
        assert!(report.warnings.iter().any(|w| w.contains("Failure rate")));
        assert!(
            !report
                .critical_issues
                .iter()
                .any(|c| c.contains("Failure rate"))
        );
    }

    #[test]
    fn test_multiple_rules_fire_independently() {
        let snapshot = AnalyticsSnapshot {
            total_sent: 100,
            total_delivered: 80,
            total_clicked: 0,
            total_failed: 40,
            delivery_rate: 80.0,
            click_rate: 0.0,
            average_response_time: 12_000,
            ..Default::default()
        };
        let report = check_performance_thresholds(&snapshot);
        // delivery 80% critical, click 0% critical, response 12s critical,
        // failure 40/140 = 28.57% critical
        assert_eq!(report.critical_issues.len(), 4);
        assert!(report.warnings.is_empty());
    }
}
