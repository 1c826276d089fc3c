//! Analytics aggregator — reduces delivery metrics into a health snapshot.
//!
//! The reduction itself is pure and computed entirely over a fully-fetched,
//! bounded window; the store readers around it are fail-open (a query error
//! yields the empty snapshot, never an error to the caller).

use std::collections::BTreeMap;

use chrono::{Duration, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use herald_common::types::{Metric, MetricStatus, NotificationType};

/// Default trailing window for analytics queries, in days.
pub const DEFAULT_WINDOW_DAYS: i64 = 30;

/// Record caps for the window query.
const USER_WINDOW_CAP: i64 = 1000;
const SYSTEM_WINDOW_CAP: i64 = 5000;

/// Derived, ephemeral aggregate over one metric window. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalyticsSnapshot {
    pub total_sent: u64,
    pub total_delivered: u64,
    pub total_clicked: u64,
    pub total_failed: u64,
    /// delivered / sent, percent, 2-decimal rounding; 0 when nothing sent.
    pub delivery_rate: f64,
    /// clicked / delivered, percent, 2-decimal rounding; 0 when nothing delivered.
    pub click_rate: f64,
    /// Mean of positive response times, rounded to whole ms; 0 when none.
    pub average_response_time: i64,
    /// Failed metrics grouped by classification code.
    pub error_breakdown: BTreeMap<String, u64>,
    /// All metrics (any status) grouped by notification type.
    pub type_breakdown: BTreeMap<NotificationType, u64>,
}

/// Reader + reducer over `delivery_metrics`.
pub struct AnalyticsAggregator;

impl AnalyticsAggregator {
    /// Pure reduction of a metric list into a snapshot.
    ///
    /// Each metric lands in exactly one of the four status counts; only
    /// `failed` metrics with a code contribute to `error_breakdown`; every
    /// metric contributes to `type_breakdown`.
    pub fn compute_analytics(metrics: &[Metric]) -> AnalyticsSnapshot {
        let mut snapshot = AnalyticsSnapshot::default();
        let mut response_time_total: i64 = 0;
        let mut response_time_count: i64 = 0;

        for metric in metrics {
            match metric.status {
                MetricStatus::Sent => snapshot.total_sent += 1,
                MetricStatus::Delivered => snapshot.total_delivered += 1,
                MetricStatus::Clicked => snapshot.total_clicked += 1,
                MetricStatus::Failed => {
                    snapshot.total_failed += 1;
                    if let Some(code) = &metric.error_code {
                        *snapshot.error_breakdown.entry(code.clone()).or_insert(0) += 1;
                    }
                }
            }

            *snapshot
                .type_breakdown
                .entry(metric.notification_type)
                .or_insert(0) += 1;

            if let Some(ms) = metric.response_time_ms
                && ms > 0
            {
                response_time_total += ms;
                response_time_count += 1;
            }
        }

        if snapshot.total_sent > 0 {
            snapshot.delivery_rate = round2(
                snapshot.total_delivered as f64 / snapshot.total_sent as f64 * 100.0,
            );
        }
        if snapshot.total_delivered > 0 {
            snapshot.click_rate = round2(
                snapshot.total_clicked as f64 / snapshot.total_delivered as f64 * 100.0,
            );
        }
        if response_time_count > 0 {
            snapshot.average_response_time =
                (response_time_total as f64 / response_time_count as f64).round() as i64;
        }

        snapshot
    }

    /// Snapshot over one user's metrics for the trailing `days` window.
    pub async fn get_user_analytics(pool: &PgPool, user_id: Uuid, days: i64) -> AnalyticsSnapshot {
        let since = Utc::now() - Duration::days(days);
        let result: Result<Vec<Metric>, sqlx::Error> = sqlx::query_as(
            r#"
            SELECT * FROM delivery_metrics
            WHERE user_id = $1 AND timestamp >= $2
            ORDER BY timestamp DESC
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(since)
        .bind(USER_WINDOW_CAP)
        .fetch_all(pool)
        .await;

        match result {
            Ok(metrics) => Self::compute_analytics(&metrics),
            Err(e) => {
                tracing::error!(
                    user_id = %user_id,
                    days,
                    error = %e,
                    "Analytics query failed, returning empty snapshot"
                );
                AnalyticsSnapshot::default()
            }
        }
    }

    /// Snapshot over all users' metrics for the trailing `days` window.
    pub async fn get_system_analytics(pool: &PgPool, days: i64) -> AnalyticsSnapshot {
        let since = Utc::now() - Duration::days(days);
        let result: Result<Vec<Metric>, sqlx::Error> = sqlx::query_as(
            r#"
            SELECT * FROM delivery_metrics
            WHERE timestamp >= $1
            ORDER BY timestamp DESC
            LIMIT $2
            "#,
        )
        .bind(since)
        .bind(SYSTEM_WINDOW_CAP)
        .fetch_all(pool)
        .await;

        match result {
            Ok(metrics) => Self::compute_analytics(&metrics),
            Err(e) => {
                tracing::error!(
                    days,
                    error = %e,
                    "System analytics query failed, returning empty snapshot"
                );
                AnalyticsSnapshot::default()
            }
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn make_metric(status: MetricStatus) -> Metric {
        Metric {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            notification_id: "n-1".to_string(),
            notification_type: NotificationType::TaskReminder,
            status,
            timestamp: Utc::now(),
            response_time_ms: None,
            error_code: None,
            error_message: None,
            destination_token: None,
            device_info: None,
        }
    }

    fn make_metrics(sent: usize, delivered: usize, clicked: usize, failed: usize) -> Vec<Metric> {
        let mut metrics = Vec::new();
        metrics.extend((0..sent).map(|_| make_metric(MetricStatus::Sent)));
        metrics.extend((0..delivered).map(|_| make_metric(MetricStatus::Delivered)));
        metrics.extend((0..clicked).map(|_| make_metric(MetricStatus::Clicked)));
        metrics.extend((0..failed).map(|_| make_metric(MetricStatus::Failed)));
        metrics
    }

    #[test]
    fn test_empty_list_yields_zero_snapshot() {
        let snapshot = AnalyticsAggregator::compute_analytics(&[]);
        assert_eq!(snapshot, AnalyticsSnapshot::default());
        assert_eq!(snapshot.delivery_rate, 0.0);
        assert_eq!(snapshot.click_rate, 0.0);
        assert_eq!(snapshot.average_response_time, 0);
    }

    #[test]
    fn test_counts_partition_by_status() {
        let snapshot = AnalyticsAggregator::compute_analytics(&make_metrics(4, 3, 2, 1));
        assert_eq!(snapshot.total_sent, 4);
        assert_eq!(snapshot.total_delivered, 3);
        assert_eq!(snapshot.total_clicked, 2);
        assert_eq!(snapshot.total_failed, 1);
    }

    #[test]
    fn test_rates_rounded_to_two_decimals() {
        // 10 sent, 9 delivered, 1 clicked, 1 failed
        let snapshot = AnalyticsAggregator::compute_analytics(&make_metrics(10, 9, 1, 1));
        assert_eq!(snapshot.delivery_rate, 90.0);
        // 1/9 * 100 = 11.111... → 11.11
        assert_eq!(snapshot.click_rate, 11.11);
    }

    #[test]
    fn test_rates_zero_when_denominator_zero() {
        // Clicks without any delivered/sent metrics must not divide by zero.
        let snapshot = AnalyticsAggregator::compute_analytics(&make_metrics(0, 0, 5, 2));
        assert_eq!(snapshot.delivery_rate, 0.0);
        assert_eq!(snapshot.click_rate, 0.0);
    }

    #[test]
    fn test_rates_bounded() {
        for (sent, delivered, clicked, failed) in
            [(10, 9, 1, 1), (1, 1, 1, 0), (5, 0, 0, 5), (3, 3, 3, 3)]
        {
            let snapshot =
                AnalyticsAggregator::compute_analytics(&make_metrics(sent, delivered, clicked, failed));
            assert!((0.0..=100.0).contains(&snapshot.delivery_rate));
            assert!((0.0..=100.0).contains(&snapshot.click_rate));
        }
    }

    #[test]
    fn test_average_response_time_ignores_missing_and_zero() {
        let mut metrics = make_metrics(0, 3, 0, 0);
        metrics[0].response_time_ms = Some(100);
        metrics[1].response_time_ms = Some(251);
        metrics[2].response_time_ms = Some(0); // unmeasured, excluded

        let snapshot = AnalyticsAggregator::compute_analytics(&metrics);
        // mean(100, 251) = 175.5 → 176
        assert_eq!(snapshot.average_response_time, 176);
    }

    #[test]
    fn test_error_breakdown_groups_failed_by_code() {
        let mut metrics = make_metrics(0, 0, 0, 3);
        metrics[0].error_code = Some("TIMEOUT".to_string());
        metrics[1].error_code = Some("TIMEOUT".to_string());
        // metrics[2] has no code → skipped

        // A delivered metric with an (unexpected) code must not count.
        let mut delivered = make_metric(MetricStatus::Delivered);
        delivered.error_code = Some("TIMEOUT".to_string());
        metrics.push(delivered);

        let snapshot = AnalyticsAggregator::compute_analytics(&metrics);
        assert_eq!(snapshot.error_breakdown.get("TIMEOUT"), Some(&2));
        assert_eq!(snapshot.error_breakdown.len(), 1);
    }

    #[test]
    fn test_type_breakdown_covers_all_statuses() {
        let mut metrics = make_metrics(2, 1, 0, 1);
        metrics[0].notification_type = NotificationType::Mention;

        let snapshot = AnalyticsAggregator::compute_analytics(&metrics);
        assert_eq!(snapshot.type_breakdown.get(&NotificationType::Mention), Some(&1));
        assert_eq!(
            snapshot.type_breakdown.get(&NotificationType::TaskReminder),
            Some(&3)
        );
        let total: u64 = snapshot.type_breakdown.values().sum();
        assert_eq!(total, metrics.len() as u64);
    }
}
