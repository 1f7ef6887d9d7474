use anyhow::Context;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use estate_common::lifecycle::overdue_cutoff;
use rusqlite::params;

use super::CrmDb;
use crate::crm::models::DashboardMetrics;
use crate::errors::CrmResult;

/// First instant of the UTC calendar month containing `now`.
pub fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(now.year(), now.month(), 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map_or(now, |d| d.and_utc())
}

impl CrmDb {
    /// Headline numbers for the dashboard as of `now`.
    pub fn dashboard_metrics(
        &self,
        now: DateTime<Utc>,
        overdue_days: u32,
    ) -> CrmResult<DashboardMetrics> {
        let since = month_start(now);
        let total_revenue: f64 = self
            .conn
            .query_row(
                "SELECT COALESCE(SUM(price), 0.0) FROM properties WHERE status = 'sold'",
                [],
                |row| row.get(0),
            )
            .context("Failed to sum revenue")?;

        Ok(DashboardMetrics {
            total_customers: self.count("SELECT COUNT(*) FROM customers", [])?,
            active_properties: self
                .count("SELECT COUNT(*) FROM properties WHERE status = 'available'", [])?,
            visits_this_month: self.count(
                "SELECT COUNT(*) FROM visits WHERE visit_date >= ?1",
                params![since],
            )?,
            total_revenue,
            interactions_this_month: self.count(
                "SELECT COUNT(*) FROM interactions WHERE created_at >= ?1",
                params![since],
            )?,
            hot_leads: self.count("SELECT COUNT(*) FROM customers WHERE priority = 'high'", [])?,
            overdue_interactions: self.count(
                "SELECT COUNT(*) FROM interactions
                 WHERE status IN ('pending', 'in_progress') AND updated_at < ?1",
                params![overdue_cutoff(now, overdue_days)],
            )?,
        })
    }
}
