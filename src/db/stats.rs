//! Aggregation queries for the admin dashboard.

use super::Database;
use crate::types::DashboardStats;
use anyhow::Result;

impl Database {
    /// Aggregate counts across all employees.
    ///
    /// Sums the denormalized per-employee counters rather than the tasks
    /// table; the counters are recomputed on every task write, so the two
    /// agree. `total_tasks` deliberately excludes newTask — that is the
    /// figure the dashboard has always reported.
    pub fn get_dashboard_stats(&self) -> Result<DashboardStats> {
        self.with_conn(|conn| {
            let stats = conn.query_row(
                "SELECT
                    COUNT(*) AS total_employees,
                    COALESCE(SUM(count_active + count_completed + count_failed), 0) AS total_tasks,
                    COALESCE(SUM(count_completed), 0) AS completed_tasks,
                    COALESCE(SUM(count_active), 0) AS active_tasks,
                    COALESCE(SUM(count_failed), 0) AS failed_tasks
                 FROM employees",
                [],
                |row| {
                    Ok(DashboardStats {
                        total_employees: row.get(0)?,
                        total_tasks: row.get(1)?,
                        completed_tasks: row.get(2)?,
                        active_tasks: row.get(3)?,
                        failed_tasks: row.get(4)?,
                    })
                },
            )?;
            Ok(stats)
        })
    }
}
