//! Sample-data seeding for local development.
//!
//! Replaces all existing data with two employees (with tasks) and one admin,
//! all with password `123`. One seeded task carries a conflicting flag pair
//! at the row level, so `POST /admin/migrate-tasks` has real work to do on a
//! fresh seed.

use anyhow::Result;
use rusqlite::{Connection, params};
use tracing::info;
use uuid::Uuid;

use crate::auth::hash_password;
use crate::db::employees::recompute_task_counts;
use crate::db::{Database, now_ms};
use crate::lifecycle::StatusFlags;

struct SeedTask {
    title: &'static str,
    description: &'static str,
    date: &'static str,
    category: &'static str,
    flags: StatusFlags,
}

struct SeedEmployee {
    first_name: &'static str,
    email: &'static str,
    tasks: &'static [SeedTask],
}

const ACTIVE: StatusFlags = StatusFlags {
    new_task: false,
    active: true,
    completed: false,
    failed: false,
};
const COMPLETED: StatusFlags = StatusFlags {
    new_task: false,
    active: false,
    completed: true,
    failed: false,
};
// Both active and newTask set: a deliberate invariant violation for the
// migrate-tasks endpoint to repair.
const CONFLICTING: StatusFlags = StatusFlags {
    new_task: true,
    active: true,
    completed: false,
    failed: false,
};

const SEED_EMPLOYEES: &[SeedEmployee] = &[
    SeedEmployee {
        first_name: "Ruhith",
        email: "e@e.com",
        tasks: &[
            SeedTask {
                title: "Update website",
                description: "Revamp the homepage design",
                date: "2024-10-12",
                category: "Design",
                flags: CONFLICTING,
            },
            SeedTask {
                title: "Client meeting",
                description: "Discuss project requirements",
                date: "2024-10-10",
                category: "Meeting",
                flags: COMPLETED,
            },
            SeedTask {
                title: "Fix bugs",
                description: "Resolve bugs reported in issue tracker",
                date: "2024-10-14",
                category: "Development",
                flags: ACTIVE,
            },
        ],
    },
    SeedEmployee {
        first_name: "Sneha",
        email: "employee2@example.com",
        tasks: &[
            SeedTask {
                title: "Database optimization",
                description: "Optimize queries for better performance",
                date: "2024-10-11",
                category: "Database",
                flags: ACTIVE,
            },
            SeedTask {
                title: "Design new feature",
                description: "Create mockups for the new feature",
                date: "2024-10-09",
                category: "Design",
                flags: COMPLETED,
            },
        ],
    },
];

fn insert_raw_task(
    conn: &Connection,
    employee_id: &str,
    task: &SeedTask,
    now: i64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO tasks (
            id, employee_id, title, description, task_date, category,
            new_task, active, completed, failed, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            Uuid::now_v7().to_string(),
            employee_id,
            task.title,
            task.description,
            task.date,
            task.category,
            task.flags.new_task,
            task.flags.active,
            task.flags.completed,
            task.flags.failed,
            now,
            now
        ],
    )?;
    Ok(())
}

/// Wipe and reseed the database.
pub fn run(db: &Database) -> Result<()> {
    db.with_conn(|conn| {
        conn.execute("DELETE FROM tasks", [])?;
        conn.execute("DELETE FROM employees", [])?;
        conn.execute("DELETE FROM admins", [])?;
        Ok(())
    })?;
    info!("Cleared existing data");

    for seed in SEED_EMPLOYEES {
        let password_hash = hash_password("123")?;
        let employee = db.create_employee(seed.first_name, seed.email, &password_hash)?;

        db.with_conn(|conn| {
            let now = now_ms();
            for task in seed.tasks {
                insert_raw_task(conn, &employee.id, task, now)?;
            }
            recompute_task_counts(conn, &employee.id, now)?;
            Ok(())
        })?;

        info!(
            "Created employee: {} ({})",
            seed.first_name, seed.email
        );
    }

    let admin_hash = hash_password("123")?;
    let admin = db.create_admin("Admin", "admin@me.com", &admin_hash)?;
    info!("Created admin: {}", admin.email);

    info!("Database seeded successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_populates_counts_from_raw_flags() {
        let db = Database::open_in_memory().unwrap();
        run(&db).unwrap();

        let ruhith = db.get_employee_by_email("e@e.com").unwrap().unwrap();
        // The conflicting task counts under both active and newTask until
        // the migration runs.
        assert_eq!(ruhith.task_counts.active, 2);
        assert_eq!(ruhith.task_counts.new_task, 1);
        assert_eq!(ruhith.task_counts.completed, 1);
        assert_eq!(ruhith.task_counts.failed, 0);

        let sneha = db
            .get_employee_by_email("employee2@example.com")
            .unwrap()
            .unwrap();
        assert_eq!(sneha.task_counts.active, 1);
        assert_eq!(sneha.task_counts.completed, 1);
    }

    #[test]
    fn seed_is_rerunnable() {
        let db = Database::open_in_memory().unwrap();
        run(&db).unwrap();
        run(&db).unwrap();

        assert_eq!(db.list_employees().unwrap().len(), 2);
    }

    #[test]
    fn migration_repairs_the_seeded_conflict() {
        let db = Database::open_in_memory().unwrap();
        run(&db).unwrap();

        assert_eq!(db.repair_task_statuses().unwrap(), 1);
        assert_eq!(db.repair_task_statuses().unwrap(), 0);

        let ruhith = db.get_employee_by_email("e@e.com").unwrap().unwrap();
        // active outranks newTask in conflict resolution
        assert_eq!(ruhith.task_counts.active, 2);
        assert_eq!(ruhith.task_counts.new_task, 0);
    }
}
