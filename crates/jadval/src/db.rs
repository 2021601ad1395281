//! SQLite storage for the lesson collection
//!
//! This module handles:
//! - Database initialization and migrations
//! - Loading the full lesson list
//! - Replacing the stored collection inside one transaction

use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use std::path::Path;
use tracing::{debug, info};

use crate::data::Persistence;
use crate::types::Lesson;

/// Schema migrations, applied in order and recorded in `schema_migrations`
const MIGRATIONS: &[(&str, &str)] = &[(
    "001_create_lessons",
    include_str!("../db/migrations/001_create_lessons.sql"),
)];

/// Initialize the database at the given path, running any pending migrations
pub fn init_db(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;

    let count = run_migrations(&conn)?;
    if count > 0 {
        info!(count = count, "Applied migrations");
    }

    Ok(conn)
}

/// Run migrations that have not been recorded yet
pub fn run_migrations(conn: &Connection) -> Result<usize> {
    let tracked: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='schema_migrations'",
        [],
        |row| row.get(0),
    )?;

    let mut applied = 0;

    for (version, sql) in MIGRATIONS {
        let already_applied = tracked
            && conn.query_row(
                "SELECT COUNT(*) > 0 FROM schema_migrations WHERE version = ?1",
                [version],
                |row| row.get::<_, bool>(0),
            )?;

        if already_applied {
            continue;
        }

        conn.execute_batch(sql)
            .with_context(|| format!("Failed to apply migration: {}", version))?;

        conn.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, datetime('now'))",
            [version],
        )?;

        debug!(version = %version, "Applied migration");
        applied += 1;
    }

    Ok(applied)
}

/// Get all lessons in insertion (id) order
pub fn get_all_lessons(conn: &Connection) -> Result<Vec<Lesson>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, teacher, day, start_time, end_time, room, color, notes
         FROM lessons
         ORDER BY id ASC",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, u8>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, String>(7)?,
                row.get::<_, Option<String>>(8)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(
            |(id, title, teacher, day, start, end, room, color, notes)| {
                Ok(Lesson {
                    id,
                    title,
                    teacher,
                    day: day.try_into().map_err(anyhow::Error::msg)?,
                    start_time: start.parse().map_err(anyhow::Error::msg)?,
                    end_time: end.parse().map_err(anyhow::Error::msg)?,
                    room,
                    color: color.parse().map_err(anyhow::Error::msg)?,
                    notes,
                })
            },
        )
        .collect::<Result<Vec<_>>>()
        .context("Corrupt row in lessons table")
}

/// Replace every stored lesson with `lessons`
///
/// Rows whose content did not change keep their `created_at`.
pub fn replace_all_lessons(conn: &mut Connection, lessons: &[Lesson]) -> Result<()> {
    let tx = conn.transaction()?;

    let ids: Vec<String> = lessons.iter().map(|l| l.id.to_string()).collect();
    if ids.is_empty() {
        tx.execute("DELETE FROM lessons", [])?;
    } else {
        // Ids are integers, so inlining them is safe
        tx.execute(
            &format!("DELETE FROM lessons WHERE id NOT IN ({})", ids.join(", ")),
            [],
        )?;
    }

    {
        let mut upsert = tx.prepare(
            "INSERT INTO lessons (id, title, teacher, day, start_time, end_time, room, color, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                teacher = excluded.teacher,
                day = excluded.day,
                start_time = excluded.start_time,
                end_time = excluded.end_time,
                room = excluded.room,
                color = excluded.color,
                notes = excluded.notes,
                updated_at = datetime('now')
             WHERE title IS NOT excluded.title
                OR teacher IS NOT excluded.teacher
                OR day IS NOT excluded.day
                OR start_time IS NOT excluded.start_time
                OR end_time IS NOT excluded.end_time
                OR room IS NOT excluded.room
                OR color IS NOT excluded.color
                OR notes IS NOT excluded.notes",
        )?;

        for lesson in lessons {
            upsert.execute(params![
                lesson.id,
                lesson.title,
                lesson.teacher,
                lesson.day.number(),
                lesson.start_time.to_string(),
                lesson.end_time.to_string(),
                lesson.room,
                lesson.color.as_str(),
                lesson.notes,
            ])?;
        }
    }

    tx.commit()?;
    Ok(())
}

/// Count all lessons in the database
pub fn count_lessons(conn: &Connection) -> Result<usize> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM lessons", [], |row| row.get(0))?;
    Ok(count as usize)
}

/// SQLite-backed persistence for the schedule store
pub struct Sqlite {
    conn: Connection,
}

impl Sqlite {
    pub fn open(db_path: &Path) -> Result<Self> {
        Ok(Self {
            conn: init_db(db_path)?,
        })
    }

    #[cfg(test)]
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl Persistence for Sqlite {
    fn load_all(&self) -> Result<Vec<Lesson>> {
        get_all_lessons(&self.conn)
    }

    fn save_all(&mut self, lessons: &[Lesson]) -> Result<()> {
        replace_all_lessons(&mut self.conn, lessons)?;
        debug!(count = lessons.len(), "Saved lessons to database");
        Ok(())
    }
}
