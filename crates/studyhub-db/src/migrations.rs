use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            first_name  TEXT,
            last_name   TEXT,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS groups (
            id           TEXT PRIMARY KEY,
            name         TEXT NOT NULL,
            description  TEXT NOT NULL,
            creator_id   TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            created_at   TEXT NOT NULL DEFAULT (datetime('now')),
            last_edit_at TEXT
        );

        -- Membership is the only thing that grants visibility; deleting a
        -- group or a user must leave no dangling membership rows.
        CREATE TABLE IF NOT EXISTS memberships (
            group_id  TEXT NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
            user_id   TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            joined_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (group_id, user_id)
        );

        CREATE INDEX IF NOT EXISTS idx_memberships_user
            ON memberships(user_id);

        CREATE TABLE IF NOT EXISTS tabs (
            id           TEXT PRIMARY KEY,
            group_id     TEXT NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
            creator_id   TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            name         TEXT NOT NULL,
            created_at   TEXT NOT NULL DEFAULT (datetime('now')),
            last_edit_at TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_tabs_group
            ON tabs(group_id, created_at);

        CREATE TABLE IF NOT EXISTS files (
            id          TEXT PRIMARY KEY,
            owner_id    TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            size        INTEGER NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS elements (
            id           TEXT PRIMARY KEY,
            tab_id       TEXT NOT NULL REFERENCES tabs(id) ON DELETE CASCADE,
            creator_id   TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            name         TEXT NOT NULL,
            body         TEXT NOT NULL,
            image_id     TEXT REFERENCES files(id) ON DELETE SET NULL,
            created_at   TEXT NOT NULL DEFAULT (datetime('now')),
            last_edit_at TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_elements_tab
            ON elements(tab_id, created_at);

        CREATE TABLE IF NOT EXISTS comments (
            id          TEXT PRIMARY KEY,
            element_id  TEXT NOT NULL REFERENCES elements(id) ON DELETE CASCADE,
            creator_id  TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            body        TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_comments_element
            ON comments(element_id, created_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
