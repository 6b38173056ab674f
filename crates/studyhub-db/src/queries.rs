use crate::Database;
use crate::models::{CommentRow, ElementRow, FileRow, GroupRow, MemberRow, TabRow, UserRow};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};

// Shared joined SELECTs. Every read joins the creator's username so the
// API layer never has to do per-row lookups.
const GROUP_SELECT: &str = "SELECT g.id, g.name, g.description, g.creator_id, u.username,
        (SELECT COUNT(*) FROM memberships m WHERE m.group_id = g.id),
        g.created_at, g.last_edit_at
     FROM groups g
     LEFT JOIN users u ON g.creator_id = u.id";

const TAB_SELECT: &str = "SELECT t.id, t.group_id, t.creator_id, u.username, t.name,
        t.created_at, t.last_edit_at
     FROM tabs t
     LEFT JOIN users u ON t.creator_id = u.id";

const ELEMENT_SELECT: &str = "SELECT e.id, e.tab_id, e.creator_id, u.username, e.name, e.body,
        e.image_id, e.created_at, e.last_edit_at
     FROM elements e
     LEFT JOIN users u ON e.creator_id = u.id";

const COMMENT_SELECT: &str = "SELECT c.id, c.element_id, c.creator_id, u.username, c.body,
        c.created_at
     FROM comments c
     LEFT JOIN users u ON c.creator_id = u.id";

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        id: &str,
        username: &str,
        password_hash: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, password, first_name, last_name)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, username, password_hash, first_name, last_name),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let row = conn
                .prepare(
                    "SELECT id, username, password, first_name, last_name, created_at
                     FROM users WHERE username = ?1",
                )?
                .query_row([username], map_user_row)
                .optional()?;
            Ok(row)
        })
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let row = conn
                .prepare(
                    "SELECT id, username, password, first_name, last_name, created_at
                     FROM users WHERE id = ?1",
                )?
                .query_row([id], map_user_row)
                .optional()?;
            Ok(row)
        })
    }

    // -- Groups --

    /// Create a group and enroll the creator as its first member in the
    /// same call. The creator ∈ members invariant holds from the moment
    /// the group becomes visible.
    pub fn create_group(&self, id: &str, name: &str, description: &str, creator_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO groups (id, name, description, creator_id) VALUES (?1, ?2, ?3, ?4)",
                (id, name, description, creator_id),
            )?;
            conn.execute(
                "INSERT INTO memberships (group_id, user_id) VALUES (?1, ?2)",
                (id, creator_id),
            )?;
            Ok(())
        })
    }

    pub fn get_group(&self, id: &str) -> Result<Option<GroupRow>> {
        self.with_conn(|conn| {
            let row = conn
                .prepare(&format!("{GROUP_SELECT} WHERE g.id = ?1"))?
                .query_row([id], map_group_row)
                .optional()?;
            Ok(row)
        })
    }

    pub fn update_group(&self, id: &str, name: &str, description: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE groups SET name = ?2, description = ?3, last_edit_at = datetime('now')
                 WHERE id = ?1",
                (id, name, description),
            )?;
            Ok(())
        })
    }

    /// Single-row delete; tabs, elements, comments and memberships below
    /// this group go away through the schema's ON DELETE CASCADE chain.
    pub fn delete_group(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM groups WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }

    pub fn groups_for_user(&self, user_id: &str) -> Result<Vec<GroupRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{GROUP_SELECT}
                 JOIN memberships ms ON ms.group_id = g.id
                 WHERE ms.user_id = ?1
                 ORDER BY g.created_at"
            ))?;
            let rows = stmt
                .query_map([user_id], map_group_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn group_ids_for_user(&self, user_id: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT group_id FROM memberships WHERE user_id = ?1")?;
            let ids = stmt
                .query_map([user_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(ids)
        })
    }

    /// Case-insensitive substring search over group name, description and
    /// the creator's identity (username, first or last name). A blank
    /// query matches nothing.
    pub fn search_groups(&self, query: &str) -> Result<Vec<GroupRow>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{GROUP_SELECT}
                 WHERE instr(lower(g.name), lower(?1)) > 0
                    OR instr(lower(g.description), lower(?1)) > 0
                    OR instr(lower(coalesce(u.username, '')), lower(?1)) > 0
                    OR instr(lower(coalesce(u.first_name, '')), lower(?1)) > 0
                    OR instr(lower(coalesce(u.last_name, '')), lower(?1)) > 0"
            ))?;
            let rows = stmt
                .query_map([query], map_group_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Membership --

    pub fn is_member(&self, group_id: &str, user_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let hit: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM memberships WHERE group_id = ?1 AND user_id = ?2",
                    (group_id, user_id),
                    |row| row.get(0),
                )
                .optional()?;
            Ok(hit.is_some())
        })
    }

    /// Joining twice is a no-op, matching the join form's behavior for
    /// users who already belong to the group.
    pub fn add_member(&self, group_id: &str, user_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO memberships (group_id, user_id) VALUES (?1, ?2)",
                (group_id, user_id),
            )?;
            Ok(())
        })
    }

    pub fn remove_member(&self, group_id: &str, user_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "DELETE FROM memberships WHERE group_id = ?1 AND user_id = ?2",
                (group_id, user_id),
            )?;
            Ok(changed > 0)
        })
    }

    pub fn members_of_group(&self, group_id: &str) -> Result<Vec<MemberRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT u.id, u.username, u.first_name, u.last_name, u.created_at
                 FROM memberships ms
                 JOIN users u ON ms.user_id = u.id
                 WHERE ms.group_id = ?1
                 ORDER BY ms.joined_at",
            )?;
            let rows = stmt
                .query_map([group_id], map_member_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Tabs --

    pub fn create_tab(&self, id: &str, group_id: &str, creator_id: &str, name: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tabs (id, group_id, creator_id, name) VALUES (?1, ?2, ?3, ?4)",
                (id, group_id, creator_id, name),
            )?;
            Ok(())
        })
    }

    pub fn get_tab(&self, id: &str) -> Result<Option<TabRow>> {
        self.with_conn(|conn| {
            let row = conn
                .prepare(&format!("{TAB_SELECT} WHERE t.id = ?1"))?
                .query_row([id], map_tab_row)
                .optional()?;
            Ok(row)
        })
    }

    pub fn update_tab(&self, id: &str, name: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE tabs SET name = ?2, last_edit_at = datetime('now') WHERE id = ?1",
                (id, name),
            )?;
            Ok(())
        })
    }

    pub fn delete_tab(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM tabs WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    pub fn tabs_in_group(&self, group_id: &str) -> Result<Vec<TabRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("{TAB_SELECT} WHERE t.group_id = ?1 ORDER BY t.created_at"))?;
            let rows = stmt
                .query_map([group_id], map_tab_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Batch-fetch tabs across a set of groups.
    pub fn tabs_in_groups(&self, group_ids: &[String]) -> Result<Vec<TabRow>> {
        if group_ids.is_empty() {
            return Ok(vec![]);
        }
        self.with_conn(|conn| {
            query_in(conn, &format!("{TAB_SELECT} WHERE t.group_id IN"), group_ids, map_tab_row)
        })
    }

    pub fn tab_group_id(&self, tab_id: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            let id = conn
                .query_row("SELECT group_id FROM tabs WHERE id = ?1", [tab_id], |row| row.get(0))
                .optional()?;
            Ok(id)
        })
    }

    // -- Elements --

    pub fn create_element(
        &self,
        id: &str,
        tab_id: &str,
        creator_id: &str,
        name: &str,
        body: &str,
        image_id: Option<&str>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO elements (id, tab_id, creator_id, name, body, image_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                (id, tab_id, creator_id, name, body, image_id),
            )?;
            Ok(())
        })
    }

    pub fn get_element(&self, id: &str) -> Result<Option<ElementRow>> {
        self.with_conn(|conn| {
            let row = conn
                .prepare(&format!("{ELEMENT_SELECT} WHERE e.id = ?1"))?
                .query_row([id], map_element_row)
                .optional()?;
            Ok(row)
        })
    }

    pub fn update_element(
        &self,
        id: &str,
        name: &str,
        body: &str,
        image_id: Option<&str>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE elements SET name = ?2, body = ?3, image_id = ?4,
                        last_edit_at = datetime('now')
                 WHERE id = ?1",
                (id, name, body, image_id),
            )?;
            Ok(())
        })
    }

    pub fn delete_element(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM elements WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    pub fn elements_in_tab(&self, tab_id: &str) -> Result<Vec<ElementRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(&format!("{ELEMENT_SELECT} WHERE e.tab_id = ?1 ORDER BY e.created_at"))?;
            let rows = stmt
                .query_map([tab_id], map_element_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn elements_in_tabs(&self, tab_ids: &[String]) -> Result<Vec<ElementRow>> {
        if tab_ids.is_empty() {
            return Ok(vec![]);
        }
        self.with_conn(|conn| {
            query_in(conn, &format!("{ELEMENT_SELECT} WHERE e.tab_id IN"), tab_ids, map_element_row)
        })
    }

    /// Resolve an element's group by walking element → tab → group.
    pub fn element_group_id(&self, element_id: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            let id = conn
                .query_row(
                    "SELECT t.group_id FROM elements e
                     JOIN tabs t ON e.tab_id = t.id
                     WHERE e.id = ?1",
                    [element_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(id)
        })
    }

    // -- Comments --

    pub fn create_comment(&self, id: &str, element_id: &str, creator_id: &str, body: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO comments (id, element_id, creator_id, body) VALUES (?1, ?2, ?3, ?4)",
                (id, element_id, creator_id, body),
            )?;
            Ok(())
        })
    }

    pub fn get_comment(&self, id: &str) -> Result<Option<CommentRow>> {
        self.with_conn(|conn| {
            let row = conn
                .prepare(&format!("{COMMENT_SELECT} WHERE c.id = ?1"))?
                .query_row([id], map_comment_row)
                .optional()?;
            Ok(row)
        })
    }

    pub fn delete_comment(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM comments WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    /// Comments under one element, newest first (the element page order).
    pub fn comments_in_element(&self, element_id: &str) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{COMMENT_SELECT} WHERE c.element_id = ?1 ORDER BY c.created_at DESC"
            ))?;
            let rows = stmt
                .query_map([element_id], map_comment_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn comments_in_elements(&self, element_ids: &[String]) -> Result<Vec<CommentRow>> {
        if element_ids.is_empty() {
            return Ok(vec![]);
        }
        self.with_conn(|conn| {
            query_in(
                conn,
                &format!("{COMMENT_SELECT} WHERE c.element_id IN"),
                element_ids,
                map_comment_row,
            )
        })
    }

    // -- Files --

    pub fn insert_file(&self, id: &str, owner_id: &str, size: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO files (id, owner_id, size) VALUES (?1, ?2, ?3)",
                (id, owner_id, size),
            )?;
            Ok(())
        })
    }

    pub fn get_file(&self, id: &str) -> Result<Option<FileRow>> {
        self.with_conn(|conn| {
            let row = conn
                .prepare("SELECT id, owner_id, size, created_at FROM files WHERE id = ?1")?
                .query_row([id], map_file_row)
                .optional()?;
            Ok(row)
        })
    }
}

/// Run `sql_prefix (?1, ?2, …)` with one placeholder per id.
fn query_in<T>(
    conn: &Connection,
    sql_prefix: &str,
    ids: &[String],
    map: fn(&rusqlite::Row) -> rusqlite::Result<T>,
) -> Result<Vec<T>> {
    let placeholders: Vec<String> = (1..=ids.len()).map(|i| format!("?{}", i)).collect();
    let sql = format!("{} ({})", sql_prefix, placeholders.join(", "));

    let mut stmt = conn.prepare(&sql)?;
    let params: Vec<&dyn rusqlite::types::ToSql> =
        ids.iter().map(|id| id as &dyn rusqlite::types::ToSql).collect();

    let rows = stmt
        .query_map(params.as_slice(), map)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn map_user_row(row: &rusqlite::Row) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        password: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn map_group_row(row: &rusqlite::Row) -> rusqlite::Result<GroupRow> {
    Ok(GroupRow {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        creator_id: row.get(3)?,
        creator_username: row
            .get::<_, Option<String>>(4)?
            .unwrap_or_else(|| "unknown".to_string()),
        member_count: row.get(5)?,
        created_at: row.get(6)?,
        last_edit_at: row.get(7)?,
    })
}

fn map_tab_row(row: &rusqlite::Row) -> rusqlite::Result<TabRow> {
    Ok(TabRow {
        id: row.get(0)?,
        group_id: row.get(1)?,
        creator_id: row.get(2)?,
        creator_username: row
            .get::<_, Option<String>>(3)?
            .unwrap_or_else(|| "unknown".to_string()),
        name: row.get(4)?,
        created_at: row.get(5)?,
        last_edit_at: row.get(6)?,
    })
}

fn map_element_row(row: &rusqlite::Row) -> rusqlite::Result<ElementRow> {
    Ok(ElementRow {
        id: row.get(0)?,
        tab_id: row.get(1)?,
        creator_id: row.get(2)?,
        creator_username: row
            .get::<_, Option<String>>(3)?
            .unwrap_or_else(|| "unknown".to_string()),
        name: row.get(4)?,
        body: row.get(5)?,
        image_id: row.get(6)?,
        created_at: row.get(7)?,
        last_edit_at: row.get(8)?,
    })
}

fn map_comment_row(row: &rusqlite::Row) -> rusqlite::Result<CommentRow> {
    Ok(CommentRow {
        id: row.get(0)?,
        element_id: row.get(1)?,
        creator_id: row.get(2)?,
        creator_username: row
            .get::<_, Option<String>>(3)?
            .unwrap_or_else(|| "unknown".to_string()),
        body: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn map_member_row(row: &rusqlite::Row) -> rusqlite::Result<MemberRow> {
    Ok(MemberRow {
        user_id: row.get(0)?,
        username: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn map_file_row(row: &rusqlite::Row) -> rusqlite::Result<FileRow> {
    Ok(FileRow {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        size: row.get(2)?,
        created_at: row.get(3)?,
    })
}
