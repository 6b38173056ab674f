use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;

use studyhub_db::models::{CommentRow, ElementRow, TabRow};
use studyhub_types::api::Claims;
use studyhub_types::feed::{FeedItem, FeedPage};

use crate::auth::AppState;
use crate::blocking;
use crate::comments::comment_from_row;
use crate::elements::element_from_row;
use crate::error::ApiError;
use crate::tabs::tab_from_row;

/// Entries shown per feed page.
pub const PAGE_SIZE: usize = 10;

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    #[serde(default = "default_page")]
    pub page: u32,
}

fn default_page() -> u32 {
    1
}

/// Everything under the caller's joined groups, one merged timeline,
/// newest first. Naive fan-out over the ownership tree; fine at
/// study-group scale.
pub async fn get_feed(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<FeedQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let uid = claims.sub.to_string();

    let (tabs, elements, comments) = blocking(move || {
        let group_ids = db.db.group_ids_for_user(&uid)?;
        let tabs = db.db.tabs_in_groups(&group_ids)?;

        let tab_ids: Vec<String> = tabs.iter().map(|t| t.id.clone()).collect();
        let elements = db.db.elements_in_tabs(&tab_ids)?;

        let element_ids: Vec<String> = elements.iter().map(|e| e.id.clone()).collect();
        let comments = db.db.comments_in_elements(&element_ids)?;

        Ok((tabs, elements, comments))
    })
    .await?;

    let entries = merge_entries(tabs, elements, comments);
    Ok(Json(paginate(entries, query.page)))
}

/// Concatenate tabs, elements and comments, then sort newest first. The
/// sort is stable, so entries with equal timestamps keep concatenation
/// order: tabs before elements before comments.
pub fn merge_entries(
    tabs: Vec<TabRow>,
    elements: Vec<ElementRow>,
    comments: Vec<CommentRow>,
) -> Vec<FeedItem> {
    let mut entries = Vec::with_capacity(tabs.len() + elements.len() + comments.len());
    entries.extend(tabs.into_iter().map(|row| FeedItem::Tab(tab_from_row(row))));
    entries.extend(elements.into_iter().map(|row| FeedItem::Element(element_from_row(row))));
    entries.extend(comments.into_iter().map(|row| FeedItem::Comment(comment_from_row(row))));

    entries.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
    entries
}

/// Fixed-size pages, 1-indexed. Out-of-range page numbers clamp to the
/// nearest valid page instead of erroring; an empty feed is one empty
/// page.
pub fn paginate(entries: Vec<FeedItem>, requested: u32) -> FeedPage {
    let total_entries = entries.len();
    let total_pages = (total_entries.div_ceil(PAGE_SIZE)).max(1) as u32;
    let page = requested.clamp(1, total_pages);

    let start = (page as usize - 1) * PAGE_SIZE;
    let entries: Vec<FeedItem> = entries.into_iter().skip(start).take(PAGE_SIZE).collect();

    FeedPage {
        page,
        total_pages,
        total_entries,
        entries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tab_row(id: &str, created_at: &str) -> TabRow {
        TabRow {
            id: id.into(),
            group_id: "group-1".into(),
            creator_id: "user-1".into(),
            creator_username: "alice".into(),
            name: id.into(),
            created_at: created_at.into(),
            last_edit_at: None,
        }
    }

    fn element_row(id: &str, created_at: &str) -> ElementRow {
        ElementRow {
            id: id.into(),
            tab_id: "tab-1".into(),
            creator_id: "user-1".into(),
            creator_username: "alice".into(),
            name: id.into(),
            body: "text".into(),
            image_id: None,
            created_at: created_at.into(),
            last_edit_at: None,
        }
    }

    fn comment_row(id: &str, created_at: &str) -> CommentRow {
        CommentRow {
            id: id.into(),
            element_id: "el-1".into(),
            creator_id: "user-2".into(),
            creator_username: "bob".into(),
            body: "nice".into(),
            created_at: created_at.into(),
        }
    }

    fn kinds(entries: &[FeedItem]) -> Vec<&'static str> {
        entries
            .iter()
            .map(|e| match e {
                FeedItem::Tab(_) => "Tab",
                FeedItem::Element(_) => "Element",
                FeedItem::Comment(_) => "Comment",
            })
            .collect()
    }

    #[test]
    fn newer_entries_come_first_regardless_of_kind() {
        let entries = merge_entries(
            vec![tab_row("notes", "2024-05-01 09:00:00")],
            vec![element_row("chapter1", "2024-05-01 10:00:00")],
            vec![comment_row("nice", "2024-05-01 11:00:00")],
        );

        assert_eq!(kinds(&entries), vec!["Comment", "Element", "Tab"]);
        for pair in entries.windows(2) {
            assert!(pair[0].created_at() >= pair[1].created_at());
        }
    }

    #[test]
    fn equal_timestamps_keep_concatenation_order() {
        let at = "2024-05-01 10:00:00";
        let entries = merge_entries(
            vec![tab_row("t", at)],
            vec![element_row("e", at)],
            vec![comment_row("c", at)],
        );

        assert_eq!(kinds(&entries), vec!["Tab", "Element", "Comment"]);
    }

    #[test]
    fn pages_are_fixed_size_and_one_indexed() {
        let tabs: Vec<TabRow> = (0..25)
            .map(|i| tab_row(&format!("tab-{i}"), &format!("2024-05-01 10:00:{:02}", i)))
            .collect();
        let entries = merge_entries(tabs, vec![], vec![]);

        let first = paginate(entries.clone(), 1);
        assert_eq!(first.page, 1);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.total_entries, 25);
        assert_eq!(first.entries.len(), 10);

        let last = paginate(entries, 3);
        assert_eq!(last.entries.len(), 5);
    }

    #[test]
    fn out_of_range_pages_clamp_instead_of_erroring() {
        let tabs: Vec<TabRow> = (0..15)
            .map(|i| tab_row(&format!("tab-{i}"), &format!("2024-05-01 10:00:{:02}", i)))
            .collect();
        let entries = merge_entries(tabs, vec![], vec![]);

        assert_eq!(paginate(entries.clone(), 0).page, 1);
        assert_eq!(paginate(entries.clone(), 99).page, 2);
        assert_eq!(paginate(entries, 99).entries.len(), 5);
    }

    #[test]
    fn empty_feed_is_a_single_empty_page() {
        let page = paginate(vec![], 7);
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.total_entries, 0);
        assert!(page.entries.is_empty());
    }
}
