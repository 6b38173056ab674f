//! Walks the collaboration flow at the component level: storage, the
//! authorization guard, group search, and the merged activity feed.

use studyhub_api::feed::{merge_entries, paginate};
use studyhub_api::guard::{self, Ownership};
use studyhub_db::Database;
use studyhub_types::feed::FeedItem;

fn seed_users(db: &Database) {
    db.create_user("user-anna", "anna", "hash", Some("Anna"), Some("Kowalska"))
        .unwrap();
    db.create_user("user-ben", "ben", "hash", None, None).unwrap();
}

fn collect_feed_rows(
    db: &Database,
    user_id: &str,
) -> (
    Vec<studyhub_db::models::TabRow>,
    Vec<studyhub_db::models::ElementRow>,
    Vec<studyhub_db::models::CommentRow>,
) {
    let group_ids = db.group_ids_for_user(user_id).unwrap();
    let tabs = db.tabs_in_groups(&group_ids).unwrap();
    let tab_ids: Vec<String> = tabs.iter().map(|t| t.id.clone()).collect();
    let elements = db.elements_in_tabs(&tab_ids).unwrap();
    let element_ids: Vec<String> = elements.iter().map(|e| e.id.clone()).collect();
    let comments = db.comments_in_elements(&element_ids).unwrap();
    (tabs, elements, comments)
}

#[test]
fn group_creation_makes_the_creator_its_first_member() {
    let db = Database::open_in_memory().unwrap();
    seed_users(&db);
    db.create_group("group-phys", "Physics", "study group", "user-anna").unwrap();

    let group = db.get_group("group-phys").unwrap().unwrap();
    assert_eq!(group.member_count, 1);

    let ownership = Ownership::of_group(&group);
    assert!(guard::can_view(&db, "user-anna", &ownership).unwrap());
    assert!(guard::can_mutate(&db, "user-anna", &ownership).unwrap());
    assert!(!guard::can_view(&db, "user-ben", &ownership).unwrap());
}

#[test]
fn joining_grants_visibility_but_not_mutation_of_other_content() {
    let db = Database::open_in_memory().unwrap();
    seed_users(&db);
    db.create_group("group-phys", "Physics", "study group", "user-anna").unwrap();
    db.create_tab("tab-notes", "group-phys", "user-anna", "Notes").unwrap();

    let tab = db.get_tab("tab-notes").unwrap().unwrap();
    let ownership = Ownership::of_tab(&tab);
    assert!(!guard::can_view(&db, "user-ben", &ownership).unwrap());

    db.add_member("group-phys", "user-ben").unwrap();

    assert!(guard::can_view(&db, "user-ben", &ownership).unwrap());
    assert!(!guard::can_mutate(&db, "user-ben", &ownership).unwrap());
    assert!(guard::can_mutate(&db, "user-anna", &ownership).unwrap());
}

#[test]
fn feed_lists_descendants_newest_first_and_only_from_joined_groups() {
    let db = Database::open_in_memory().unwrap();
    seed_users(&db);
    db.create_group("group-phys", "Physics", "study group", "user-anna").unwrap();
    db.add_member("group-phys", "user-ben").unwrap();
    db.create_tab("tab-notes", "group-phys", "user-anna", "Notes").unwrap();
    db.create_element("el-ch1", "tab-notes", "user-anna", "Chapter1", "kinematics", None)
        .unwrap();
    db.create_comment("com-nice", "el-ch1", "user-ben", "nice").unwrap();

    // A group anna never joined; nothing under it may surface in her feed.
    db.create_user("user-zoe", "zoe", "hash", None, None).unwrap();
    db.create_group("group-priv", "Private", "secret club", "user-zoe").unwrap();
    db.create_tab("tab-priv", "group-priv", "user-zoe", "Hidden").unwrap();

    // Spread creation times: tab oldest, element next, comment newest.
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE tabs SET created_at = datetime('now', '-2 hours') WHERE id = 'tab-notes'",
            [],
        )?;
        conn.execute(
            "UPDATE elements SET created_at = datetime('now', '-1 hour') WHERE id = 'el-ch1'",
            [],
        )?;
        Ok(())
    })
    .unwrap();

    let (tabs, elements, comments) = collect_feed_rows(&db, "user-anna");
    let entries = merge_entries(tabs, elements, comments);

    assert_eq!(entries.len(), 3);
    match &entries[0] {
        FeedItem::Comment(comment) => assert_eq!(comment.body, "nice"),
        other => panic!("expected the comment first, got {other:?}"),
    }
    match &entries[1] {
        FeedItem::Element(element) => assert_eq!(element.name, "Chapter1"),
        other => panic!("expected the element second, got {other:?}"),
    }
    match &entries[2] {
        FeedItem::Tab(tab) => assert_eq!(tab.name, "Notes"),
        other => panic!("expected the tab last, got {other:?}"),
    }

    let page = paginate(entries, 1);
    assert_eq!(page.page, 1);
    assert_eq!(page.total_pages, 1);
    assert_eq!(page.total_entries, 3);

    // ben joined, so his feed carries the same entries; zoe's private
    // group still leaks nothing into either.
    let (tabs, elements, comments) = collect_feed_rows(&db, "user-ben");
    let entries = merge_entries(tabs, elements, comments);
    assert_eq!(entries.len(), 3);

    let (tabs, elements, comments) = collect_feed_rows(&db, "user-zoe");
    let entries = merge_entries(tabs, elements, comments);
    assert_eq!(entries.len(), 1);
    match &entries[0] {
        FeedItem::Tab(tab) => assert_eq!(tab.name, "Hidden"),
        other => panic!("expected zoe's own tab, got {other:?}"),
    }
}

#[test]
fn search_finds_groups_by_fragment_but_never_invents_matches() {
    let db = Database::open_in_memory().unwrap();
    seed_users(&db);
    db.create_group("group-phys", "Physics", "study group", "user-anna").unwrap();

    let hits = db.search_groups("phys").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "Physics");

    // Creator identity counts as a match field.
    assert_eq!(db.search_groups("kowalska").unwrap().len(), 1);

    assert!(db.search_groups("chem").unwrap().is_empty());
    assert!(db.search_groups("").unwrap().is_empty());
}

#[test]
fn deleting_a_group_erases_it_for_everyone() {
    let db = Database::open_in_memory().unwrap();
    seed_users(&db);
    db.create_group("group-phys", "Physics", "study group", "user-anna").unwrap();
    db.add_member("group-phys", "user-ben").unwrap();
    db.create_tab("tab-notes", "group-phys", "user-anna", "Notes").unwrap();
    db.create_element("el-ch1", "tab-notes", "user-anna", "Chapter1", "kinematics", None)
        .unwrap();
    db.create_comment("com-nice", "el-ch1", "user-ben", "nice").unwrap();

    assert!(db.delete_group("group-phys").unwrap());

    // Every former descendant now resolves to "not found".
    assert!(db.get_tab("tab-notes").unwrap().is_none());
    assert!(db.get_element("el-ch1").unwrap().is_none());
    assert!(db.get_comment("com-nice").unwrap().is_none());

    // ben's membership list no longer mentions the group.
    assert!(db.groups_for_user("user-ben").unwrap().is_empty());

    let (tabs, elements, comments) = collect_feed_rows(&db, "user-ben");
    assert!(merge_entries(tabs, elements, comments).is_empty());
}
