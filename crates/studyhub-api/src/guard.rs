use anyhow::Result;

use studyhub_db::Database;
use studyhub_db::models::{CommentRow, ElementRow, GroupRow, TabRow};

/// An entity's resolved position in the ownership chain: the group it
/// lives under and the user who created it. Resolved fresh per request;
/// nothing here is cached across requests.
#[derive(Debug, Clone)]
pub struct Ownership {
    pub group_id: String,
    pub creator_id: String,
}

impl Ownership {
    pub fn of_group(group: &GroupRow) -> Self {
        Self {
            group_id: group.id.clone(),
            creator_id: group.creator_id.clone(),
        }
    }

    pub fn of_tab(tab: &TabRow) -> Self {
        Self {
            group_id: tab.group_id.clone(),
            creator_id: tab.creator_id.clone(),
        }
    }

    /// Elements resolve their group through their tab. `None` means the
    /// parent chain is gone (stale id); callers treat that as not found.
    pub fn of_element(db: &Database, element: &ElementRow) -> Result<Option<Self>> {
        Ok(db.tab_group_id(&element.tab_id)?.map(|group_id| Self {
            group_id,
            creator_id: element.creator_id.clone(),
        }))
    }

    pub fn of_comment(db: &Database, comment: &CommentRow) -> Result<Option<Self>> {
        Ok(db.element_group_id(&comment.element_id)?.map(|group_id| Self {
            group_id,
            creator_id: comment.creator_id.clone(),
        }))
    }
}

/// Visibility: current membership of the entity's group. Always evaluated
/// against live relational state; losing membership revokes access to
/// everything under the group, including one's own entities.
pub fn can_view(db: &Database, user_id: &str, ownership: &Ownership) -> Result<bool> {
    db.is_member(&ownership.group_id, user_id)
}

/// Update/delete: visibility plus creatorship. For groups the creator is
/// the ownership creator, so only the group's creator may mutate it.
pub fn can_mutate(db: &Database, user_id: &str, ownership: &Ownership) -> Result<bool> {
    Ok(can_view(db, user_id, ownership)? && user_id == ownership.creator_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        db: Database,
        alice: String,
        bob: String,
        group: String,
    }

    /// alice creates a group with one tab, one element and one comment;
    /// bob exists but is not a member.
    fn fixture() -> Fixture {
        let db = Database::open_in_memory().unwrap();
        db.create_user("user-alice", "alice", "hash", None, None).unwrap();
        db.create_user("user-bob", "bob", "hash", None, None).unwrap();
        db.create_group("group-1", "Physics", "study group", "user-alice").unwrap();
        db.create_tab("tab-1", "group-1", "user-alice", "Notes").unwrap();
        db.create_element("el-1", "tab-1", "user-alice", "Chapter1", "text", None).unwrap();
        db.create_comment("com-1", "el-1", "user-alice", "nice").unwrap();

        Fixture {
            db,
            alice: "user-alice".into(),
            bob: "user-bob".into(),
            group: "group-1".into(),
        }
    }

    fn chain_ownerships(db: &Database) -> Vec<Ownership> {
        let group = db.get_group("group-1").unwrap().unwrap();
        let tab = db.get_tab("tab-1").unwrap().unwrap();
        let element = db.get_element("el-1").unwrap().unwrap();
        let comment = db.get_comment("com-1").unwrap().unwrap();

        vec![
            Ownership::of_group(&group),
            Ownership::of_tab(&tab),
            Ownership::of_element(db, &element).unwrap().unwrap(),
            Ownership::of_comment(db, &comment).unwrap().unwrap(),
        ]
    }

    #[test]
    fn membership_gates_visibility_across_the_whole_chain() {
        let fx = fixture();

        for ownership in chain_ownerships(&fx.db) {
            assert!(can_view(&fx.db, &fx.alice, &ownership).unwrap());
            assert!(!can_view(&fx.db, &fx.bob, &ownership).unwrap());
        }

        fx.db.add_member(&fx.group, &fx.bob).unwrap();

        for ownership in chain_ownerships(&fx.db) {
            assert!(can_view(&fx.db, &fx.bob, &ownership).unwrap());
        }
    }

    #[test]
    fn mutation_needs_creatorship_on_top_of_membership() {
        let fx = fixture();
        fx.db.add_member(&fx.group, &fx.bob).unwrap();

        for ownership in chain_ownerships(&fx.db) {
            assert!(can_mutate(&fx.db, &fx.alice, &ownership).unwrap());
            // bob can see everything but created none of it.
            assert!(can_view(&fx.db, &fx.bob, &ownership).unwrap());
            assert!(!can_mutate(&fx.db, &fx.bob, &ownership).unwrap());
        }
    }

    #[test]
    fn group_mutation_is_reserved_for_the_creator() {
        let fx = fixture();
        fx.db.add_member(&fx.group, &fx.bob).unwrap();

        let group = fx.db.get_group("group-1").unwrap().unwrap();
        let ownership = Ownership::of_group(&group);
        assert!(can_mutate(&fx.db, &fx.alice, &ownership).unwrap());
        assert!(!can_mutate(&fx.db, &fx.bob, &ownership).unwrap());
    }

    #[test]
    fn leaving_the_group_freezes_everything_the_user_created() {
        let fx = fixture();
        fx.db.add_member(&fx.group, &fx.bob).unwrap();
        fx.db.remove_member(&fx.group, &fx.alice).unwrap();

        for ownership in chain_ownerships(&fx.db) {
            // The creator left: no view, no mutation. Nobody else
            // created these entities, so they are frozen.
            assert!(!can_view(&fx.db, &fx.alice, &ownership).unwrap());
            assert!(!can_mutate(&fx.db, &fx.alice, &ownership).unwrap());
            assert!(!can_mutate(&fx.db, &fx.bob, &ownership).unwrap());
        }
    }

    #[test]
    fn stale_parents_resolve_to_no_ownership() {
        let fx = fixture();
        let element = fx.db.get_element("el-1").unwrap().unwrap();
        let comment = fx.db.get_comment("com-1").unwrap().unwrap();

        // Drop the chain above them (cascades), then resolve again.
        fx.db.delete_group(&fx.group).unwrap();

        assert!(Ownership::of_element(&fx.db, &element).unwrap().is_none());
        assert!(Ownership::of_comment(&fx.db, &comment).unwrap().is_none());
    }
}
