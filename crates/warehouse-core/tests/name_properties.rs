//! Property tests for project name validation and canonicalization.

use proptest::prelude::*;
use warehouse_core::packaging::{canonical_project_name, is_valid_project_name, store};
use warehouse_core::Database;

fn valid_name() -> impl Strategy<Value = String> {
    prop_oneof![
        "[A-Za-z0-9]",
        "[A-Za-z0-9][A-Za-z0-9._-]{0,20}[A-Za-z0-9]",
    ]
}

proptest! {
    #[test]
    fn canonical_name_is_idempotent(name in "[A-Za-z0-9._-]{1,30}") {
        let once = canonical_project_name(&name);
        prop_assert_eq!(canonical_project_name(&once), once);
    }

    #[test]
    fn canonical_name_ignores_case(name in valid_name()) {
        prop_assert_eq!(
            canonical_project_name(&name.to_ascii_lowercase()),
            canonical_project_name(&name.to_ascii_uppercase())
        );
    }

    #[test]
    fn generated_names_are_valid(name in valid_name()) {
        prop_assert!(is_valid_project_name(&name));
    }

    #[test]
    fn names_with_bad_edges_are_invalid(
        core in "[A-Za-z0-9]{1,10}",
        edge in "[._-]",
    ) {
        let leading = format!("{}{}", edge, core);
        let trailing = format!("{}{}", core, edge);
        prop_assert!(!is_valid_project_name(&leading));
        prop_assert!(!is_valid_project_name(&trailing));
    }

    #[test]
    fn storage_agrees_with_validator(name in "[ -~]{0,12}") {
        let mut db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        let stored = db
            .conn()
            .execute("INSERT INTO packaging_project (name) VALUES (?1)", [&name])
            .is_ok();
        prop_assert_eq!(stored, is_valid_project_name(&name));
    }

    #[test]
    fn storage_uniqueness_matches_canonical_key(a in valid_name(), b in valid_name()) {
        let mut db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        store::create_project(db.conn(), &a).unwrap();
        let second = store::create_project(db.conn(), &b);
        prop_assert_eq!(
            second.is_err(),
            canonical_project_name(&a) == canonical_project_name(&b)
        );
    }
}
