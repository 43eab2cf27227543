//! Property-based tests for value types and content addressing.

use proptest::prelude::*;

use hubkit::core::types::{validate_path, BranchName, FileChange, Oid, RepositoryRef};
use hubkit::forge::mock::MockForge;
use hubkit::ops::{build_tree, publish_batch, OpError, PublishRequest};

/// One path component: no leading dot, no slash.
fn component() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_][a-zA-Z0-9_.-]{0,11}"
}

fn relative_path() -> impl Strategy<Value = String> {
    prop::collection::vec(component(), 1..5).prop_map(|parts| parts.join("/"))
}

fn branch_name() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z0-9_][a-z0-9_-]{0,9}", 1..4)
        .prop_map(|parts| parts.join("/"))
        .prop_filter("not a lock file", |name| !name.ends_with(".lock"))
}

/// A set of file paths where no path is the parent directory of another.
fn file_set(
    content: &'static str,
    size: std::ops::Range<usize>,
) -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::btree_map(relative_path(), content, size)
        .prop_filter("a path cannot also be a directory", |files| {
            files.keys().all(|path| {
                let dir = format!("{}/", path);
                !files.keys().any(|other| other.starts_with(&dir))
            })
        })
        .prop_map(|files| files.into_iter().collect())
}

fn hex_oid() -> impl Strategy<Value = String> {
    "[0-9a-fA-F]{40}"
}

fn repo() -> RepositoryRef {
    RepositoryRef::new("octo", "demo").unwrap()
}

proptest! {
    #[test]
    fn generated_paths_are_valid(path in relative_path()) {
        prop_assert!(validate_path(&path).is_ok());
    }

    #[test]
    fn dot_components_are_rejected(
        head in relative_path(),
        tail in relative_path(),
        dots in prop::sample::select(vec![".", ".."]),
    ) {
        let path = format!("{}/{}/{}", head, dots, tail);
        prop_assert!(validate_path(&path).is_err());
    }

    #[test]
    fn absolute_and_trailing_slash_rejected(path in relative_path()) {
        let absolute = format!("/{}", path);
        let trailing = format!("{}/", path);
        prop_assert!(validate_path(&absolute).is_err());
        prop_assert!(validate_path(&trailing).is_err());
    }

    #[test]
    fn branch_names_accepted(name in branch_name()) {
        let branch = BranchName::new(name.clone()).unwrap();
        prop_assert_eq!(branch.as_str(), name.as_str());
        prop_assert_eq!(branch.full_ref(), format!("refs/heads/{}", name));
    }

    #[test]
    fn branch_names_with_forbidden_sequences_rejected(
        name in branch_name(),
        bad in prop::sample::select(vec!["..", "@{", "//", " ", "~", "^", ":", "?", "*", "["]),
    ) {
        let candidate = format!("{}{}x", name, bad);
        prop_assert!(BranchName::new(candidate).is_err());
    }

    #[test]
    fn oids_are_lowercased(raw in hex_oid()) {
        let oid = Oid::new(raw.clone()).unwrap();
        prop_assert_eq!(oid.as_str(), raw.to_ascii_lowercase());
    }

    #[test]
    fn non_hex_oids_rejected(prefix in "[0-9a-f]{39}", bad in "[g-zG-Z]") {
        let candidate = format!("{}{}", prefix, bad);
        prop_assert!(Oid::new(candidate).is_err());
    }

    #[test]
    fn wrong_length_oids_rejected(raw in "[0-9a-f]{1,80}") {
        prop_assume!(raw.len() != 40 && raw.len() != 64);
        prop_assert!(Oid::new(raw).is_err());
    }

    /// The tree id depends on the file set, not the order it was given in.
    #[test]
    fn tree_sha_ignores_order(
        files in file_set("[ -~]{0,24}", 1..8),
    ) {
        let forge = MockForge::new();
        let base = forge.seed_branch(&repo(), "main", &[("README.md", "seed")]);

        let forward: Vec<FileChange> = files
            .iter()
            .map(|(path, content)| FileChange::new(path.clone(), content.clone()))
            .collect();
        let mut backward = forward.clone();
        backward.reverse();

        let (a, b) = tokio_test::block_on(async {
            let a = build_tree(&forge, &repo(), &forward, Some(&base)).await.unwrap();
            let b = build_tree(&forge, &repo(), &backward, Some(&base)).await.unwrap();
            (a, b)
        });
        prop_assert_eq!(a.sha, b.sha);
    }

    /// A batch naming any path twice is refused before the remote is touched.
    #[test]
    fn duplicate_paths_make_no_calls(
        files in file_set("[a-z]{0,8}", 1..6),
        pick in any::<prop::sample::Index>(),
    ) {
        let forge = MockForge::new();
        forge.seed_branch(&repo(), "main", &[]);

        let mut changes: Vec<FileChange> = files
            .iter()
            .map(|(path, content)| FileChange::new(path.clone(), content.clone()))
            .collect();
        let duplicate = changes[pick.index(changes.len())].path.clone();
        changes.push(FileChange::new(duplicate, "again"));

        let request = PublishRequest {
            branch: BranchName::new("main").unwrap(),
            files: changes,
            message: "dup".to_string(),
        };
        let err = tokio_test::block_on(publish_batch(&forge, &repo(), &request)).unwrap_err();
        prop_assert!(matches!(err, OpError::InvalidInput(_)));
        prop_assert!(forge.operations().is_empty());
    }
}

#[test]
fn empty_batch_rejected() {
    let forge = MockForge::new();
    forge.seed_branch(&repo(), "main", &[]);
    let request = PublishRequest {
        branch: BranchName::new("main").unwrap(),
        files: Vec::new(),
        message: "nothing".to_string(),
    };
    let err = tokio_test::block_on(publish_batch(&forge, &repo(), &request)).unwrap_err();
    assert!(matches!(err, OpError::InvalidInput(_)));
    assert!(forge.operations().is_empty());
}
