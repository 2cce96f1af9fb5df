// Unit tests for scripts directory scanning

use crate::scripts::discovery::{compare_names, discover_scripts, ensure_scripts_dir, resolve_within};

use std::cmp::Ordering;
use std::fs;

fn names(entries: &[crate::scripts::ScriptEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.name.as_str()).collect()
}

/// **VALUE**: Verifies the core eligibility rules: regular files only, no symlinks, no dotfiles, sorted.
///
/// **WHY THIS MATTERS**: The scripts directory is the trust boundary. A symlink could point at any
/// file on disk; a dotfile is usually editor or OS clutter.
///
/// **BUG THIS CATCHES**: Would catch symlinks being followed, dotfiles being dispatched, or the
/// ordering changing between runs.
#[cfg(unix)]
#[tokio::test]
async fn given_mixed_entries_when_discovering_then_only_regular_visible_files_in_order() {
    // GIVEN: b.sh, a.sh, a symlink c.sh, a dotfile, and a subdirectory
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::write(root.join("b.sh"), "echo b").unwrap();
    fs::write(root.join("a.sh"), "echo a").unwrap();
    fs::write(root.join(".d.sh"), "echo d").unwrap();
    fs::create_dir(root.join("nested.sh")).unwrap();
    std::os::unix::fs::symlink(root.join("a.sh"), root.join("c.sh")).unwrap();

    // WHEN: Discovering
    let scripts = discover_scripts(root).await.unwrap();

    // THEN: Only a.sh and b.sh, in that order
    assert_eq!(names(&scripts), vec!["a.sh", "b.sh"]);

    let canonical = fs::canonicalize(root).unwrap();
    for entry in &scripts {
        assert!(entry.path.is_absolute());
        assert!(entry.path.starts_with(&canonical));
    }
}

/// **VALUE**: Verifies a missing scripts directory is created, not treated as an error.
///
/// **WHY THIS MATTERS**: First run on a fresh profile has no directory yet.
///
/// **BUG THIS CATCHES**: Would catch discovery failing with NotFound on first wake.
#[tokio::test]
async fn given_missing_dir_when_discovering_then_created_and_empty() {
    let dir = tempfile::tempdir().unwrap();
    let scripts_dir = dir.path().join("profile").join("startup-scripts");

    let scripts = discover_scripts(&scripts_dir).await.unwrap();

    assert!(scripts.is_empty());
    assert!(scripts_dir.is_dir());
}

#[tokio::test]
async fn given_nested_path_when_ensuring_then_parents_created() {
    let dir = tempfile::tempdir().unwrap();
    let scripts_dir = dir.path().join("a").join("b").join("c");

    let created = ensure_scripts_dir(&scripts_dir).await.unwrap();

    assert_eq!(created, scripts_dir);
    assert!(scripts_dir.is_dir());
}

/// **VALUE**: Verifies traversal-style paths that resolve outside the root are refused.
///
/// **WHY THIS MATTERS**: A crafted name such as `../../outside.sh` must never reach the interpreter.
///
/// **BUG THIS CATCHES**: Would catch a containment check done on the unresolved path string.
#[tokio::test]
async fn given_path_escaping_root_when_resolving_then_refused() {
    // GIVEN: root/scripts and a sibling file outside it
    let dir = tempfile::tempdir().unwrap();
    let scripts = dir.path().join("scripts");
    fs::create_dir(&scripts).unwrap();
    fs::write(dir.path().join("outside.sh"), "echo out").unwrap();
    fs::write(scripts.join("inside.sh"), "echo in").unwrap();
    let root = fs::canonicalize(&scripts).unwrap();

    // THEN: Escaping paths are refused, contained ones are resolved
    assert!(resolve_within(&root, &root.join("../outside.sh")).await.is_none());
    assert!(resolve_within(&root, &root.join("sub/../../outside.sh")).await.is_none());
    assert!(resolve_within(&root, &root.join("missing.sh")).await.is_none());
    assert!(resolve_within(&root, &root).await.is_none());
    assert_eq!(
        resolve_within(&root, &root.join("inside.sh")).await,
        Some(root.join("inside.sh"))
    );
}

/// **VALUE**: Verifies a scripts directory reached through a symlinked parent still confines scripts.
///
/// **WHY THIS MATTERS**: Canonicalizing only one side of the comparison would reject every script
/// (or accept escapes) when the profile lives behind a symlink.
///
/// **BUG THIS CATCHES**: Would catch comparing a canonical child against a non-canonical root.
#[cfg(unix)]
#[tokio::test]
async fn given_symlinked_scripts_dir_when_discovering_then_scripts_resolve_inside_target() {
    let dir = tempfile::tempdir().unwrap();
    let real = dir.path().join("real");
    fs::create_dir(&real).unwrap();
    fs::write(real.join("a.sh"), "echo a").unwrap();
    let link = dir.path().join("link");
    std::os::unix::fs::symlink(&real, &link).unwrap();

    let scripts = discover_scripts(&link).await.unwrap();

    assert_eq!(names(&scripts), vec!["a.sh"]);
    assert!(scripts[0].path.starts_with(fs::canonicalize(&real).unwrap()));
}

#[test]
fn given_names_when_compared_then_case_insensitive_with_stable_tiebreak() {
    assert_eq!(compare_names("a.sh", "B.sh"), Ordering::Less);
    assert_eq!(compare_names("B.sh", "a.sh"), Ordering::Greater);
    assert_eq!(compare_names("A.sh", "a.sh"), Ordering::Less);
    assert_eq!(compare_names("10.sh", "9.sh"), Ordering::Less);
}
