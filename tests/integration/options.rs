//! Loading checker options from `reef.toml` and their effect on checking.

use std::fs;
use std::path::Path;

use reef::ast::builder::{named, ProgramBuilder, UnionSpec};
use reef::manifest::{find_manifest, MANIFEST_FILE};
use reef::{type_check, CheckerOptions, CompileError, TypeError};

fn non_exhaustive_match() -> ProgramBuilder {
    let mut b = ProgramBuilder::new();
    b.union(UnionSpec::new("Light").unit("Red").unit("Off"));
    let value = b.static_member(named("Light"), "Red");
    let red = b.variant_pattern(named("Light"), Some("Red"), None);
    let zero = b.int(0);
    let choose = b.match_(value, vec![(red, zero)]);
    b.push(choose);
    b
}

#[test]
fn typeck_table_is_read() {
    let options = CheckerOptions::from_toml_str(
        "[package]\nname = \"shapes\"\n\n[typeck]\ncomplexity-limit = 32\ncheck-exhaustiveness = false\nmax-tuple-arity = 4\n",
        Path::new(MANIFEST_FILE),
    )
    .unwrap();
    assert_eq!(options, CheckerOptions { complexity_limit: 32, check_exhaustiveness: false, max_tuple_arity: 4 });
}

#[test]
fn zero_complexity_limit_is_rejected() {
    let err = CheckerOptions::from_toml_str("[typeck]\ncomplexity-limit = 0\n", Path::new(MANIFEST_FILE)).unwrap_err();
    let CompileError::Manifest { msg, path } = err else { panic!("expected a manifest error") };
    assert!(msg.contains("complexity-limit"), "{msg}");
    assert_eq!(path, Path::new(MANIFEST_FILE));
}

#[test]
fn wrong_value_type_is_rejected() {
    let err = CheckerOptions::from_toml_str("[typeck]\ncheck-exhaustiveness = \"yes\"\n", Path::new(MANIFEST_FILE))
        .unwrap_err();
    assert!(matches!(err, CompileError::Manifest { .. }));
}

#[test]
fn discover_walks_up_to_manifest() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(MANIFEST_FILE), "[typeck]\nmax-tuple-arity = 3\n").unwrap();
    let nested = dir.path().join("src").join("shapes");
    fs::create_dir_all(&nested).unwrap();

    assert_eq!(find_manifest(&nested), Some(dir.path().join(MANIFEST_FILE)));
    let options = CheckerOptions::discover(&nested).unwrap();
    assert_eq!(options.max_tuple_arity, 3);
    assert_eq!(options.complexity_limit, 15);
}

#[test]
fn discover_stops_at_git_boundary() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(MANIFEST_FILE), "[typeck]\nmax-tuple-arity = 3\n").unwrap();
    let repo = dir.path().join("repo");
    fs::create_dir_all(repo.join(".git")).unwrap();

    assert_eq!(find_manifest(&repo), None);
    assert_eq!(CheckerOptions::discover(&repo).unwrap(), CheckerOptions::default());
}

#[test]
fn unreadable_manifest_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let err = CheckerOptions::from_path(&dir.path().join(MANIFEST_FILE)).unwrap_err();
    assert!(err.to_string().contains("could not read file"), "{err}");
}

#[test]
fn loaded_options_drive_the_checker() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(MANIFEST_FILE), "[typeck]\ncheck-exhaustiveness = false\n").unwrap();
    let options = CheckerOptions::discover(dir.path()).unwrap();

    let program = non_exhaustive_match().finish();
    assert!(type_check(&program, &options).unwrap().is_ok());

    let checked = type_check(&program, &CheckerOptions::default()).unwrap();
    let errors: Vec<TypeError> = checked.errors().iter().map(|d| d.error.clone()).collect();
    assert_eq!(errors, vec![TypeError::MatchNonExhaustive]);
}
