// tests/matcher_properties.rs

use std::path::{Path, PathBuf};

use proptest::prelude::*;
use reloadwatch::watch::{WatchSpec, expand_braces, strip_root};

fn component() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,7}"
}

fn dirs(max: usize) -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec(component(), 0..max)
}

fn build_path(root: &str, dirs: &[String], file: &str) -> PathBuf {
    let mut path = PathBuf::from(root);
    for d in dirs {
        path.push(d);
    }
    path.push(file);
    path
}

fn spec(pattern: &str) -> WatchSpec {
    WatchSpec::compile_with_base(pattern, Path::new("/base")).unwrap()
}

proptest! {
    #[test]
    fn recursive_tail_matches_at_every_depth(dirs in dirs(6), stem in component()) {
        let spec = spec("/srv/app/**/*.php");
        let path = build_path("/srv/app", &dirs, &format!("{stem}.php"));
        prop_assert!(spec.matches(&path));
    }

    #[test]
    fn recursive_tail_rejects_other_extensions(dirs in dirs(6), stem in component()) {
        let spec = spec("/srv/app/**/*.php");
        let path = build_path("/srv/app", &dirs, &format!("{stem}.phps"));
        prop_assert!(!spec.matches(&path));
    }

    #[test]
    fn single_level_matches_only_direct_children(dirs in dirs(4), stem in component()) {
        let spec = spec("/srv/app/*.php");
        let path = build_path("/srv/app", &dirs, &format!("{stem}.php"));
        prop_assert_eq!(spec.matches(&path), dirs.is_empty());
    }

    #[test]
    fn paths_outside_the_root_never_match(
        suffix in "[a-z]{1,4}",
        dirs in dirs(4),
        stem in component()
    ) {
        let spec = spec("/srv/app/**/*.php");
        let sibling = format!("/srv/app{suffix}");
        let path = build_path(&sibling, &dirs, &format!("{stem}.php"));
        prop_assert!(!spec.matches(&path));
    }

    #[test]
    fn strip_root_returns_exact_remainder(dirs in dirs(5), file in component()) {
        let rest = dirs
            .iter()
            .cloned()
            .chain(std::iter::once(file))
            .collect::<Vec<_>>()
            .join("/");
        let full = format!("/srv/app/{rest}");
        prop_assert_eq!(strip_root("/srv/app", &full), Some(rest.as_str()));
    }

    #[test]
    fn brace_expansion_yields_one_candidate_per_alternative(
        alts in proptest::collection::vec("[a-z]{1,5}", 1..6),
        prefix in "[a-z*]{0,4}"
    ) {
        let segment = format!("{prefix}.{{{}}}", alts.join(","));
        let expanded = expand_braces(&segment);
        prop_assert_eq!(expanded.len(), alts.len());
        for (candidate, alt) in expanded.iter().zip(&alts) {
            prop_assert_eq!(candidate, &format!("{prefix}.{alt}"));
        }
    }
}
