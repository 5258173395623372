// tests/pattern_compile.rs

use std::path::Path;

use reloadwatch::watch::WatchSpec;

fn compile(pattern: &str) -> WatchSpec {
    WatchSpec::compile_with_base(pattern, Path::new("/base")).unwrap()
}

#[test]
fn plain_absolute_directory_is_the_root() {
    let spec = compile("/path");
    assert_eq!(spec.root_dir(), "/path");
    assert_eq!(spec.segments(), vec![""]);
    assert!(!spec.is_recursive());
}

#[test]
fn recursive_php_pattern_roots_at_last_static_directory() {
    let spec = compile("/path/**/*.php");
    assert_eq!(spec.root_dir(), "/path");
    assert_eq!(spec.segments(), vec!["", "*.php"]);
    assert!(spec.is_recursive());
}

#[test]
fn dot_compiles_to_the_current_directory() {
    let cwd = std::env::current_dir().unwrap();
    let spec = WatchSpec::compile(".").unwrap();

    assert!(spec.root_dir().starts_with('/'));
    assert!(cwd.to_str().unwrap().starts_with(spec.root_dir()));

    // Only exact when the last directory name has no dot in it; otherwise it
    // is treated as a file-like final component.
    let last_has_dot = cwd
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.contains('.'));
    if !last_has_dot {
        assert_eq!(Path::new(spec.root_dir()), cwd.as_path());
    }
}

#[test]
fn relative_patterns_resolve_against_the_base() {
    let spec = compile("src/**/*.{php,twig}");
    assert_eq!(spec.root_dir(), "/base/src");
    assert_eq!(spec.segments(), vec!["", "*.{php,twig}"]);
    assert_eq!(spec.pattern(), "src/**/*.{php,twig}");
}

#[test]
fn dot_and_dotdot_components_are_collapsed() {
    let spec = compile("./app/../config/./*.yaml");
    assert_eq!(spec.root_dir(), "/base/config");
    assert_eq!(spec.segments(), vec!["*.yaml"]);
}

#[test]
fn final_component_with_a_dot_is_part_of_the_remainder() {
    let spec = compile("/srv/app/composer.json");
    assert_eq!(spec.root_dir(), "/srv/app");
    assert_eq!(spec.segments(), vec!["composer.json"]);
}

#[test]
fn dotted_directory_in_the_middle_stays_in_the_root() {
    let spec = compile("/srv/app.d/conf/*.ini");
    assert_eq!(spec.root_dir(), "/srv/app.d/conf");
    assert_eq!(spec.segments(), vec!["*.ini"]);
}

#[test]
fn trailing_recursive_marker_gives_trailing_empty_segment() {
    let spec = compile("/srv/app/**");
    assert_eq!(spec.root_dir(), "/srv/app");
    assert_eq!(spec.segments(), vec!["", ""]);
}

#[test]
fn multiple_recursive_markers_split_into_ordered_segments() {
    let spec = compile("/srv/**/views/**/*.twig");
    assert_eq!(spec.root_dir(), "/srv");
    assert_eq!(spec.segments(), vec!["", "views", "*.twig"]);
}

#[test]
fn multi_component_segment_is_kept_whole() {
    let spec = compile("/srv/*/config/*.yml");
    assert_eq!(spec.root_dir(), "/srv");
    assert_eq!(spec.segments(), vec!["*/config/*.yml"]);
}

#[test]
fn trailing_and_doubled_slashes_are_normalized() {
    let spec = compile("//srv//app///");
    assert_eq!(spec.root_dir(), "/srv/app");
}

#[test]
fn filesystem_root_pattern() {
    let spec = compile("/*.conf");
    assert_eq!(spec.root_dir(), "/");
    assert_eq!(spec.segments(), vec!["*.conf"]);
}

#[test]
fn malformed_glob_still_compiles() {
    let spec = compile("/srv/[abc.txt");
    assert_eq!(spec.root_dir(), "/srv");
    assert_eq!(spec.segments(), vec!["[abc.txt"]);
}

#[test]
fn relative_base_is_rejected() {
    let err = WatchSpec::compile_with_base("*.php", Path::new("relative/dir")).unwrap_err();
    assert!(
        matches!(err, reloadwatch::errors::WatchError::InvalidPattern { .. }),
        "unexpected error: {err}"
    );
}

#[test]
fn display_mentions_pattern_and_root() {
    let spec = compile("/path/**/*.php");
    let shown = spec.to_string();
    assert!(shown.contains("/path/**/*.php"));
    assert!(shown.contains("root /path"));
}
