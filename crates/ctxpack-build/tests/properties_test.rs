use ctxpack_build::PatternSet;
use ctxpack_build::args::expand;
use ctxpack_build::paths::clean_str;
use proptest::prelude::*;

proptest! {
    #[test]
    fn text_without_references_is_unchanged(text in "[a-zA-Z0-9_./:-]{0,40}", value in "[a-z0-9]{0,8}") {
        prop_assert_eq!(expand(&text, "KEY", &value), text);
    }

    #[test]
    fn braced_reference_is_always_replaced(prefix in "[a-z/]{0,10}", suffix in "[A-Za-z0-9_]{0,10}", value in "[a-z0-9]{0,8}") {
        let text = format!("{prefix}${{KEY}}{suffix}");
        prop_assert_eq!(expand(&text, "KEY", &value), format!("{prefix}{value}{suffix}"));
    }

    #[test]
    fn directory_pattern_covers_every_descendant(dir in "[a-z]{1,8}", rest in "[a-z]{1,8}(/[a-z]{1,8}){0,3}") {
        let set = PatternSet::new(&[dir.as_str()]).unwrap();
        let descendant = format!("{dir}/{rest}");
        prop_assert!(set.matches(&dir));
        prop_assert!(set.matches(&descendant));
    }

    #[test]
    fn later_exception_wins(dir in "[a-z]{1,8}", name in "[a-z]{1,8}") {
        let file = format!("{dir}/{name}");
        let set = PatternSet::new(&[dir.clone(), format!("!{file}")]).unwrap();
        prop_assert!(!set.matches(&file));
    }

    #[test]
    fn clean_is_idempotent(path in "[a-z]{1,4}(/(\\.{1,2}|[a-z]{1,4})){0,6}") {
        let once = clean_str(&path);
        prop_assert_eq!(clean_str(&once), once.clone());
    }
}
