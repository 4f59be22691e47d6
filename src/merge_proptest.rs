//! Property-based tests for merging repository declarations.

#[cfg(test)]
mod proptest_tests {
    use crate::collect::{collect, LineSource};
    use crate::deb::flat_name;
    use crate::repository::Repository;
    use proptest::prelude::*;

    const URL: &str = "http://deb.example.org/debian";

    fn record(components: Vec<String>, trusted: bool) -> Repository {
        Repository {
            kind: "apt-deb".to_string(),
            components,
            url: URL.to_string(),
            trusted,
            name: "stable".to_string(),
            ..Default::default()
        }
    }

    fn components() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[a-z][a-z-]{0,8}", 0..5)
    }

    fn fold(records: &[Repository]) -> Repository {
        let mut acc = records[0].clone();
        for r in &records[1..] {
            acc.merge(r).unwrap();
        }
        acc
    }

    proptest! {
        /// Property: merged trust is the AND of all members, in any order
        #[test]
        fn trust_is_and_of_members(flags in prop::collection::vec(any::<bool>(), 1..8)) {
            let records: Vec<Repository> = flags
                .iter()
                .map(|&t| record(vec!["main".to_string()], t))
                .collect();
            let expected = flags.iter().all(|&t| t);

            prop_assert_eq!(fold(&records).trusted, expected);

            let mut reversed = records.clone();
            reversed.reverse();
            prop_assert_eq!(fold(&reversed).trusted, expected);
        }

        /// Property: merged components are the sorted, deduplicated union
        #[test]
        fn components_are_sorted_union(a in components(), b in components()) {
            let mut merged = record(a.clone(), true);
            merged.merge(&record(b.clone(), true)).unwrap();

            let mut expected: Vec<String> = a.into_iter().chain(b).collect();
            expected.sort();
            expected.dedup();
            prop_assert_eq!(merged.components, expected);
        }

        /// Property: merging a record with itself only deduplicates components
        #[test]
        fn merge_with_self(c in components(), trusted in any::<bool>()) {
            let original = record(c, trusted);
            let mut merged = original.clone();
            merged.merge(&original).unwrap();

            let mut expected = original.components.clone();
            expected.sort();
            expected.dedup();
            prop_assert_eq!(&merged.components, &expected);
            prop_assert_eq!(merged.trusted, original.trusted);
            prop_assert_eq!(&merged.attrs, &original.attrs);
            prop_assert_eq!(&merged.name, &original.name);
        }

        /// Property: flat names are deterministic and never contain `/`, `.` or `:`
        #[test]
        fn flat_name_is_clean(url in "(https?|file)://[A-Za-z0-9./:_-]{0,40}") {
            let name = flat_name(&url);
            prop_assert_eq!(&name, &flat_name(&url));
            prop_assert!(!name.contains(['/', '.', ':']));
        }

        /// Property: one record per distinct URL regardless of how lines are split into files
        #[test]
        fn one_record_per_url(split in 0usize..4, hosts in prop::collection::vec(0u8..3, 1..8)) {
            let lines: Vec<String> = hosts
                .iter()
                .map(|h| format!("deb http://h{h}.example.org/ stable main"))
                .collect();
            let at = split.min(lines.len());
            let sources = [
                LineSource::new("a.list", lines[..at].to_vec()),
                LineSource::new("b.list", lines[at..].to_vec()),
            ];
            let repos = collect(&sources).unwrap();

            let mut distinct = hosts.clone();
            distinct.sort();
            distinct.dedup();
            prop_assert_eq!(repos.len(), distinct.len());
            prop_assert_eq!(&repos[0].url, &format!("http://h{}.example.org/", hosts[0]));
        }
    }
}
