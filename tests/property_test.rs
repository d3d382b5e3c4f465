//! Property tests for the similarity primitive and the persistence codec.

use indexmap::IndexMap;
use proptest::prelude::*;
use scrapestack::{Scraper, Stack, StackEntry, similarity_ratio};

fn arb_entry() -> impl Strategy<Value = StackEntry> {
    (
        "[a-z]{1,8}",
        proptest::option::of("[a-z ]{1,12}"),
        proptest::option::of("[a-z0-9-]{1,10}"),
    )
        .prop_map(|(tag, class, id)| {
            let mut attrs = IndexMap::new();
            if let Some(class) = class {
                attrs.insert("class".to_string(), class);
            }
            if let Some(id) = id {
                attrs.insert("id".to_string(), id);
            }
            StackEntry { tag, attrs }
        })
}

fn arb_stack() -> impl Strategy<Value = Stack> {
    (
        proptest::collection::vec(arb_entry(), 1..6),
        proptest::option::of("[a-z]{1,6}"),
        any::<bool>(),
        any::<bool>(),
        "[a-z]{0,6}",
    )
        .prop_map(|(content, wanted_attr, is_full_url, is_non_rec_text, alias)| {
            let url = if is_full_url {
                "https://example.com/train".to_string()
            } else {
                String::new()
            };
            let mut stack = Stack::new(content, wanted_attr, is_full_url, is_non_rec_text, url);
            stack.alias = alias;
            stack
        })
}

proptest! {
    #[test]
    fn ratio_stays_in_unit_interval(a in ".{0,24}", b in ".{0,24}") {
        let r = similarity_ratio(&a, &b);
        prop_assert!((0.0..=1.0).contains(&r));
    }

    #[test]
    fn ratio_is_symmetric(a in ".{0,24}", b in ".{0,24}") {
        prop_assert_eq!(similarity_ratio(&a, &b), similarity_ratio(&b, &a));
    }

    #[test]
    fn ratio_is_one_for_identical(a in ".{0,24}") {
        prop_assert_eq!(similarity_ratio(&a, &a), 1.0);
    }

    #[test]
    fn codec_round_trips_any_rule_set(stacks in proptest::collection::vec(arb_stack(), 0..8)) {
        // Assemble through the public surface: load from a bare array, then
        // re-encode and decode.
        let array = serde_json::to_string(&stacks).unwrap();
        let scraper = Scraper::from_json(&array).unwrap();

        let encoded = scraper.to_json().unwrap();
        let back = Scraper::from_json(&encoded).unwrap();

        prop_assert_eq!(back.stacks().len(), stacks.len());
        for (a, b) in back.stacks().iter().zip(&stacks) {
            prop_assert_eq!(&a.hash, &b.hash);
            prop_assert_eq!(&a.stack_id, &b.stack_id);
            prop_assert_eq!(&a.alias, &b.alias);
            prop_assert_eq!(&a.content, &b.content);
            prop_assert_eq!(&a.wanted_attr, &b.wanted_attr);
            prop_assert_eq!(a.is_full_url, b.is_full_url);
            prop_assert_eq!(a.is_non_rec_text, b.is_non_rec_text);
            prop_assert_eq!(&a.url, &b.url);
        }
    }
}
