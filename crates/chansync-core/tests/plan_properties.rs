//! Property tests for plan generation over a small model vocabulary.

use std::collections::HashSet;

use chansync_core::{generate_plan, ModelMapping, UpdateMode};
use proptest::prelude::*;

const VOCAB: [&str; 6] = ["gpt-4", "gpt-4o", "o3", "claude-3", "alias-a", "alias-b"];

fn arb_current() -> impl Strategy<Value = Vec<String>> {
    prop::sample::subsequence(VOCAB.to_vec(), 0..=VOCAB.len())
        .prop_map(|models| models.into_iter().map(str::to_string).collect())
}

fn arb_available() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(prop::sample::select(VOCAB.to_vec()), 0..8)
        .prop_map(|models| models.into_iter().map(str::to_string).collect())
}

fn arb_mapping() -> impl Strategy<Value = ModelMapping> {
    prop::collection::vec(
        (
            prop::sample::select(VOCAB.to_vec()),
            prop::sample::select(VOCAB.to_vec()),
        ),
        0..4,
    )
    .prop_map(|pairs| pairs.into_iter().collect())
}

fn arb_mode() -> impl Strategy<Value = UpdateMode> {
    prop_oneof![
        Just(UpdateMode::AddOnly),
        Just(UpdateMode::RemoveOnly),
        Just(UpdateMode::Full),
    ]
}

proptest! {
    #[test]
    fn plan_halves_respect_current(
        current in arb_current(),
        available in arb_available(),
        mapping in arb_mapping(),
        mode in arb_mode(),
    ) {
        let plan = generate_plan(&current, &available, &mapping, mode);
        let current_set: HashSet<&String> = current.iter().collect();

        prop_assert!(plan.to_add.iter().all(|m| !current_set.contains(m)));
        prop_assert!(plan.to_remove.iter().all(|m| current_set.contains(m)));

        let unique_adds: HashSet<&String> = plan.to_add.iter().collect();
        prop_assert_eq!(unique_adds.len(), plan.to_add.len());
    }

    #[test]
    fn mode_gates_plan_halves(
        current in arb_current(),
        available in arb_available(),
        mapping in arb_mapping(),
        mode in arb_mode(),
    ) {
        let full = generate_plan(&current, &available, &mapping, UpdateMode::Full);
        let gated = generate_plan(&current, &available, &mapping, mode);
        prop_assert_eq!(gated, full.visible(mode));
    }

    #[test]
    fn applied_plan_is_fixed_point(
        current in arb_current(),
        available in arb_available(),
        mapping in arb_mapping(),
    ) {
        let plan = generate_plan(&current, &available, &mapping, UpdateMode::Full);
        let next = plan.apply_to(&current);

        let again = generate_plan(&next, &available, &mapping, UpdateMode::Full);
        prop_assert!(again.is_empty(), "second pass proposed {:?}", again);
    }

    #[test]
    fn listed_alias_covers_served_target(
        current in arb_current(),
        available in arb_available(),
        mapping in arb_mapping(),
    ) {
        let plan = generate_plan(&current, &available, &mapping, UpdateMode::Full);

        for (alias, target) in mapping.iter() {
            let listed = current.iter().any(|m| m == alias);
            let served = available.iter().any(|m| m == target);
            if listed && served {
                prop_assert!(!plan.to_add.iter().any(|m| m == target));
                prop_assert!(!plan.to_remove.iter().any(|m| m == alias));
            }
        }
    }
}
