//! Resolver properties over generated acyclic datasets.
use ntmbot::craft::{
    is_passive, CraftDataset, CraftGraphResolver, CraftRecipe, PASSIVE_MATERIALS,
    REQUIREMENT_NONE,
};
use proptest::prelude::*;

/// `(kind, pick, quantity)` per slot; see [`slot_name`].
type SlotSeed = (u8, usize, u64);

fn item_name(index: usize) -> String {
    format!("Item{}", index)
}

/// Kind 0 points at a later item so every generated graph is acyclic.
fn slot_name(owner: usize, items: usize, kind: u8, pick: usize) -> String {
    match kind {
        0 if owner + 1 < items => item_name(owner + 1 + pick % (items - owner - 1)),
        1 => PASSIVE_MATERIALS[pick % PASSIVE_MATERIALS.len()].to_string(),
        3 => REQUIREMENT_NONE.to_string(),
        _ => format!("Raw{}", pick % 3),
    }
}

fn build_dataset(seeds: &[Vec<SlotSeed>], passive_recipe: bool) -> CraftDataset {
    let mut data = CraftDataset::new();
    for (owner, slots) in seeds.iter().enumerate() {
        let reqs: Vec<(String, u64)> = slots
            .iter()
            .map(|&(kind, pick, qty)| (slot_name(owner, seeds.len(), kind, pick), qty))
            .collect();
        let refs: Vec<(&str, u64)> = reqs.iter().map(|(n, q)| (n.as_str(), *q)).collect();
        let name = item_name(owner);
        data.insert(name.clone(), CraftRecipe::from_requirements(&name, &refs).unwrap());
    }
    // passive materials must stay leaves even when the dataset can craft them
    if passive_recipe {
        data.insert(
            "Water",
            CraftRecipe::from_requirements("Water", &[("Well", 2), ("Item0", 1)]).unwrap(),
        );
    }
    data
}

prop_compose! {
    fn acyclic_dataset()(
        seeds in prop::collection::vec(
            prop::collection::vec((0u8..4, 0usize..8, 0u64..5), 0..=3),
            1..8,
        ),
        root in 0usize..8,
        passive_recipe in any::<bool>(),
    ) -> (CraftDataset, String) {
        let root = item_name(root % seeds.len());
        (build_dataset(&seeds, passive_recipe), root)
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn totals_scale_linearly((data, root) in acyclic_dataset(), n in 1u64..=1000) {
        let resolver = CraftGraphResolver::new();
        let one = resolver.resolve(&root, &data, 1).unwrap();
        let many = resolver.resolve(&root, &data, n).unwrap();

        let one_order: Vec<&str> = one.iter().map(|(name, _)| name).collect();
        let many_order: Vec<&str> = many.iter().map(|(name, _)| name).collect();
        prop_assert_eq!(one_order, many_order);
        for (name, qty) in one.iter() {
            prop_assert_eq!(many.get(name), Some(qty * n), "material {}", name);
        }
    }

    #[test]
    fn passive_and_none_never_appear((data, root) in acyclic_dataset(), n in 1u64..=50) {
        let result = CraftGraphResolver::new().resolve(&root, &data, n).unwrap();
        for (name, _) in result.iter() {
            prop_assert!(!is_passive(name), "passive {} in result", name);
            prop_assert_ne!(name, REQUIREMENT_NONE);
            prop_assert_ne!(name, "Well");
        }
    }
}
