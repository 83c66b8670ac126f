use chrono::DateTime;
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use treeshift_core::ease::Ease;
use treeshift_core::hierarchy::Hierarchy;
use treeshift_core::palette::PaletteStore;
use treeshift_core::transition::{Timing, TransitionScheduler};
use treeshift_core::treemap::{TileStrategy, Tiler};
use treeshift_core::weight::{apply_floor, SizeMode};
use treeshift_core::{Config, Identity, Item, LayoutLeaf, Rect, Sides};

const MODE: SizeMode = SizeMode::FileCount { floor: 1.0 };

fn to_slice(entries: &BTreeMap<(u8, u8), u32>) -> Vec<Item> {
    let when = DateTime::parse_from_rfc3339("2020-06-01T00:00:00Z").unwrap();
    entries
        .iter()
        .map(|(&(d, p), &w)| Item {
            domain: format!("domain-{d}"),
            package: format!("pkg-{p}"),
            file_count: Some(w as f64),
            size: None,
            when,
        })
        .collect()
}

prop_compose! {
    /// A slice with unique identities over a handful of domains.
    fn arb_slice()(entries in prop::collection::btree_map((0u8..6, 0u8..15), 1u32..500, 1..60)) -> Vec<Item> {
        to_slice(&entries)
    }
}

fn leaf(identity: &Identity, n: usize) -> LayoutLeaf {
    LayoutLeaf {
        identity: identity.clone(),
        rect: Rect::new(n as f64, 0.0, n as f64 + 1.0, 1.0),
        weight: 1.0,
    }
}

proptest! {
    /// Property: leaves never overlap and stay inside their domain rectangle
    #[test]
    fn prop_leaves_tile_their_domain(slice in arb_slice(), padded in any::<bool>()) {
        let config = if padded { Config::default() } else { Config::unpadded(1000.0, 800.0) };
        let mut store = PaletteStore::default();
        let h = Hierarchy::build(&slice, 0, &MODE, &mut store).unwrap();
        let mut tiler = Tiler::from_config(&config);
        let layout = tiler.layout(&h, Rect::new(20.0, 70.0, 1020.0, 870.0)).unwrap();

        prop_assert_eq!(layout.leaves.len(), slice.len());
        for domain in &layout.domains {
            for l in layout.leaves.iter().filter(|l| l.domain() == domain.key) {
                prop_assert!(domain.rect.contains(&l.rect), "{:?} not in {:?}", l.rect, domain.rect);
            }
        }
        for (i, a) in layout.leaves.iter().enumerate() {
            prop_assert!(a.rect.is_valid());
            for b in &layout.leaves[i + 1..] {
                prop_assert_eq!(a.rect.intersection_area(&b.rect), 0.0);
            }
        }
    }

    /// Property: reused rows still tile when only the weights move between frames
    #[test]
    fn prop_reused_rows_tile_across_frames(
        members in prop::collection::btree_set((0u8..6, 0u8..15), 1..40),
        frames in prop::collection::vec(prop::collection::vec(1u32..500, 40), 2..8),
    ) {
        let config = Config::default();
        let bounds = Rect::new(20.0, 70.0, 1260.0, 780.0);
        let mut store = PaletteStore::default();
        let mut tiler = Tiler::from_config(&config);
        for weights in &frames {
            let entries: BTreeMap<(u8, u8), u32> = members
                .iter()
                .zip(weights)
                .map(|(&key, &w)| (key, w))
                .collect();
            let slice = to_slice(&entries);
            let h = Hierarchy::build(&slice, 0, &MODE, &mut store).unwrap();
            let layout = tiler.layout(&h, bounds).unwrap();

            prop_assert_eq!(layout.leaves.len(), slice.len());
            for domain in &layout.domains {
                prop_assert!(bounds.contains(&domain.rect));
                for l in layout.leaves.iter().filter(|l| l.domain() == domain.key) {
                    prop_assert!(domain.rect.contains(&l.rect), "{:?} not in {:?}", l.rect, domain.rect);
                }
            }
            for (i, a) in layout.leaves.iter().enumerate() {
                prop_assert!(a.rect.is_valid());
                for b in &layout.leaves[i + 1..] {
                    prop_assert_eq!(a.rect.intersection_area(&b.rect), 0.0);
                }
            }
        }
    }

    /// Property: without padding a domain's area tracks its share of the total weight
    #[test]
    fn prop_domain_area_is_proportional(slice in arb_slice()) {
        let mut store = PaletteStore::default();
        let h = Hierarchy::build(&slice, 0, &MODE, &mut store).unwrap();
        let mut tiler = Tiler::new(TileStrategy::Squarify, Sides::ZERO, 0.0);
        let bounds = Rect::from_size(1000.0, 800.0);
        let layout = tiler.layout(&h, bounds).unwrap();
        let total = h.root_node().value;

        for domain in &layout.domains {
            let expected = bounds.area() * domain.weight / total;
            let r = domain.rect;
            // each edge may move by up to one pixel when rounded
            let tolerance = r.width() + r.height() + 2.0;
            prop_assert!((r.area() - expected).abs() <= tolerance, "{} vs {}", r.area(), expected);
        }
    }

    /// Property: identical input lays out pixel-identically
    #[test]
    fn prop_layout_is_deterministic(slice in arb_slice()) {
        let config = Config::default();
        let bounds = Rect::from_size(1280.0, 800.0);
        let mut store = PaletteStore::default();
        let h = Hierarchy::build(&slice, 0, &config.size_mode, &mut store).unwrap();
        let first = Tiler::from_config(&config).layout(&h, bounds).unwrap();
        let mut tiler = Tiler::from_config(&config);
        let again = tiler.layout(&h, bounds).unwrap();
        let reused = tiler.layout(&h, bounds).unwrap();
        prop_assert_eq!(&first, &again);
        prop_assert_eq!(&first, &reused);
    }

    /// Property: enter/update/exit partition the union of both identity sets
    #[test]
    fn prop_diff_partitions_identities(
        prev in prop::collection::btree_set((0u8..4, 0u8..10), 0..30),
        cur in prop::collection::btree_set((0u8..4, 0u8..10), 0..30),
    ) {
        let ids = |set: &BTreeSet<(u8, u8)>| -> Vec<Identity> {
            set.iter().map(|(d, p)| Identity::new(format!("d{d}"), format!("p{p}"))).collect()
        };
        let (p_ids, c_ids) = (ids(&prev), ids(&cur));
        let mut s = TransitionScheduler::new(Timing { duration_ms: 225, ease: Ease::InOutQuad });
        s.plan(&p_ids.iter().enumerate().map(|(n, id)| leaf(id, n)).collect::<Vec<_>>()).unwrap();
        let plan = s.plan(&c_ids.iter().enumerate().map(|(n, id)| leaf(id, n)).collect::<Vec<_>>()).unwrap();

        let p: HashSet<Identity> = p_ids.iter().cloned().collect();
        let c: HashSet<Identity> = c_ids.iter().cloned().collect();
        let enters: HashSet<_> = plan.enters.iter().map(|l| l.identity.clone()).collect();
        let updates: HashSet<_> = plan.updates.iter().map(|u| u.leaf.identity.clone()).collect();
        let exits: HashSet<_> = plan.exits.iter().map(|e| e.identity.clone()).collect();

        let only_current: HashSet<Identity> = c.difference(&p).cloned().collect();
        let only_previous: HashSet<Identity> = p.difference(&c).cloned().collect();
        let both: HashSet<Identity> = p.intersection(&c).cloned().collect();
        prop_assert_eq!(enters, only_current);
        prop_assert_eq!(exits, only_previous);
        prop_assert_eq!(updates, both);
        prop_assert_eq!(plan.enters.len() + plan.updates.len(), c.len());
        prop_assert_eq!(plan.exits.len() + plan.updates.len(), p.len());
    }

    /// Property: the floor only ever raises a weight, and only to itself
    #[test]
    fn prop_floor_round_trip(raw in 0.0f64..1000.0, floor in 0.5f64..500.0) {
        let w = apply_floor(raw, floor);
        if raw < floor {
            prop_assert_eq!(w, floor);
        } else {
            prop_assert_eq!(w, raw);
        }
    }

    /// Property: assignment is idempotent and the store never shrinks
    #[test]
    fn prop_assign_is_stable(domains in prop::collection::vec(0u8..40, 1..80)) {
        let mut store = PaletteStore::default();
        let mut first = BTreeMap::new();
        let mut size = 0;
        for d in domains {
            let key = format!("domain-{d}");
            let got = store.assign(&key);
            let was = *first.entry(key).or_insert(got);
            prop_assert_eq!(got, was);
            prop_assert!(store.len() >= size);
            size = store.len();
        }
        let mut indices: Vec<_> = first.values().map(|a| a.order_index).collect();
        indices.sort_unstable();
        prop_assert_eq!(indices, (0..first.len()).collect::<Vec<_>>());
    }
}
