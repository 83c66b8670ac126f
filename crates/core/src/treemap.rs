//! Squarified treemap tiling over a two-level [`Hierarchy`].
//!
//! Padding and row building follow the d3-hierarchy treemap: every node is
//! shrunk by half the inner padding of its parent, group nodes reserve their
//! own padding around their children, and children are packed into rows
//! targeting the golden ratio. Coordinates are rounded only once the whole
//! tree is placed.

use crate::config::{Config, Sides};
use crate::error::{Error, Result};
use crate::hierarchy::{Hierarchy, Node, NodeKind};
use crate::model::{LayoutLeaf, Rect};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

const PHI: f64 = 1.618_033_988_749_895;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileStrategy {
    /// Fresh rows on every pass.
    Squarify,
    /// Reuse the previous pass's rows while a group's members are unchanged.
    Resquarify,
}

impl Default for TileStrategy {
    fn default() -> Self {
        TileStrategy::Resquarify
    }
}

/// One row of a squarified partition: `len` consecutive siblings laid side
/// by side. `dice` rows span the full width and take a horizontal band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSpec {
    pub len: usize,
    pub dice: bool,
}

/// Partitions `values` into rows over `area`, closing a row as soon as
/// adding the next sibling would worsen its worst aspect ratio.
pub fn squarify_rows(values: &[f64], area: Rect) -> Vec<RowSpec> {
    let n = values.len();
    let mut rows = Vec::new();
    let (mut x0, mut y0, x1, y1) = (area.x0, area.y0, area.x1, area.y1);
    let mut value: f64 = values.iter().sum();
    let mut i0 = 0usize;
    let mut i1 = 0usize;

    while i0 < n {
        let dx = x1 - x0;
        let dy = y1 - y0;

        // Zero-valued siblings ride along with the next non-zero one.
        let mut sum_value = values[i1];
        i1 += 1;
        while sum_value == 0.0 && i1 < n {
            sum_value = values[i1];
            i1 += 1;
        }
        let mut min_value = sum_value;
        let mut max_value = sum_value;

        let alpha = (dy / dx).max(dx / dy) / (value * PHI);
        let mut beta = sum_value * sum_value * alpha;
        let mut min_ratio = (max_value / beta).max(beta / min_value);

        while i1 < n {
            let v = values[i1];
            sum_value += v;
            min_value = min_value.min(v);
            max_value = max_value.max(v);
            beta = sum_value * sum_value * alpha;
            let ratio = (max_value / beta).max(beta / min_value);
            if ratio > min_ratio {
                sum_value -= v;
                break;
            }
            min_ratio = ratio;
            i1 += 1;
        }

        let dice = dx < dy;
        if dice {
            y0 = if value != 0.0 { y0 + dy * sum_value / value } else { y1 };
        } else {
            x0 = if value != 0.0 { x0 + dx * sum_value / value } else { x1 };
        }
        rows.push(RowSpec { len: i1 - i0, dice });
        value -= sum_value;
        i0 = i1;
    }
    rows
}

/// Places `values` into `area` following a row partition. Each row's
/// thickness is its share of the remaining value; members split the row's
/// length by weight.
pub fn place_rows(values: &[f64], rows: &[RowSpec], area: Rect) -> Vec<Rect> {
    let mut out = Vec::with_capacity(values.len());
    let (mut x0, mut y0, x1, y1) = (area.x0, area.y0, area.x1, area.y1);
    let mut value: f64 = values.iter().sum();
    let mut start = 0usize;

    for row in rows {
        let members = &values[start..start + row.len];
        let row_value: f64 = members.iter().sum();
        if row.dice {
            let y2 = if value != 0.0 { y0 + (y1 - y0) * row_value / value } else { y1 };
            dice(members, row_value, Rect::new(x0, y0, x1, y2), &mut out);
            y0 = y2;
        } else {
            let x2 = if value != 0.0 { x0 + (x1 - x0) * row_value / value } else { x1 };
            slice(members, row_value, Rect::new(x0, y0, x2, y1), &mut out);
            x0 = x2;
        }
        value -= row_value;
        start += row.len;
    }
    out
}

fn dice(members: &[f64], row_value: f64, band: Rect, out: &mut Vec<Rect>) {
    let k = if row_value != 0.0 { band.width() / row_value } else { 0.0 };
    let mut x = band.x0;
    for v in members {
        let next = x + v * k;
        out.push(Rect::new(x, band.y0, next, band.y1));
        x = next;
    }
}

fn slice(members: &[f64], row_value: f64, band: Rect, out: &mut Vec<Rect>) {
    let k = if row_value != 0.0 { band.height() / row_value } else { 0.0 };
    let mut y = band.y0;
    for v in members {
        let next = y + v * k;
        out.push(Rect::new(band.x0, y, band.x1, next));
        y = next;
    }
}

/// Convenience squarify over a flat list of weights.
pub fn squarify(values: &[f64], area: Rect) -> Vec<Rect> {
    place_rows(values, &squarify_rows(values, area), area)
}

/// Insets `r`. An axis squeezed past zero collapses to the midpoint of the
/// crossed edges, kept inside `r`.
fn inset(r: Rect, top: f64, left: f64, right: f64, bottom: f64) -> Rect {
    let (mut x0, mut x1) = (r.x0 + left, r.x1 - right);
    let (mut y0, mut y1) = (r.y0 + top, r.y1 - bottom);
    if x1 < x0 {
        x0 = ((x0 + x1) / 2.0).clamp(r.x0, r.x1);
        x1 = x0;
    }
    if y1 < y0 {
        y0 = ((y0 + y1) / 2.0).clamp(r.y0, r.y1);
        y1 = y0;
    }
    Rect::new(x0, y0, x1, y1)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum GroupKey {
    Root,
    Domain(String),
}

impl GroupKey {
    fn of(node: &Node) -> Self {
        match &node.kind {
            NodeKind::Domain { key, .. } => GroupKey::Domain(key.clone()),
            _ => GroupKey::Root,
        }
    }
}

#[derive(Debug, Clone)]
struct CachedRows {
    members: Vec<String>,
    rows: Vec<RowSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainBox {
    pub key: String,
    pub order_index: usize,
    pub weight: f64,
    pub rect: Rect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub bounds: Rect,
    pub domains: Vec<DomainBox>,
    pub leaves: Vec<LayoutLeaf>,
}

#[derive(Debug, Clone)]
pub struct Tiler {
    strategy: TileStrategy,
    group_padding: Sides,
    inner_padding: f64,
    cache: HashMap<GroupKey, CachedRows>,
}

impl Tiler {
    pub fn new(strategy: TileStrategy, group_padding: Sides, inner_padding: f64) -> Self {
        Self {
            strategy,
            group_padding,
            inner_padding,
            cache: HashMap::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.tiling, config.group_padding, config.inner_padding)
    }

    /// Drops remembered rows; the next pass squarifies from scratch.
    pub fn forget(&mut self) {
        self.cache.clear();
    }

    pub fn layout(&mut self, hierarchy: &Hierarchy, bounds: Rect) -> Result<Layout> {
        let mut rects = vec![Rect::default(); hierarchy.nodes.len()];
        rects[hierarchy.root.0] = bounds;
        let mut padding_stack = [0.0f64; 3];
        let mut touched = HashSet::new();
        let order = hierarchy.pre_order();

        for &id in &order {
            let node = hierarchy.get(id);
            let p = padding_stack[node.depth];
            let outer = inset(rects[id.0], p, p, p, p);
            rects[id.0] = outer;
            if node.children.is_empty() {
                continue;
            }

            let p = self.inner_padding / 2.0;
            padding_stack[node.depth + 1] = p;
            let g = self.group_padding;
            let inner = inset(outer, g.top - p, g.left - p, g.right - p, g.bottom - p);
            let key = GroupKey::of(node);
            self.tile(hierarchy, node, &key, inner, &mut rects);
            touched.insert(key);
        }
        if self.strategy == TileStrategy::Resquarify {
            self.cache.retain(|k, _| touched.contains(k));
        }

        for &id in &order {
            let rect = rects[id.0].round();
            if !rect.is_valid() {
                return Err(Error::InvalidGeometry {
                    node: hierarchy.get(id).key().to_string(),
                    rect,
                });
            }
            rects[id.0] = rect;
        }

        let domains = hierarchy
            .domains()
            .filter_map(|d| match &d.kind {
                NodeKind::Domain { key, order_index } => Some(DomainBox {
                    key: key.clone(),
                    order_index: *order_index,
                    weight: d.value,
                    rect: rects[d.id.0],
                }),
                _ => None,
            })
            .collect();
        let leaves = hierarchy
            .leaves()
            .filter_map(|n| {
                Some(LayoutLeaf {
                    identity: hierarchy.identity(n.id)?,
                    rect: rects[n.id.0],
                    weight: n.value,
                })
            })
            .collect();

        Ok(Layout {
            bounds: bounds.round(),
            domains,
            leaves,
        })
    }

    fn tile(&mut self, hierarchy: &Hierarchy, node: &Node, key: &GroupKey, area: Rect, rects: &mut [Rect]) {
        let children: Vec<&Node> = hierarchy.children(node.id).collect();
        let values: Vec<f64> = children.iter().map(|c| c.value).collect();

        let rows = match self.strategy {
            TileStrategy::Squarify => squarify_rows(&values, area),
            TileStrategy::Resquarify => {
                let reusable = self.cache.get(key).filter(|cached| {
                    cached.members.len() == children.len()
                        && cached.members.iter().zip(&children).all(|(m, c)| m == c.key())
                });
                match reusable {
                    Some(cached) => {
                        tracing::trace!(group = node.key(), rows = cached.rows.len(), "reusing rows");
                        cached.rows.clone()
                    }
                    None => {
                        let rows = squarify_rows(&values, area);
                        self.cache.insert(
                            key.clone(),
                            CachedRows {
                                members: children.iter().map(|c| c.key().to_string()).collect(),
                                rows: rows.clone(),
                            },
                        );
                        rows
                    }
                }
            }
        };

        for (child, rect) in children.iter().zip(place_rows(&values, &rows, area)) {
            rects[child.id.0] = rect;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Identity, Item};
    use crate::palette::PaletteStore;
    use crate::weight::SizeMode;
    use chrono::DateTime;

    fn item(domain: &str, package: &str, count: f64) -> Item {
        Item {
            domain: domain.into(),
            package: package.into(),
            file_count: Some(count),
            size: None,
            when: DateTime::parse_from_rfc3339("2022-03-01T00:00:00Z").unwrap(),
        }
    }

    fn hierarchy(slice: &[Item], store: &mut PaletteStore) -> Hierarchy {
        Hierarchy::build(slice, 0, &SizeMode::FileCount { floor: 1.0 }, store).unwrap()
    }

    fn leaf<'a>(layout: &'a Layout, domain: &str, package: &str) -> &'a LayoutLeaf {
        let id = Identity::new(domain, package);
        layout.leaves.iter().find(|l| l.identity == id).unwrap()
    }

    #[test]
    fn single_value_fills_area() {
        let rects = squarify(&[42.0], Rect::from_size(1920.0, 1080.0));
        assert_eq!(rects.len(), 1);
        assert!((rects[0].width() - 1920.0).abs() < 1e-9);
        assert!((rects[0].height() - 1080.0).abs() < 1e-9);
    }

    #[test]
    fn squarify_preserves_total_area() {
        let values = [400.0, 300.0, 200.0, 100.0];
        let rects = squarify(&values, Rect::from_size(50.0, 20.0));
        let total: f64 = rects.iter().map(Rect::area).sum();
        assert!((total - 1000.0).abs() < 1e-6);
        for (r, v) in rects.iter().zip(values) {
            assert!((r.area() - v).abs() < 1e-6, "{r:?} vs {v}");
        }
    }

    #[test]
    fn rows_run_along_the_short_side() {
        let rows = squarify_rows(&[1.0, 1.0, 1.0, 1.0], Rect::from_size(10.0, 100.0));
        assert!(rows[0].dice);
        assert_eq!(rows.iter().map(|r| r.len).sum::<usize>(), 4);
    }

    #[test]
    fn inset_collapses_instead_of_inverting() {
        let r = inset(Rect::new(0.0, 0.0, 10.0, 4.0), 5.0, 1.0, 1.0, 5.0);
        assert_eq!(r, Rect::new(1.0, 2.0, 9.0, 2.0));
        // a tall header on a short rect stays inside it
        let r = inset(Rect::new(0.0, 0.0, 10.0, 4.0), 19.5, 0.5, 0.5, 0.5);
        assert_eq!(r, Rect::new(0.5, 4.0, 9.5, 4.0));
    }

    #[test]
    fn unpadded_scenario_splits_by_weight() {
        let slice = vec![item("A", "pkg-one", 10.0), item("A", "pkg-two", 5.0), item("B", "pkg-three", 20.0)];
        let mut store = PaletteStore::default();
        let h = hierarchy(&slice, &mut store);
        let mut tiler = Tiler::new(TileStrategy::Squarify, Sides::ZERO, 0.0);
        let layout = tiler.layout(&h, Rect::from_size(100.0, 100.0)).unwrap();

        let area_of = |key: &str| layout.domains.iter().find(|d| d.key == key).unwrap().rect.area();
        assert!((area_of("B") / 10_000.0 - 20.0 / 35.0).abs() < 0.02);
        assert!((area_of("A") / 10_000.0 - 15.0 / 35.0).abs() < 0.02);

        let one = leaf(&layout, "A", "pkg-one").rect.area();
        let two = leaf(&layout, "A", "pkg-two").rect.area();
        assert!((one / (one + two) - 2.0 / 3.0).abs() < 0.02);
        assert!((two / (one + two) - 1.0 / 3.0).abs() < 0.02);
    }

    #[test]
    fn padded_leaves_stay_inside_their_domain() {
        let slice = vec![
            item("A", "a1", 50.0),
            item("A", "a2", 30.0),
            item("A", "a3", 10.0),
            item("B", "b1", 70.0),
            item("C", "c1", 20.0),
            item("C", "c2", 25.0),
        ];
        let mut store = PaletteStore::default();
        let h = hierarchy(&slice, &mut store);
        let config = Config::default();
        let mut tiler = Tiler::from_config(&config);
        let layout = tiler.layout(&h, Rect::new(20.0, 70.0, 1260.0, 780.0)).unwrap();

        for domain in &layout.domains {
            assert!(layout.bounds.contains(&domain.rect));
            // header row stays clear of packages
            for l in layout.leaves.iter().filter(|l| l.domain() == domain.key) {
                assert!(domain.rect.contains(&l.rect), "{:?} outside {:?}", l.rect, domain.rect);
                assert!(l.rect.y0 >= domain.rect.y0 + config.group_padding.top - 1.0);
            }
        }
        for (i, a) in layout.leaves.iter().enumerate() {
            for b in &layout.leaves[i + 1..] {
                assert_eq!(a.rect.intersection_area(&b.rect), 0.0);
            }
        }
    }

    #[test]
    fn resquarify_keeps_rows_when_members_are_unchanged() {
        let area = Rect::from_size(400.0, 300.0);
        let before = vec![item("A", "a", 10.0), item("A", "b", 10.0), item("A", "c", 10.0), item("A", "d", 10.0)];
        let after = vec![item("A", "a", 30.0), item("A", "b", 5.0), item("A", "c", 5.0), item("A", "d", 10.0)];

        let mut store = PaletteStore::default();
        let mut tiler = Tiler::new(TileStrategy::Resquarify, Sides::ZERO, 0.0);
        tiler.layout(&hierarchy(&before, &mut store), area).unwrap();
        let reused = tiler.layout(&hierarchy(&after, &mut store), area).unwrap();

        let cached = &tiler.cache[&GroupKey::Domain("A".into())];
        let fresh_values = [30.0, 5.0, 5.0, 10.0];
        let inner = reused.domains[0].rect;
        assert_eq!(cached.rows, squarify_rows(&[10.0; 4], inner));
        assert_ne!(cached.rows, squarify_rows(&fresh_values, inner));
    }

    #[test]
    fn resquarify_recomputes_when_members_change() {
        let area = Rect::from_size(400.0, 300.0);
        let mut store = PaletteStore::default();
        let mut tiler = Tiler::new(TileStrategy::Resquarify, Sides::ZERO, 0.0);
        tiler.layout(&hierarchy(&[item("A", "a", 10.0), item("A", "b", 10.0)], &mut store), area).unwrap();
        tiler.layout(&hierarchy(&[item("A", "a", 10.0), item("A", "c", 10.0)], &mut store), area).unwrap();
        let cached = &tiler.cache[&GroupKey::Domain("A".into())];
        assert_eq!(cached.members, vec!["a".to_string(), "c".to_string()]);
    }

    #[test]
    fn cache_drops_domains_that_disappear() {
        let area = Rect::from_size(400.0, 300.0);
        let mut store = PaletteStore::default();
        let mut tiler = Tiler::new(TileStrategy::Resquarify, Sides::ZERO, 0.0);
        tiler.layout(&hierarchy(&[item("A", "a", 1.0), item("B", "b", 1.0)], &mut store), area).unwrap();
        tiler.layout(&hierarchy(&[item("A", "a", 1.0)], &mut store), area).unwrap();
        assert!(!tiler.cache.contains_key(&GroupKey::Domain("B".into())));
        assert!(tiler.cache.contains_key(&GroupKey::Root));
    }

    #[test]
    fn forget_drops_cached_rows() {
        let area = Rect::from_size(400.0, 300.0);
        let mut store = PaletteStore::default();
        let mut tiler = Tiler::new(TileStrategy::Resquarify, Sides::ZERO, 0.0);
        tiler.layout(&hierarchy(&[item("A", "a", 1.0)], &mut store), area).unwrap();
        assert!(!tiler.cache.is_empty());
        tiler.forget();
        assert!(tiler.cache.is_empty());
    }

    #[test]
    fn layout_is_deterministic() {
        let slice = vec![item("A", "x", 3.0), item("B", "y", 9.0), item("B", "z", 4.0)];
        let mut store = PaletteStore::default();
        let h = hierarchy(&slice, &mut store);
        let area = Rect::from_size(640.0, 480.0);
        for strategy in [TileStrategy::Squarify, TileStrategy::Resquarify] {
            let mut tiler = Tiler::new(strategy, Config::default().group_padding, 1.0);
            let first = tiler.layout(&h, area).unwrap();
            let second = tiler.layout(&h, area).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn coordinates_are_rounded() {
        let slice = vec![item("A", "x", 1.0), item("A", "y", 2.0), item("A", "z", 4.0)];
        let mut store = PaletteStore::default();
        let h = hierarchy(&slice, &mut store);
        let mut tiler = Tiler::new(TileStrategy::Squarify, Sides::ZERO, 0.0);
        let layout = tiler.layout(&h, Rect::from_size(333.0, 111.0)).unwrap();
        for l in &layout.leaves {
            assert_eq!(l.rect, l.rect.round());
        }
    }
}
