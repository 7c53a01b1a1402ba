use crate::{
    Engine, GroupId, Grouping, Item, Layout, LayoutConfig, LayoutError, Point, median,
    nearest_neighbor_distances,
};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// `clusters` clusters of `per` items.
///
/// Every item is `s + e_c + t * e_i`: a shared component `s` (0.5), a
/// cluster axis `e_c`, and a private axis `e_i`. With `t^2 = 0.125 / 0.9`
/// the cosine distance is exactly 0.1 inside a cluster and 0.82 across.
/// Hints sit on a regular polygon per cluster, so scatter is symmetric.
fn clustered_corpus(clusters: usize, per: usize) -> (Vec<Item>, Grouping) {
    let n = clusters * per;
    let dim = 1 + clusters + n;
    let t = (0.125f64 / 0.9).sqrt() as f32;

    let mut items = Vec::with_capacity(n);
    let mut grouping = Grouping::default();
    for c in 0..clusters {
        grouping
            .names
            .insert(GroupId(c as u32), format!("topic {c}"));
        for j in 0..per {
            let i = c * per + j;
            let mut emb = vec![0.0f32; dim];
            emb[0] = 0.5;
            emb[1 + c] = 1.0;
            emb[1 + clusters + i] = t;
            let theta = std::f64::consts::TAU * j as f64 / per as f64;
            let id = format!("item-{i:02}");
            grouping.assignment.insert(id.clone(), GroupId(c as u32));
            items.push(Item::new(id, emb, Point::new(theta.cos(), theta.sin())));
        }
    }
    (items, grouping)
}

fn unit(deg: f64) -> Vec<f32> {
    let r = deg.to_radians();
    vec![r.cos() as f32, r.sin() as f32]
}

fn assign(grouping: &mut Grouping, id: &str, group: u32, name: &str) {
    grouping.assignment.insert(id.to_string(), GroupId(group));
    grouping.names.insert(GroupId(group), name.to_string());
}

fn assert_finite(layout: &Layout) {
    for p in &layout.items {
        assert!(p.position.is_finite(), "item {} not finite", p.id);
    }
    for g in &layout.groups {
        assert!(g.centroid.is_finite() && g.anchor.is_finite(), "group {} not finite", g.id);
        assert!(g.radius.is_finite());
    }
}

// ---------------------------------------------------------------------------
// End-to-end
// ---------------------------------------------------------------------------

#[test]
fn test_four_clean_clusters() {
    let (items, grouping) = clustered_corpus(4, 10);
    let cfg = LayoutConfig::default().with_group_bounds(2, 6);
    let scale = cfg.layout_scale;
    let layout = Engine::new(cfg).unwrap().layout(&items, &grouping).unwrap();

    assert!(layout.merges.is_empty(), "4 <= 6, nothing to merge");
    assert!(!layout.insufficient);
    assert_eq!(layout.groups.len(), 4);
    assert_eq!(layout.items.len(), 40);
    assert_finite(&layout);

    // Centroids separated roughly in proportion to 0.82.
    for a in &layout.groups {
        for b in &layout.groups {
            if a.id >= b.id {
                continue;
            }
            let ratio = a.centroid.distance(b.centroid) / (0.82 * scale);
            assert!((0.5..1.6).contains(&ratio), "{} - {}: ratio {ratio}", a.id, b.id);
        }
    }

    let centroids: Vec<Point> = layout.groups.iter().map(|g| g.centroid).collect();
    let spacing = median(&nearest_neighbor_distances(&centroids)).unwrap();
    for g in &layout.groups {
        let expected = 0.35 * spacing * (1.0 + g.variance * 2.0);
        assert!((g.radius - expected).abs() < 1e-9, "group {} radius {}", g.id, g.radius);

        // Every member is equally far from the mean embedding, so all of
        // them sit on the radius.
        for id in &g.members {
            let p = layout.item(id).unwrap();
            let r = p.position.distance(g.centroid);
            assert!((r - g.radius).abs() < 1e-4 * g.radius, "{id}: {r} vs {}", g.radius);
        }

        // Symmetric hints: anchor stays on the centroid.
        assert!(g.anchor.distance(g.centroid) < 1e-6 * scale, "group {}", g.id);
    }
}

#[test]
fn test_scatter_is_fraction_of_nearest_spacing_without_amplifier() {
    let (items, grouping) = clustered_corpus(4, 10);
    let cfg = LayoutConfig::default()
        .with_group_bounds(2, 6)
        .with_variance_amplifier(0.0);
    let layout = Engine::new(cfg).unwrap().layout(&items, &grouping).unwrap();

    let centroids: Vec<Point> = layout.groups.iter().map(|g| g.centroid).collect();
    let nearest = nearest_neighbor_distances(&centroids);
    for (g, near) in layout.groups.iter().zip(&nearest) {
        let ratio = g.radius / near;
        assert!((0.25..0.5).contains(&ratio), "group {}: radius/nearest {ratio}", g.id);
    }
}

#[test]
fn test_repeated_runs_are_identical() {
    let (items, grouping) = clustered_corpus(5, 6);
    let engine = Engine::new(LayoutConfig::default().with_group_bounds(2, 3)).unwrap();
    let a = engine.layout(&items, &grouping).unwrap();
    let b = engine.layout(&items, &grouping).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.merges.len(), 2);
}

// ---------------------------------------------------------------------------
// Consolidation through the engine
// ---------------------------------------------------------------------------

#[test]
fn test_nearest_pair_merges_first() {
    // d(A,B) < d(A,C) < d(B,C); B is the larger of A/B.
    let mut grouping = Grouping::default();
    let mut items = Vec::new();
    for (id, deg, group, name) in [
        ("a1", 0.0, 0, "A"),
        ("a2", 0.0, 0, "A"),
        ("b1", 20.0, 1, "B"),
        ("b2", 20.0, 1, "B"),
        ("b3", 20.0, 1, "B"),
        ("c1", -50.0, 2, "C"),
        ("c2", -50.0, 2, "C"),
    ] {
        items.push(Item::new(id, unit(deg), Point::new(deg, 1.0)));
        assign(&mut grouping, id, group, name);
    }

    let cfg = LayoutConfig::default().with_group_bounds(1, 2);
    let layout = Engine::new(cfg).unwrap().layout(&items, &grouping).unwrap();

    assert_eq!(layout.merges.len(), 1);
    assert_eq!(layout.merges[0].absorbed, GroupId(0));
    assert_eq!(layout.merges[0].into, GroupId(1));
    assert_eq!(layout.names.len(), 2);
    assert_eq!(layout.names[&GroupId(1)], "B");
    assert_eq!(layout.names[&GroupId(2)], "C");
    assert!(!layout.names.contains_key(&GroupId(0)));

    let regrouped = layout.grouping();
    assert_eq!(regrouped.assignment["a1"], GroupId(1));
    assert_eq!(regrouped.assignment["c2"], GroupId(2));
    assert_finite(&layout);
}

#[test]
fn test_group_count_bounded_and_items_partitioned() {
    let (items, grouping) = clustered_corpus(10, 3);
    let cfg = LayoutConfig::default().with_group_bounds(2, 4);
    let layout = Engine::new(cfg).unwrap().layout(&items, &grouping).unwrap();

    assert_eq!(layout.groups.len(), 4);
    assert_eq!(layout.merges.len(), 6);

    let mut seen: Vec<&str> = layout
        .groups
        .iter()
        .flat_map(|g| g.members.iter().map(|s| s.as_str()))
        .collect();
    seen.sort();
    let mut expected: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
    expected.sort();
    assert_eq!(seen, expected);

    for p in &layout.items {
        let g = layout.group(p.group).expect("item points at a surviving group");
        assert!(g.members.contains(&p.id));
    }
    assert_finite(&layout);
}

#[test]
fn test_offline_relayout_reproduces_positions() {
    let (items, grouping) = clustered_corpus(6, 4);
    let engine = Engine::new(LayoutConfig::default().with_group_bounds(2, 4)).unwrap();
    let first = engine.layout(&items, &grouping).unwrap();

    // Feeding the consolidated grouping back in skips every merge.
    let second = engine.layout(&items, &first.grouping()).unwrap();
    assert!(second.merges.is_empty());
    assert_eq!(second.groups.len(), first.groups.len());
    for (a, b) in first.items.iter().zip(&second.items) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.group, b.group);
        assert!(a.position.distance(b.position) < 1e-9, "{} moved", a.id);
    }
    for (a, b) in first.groups.iter().zip(&second.groups) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.members, b.members);
        assert!(a.centroid.distance(b.centroid) < 1e-3);
    }
}

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

#[test]
fn test_lopsided_hints_move_anchor_off_centroid() {
    let mut grouping = Grouping::default();
    let mut items = Vec::new();
    // Group 0: two hints at the origin and one at (3, 0). The hint centroid
    // is (1, 0), so two members go left and one goes right.
    for (id, hint) in [("l1", (0.0, 0.0)), ("l2", (0.0, 0.0)), ("r1", (3.0, 0.0))] {
        items.push(Item::new(id, unit(0.0), Point::new(hint.0, hint.1)));
        assign(&mut grouping, id, 0, "lopsided");
    }
    for (id, hint) in [("s1", (1.0, 0.0)), ("s2", (-1.0, 0.0))] {
        items.push(Item::new(id, unit(90.0), Point::new(hint.0, hint.1)));
        assign(&mut grouping, id, 1, "symmetric");
    }

    let layout = Engine::new(LayoutConfig::default())
        .unwrap()
        .layout(&items, &grouping)
        .unwrap();

    let lop = layout.group(GroupId(0)).unwrap();
    let shift = lop.anchor.distance(lop.centroid);
    assert!((shift - lop.radius / 3.0).abs() < 1e-9, "shift {shift}, radius {}", lop.radius);
    assert!(lop.anchor.x < lop.centroid.x);

    let sym = layout.group(GroupId(1)).unwrap();
    assert!(sym.anchor.distance(sym.centroid) < 1e-9);
}

// ---------------------------------------------------------------------------
// Degenerate geometry
// ---------------------------------------------------------------------------

#[test]
fn test_single_group_at_origin() {
    let mut grouping = Grouping::default();
    let items: Vec<Item> = (0..3)
        .map(|i| Item::new(format!("x{i}"), vec![1.0, 0.0, 0.0], Point::new(i as f64, 0.0)))
        .collect();
    for it in &items {
        assign(&mut grouping, &it.id, 7, "everything");
    }

    let engine = Engine::new(LayoutConfig::default()).unwrap();
    assert!(engine.needs_regroup(&grouping));
    let layout = engine.layout(&items, &grouping).unwrap();

    assert!(layout.insufficient);
    assert_eq!(layout.groups.len(), 1);
    let g = &layout.groups[0];
    assert_eq!(g.centroid, Point::ORIGIN);
    // No neighbour: the radius falls back to F * layout_scale.
    assert!((g.radius - 0.35 * 10.0).abs() < 1e-12);
    assert_eq!(g.variance, 0.0);
    assert_finite(&layout);
}

#[test]
fn test_coincident_centroids_keep_clouds_open() {
    let mut grouping = Grouping::default();
    let mut items = Vec::new();
    for (id, deg, group, hint) in [
        ("a1", 0.0, 0, (1.0, 0.0)),
        ("a2", 0.0, 0, (-1.0, 0.0)),
        ("b1", 0.0, 1, (0.0, 1.0)),
        ("b2", 0.0, 1, (0.0, -1.0)),
        ("c1", 90.0, 2, (1.0, 0.0)),
        ("c2", 90.0, 2, (-1.0, 0.0)),
    ] {
        items.push(Item::new(id, unit(deg), Point::new(hint.0, hint.1)));
        assign(&mut grouping, id, group, &format!("g{group}"));
    }

    let layout = Engine::new(LayoutConfig::default())
        .unwrap()
        .layout(&items, &grouping)
        .unwrap();
    assert_finite(&layout);

    // Two of three centroids share a spot, so the median spacing is zero.
    let a = layout.group(GroupId(0)).unwrap();
    let b = layout.group(GroupId(1)).unwrap();
    assert!(a.centroid.distance(b.centroid) < 1e-9);
    for g in &layout.groups {
        assert!(g.radius >= 0.35 * 10.0 - 1e-9, "group {} collapsed", g.id);
    }
    let c1 = layout.item("c1").unwrap().position;
    let c = layout.group(GroupId(2)).unwrap().centroid;
    assert!(c1.distance(c) > 1.0);
}

#[test]
fn test_coinciding_hints_use_hashed_directions() {
    let mut grouping = Grouping::default();
    let mut items = Vec::new();
    for (id, deg, group) in [("p", 0.0, 0), ("q", 5.0, 0), ("r", 90.0, 1), ("s", 95.0, 1)] {
        items.push(Item::new(id, unit(deg), Point::new(2.0, 2.0)));
        assign(&mut grouping, id, group, &format!("g{group}"));
    }
    let engine = Engine::new(LayoutConfig::default()).unwrap();
    let a = engine.layout(&items, &grouping).unwrap();
    let b = engine.layout(&items, &grouping).unwrap();
    assert_eq!(a, b);
    assert_finite(&a);

    let g = a.group(GroupId(0)).unwrap();
    let p = a.item("p").unwrap().position;
    let q = a.item("q").unwrap().position;
    assert!(p.distance(q) > 0.0, "distinct ids should get distinct directions");
    assert!((p.distance(g.centroid) - g.radius).abs() < 1e-3 * g.radius);
}

#[test]
fn test_zero_embedding_and_singletons_stay_finite() {
    let mut grouping = Grouping::default();
    let items = vec![
        Item::new("zero", vec![0.0, 0.0], Point::new(0.0, 0.0)),
        Item::new("one", vec![1.0, 0.0], Point::new(0.0, 0.0)),
        Item::new("two", vec![0.0, 1.0], Point::new(1.0, 1.0)),
        Item::new("three", vec![-1.0, 0.0], Point::new(0.0, 0.0)),
    ];
    assign(&mut grouping, "zero", 0, "z");
    assign(&mut grouping, "one", 1, "o");
    assign(&mut grouping, "two", 1, "o");
    assign(&mut grouping, "three", 2, "t");

    let layout = Engine::new(LayoutConfig::default().with_group_bounds(1, 12))
        .unwrap()
        .layout(&items, &grouping)
        .unwrap();
    assert_eq!(layout.groups.len(), 3);
    assert_finite(&layout);
    for g in &layout.groups {
        assert!(g.radius > 0.0);
    }
}

// ---------------------------------------------------------------------------
// Boundary errors
// ---------------------------------------------------------------------------

#[test]
fn test_malformed_grouping_is_fatal() {
    let items = vec![Item::new("a", vec![1.0], Point::ORIGIN)];
    let mut grouping = Grouping::default();
    assign(&mut grouping, "a", 0, "g");
    assign(&mut grouping, "stranger", 0, "g");

    let err = Engine::new(LayoutConfig::default())
        .unwrap()
        .layout(&items, &grouping)
        .unwrap_err();
    assert!(matches!(err, LayoutError::UnknownItem(id) if id == "stranger"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let err = Engine::new(LayoutConfig::default().with_group_bounds(4, 2)).unwrap_err();
    assert!(matches!(err, LayoutError::InvalidConfig(_)));
}

#[test]
fn test_layout_serializes_to_json() {
    let (items, grouping) = clustered_corpus(2, 2);
    let layout = Engine::new(LayoutConfig::default())
        .unwrap()
        .layout(&items, &grouping)
        .unwrap();
    let json = serde_json::to_value(&layout).unwrap();
    assert_eq!(json["items"].as_array().unwrap().len(), 4);
    assert_eq!(json["names"]["0"], "topic 0");
    let back: Layout = serde_json::from_value(json).unwrap();
    assert_eq!(back, layout);
}
