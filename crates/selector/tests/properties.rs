use std::collections::HashSet;
use std::f32::consts::PI;

use glam::{Affine3A, Vec3};
use proptest::prelude::*;
use selector::{Cursor, Label, MeshData, PatchSet, TriangleId, TriangleSelector};

fn octahedron() -> TriangleSelector {
    let r = 2.0;
    let mesh = MeshData::new(
        vec![
            Vec3::new(r, 0.0, 0.0),
            Vec3::new(-r, 0.0, 0.0),
            Vec3::new(0.0, r, 0.0),
            Vec3::new(0.0, -r, 0.0),
            Vec3::new(0.0, 0.0, r),
            Vec3::new(0.0, 0.0, -r),
        ],
        vec![
            [0, 2, 4],
            [2, 1, 4],
            [1, 3, 4],
            [3, 0, 4],
            [2, 0, 5],
            [1, 2, 5],
            [3, 1, 5],
            [0, 3, 5],
        ],
    );
    TriangleSelector::from_mesh(&mesh).unwrap()
}

#[derive(Debug, Clone)]
struct Dab {
    center: Vec3,
    radius: f32,
    label: u8,
}

fn dab() -> impl Strategy<Value = Dab> {
    (
        (-2.5f32..2.5, -2.5f32..2.5, -2.5f32..2.5),
        0.3f32..1.5,
        0u8..=4,
    )
        .prop_map(|((x, y, z), radius, label)| Dab {
            center: Vec3::new(x, y, z),
            radius,
            label,
        })
}

fn apply(selector: &mut TriangleSelector, dab: &Dab) -> usize {
    let cursor = Cursor::sphere(dab.center, dab.radius, Affine3A::IDENTITY).unwrap();
    let label = Label::new(dab.label).unwrap();
    selector.paint(&cursor, label, dab.radius * 0.3)
}

fn painted(dabs: &[Dab]) -> TriangleSelector {
    let mut selector = octahedron();
    for dab in dabs {
        apply(&mut selector, dab);
    }
    selector
}

#[test]
fn test_full_angle_fill_covers_closed_mesh() {
    let mut selector = octahedron();
    assert_eq!(selector.seed_fill_select(TriangleId(0), PI, None), 8);

    let mut selector = painted(&[Dab {
        center: Vec3::new(2.0, 0.0, 0.0),
        radius: 0.8,
        label: 0,
    }]);
    let leaves = selector.leaf_count();
    assert!(leaves > 8);
    let seed = selector.leaf_ids()[0];
    assert_eq!(selector.bucket_fill_select(seed, Some(PI), true, None), leaves);
    selector.seed_fill_apply(Label::ENFORCER);
    assert!((selector.label_area(Label::ENFORCER) - selector.mesh_area()).abs() < 1e-3);
}

#[test]
fn test_narrow_fill_stays_on_one_face() {
    let mut selector = octahedron();
    // Adjacent octahedron faces meet at about 70.5 degrees
    assert_eq!(selector.seed_fill_select(TriangleId(0), 1.2, None), 1);
    assert_eq!(selector.seed_fill_select(TriangleId(0), 1.24, None), 8);
}

proptest! {
    #[test]
    fn proptest_leaf_area_is_preserved(dabs in prop::collection::vec(dab(), 1..5)) {
        let selector = painted(&dabs);
        prop_assert!(selector.validate().is_ok());

        let leaf_area: f32 = selector
            .leaf_ids()
            .into_iter()
            .map(|leaf| selector.area(leaf))
            .sum();
        let mesh_area = selector.mesh_area();
        prop_assert!((leaf_area - mesh_area).abs() <= mesh_area * 1e-4);
    }

    #[test]
    fn proptest_touching_is_symmetric(dabs in prop::collection::vec(dab(), 1..4)) {
        let selector = painted(&dabs);
        for leaf in selector.leaf_ids() {
            for other in selector.touching_triangles(leaf) {
                prop_assert!(selector.triangle(other).unwrap().is_leaf());
                prop_assert!(selector.touching_triangles(other).contains(&leaf));
            }
        }
    }

    #[test]
    fn proptest_snapshot_round_trip(dabs in prop::collection::vec(dab(), 1..4)) {
        let source = painted(&dabs);
        let snapshot = source.snapshot();

        let mut target = octahedron();
        target.restore(&snapshot).unwrap();
        prop_assert_eq!(target.snapshot(), snapshot.clone());
        for leaf in source.leaf_ids() {
            let p = source.centroid(leaf);
            prop_assert_eq!(target.label_of_point(p), source.label_of_point(p));
        }

        let decoded = selector::SelectorSnapshot::from_bytes(&snapshot.to_bytes()).unwrap();
        prop_assert_eq!(decoded, snapshot);
    }

    #[test]
    fn proptest_painting_is_idempotent(setup in prop::collection::vec(dab(), 0..3), repeat in dab()) {
        let mut selector = painted(&setup);
        apply(&mut selector, &repeat);
        let once = selector.snapshot();
        prop_assert_eq!(apply(&mut selector, &repeat), 0);
        prop_assert_eq!(selector.snapshot(), once);
    }

    #[test]
    fn proptest_fill_steps_respect_angle(
        dabs in prop::collection::vec(dab(), 0..3),
        angle in 0.0f32..PI,
        seed_pick in any::<prop::sample::Index>(),
    ) {
        let mut selector = painted(&dabs);
        let leaves = selector.leaf_ids();
        let seed = leaves[seed_pick.index(leaves.len())];
        selector.seed_fill_select(seed, angle, None);

        let selected: HashSet<TriangleId> = selector.seed_fill_selection().into_iter().collect();
        prop_assert!(selected.contains(&seed));
        let limit = angle.cos() - 1e-4;
        for &leaf in &selected {
            if leaf == seed {
                continue;
            }
            let normal = selector.facet_normal(leaf);
            let reached = selector
                .touching_triangles(leaf)
                .into_iter()
                .any(|n| selected.contains(&n) && selector.facet_normal(n).dot(normal) >= limit);
            prop_assert!(reached, "{:?} joined without an admissible step", leaf);
        }
    }

    #[test]
    fn proptest_gap_fill_is_monotonic(
        dabs in prop::collection::vec(dab(), 1..4),
        low in 0.0f32..5.0,
        extra in 0.0f32..5.0,
    ) {
        let selector = painted(&dabs);
        let high = low + extra;
        let small = PatchSet::build(&selector, low);
        let large = PatchSet::build(&selector, high);
        prop_assert_eq!(small.len(), large.len());
        for index in 0..small.len() {
            if small.is_fragment(index) {
                prop_assert!(large.is_fragment(index));
            }
        }
        prop_assert!(small.absorbed_triangle_count() <= large.absorbed_triangle_count());
    }
}
