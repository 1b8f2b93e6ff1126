//! Same-label patches and gap-fill reclassification.
//!
//! A patch is a maximal connected set of leaves sharing one label. Patches
//! smaller than the gap area that border another label are fragments; they
//! take the label of their largest non-fragment neighbor when rendered, and
//! only [`PatchSet::finalize`] writes that label back into the selector.

use std::collections::{BTreeSet, HashMap, VecDeque};

use tracing::{debug, error, warn};

use crate::constants::GAP_AREA_CEILING;
use crate::events::SelectorEvent;
use crate::selector::TriangleSelector;
use crate::types::{Label, TriangleId};

/// Connected same-label region of leaves
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    pub label: Label,
    /// Member leaves in breadth-first order from the lowest id
    pub triangles: Vec<TriangleId>,
    /// Other labels touching the patch boundary
    pub neighbor_labels: BTreeSet<Label>,
    /// Indices of touching patches
    pub neighbor_patches: BTreeSet<usize>,
    /// Surface area; stops accumulating once it passes the area ceiling
    pub area: f32,
}

/// Partition of a selector's leaves into patches
#[derive(Debug, Clone)]
pub struct PatchSet {
    patches: Vec<Patch>,
    effective: Vec<Label>,
    fragment: Vec<bool>,
    patch_of: HashMap<TriangleId, usize>,
    gap_area: f32,
    revision: u64,
    generation: u32,
}

impl PatchSet {
    /// Build patches with the default area ceiling
    pub fn build(selector: &TriangleSelector, gap_area: f32) -> Self {
        Self::build_with_ceiling(selector, gap_area, GAP_AREA_CEILING)
    }

    /// Build patches, accumulating each patch area only up to `area_ceiling`
    /// (raised to `gap_area` when lower so fragments are still detected)
    pub fn build_with_ceiling(selector: &TriangleSelector, gap_area: f32, area_ceiling: f32) -> Self {
        let gap_area = if gap_area.is_finite() { gap_area.max(0.0) } else { 0.0 };
        let ceiling = area_ceiling.max(gap_area);

        let leaves = selector.leaf_ids();
        let (patches, patch_of) = match collect_patches(selector, &leaves, ceiling) {
            Ok(collected) => collected,
            Err(message) => {
                error!("Patch bookkeeping mismatch ({}); treating mesh as unpainted", message);
                debug_assert!(false, "patch bookkeeping mismatch: {message}");
                unpainted_fallback(selector, &leaves, ceiling)
            }
        };

        let fragment: Vec<bool> = patches
            .iter()
            .map(|p| p.area < gap_area && !p.neighbor_labels.is_empty())
            .collect();
        let effective = (0..patches.len())
            .map(|i| effective_label(&patches, &fragment, i))
            .collect();

        let set = Self {
            patches,
            effective,
            fragment,
            patch_of,
            gap_area,
            revision: selector.revision(),
            generation: selector.generation(),
        };
        debug!(
            "PatchSet built: {} patches, {} fragments, gap area {}",
            set.patches.len(),
            set.fragment_count(),
            gap_area
        );
        set
    }

    pub fn patches(&self) -> &[Patch] {
        &self.patches
    }

    pub fn patch(&self, index: usize) -> Option<&Patch> {
        self.patches.get(index)
    }

    pub fn len(&self) -> usize {
        self.patches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    pub fn gap_area(&self) -> f32 {
        self.gap_area
    }

    /// Selector revision this set was built from
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether the patch is absorbed by a neighbor under the gap area
    pub fn is_fragment(&self, index: usize) -> bool {
        self.fragment.get(index).copied().unwrap_or(false)
    }

    /// Label the patch is displayed with after gap fill
    pub fn effective_label(&self, index: usize) -> Option<Label> {
        self.effective.get(index).copied()
    }

    /// Index of the patch containing a leaf
    pub fn patch_of(&self, triangle: TriangleId) -> Option<usize> {
        self.patch_of.get(&triangle).copied()
    }

    pub fn effective_label_of(&self, triangle: TriangleId) -> Option<Label> {
        self.patch_of(triangle)
            .and_then(|index| self.effective_label(index))
    }

    pub fn fragment_count(&self) -> usize {
        self.fragment.iter().filter(|&&f| f).count()
    }

    /// Leaves whose effective label differs from their literal label
    pub fn absorbed_triangle_count(&self) -> usize {
        self.patches
            .iter()
            .enumerate()
            .filter(|&(i, _)| self.fragment[i])
            .map(|(_, p)| p.triangles.len())
            .sum()
    }

    /// Whether the selector changed since this set was built
    pub fn is_stale(&self, selector: &TriangleSelector) -> bool {
        self.revision != selector.revision() || self.generation != selector.generation()
    }

    /// Write effective labels of fragments back into the selector.
    ///
    /// Returns the number of leaves relabeled; a stale set changes nothing.
    pub fn finalize(&self, selector: &mut TriangleSelector) -> usize {
        if self.is_stale(selector) {
            warn!(
                "PatchSet finalize ignored: built at revision {}, selector at {}",
                self.revision,
                selector.revision()
            );
            return 0;
        }

        let mut changed = 0;
        for (index, patch) in self.patches.iter().enumerate() {
            if !self.fragment[index] {
                continue;
            }
            let label = self.effective[index];
            for &triangle in &patch.triangles {
                changed += usize::from(selector.set_leaf_label(triangle, label));
            }
        }

        if changed > 0 {
            selector.touch();
            selector.emit(SelectorEvent::LabelsChanged {
                revision: selector.revision(),
                changed,
            });
        }
        debug!("PatchSet finalize: {} leaves relabeled", changed);
        changed
    }
}

type Collected = (Vec<Patch>, HashMap<TriangleId, usize>);

fn collect_patches(
    selector: &TriangleSelector,
    leaves: &[TriangleId],
    ceiling: f32,
) -> Result<Collected, String> {
    let label_of = |id: TriangleId| selector.triangle(id).map(|tri| tri.label);

    let mut patches: Vec<Patch> = Vec::new();
    let mut patch_of: HashMap<TriangleId, usize> = HashMap::with_capacity(leaves.len());

    for &start in leaves {
        if patch_of.contains_key(&start) {
            continue;
        }
        let label = label_of(start).ok_or_else(|| format!("invalid leaf {start:?}"))?;
        let index = patches.len();
        let mut patch = Patch {
            label,
            triangles: Vec::new(),
            neighbor_labels: BTreeSet::new(),
            neighbor_patches: BTreeSet::new(),
            area: 0.0,
        };

        patch_of.insert(start, index);
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            patch.triangles.push(current);
            if patch.area < ceiling {
                patch.area += selector.area(current);
            }
            for next in selector.touching_triangles(current) {
                if label_of(next) == Some(label) && !patch_of.contains_key(&next) {
                    patch_of.insert(next, index);
                    queue.push_back(next);
                }
            }
        }
        patches.push(patch);
    }

    let member_count: usize = patches.iter().map(|p| p.triangles.len()).sum();
    if member_count != leaves.len() {
        return Err(format!("{member_count} members for {} leaves", leaves.len()));
    }

    for index in 0..patches.len() {
        let mut neighbor_patches = BTreeSet::new();
        for &member in &patches[index].triangles {
            for next in selector.touching_triangles(member) {
                let other = *patch_of
                    .get(&next)
                    .ok_or_else(|| format!("{next:?} touches {member:?} but has no patch"))?;
                if other != index {
                    neighbor_patches.insert(other);
                }
            }
        }
        let neighbor_labels = neighbor_patches
            .iter()
            .map(|&other| patches[other].label)
            .filter(|&label| label != patches[index].label)
            .collect();
        patches[index].neighbor_patches = neighbor_patches;
        patches[index].neighbor_labels = neighbor_labels;
    }

    Ok((patches, patch_of))
}

fn unpainted_fallback(selector: &TriangleSelector, leaves: &[TriangleId], ceiling: f32) -> Collected {
    let area = leaves
        .iter()
        .map(|&leaf| selector.area(leaf))
        .sum::<f32>()
        .min(ceiling);
    let patch = Patch {
        label: Label::NONE,
        triangles: leaves.to_vec(),
        neighbor_labels: BTreeSet::new(),
        neighbor_patches: BTreeSet::new(),
        area,
    };
    let patch_of = leaves.iter().map(|&leaf| (leaf, 0)).collect();
    (vec![patch], patch_of)
}

/// Largest touching non-fragment patch wins; ties go to the lower label,
/// then the lower patch index. When every neighbor is itself a fragment,
/// only neighbors strictly larger than the patch are candidates, so two
/// fragments never trade labels.
fn effective_label(patches: &[Patch], fragment: &[bool], index: usize) -> Label {
    let patch = &patches[index];
    if !fragment[index] {
        return patch.label;
    }

    let pick = |candidates: &mut dyn Iterator<Item = usize>| {
        candidates.min_by(|&a, &b| {
            patches[b]
                .area
                .total_cmp(&patches[a].area)
                .then(patches[a].label.cmp(&patches[b].label))
                .then(a.cmp(&b))
        })
    };

    let neighbors = &patch.neighbor_patches;
    pick(&mut neighbors.iter().copied().filter(|&n| !fragment[n]))
        .or_else(|| {
            pick(
                &mut neighbors
                    .iter()
                    .copied()
                    .filter(|&n| patches[n].area > patch.area),
            )
        })
        .map(|winner| patches[winner].label)
        .unwrap_or(patch.label)
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::types::MeshData;

    /// A 10 x 10 square (facets 0, 1) next to a 10 x 0.2 strip (facets 2, 3)
    fn square_and_strip() -> TriangleSelector {
        let mesh = MeshData::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(10.0, 0.0, 0.0),
                Vec3::new(10.0, 10.0, 0.0),
                Vec3::new(0.0, 10.0, 0.0),
                Vec3::new(10.0, 10.2, 0.0),
                Vec3::new(0.0, 10.2, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3], [3, 2, 4], [3, 4, 5]],
        );
        TriangleSelector::from_mesh(&mesh).unwrap()
    }

    #[test]
    fn test_unpainted_mesh_is_one_patch() {
        let selector = square_and_strip();
        let set = PatchSet::build(&selector, 1.0);
        assert_eq!(set.len(), 1);
        assert_eq!(set.patches()[0].label, Label::NONE);
        assert_eq!(set.patches()[0].triangles.len(), 4);
        assert_eq!(set.fragment_count(), 0);
    }

    #[test]
    fn test_small_patch_takes_large_neighbor_label() {
        let mut selector = square_and_strip();
        selector.set_facet(0, Label::ENFORCER);
        selector.set_facet(1, Label::ENFORCER);
        selector.set_facet(2, Label::BLOCKER);
        selector.set_facet(3, Label::BLOCKER);

        let set = PatchSet::build_with_ceiling(&selector, 5.0, f32::INFINITY);
        assert_eq!(set.len(), 2);
        let big = set.patch_of(TriangleId(0)).unwrap();
        let small = set.patch_of(TriangleId(2)).unwrap();
        assert!((set.patches()[big].area - 100.0).abs() < 1e-3);
        assert!((set.patches()[small].area - 2.0).abs() < 1e-3);

        assert!(set.is_fragment(small));
        assert!(!set.is_fragment(big));
        assert_eq!(set.effective_label(small), Some(Label::ENFORCER));
        assert_eq!(set.effective_label_of(TriangleId(3)), Some(Label::ENFORCER));

        // Literal labels survive until finalize
        assert_eq!(selector.label_of_triangle(TriangleId(3)), Some(Label::BLOCKER));
        assert_eq!(set.finalize(&mut selector), 2);
        assert_eq!(selector.label_of_triangle(TriangleId(3)), Some(Label::ENFORCER));
        assert!(!selector.has_label(Label::BLOCKER));
    }

    #[test]
    fn test_area_ceiling_saturates() {
        let mut selector = square_and_strip();
        selector.set_facet(2, Label::BLOCKER);
        selector.set_facet(3, Label::BLOCKER);
        let set = PatchSet::build(&selector, 0.5);
        let big = set.patch_of(TriangleId(0)).unwrap();
        let area = set.patches()[big].area;
        assert!(area >= GAP_AREA_CEILING && area < 100.0);
    }

    #[test]
    fn test_stale_set_does_not_finalize() {
        let mut selector = square_and_strip();
        selector.set_facet(2, Label::BLOCKER);
        let set = PatchSet::build(&selector, 5.0);
        assert!(!set.is_stale(&selector));

        selector.set_facet(3, Label::ENFORCER);
        assert!(set.is_stale(&selector));
        assert_eq!(set.finalize(&mut selector), 0);

        let set = PatchSet::build(&selector, 5.0);
        selector.reset();
        assert!(set.is_stale(&selector));
    }

    #[test]
    fn test_tie_breaks_on_lower_label() {
        // Thin center patch (facets 0 and 1) between two equal-area patches
        let mesh = MeshData::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(4.0, 0.0, 0.0),
                Vec3::new(-4.0, 0.0, 0.0),
                Vec3::new(0.0, 4.0, 0.0),
                Vec3::new(0.0, 0.1, 0.0),
            ],
            vec![[0, 1, 4], [0, 4, 2], [4, 1, 3], [2, 4, 3]],
        );
        let mut selector = TriangleSelector::from_mesh(&mesh).unwrap();
        selector.set_facet(0, Label::material(1).unwrap());
        selector.set_facet(1, Label::material(1).unwrap());
        selector.set_facet(2, Label::BLOCKER);
        selector.set_facet(3, Label::ENFORCER);

        let set = PatchSet::build_with_ceiling(&selector, 1.0, f32::INFINITY);
        let thin = set.patch_of(TriangleId(0)).unwrap();
        assert!(set.is_fragment(thin));
        assert_eq!(set.effective_label(thin), Some(Label::ENFORCER));
    }

    #[test]
    fn test_finalize_settles_when_all_patches_are_fragments() {
        // Two equal fragments keep their own labels
        let mesh = MeshData::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(2.0, 0.0, 0.0),
                Vec3::new(2.0, 2.0, 0.0),
                Vec3::new(0.0, 2.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        );
        let mut selector = TriangleSelector::from_mesh(&mesh).unwrap();
        selector.set_facet(0, Label::ENFORCER);
        selector.set_facet(1, Label::BLOCKER);
        let set = PatchSet::build(&selector, 5.0);
        assert_eq!(set.fragment_count(), 2);
        assert_eq!(set.finalize(&mut selector), 0);
        assert_eq!(selector.label_of_triangle(TriangleId(0)), Some(Label::ENFORCER));
        assert_eq!(selector.label_of_triangle(TriangleId(1)), Some(Label::BLOCKER));

        // The smaller fragment joins the larger one, then nothing moves
        let mut selector = square_and_strip();
        selector.set_facet(0, Label::ENFORCER);
        selector.set_facet(1, Label::ENFORCER);
        selector.set_facet(2, Label::BLOCKER);
        selector.set_facet(3, Label::BLOCKER);
        let first = PatchSet::build_with_ceiling(&selector, 500.0, f32::INFINITY);
        assert_eq!(first.fragment_count(), 2);
        assert_eq!(first.finalize(&mut selector), 2);
        assert!(!selector.has_label(Label::BLOCKER));

        let second = PatchSet::build_with_ceiling(&selector, 500.0, f32::INFINITY);
        assert_eq!(second.finalize(&mut selector), 0);
        assert_eq!(selector.label_of_triangle(TriangleId(0)), Some(Label::ENFORCER));
    }
}
