/*

    Weight groups restricting a lattice link to the selected
    vertices of an object.

    Every group and link this crate creates belongs to the
    "SimpleLattice" family. Groups are named SimpleLattice.<n>
    where n is one more than the largest suffix already on the
    object (max + 1, not count + 1, because older groups may have
    been deleted in between). Without any such group n is 0. If
    the largest suffix is u32::MAX the lowest unused one is taken.

    cleanup( ) runs before new groups are created so repeated
    lattice creation on the same objects does not pile up stale
    groups and modifiers:

        pass 1: collect links of the family whose cage is gone
                and the groups still used by the remaining links
        pass 2: collect family groups nobody uses
        pass 3: remove what was collected

    Removal never happens while iterating the host's lists.

    @date: Oct, 2025
    @author: bartu
*/

use std::collections::{BTreeMap, BTreeSet};

use crate::error::CageResult;
use crate::extract::{SelectionSet, VertexMapping};
use crate::host::{ObjectId, SceneHost};
use crate::prelude::*;

pub const GROUP_PREFIX: &str = "SimpleLattice";

/// Object -> name of the group created for it
pub type GroupMapping = BTreeMap<ObjectId, String>;


/// How assigned weights combine with a vertex's existing weight in the group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, SmartDefault)]
#[serde(rename_all = "lowercase")]
pub enum WeightCombine {
    #[default]
    Replace,
    Add,
    Subtract,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WeightGroup {
    pub name: String,
    weights: BTreeMap<usize, Float>,
}

impl WeightGroup {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            weights: BTreeMap::new(),
        }
    }

    /// Weights are kept in [0, 1]. Subtracting down to zero drops the vertex from the group.
    pub fn assign(&mut self, indices: &[usize], weight: Float, mode: WeightCombine) {
        let weight = weight.clamp(0.0, 1.0);
        for &i in indices {
            match mode {
                WeightCombine::Replace => {
                    self.weights.insert(i, weight);
                }
                WeightCombine::Add => {
                    let w = self.weights.entry(i).or_insert(0.0);
                    *w = (*w + weight).min(1.0);
                }
                WeightCombine::Subtract => {
                    if let Some(w) = self.weights.get_mut(&i) {
                        *w -= weight;
                        if *w <= 0.0 {
                            self.weights.remove(&i);
                        }
                    }
                }
            }
        }
    }

    pub fn weight(&self, index: usize) -> Option<Float> {
        self.weights.get(&index).copied()
    }

    pub fn indices(&self) -> Vec<usize> {
        self.weights.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}


/// True for group and link names created by this crate
pub fn is_reserved_name(name: &str) -> bool {
    name.contains(GROUP_PREFIX)
}

/// Numeric suffix of a "SimpleLattice.<n>" name, None for anything else
pub fn group_suffix(name: &str) -> Option<u32> {
    let family = format!("{GROUP_PREFIX}.");
    if !name.contains(&family) {
        return None;
    }
    name.rsplit('.').next()?.parse::<u32>().ok()
}

pub fn next_group_name<S: AsRef<str>>(existing: &[S]) -> String {
    let used: BTreeSet<u32> = existing
        .iter()
        .filter_map(|name| group_suffix(name.as_ref()))
        .collect();

    let next = match used.last() {
        None => 0,
        Some(&max) => max.checked_add(1).unwrap_or_else(|| {
            // u32::MAX is taken, the lowest free suffix still gives a unique name
            let free = used.iter().zip(0u32..).find(|(n, i)| **n != *i).map_or(max, |(_, i)| i);
            warn!("Group suffix {} cannot be incremented, using {}", max, free);
            free
        }),
    };
    format!("{GROUP_PREFIX}.{next}")
}


#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CleanupReport {
    pub removed_links: Vec<(ObjectId, String)>,
    pub removed_groups: Vec<(ObjectId, String)>,
}

/// Remove family links whose cage no longer exists and family groups no
/// live link refers to. Failures are logged and skipped, cleanup is advisory.
pub fn cleanup<H: SceneHost + ?Sized>(host: &mut H, objects: &SelectionSet) -> CleanupReport {
    let mut report = CleanupReport::default();

    for id in objects.ids() {
        let links = match host.lattice_links(id) {
            Ok(links) => links,
            Err(e) => {
                warn!("Cleanup skipped object {}: {}", id, e);
                continue;
            }
        };

        let mut used_vertex_groups = BTreeSet::new();
        let mut obsolete_links = Vec::new();
        for link in links.iter() {
            let alive = link.cage.is_some_and(|cage| host.contains(cage));
            if link.is_reserved() && !alive {
                obsolete_links.push(link.name.clone());
            } else if let Some(group) = &link.weight_group {
                used_vertex_groups.insert(group.clone());
            }
        }

        let groups = match host.weight_groups(id) {
            Ok(groups) => groups,
            Err(e) => {
                warn!("Cleanup could not list weight groups of {}: {}", id, e);
                Vec::new()
            }
        };
        let obsolete_groups: Vec<String> = groups
            .into_iter()
            .filter(|name| is_reserved_name(name) && !used_vertex_groups.contains(name))
            .collect();

        for name in obsolete_groups {
            match host.remove_weight_group(id, &name) {
                Ok(()) => {
                    info!("removed vertex_group: {} from {}", name, id);
                    report.removed_groups.push((id, name));
                }
                Err(e) => warn!("Could not remove weight group '{}': {}", name, e),
            }
        }
        for name in obsolete_links {
            match host.remove_lattice_link(id, &name) {
                Ok(()) => {
                    info!("removed modifier: {} from {}", name, id);
                    report.removed_links.push((id, name));
                }
                Err(e) => warn!("Could not remove lattice link '{}': {}", name, e),
            }
        }
    }

    report
}

/// Create one fresh group per object holding its selected vertices with
/// weight 1.0. An object without selected vertices gets an empty group.
pub fn assign_weight_groups<H: SceneHost + ?Sized>(host: &mut H, objects: &SelectionSet, vertex_mapping: &VertexMapping) -> CageResult<GroupMapping> {
    let mut group_mapping = GroupMapping::new();

    for id in objects.ids() {
        let existing = host.weight_groups(id)?;
        let name = next_group_name(&existing);
        let name = host.create_weight_group(id, &name)?;

        let indices = vertex_mapping.get(&id).map(Vec::as_slice).unwrap_or(&[]);
        host.assign_weights(id, &name, indices, 1.0, WeightCombine::Replace)?;
        debug!("Created weight group '{}' on {} with {} vertices", name, id, indices.len());

        group_mapping.insert(id, name);
    }

    Ok(group_mapping)
}
