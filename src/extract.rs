/*

    Gather the world-space points the cage has to enclose.

    Two flavours:
        - whole objects: the 8 corners of every object's local bound
          box, moved to world space with the object's world matrix
        - vertex subset: world positions of the vertices that were
          selected when the operation started, plus the index list per
          object (VertexMapping) that the weight groups are built from

    Both flavours deselect every object they visit so the cage can
    become the only selected object afterwards. This is part of the
    contract, the operator relies on it.

    @date: Oct, 2025
    @author: bartu
*/

use std::collections::BTreeMap;

use crate::error::CageResult;
use crate::host::{ObjectId, ObjectMode, SceneHost};
use crate::prelude::*;

pub type PointCloud = Vec<Vector3>;

/// Object -> selected vertex indices, in the host's vertex order
pub type VertexMapping = BTreeMap<ObjectId, Vec<usize>>;


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    VertexAddressable,
    WholeObject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionEntry {
    pub id: ObjectId,
    pub capability: Capability,
}

/// Selected objects a lattice can deform, in the host's selection order.
/// Built once per creation and not modified afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    entries: Vec<SelectionEntry>,
}

impl SelectionSet {

    pub fn gather<H: SceneHost + ?Sized>(host: &H) -> Self {
        let mut entries = Vec::new();
        for id in host.selected_objects() {
            let kind = match host.object_kind(id) {
                Ok(kind) => kind,
                Err(e) => {
                    warn!("Skipping selected object {}: {}", id, e);
                    continue;
                }
            };
            if !kind.is_deformable() {
                debug!("Object {} of kind {:?} cannot carry a lattice, skipping", id, kind);
                continue;
            }
            let capability = if kind.supports_vertex_addressing() {
                Capability::VertexAddressable
            } else {
                Capability::WholeObject
            };
            entries.push(SelectionEntry { id, capability });
        }
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn first(&self) -> Option<ObjectId> {
        self.entries.first().map(|e| e.id)
    }

    pub fn ids(&self) -> Vec<ObjectId> {
        self.entries.iter().map(|e| e.id).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SelectionEntry> {
        self.entries.iter()
    }

    pub fn all_vertex_addressable(&self) -> bool {
        self.entries.iter().all(|e| e.capability == Capability::VertexAddressable)
    }

    /// Vertex mode is used when every object is vertex addressable and the
    /// first one is being edited
    pub fn wants_vertex_mode<H: SceneHost + ?Sized>(&self, host: &H) -> CageResult<bool> {
        let Some(first) = self.first() else {
            return Ok(false);
        };
        if !self.all_vertex_addressable() {
            return Ok(false);
        }
        Ok(host.object_mode(first)? == ObjectMode::Edit)
    }
}


/// Number of selected vertices over all objects, read only
pub fn count_selected_vertices<H: SceneHost + ?Sized>(host: &H, objects: &SelectionSet) -> CageResult<usize> {
    let mut count = 0;
    for id in objects.ids() {
        count += host.mesh_vertices(id)?.iter().filter(|v| v.selected).count();
    }
    Ok(count)
}

pub fn extract_whole_object_points<H: SceneHost + ?Sized>(host: &mut H, objects: &SelectionSet) -> CageResult<PointCloud> {
    let mut bbox_world_coords = Vec::with_capacity(objects.len() * 8);
    for id in objects.ids() {
        host.set_selected(id, false)?;

        let matrix_world = host.world_matrix(id)?;
        let corners = host.local_bound_corners(id)?;
        bbox_world_coords.extend(corners.iter().map(|p| transform_point(&matrix_world, p)));
    }
    debug!("Extracted {} bound corners from {} object(s)", bbox_world_coords.len(), objects.len());
    Ok(bbox_world_coords)
}

pub fn extract_vertex_points<H: SceneHost + ?Sized>(host: &mut H, objects: &SelectionSet) -> CageResult<(PointCloud, VertexMapping)> {
    let mut worldspace_verts = Vec::new();
    let mut vert_mapping = VertexMapping::new();

    for id in objects.ids() {
        host.set_selected(id, false)?;
        if host.object_mode(id)? == ObjectMode::Edit {
            // vertex selection is only synced back once edit mode is left
            host.set_object_mode(id, ObjectMode::Object)?;
        }

        let matrix_world = host.world_matrix(id)?;
        let mut vert_indices = Vec::new();
        for vert in host.mesh_vertices(id)? {
            if vert.selected {
                vert_indices.push(vert.index);
                worldspace_verts.push(transform_point(&matrix_world, &vert.co));
            }
        }

        if vert_indices.is_empty() {
            debug!("Object {} has no selected vertices, its group will be empty", id);
        }
        vert_mapping.insert(id, vert_indices);
    }

    debug!("Extracted {} selected vertices from {} object(s)", worldspace_verts.len(), objects.len());
    Ok((worldspace_verts, vert_mapping))
}
