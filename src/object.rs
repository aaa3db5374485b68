/*

    Objects of the reference scene.

    SceneObjectJSON is what a scene file describes, SceneObject is
    what Scene keeps at runtime. Links in the file refer to their
    lattice by object name, Scene::from_json( ) resolves those names
    to ObjectIds once every object exists.

    @date: Oct-Nov 2025
    @author: Bartu
*/

use std::collections::BTreeSet;

use crate::bbox::{BBox, BBoxable};
use crate::binder::DeformationLink;
use crate::host::{LatticeSettings, MeshVertex, ObjectKind, ObjectMode};
use crate::interval::Interval;
use crate::json_structs::{SingleOrVec, VertexData};
use crate::pose::CagePose;
use crate::weights::{WeightCombine, WeightGroup};
use crate::prelude::*;


#[derive(Debug, Deserialize, Clone, SmartDefault)]
#[serde(default)]
pub struct WeightGroupJSON {
    #[serde(rename = "_name")]
    pub name: String,

    #[serde(rename = "Indices", deserialize_with = "deser_usize_vec")]
    pub indices: Vec<usize>,

    #[default = 1.0]
    #[serde(rename = "Weight", deserialize_with = "deser_float")]
    pub weight: Float,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct LatticeModifierJSON {
    #[serde(rename = "_name")]
    pub name: String,

    /// Name of the lattice object, empty if the lattice was deleted
    #[serde(rename = "Object")]
    pub object: String,

    #[serde(rename = "VertexGroup")]
    pub vertex_group: String,
}

#[derive(Debug, Deserialize, Clone, SmartDefault)]
#[serde(default)]
pub struct SceneObjectJSON {
    #[serde(rename = "_name")]
    pub name: String,

    #[serde(rename = "_type")]
    pub kind: ObjectKind,

    #[serde(rename = "Mode")]
    pub mode: ObjectMode,

    #[serde(rename = "Selected", deserialize_with = "deser_bool")]
    pub selected: bool,

    #[serde(rename = "Location", deserialize_with = "deser_vec3")]
    pub location: Vector3,

    /// XYZ euler angles in degrees
    #[serde(rename = "Rotation", deserialize_with = "deser_vec3")]
    pub rotation: Vector3,

    #[default(Vector3::ONE)]
    #[serde(rename = "Scale", deserialize_with = "deser_vec3")]
    pub scale: Vector3,

    #[serde(rename = "VertexData", deserialize_with = "deser_string_or_struct")]
    pub vertex_data: VertexData,

    #[serde(rename = "SelectedVertices", deserialize_with = "deser_usize_vec")]
    pub selected_vertices: Vec<usize>,

    /// "xmin ymin zmin xmax ymax zmax" for objects without vertex data
    #[serde(rename = "BoundBox", deserialize_with = "deser_float_vec")]
    pub bound_box: Vec<Float>,

    #[serde(rename = "VertexGroup")]
    pub vertex_groups: SingleOrVec<WeightGroupJSON>,

    #[serde(rename = "LatticeModifier")]
    pub lattice_modifiers: SingleOrVec<LatticeModifierJSON>,
}


#[derive(Debug, Clone, SmartDefault)]
pub struct SceneObject {
    pub name: String,
    pub kind: ObjectKind,
    pub mode: ObjectMode,
    pub selected: bool,

    pub location: Vector3,
    #[default(Quaternion::IDENTITY)]
    pub rotation: Quaternion,
    #[default(Vector3::ONE)]
    pub scale: Vector3,

    /// Object local coordinates
    pub vertices: Vec<Vector3>,
    pub selected_vertices: BTreeSet<usize>,
    /// Local bound box, derived from vertices when there are any
    pub bound: BBox,

    pub vertex_groups: Vec<WeightGroup>,
    pub links: Vec<DeformationLink>,

    /// Some for lattice objects
    pub lattice: Option<LatticeSettings>,
}

impl SceneObject {
    pub fn new(name: &str, kind: ObjectKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            ..Default::default()
        }
    }

    pub fn new_mesh(name: &str, vertices: Vec<Vector3>) -> Self {
        let mut obj = Self::new(name, ObjectKind::Mesh);
        obj.set_vertices(vertices);
        obj
    }

    pub fn with_transform(mut self, location: Vector3, rotation: Quaternion, scale: Vector3) -> Self {
        self.location = location;
        self.rotation = rotation;
        self.scale = scale;
        self
    }

    pub fn with_selection(mut self, selected: bool, mode: ObjectMode) -> Self {
        self.selected = selected;
        self.mode = mode;
        self
    }

    pub fn with_selected_vertices(mut self, indices: &[usize]) -> Self {
        self.selected_vertices = indices.iter().copied().filter(|&i| i < self.vertices.len()).collect();
        self
    }

    pub fn with_bound(mut self, bound: BBox) -> Self {
        self.bound = bound;
        self
    }

    pub fn set_vertices(&mut self, vertices: Vec<Vector3>) {
        if let Some(bound) = vertices.as_slice().get_bbox() {
            self.bound = bound;
        }
        self.vertices = vertices;
    }

    pub fn matrix_world(&self) -> Matrix4 {
        compose(self.location, self.rotation, self.scale)
    }

    pub fn set_pose(&mut self, pose: &CagePose) {
        self.location = pose.location;
        self.rotation = pose.rotation;
        self.scale = pose.scale;
    }

    pub fn mesh_vertices(&self) -> Vec<MeshVertex> {
        self.vertices
            .iter()
            .enumerate()
            .map(|(index, co)| MeshVertex {
                index,
                co: *co,
                selected: self.selected_vertices.contains(&index),
            })
            .collect()
    }

    pub fn group(&self, name: &str) -> Option<&WeightGroup> {
        self.vertex_groups.iter().find(|g| g.name == name)
    }

    pub fn group_mut(&mut self, name: &str) -> Option<&mut WeightGroup> {
        self.vertex_groups.iter_mut().find(|g| g.name == name)
    }

    pub fn link(&self, name: &str) -> Option<&DeformationLink> {
        self.links.iter().find(|l| l.name == name)
    }

    /// Host style unique modifier name: "name", "name.001", "name.002", ...
    pub fn unique_link_name(&self, base: &str) -> String {
        unique_name(base, |candidate| self.link(candidate).is_some())
    }
}

impl SceneObjectJSON {
    /// Build the runtime object. Lattice references are left unresolved
    /// (cage = None), the scene fills them in afterwards.
    pub fn to_object(&self, ply_vertices: Vec<Vector3>) -> SceneObject {
        let mut vertices = self.vertex_data.points.clone();
        vertices.extend(ply_vertices);

        let rotation = quat_from_euler_xyz(degrees_to_radians(self.rotation));
        let mut obj = SceneObject::new(&self.name, self.kind)
            .with_transform(self.location, rotation, self.scale)
            .with_selection(self.selected, self.mode);
        obj.set_vertices(vertices);
        obj = obj.with_selected_vertices(&self.selected_vertices);

        if self.bound_box.len() == 6 {
            let b = &self.bound_box;
            let (xint, yint, zint) = (Interval::new(b[0], b[3]), Interval::new(b[1], b[4]), Interval::new(b[2], b[5]));
            if xint.validate() && yint.validate() && zint.validate() {
                obj.bound = BBox::new_from(&xint, &yint, &zint);
            } else {
                warn!("Object '{}' has BoundBox with max < min, ignoring it", self.name);
            }
        } else if !self.bound_box.is_empty() {
            warn!("Object '{}' has BoundBox with {} values, expected 6", self.name, self.bound_box.len());
        }

        if obj.kind == ObjectKind::Mesh && obj.vertices.is_empty() {
            warn!("Mesh '{}' has no vertices, its bound box is a point at the origin", self.name);
        }

        for g in self.vertex_groups.all() {
            let mut group = WeightGroup::new(&g.name);
            group.assign(&g.indices, g.weight, WeightCombine::Replace);
            obj.vertex_groups.push(group);
        }
        for m in self.lattice_modifiers.all() {
            obj.links.push(DeformationLink {
                name: m.name.clone(),
                cage: None,
                weight_group: if m.vertex_group.is_empty() { None } else { Some(m.vertex_group.clone()) },
            });
        }
        obj
    }
}

pub(crate) fn unique_name<F>(base: &str, taken: F) -> String
where
    F: Fn(&str) -> bool,
{
    if !taken(base) {
        return base.to_string();
    }
    let mut n = 1;
    loop {
        let candidate = format!("{base}.{n:03}");
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_name() {
        let taken = ["SimpleLattice", "SimpleLattice.001"];
        let name = unique_name("SimpleLattice", |c| taken.contains(&c));
        assert_eq!(name, "SimpleLattice.002");
        assert_eq!(unique_name("Cube", |c| taken.contains(&c)), "Cube");
    }

    #[test]
    fn test_mesh_bound_follows_vertices() {
        let obj = SceneObject::new_mesh("m", vec![Vector3::new(-1.0, 0.0, 2.0), Vector3::new(3.0, 1.0, 4.0)]);
        assert_eq!(obj.bound.min(), Vector3::new(-1.0, 0.0, 2.0));
        assert_eq!(obj.bound.max(), Vector3::new(3.0, 1.0, 4.0));
    }

    #[test]
    fn test_json_object() {
        let json = r#"{
            "_name": "Bent",
            "_type": "mesh",
            "Mode": "edit",
            "Selected": "true",
            "Rotation": "0 0 90",
            "VertexData": "0 0 0  1 0 0  1 1 0",
            "SelectedVertices": "0 2 9",
            "VertexGroup": {"_name": "SimpleLattice.0", "Indices": "1"},
            "LatticeModifier": [{"_name": "SimpleLattice.0", "Object": "Gone", "VertexGroup": "SimpleLattice.0"}]
        }"#;
        let parsed: SceneObjectJSON = serde_json::from_str(json).unwrap();
        let obj = parsed.to_object(vec![]);

        assert_eq!(obj.kind, ObjectKind::Mesh);
        assert_eq!(obj.mode, ObjectMode::Edit);
        assert!(obj.selected);
        assert_eq!(obj.scale, Vector3::ONE);
        // Index 9 is out of range and dropped
        assert_eq!(obj.selected_vertices.iter().copied().collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(obj.group("SimpleLattice.0").unwrap().weight(1), Some(1.0));
        assert_eq!(obj.links.len(), 1);
        assert_eq!(obj.links[0].cage, None);

        let x_world = transform_point(&obj.matrix_world(), &Vector3::X);
        assert!(x_world.abs_diff_eq(Vector3::Y, 1e-12));
    }

    #[test]
    fn test_bound_box_for_curves() {
        let json = r#"{"_name": "Path", "_type": "curve", "BoundBox": "-1 -2 -3 1 2 3"}"#;
        let parsed: SceneObjectJSON = serde_json::from_str(json).unwrap();
        let obj = parsed.to_object(vec![]);
        assert_eq!(obj.bound.extents(), Vector3::new(2.0, 4.0, 6.0));
        assert!(obj.mesh_vertices().is_empty());
    }
}
