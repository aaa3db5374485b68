/*

    Declare Scene, an in-memory host the lattice operator can
    run against. It is loaded from a JSON scene description and
    implements SceneHost the way a 3D application would:

        - object names are kept unique ("SimpleLattice.001", ...)
        - removing an object clears lattice links pointing at it
        - vertex selection is per object, weight groups and lattice
          links are ordered lists on the object

    Meshes may pull (extra) vertices from a .ply file given as
    VertexData._plyFile, relative to the JSON file.

    @date: 2 Oct, 2025
    @author: Bartu
*/
use std::collections::BTreeMap;
use std::{path::Path, io::BufReader, fs::File};

use thiserror::Error;

use crate::bbox::BBox;
use crate::binder::DeformationLink;
use crate::error::{CageError, CageResult};
use crate::host::{LatticeSettings, MeshVertex, ObjectId, ObjectKind, ObjectMode, SceneHost};
use crate::interval::Interval;
use crate::json_structs::{PlyMesh, SingleOrVec};
use crate::object::{SceneObject, SceneObjectJSON, unique_name};
use crate::operator::CageParams;
use crate::pose::CagePose;
use crate::weights::{WeightCombine, WeightGroup};
use crate::prelude::*;


#[derive(Debug, Error)]
pub enum SceneError {
    #[error("could not read scene: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not parse scene JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not parse PLY file {path}: {message}")]
    Ply { path: String, message: String },

    #[error("object '{object}' refers to unknown object '{name}'")]
    UnknownReference { object: String, name: String },
}


#[derive(Debug, Deserialize)]
pub struct RootScene {
    #[serde(rename = "Scene")]
    pub scene: SceneJSON,

    #[serde(rename = "Operator", default)]
    pub params: CageParams,
}

#[derive(Debug, Deserialize, SmartDefault)]
#[serde(rename_all = "PascalCase")]
#[serde(default)]
pub struct SceneJSON {
    /// XYZ euler angles in degrees
    #[serde(deserialize_with = "deser_vec3")]
    pub cursor_rotation: Vector3,

    pub active_object: Option<String>,

    pub objects: SceneObjects,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct SceneObjects {
    #[serde(rename = "Object")]
    pub objects: SingleOrVec<SceneObjectJSON>,
}


#[derive(Debug, Clone, SmartDefault)]
pub struct Scene {
    objects: BTreeMap<ObjectId, SceneObject>,
    active: Option<ObjectId>,
    #[default(Quaternion::IDENTITY)]
    cursor_rotation: Quaternion,
    next_id: u64,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a scene file together with the operator parameters it carries
    pub fn load(json_path: &Path) -> Result<(Self, CageParams), SceneError> {
        let root = parse_scene_json(json_path)?;
        let scene = Self::from_json(&root.scene, json_path)?;
        Ok((scene, root.params))
    }

    pub fn from_json(scene_json: &SceneJSON, json_path: &Path) -> Result<Self, SceneError> {
        let json_dir = json_path.parent().unwrap_or(Path::new("."));
        let mut scene = Scene::new();
        scene.cursor_rotation = quat_from_euler_xyz(degrees_to_radians(scene_json.cursor_rotation));

        let objects_json = scene_json.objects.objects.all();
        let mut ids = Vec::with_capacity(objects_json.len());
        for obj_json in objects_json.iter() {
            let ply_vertices = load_ply_vertices(&obj_json.vertex_data.ply_file, json_dir)?;
            let id = scene.add_object(obj_json.to_object(ply_vertices));
            ids.push(id);
        }

        // Resolve lattice references by name now that every object exists.
        // An empty name is a link whose lattice was deleted.
        for (obj_json, id) in objects_json.iter().zip(ids.iter()) {
            for (i, m) in obj_json.lattice_modifiers.all().iter().enumerate() {
                if m.object.is_empty() {
                    continue;
                }
                let cage = scene.find(&m.object).ok_or_else(|| SceneError::UnknownReference {
                    object: obj_json.name.clone(),
                    name: m.object.clone(),
                })?;
                if let Some(obj) = scene.objects.get_mut(id) {
                    obj.links[i].cage = Some(cage);
                }
            }
        }

        if let Some(name) = &scene_json.active_object {
            scene.active = Some(scene.find(name).ok_or_else(|| SceneError::UnknownReference {
                object: String::from("Scene"),
                name: name.clone(),
            })?);
        }

        info!(">> Scene has {} objects, {} selected.", scene.objects.len(), scene.selected_objects().len());
        Ok(scene)
    }

    /// Add an object, renaming it if the name is already taken
    pub fn add_object(&mut self, mut obj: SceneObject) -> ObjectId {
        obj.name = unique_name(&obj.name, |candidate| self.find(candidate).is_some());
        let id = ObjectId::from_raw(self.next_id);
        self.next_id += 1;
        debug!("Adding object '{}' as {}", obj.name, id);
        self.objects.insert(id, obj);
        id
    }

    pub fn find(&self, name: &str) -> Option<ObjectId> {
        self.objects.iter().find(|(_, obj)| obj.name == name).map(|(id, _)| *id)
    }

    pub fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(&id)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.get_mut(&id)
    }

    /// Objects in creation order
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &SceneObject)> {
        self.objects.iter().map(|(id, obj)| (*id, obj))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn set_cursor_rotation(&mut self, rotation: Quaternion) {
        self.cursor_rotation = rotation;
    }

    fn get(&self, id: ObjectId) -> CageResult<&SceneObject> {
        self.objects.get(&id).ok_or(CageError::StaleObject(id))
    }

    fn get_mut(&mut self, id: ObjectId) -> CageResult<&mut SceneObject> {
        self.objects.get_mut(&id).ok_or(CageError::StaleObject(id))
    }
}

fn load_ply_vertices(ply_file: &str, json_dir: &Path) -> Result<Vec<Vector3>, SceneError> {
    if ply_file.is_empty() {
        return Ok(Vec::new());
    }
    let ply_path = json_dir.join(ply_file);
    debug!("Loading vertices from PLY file path: {:?}", ply_path);

    let file = File::open(&ply_path)?;
    let reader = BufReader::new(file);
    let plymesh: PlyMesh = serde_ply::from_reader(reader).map_err(|e| SceneError::Ply {
        path: ply_path.display().to_string(),
        message: e.to_string(),
    })?;

    Ok(plymesh
        .vertex
        .iter()
        .map(|v| Vector3::new(v.x as Float, v.y as Float, v.z as Float))
        .collect())
}


impl SceneHost for Scene {

    fn selected_objects(&self) -> Vec<ObjectId> {
        self.objects.iter().filter(|(_, obj)| obj.selected).map(|(id, _)| *id).collect()
    }

    fn active_object(&self) -> Option<ObjectId> {
        self.active
    }

    fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    fn object_name(&self, id: ObjectId) -> CageResult<String> {
        Ok(self.get(id)?.name.clone())
    }

    fn object_kind(&self, id: ObjectId) -> CageResult<ObjectKind> {
        Ok(self.get(id)?.kind)
    }

    fn object_mode(&self, id: ObjectId) -> CageResult<ObjectMode> {
        Ok(self.get(id)?.mode)
    }

    fn world_matrix(&self, id: ObjectId) -> CageResult<Matrix4> {
        Ok(self.get(id)?.matrix_world())
    }

    fn local_bound_corners(&self, id: ObjectId) -> CageResult<[Vector3; 8]> {
        Ok(self.get(id)?.bound.corners())
    }

    fn mesh_vertices(&self, id: ObjectId) -> CageResult<Vec<MeshVertex>> {
        let obj = self.get(id)?;
        if obj.kind != ObjectKind::Mesh {
            return Err(CageError::NotMesh(id));
        }
        Ok(obj.mesh_vertices())
    }

    fn cursor_rotation(&self) -> Quaternion {
        self.cursor_rotation
    }

    fn weight_groups(&self, id: ObjectId) -> CageResult<Vec<String>> {
        Ok(self.get(id)?.vertex_groups.iter().map(|g| g.name.clone()).collect())
    }

    fn lattice_links(&self, id: ObjectId) -> CageResult<Vec<DeformationLink>> {
        Ok(self.get(id)?.links.clone())
    }

    fn set_object_mode(&mut self, id: ObjectId, mode: ObjectMode) -> CageResult<()> {
        self.get_mut(id)?.mode = mode;
        Ok(())
    }

    fn set_selected(&mut self, id: ObjectId, selected: bool) -> CageResult<()> {
        self.get_mut(id)?.selected = selected;
        Ok(())
    }

    fn set_active(&mut self, id: ObjectId) -> CageResult<()> {
        self.get(id)?;
        self.active = Some(id);
        Ok(())
    }

    fn create_lattice(&mut self, name: &str) -> CageResult<ObjectId> {
        let mut lattice = SceneObject::new(name, ObjectKind::Lattice);
        lattice.lattice = Some(LatticeSettings::default());
        // Lattice points span [-0.5, 0.5] in object space
        let half = Interval::new(-0.5, 0.5);
        lattice = lattice.with_bound(BBox::new_from(&half, &half, &half));
        Ok(self.add_object(lattice))
    }

    fn configure_lattice(&mut self, id: ObjectId, settings: &LatticeSettings) -> CageResult<()> {
        let obj = self.get_mut(id)?;
        if obj.kind != ObjectKind::Lattice {
            warn!("Configuring lattice settings on '{}' which is a {:?}", obj.name, obj.kind);
        }
        obj.lattice = Some(*settings);
        Ok(())
    }

    fn set_transform(&mut self, id: ObjectId, pose: &CagePose) -> CageResult<()> {
        self.get_mut(id)?.set_pose(pose);
        Ok(())
    }

    fn remove_object(&mut self, id: ObjectId) -> CageResult<()> {
        let obj = self.objects.remove(&id).ok_or(CageError::StaleObject(id))?;
        debug!("Removed object '{}' ({})", obj.name, id);
        if self.active == Some(id) {
            self.active = None;
        }
        // Links survive their lattice with an empty object slot
        for other in self.objects.values_mut() {
            for link in other.links.iter_mut().filter(|l| l.cage == Some(id)) {
                link.cage = None;
            }
        }
        Ok(())
    }

    fn create_weight_group(&mut self, id: ObjectId, name: &str) -> CageResult<String> {
        let obj = self.get_mut(id)?;
        let name = unique_name(name, |candidate| obj.group(candidate).is_some());
        obj.vertex_groups.push(WeightGroup::new(&name));
        Ok(name)
    }

    fn assign_weights(&mut self, id: ObjectId, group: &str, indices: &[usize], weight: Float, mode: WeightCombine) -> CageResult<()> {
        let obj = self.get_mut(id)?;
        let n_verts = obj.vertices.len();
        if let Some(&bad) = indices.iter().find(|&&i| i >= n_verts) {
            warn!("Vertex index {} out of range on '{}' ({} vertices), skipping it", bad, obj.name, n_verts);
        }
        let indices: Vec<usize> = indices.iter().copied().filter(|&i| i < n_verts).collect();
        let grp = obj.group_mut(group).ok_or_else(|| CageError::MissingGroup { object: id, name: group.to_string() })?;
        grp.assign(&indices, weight, mode);
        Ok(())
    }

    fn remove_weight_group(&mut self, id: ObjectId, name: &str) -> CageResult<()> {
        let obj = self.get_mut(id)?;
        let before = obj.vertex_groups.len();
        obj.vertex_groups.retain(|g| g.name != name);
        if obj.vertex_groups.len() == before {
            return Err(CageError::MissingGroup { object: id, name: name.to_string() });
        }
        Ok(())
    }

    fn add_lattice_link(&mut self, id: ObjectId, mut link: DeformationLink) -> CageResult<String> {
        let obj = self.get_mut(id)?;
        link.name = obj.unique_link_name(&link.name);
        let name = link.name.clone();
        obj.links.push(link);
        Ok(name)
    }

    fn rename_lattice_link(&mut self, id: ObjectId, from: &str, to: &str) -> CageResult<String> {
        let obj = self.get_mut(id)?;
        let Some(pos) = obj.links.iter().position(|l| l.name == from) else {
            return Err(CageError::MissingLink { object: id, name: from.to_string() });
        };
        let new_name = if from == to { to.to_string() } else { obj.unique_link_name(to) };
        obj.links[pos].name = new_name.clone();
        Ok(new_name)
    }

    fn remove_lattice_link(&mut self, id: ObjectId, name: &str) -> CageResult<()> {
        let obj = self.get_mut(id)?;
        let Some(pos) = obj.links.iter().position(|l| l.name == name) else {
            return Err(CageError::MissingLink { object: id, name: name.to_string() });
        };
        obj.links.remove(pos);
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn two_object_scene() -> (Scene, ObjectId, ObjectId) {
        let mut scene = Scene::new();
        let a = scene.add_object(SceneObject::new_mesh("Cube", vec![Vector3::ZERO, Vector3::ONE]).with_selection(true, ObjectMode::Object));
        let b = scene.add_object(SceneObject::new("Cube", ObjectKind::Curve));
        (scene, a, b)
    }

    #[test]
    fn test_names_are_unique() {
        let (scene, a, b) = two_object_scene();
        assert_eq!(scene.object_name(a).unwrap(), "Cube");
        assert_eq!(scene.object_name(b).unwrap(), "Cube.001");
        assert_eq!(scene.selected_objects(), vec![a]);
    }

    #[test]
    fn test_removed_object_is_stale_and_unlinked() {
        let (mut scene, a, b) = two_object_scene();
        scene.add_lattice_link(a, DeformationLink::new(b)).unwrap();
        scene.set_active(b).unwrap();

        scene.remove_object(b).unwrap();
        assert!(!scene.contains(b));
        assert_eq!(scene.active_object(), None);
        assert!(matches!(scene.object_kind(b), Err(CageError::StaleObject(_))));
        assert_eq!(scene.lattice_links(a).unwrap()[0].cage, None);
        assert!(scene.remove_object(b).is_err());
    }

    #[test]
    fn test_mesh_vertices_only_for_meshes() {
        let (scene, a, b) = two_object_scene();
        assert_eq!(scene.mesh_vertices(a).unwrap().len(), 2);
        assert!(matches!(scene.mesh_vertices(b), Err(CageError::NotMesh(_))));
    }

    #[test]
    fn test_link_names_are_uniquified_and_renamed() {
        let (mut scene, a, b) = two_object_scene();
        let first = scene.add_lattice_link(a, DeformationLink::new(b)).unwrap();
        let second = scene.add_lattice_link(a, DeformationLink::new(b)).unwrap();
        assert_eq!(first, "SimpleLattice");
        assert_eq!(second, "SimpleLattice.001");

        let renamed = scene.rename_lattice_link(a, &second, "SimpleLattice.4").unwrap();
        assert_eq!(renamed, "SimpleLattice.4");
        assert!(scene.remove_lattice_link(a, "SimpleLattice.001").is_err());
        scene.remove_lattice_link(a, "SimpleLattice.4").unwrap();
        assert_eq!(scene.lattice_links(a).unwrap().len(), 1);
    }

    #[test]
    fn test_group_crud() {
        let (mut scene, a, _) = two_object_scene();
        let name = scene.create_weight_group(a, "SimpleLattice.0").unwrap();
        scene.assign_weights(a, &name, &[0, 1, 7], 1.0, WeightCombine::Replace).unwrap();
        assert_eq!(scene.object(a).unwrap().group(&name).unwrap().indices(), vec![0, 1]);

        assert!(matches!(
            scene.assign_weights(a, "nope", &[0], 1.0, WeightCombine::Replace),
            Err(CageError::MissingGroup { .. })
        ));
        scene.remove_weight_group(a, &name).unwrap();
        assert!(scene.remove_weight_group(a, &name).is_err());
    }

    #[test]
    fn test_from_json_resolves_links_and_active() {
        let json = r#"{
            "Scene": {
                "CursorRotation": "0 0 90",
                "ActiveObject": "Suzanne",
                "Objects": { "Object": [
                    { "_name": "Suzanne", "_type": "mesh", "Selected": true, "VertexData": "0 0 0 1 1 1",
                      "LatticeModifier": [
                        {"_name": "SimpleLattice", "Object": "Cage"},
                        {"_name": "SimpleLattice.001", "Object": ""}
                      ] },
                    { "_name": "Cage", "_type": "lattice" }
                ]}
            },
            "Operator": { "Orientation": "Cursor", "ResolutionU": "3" }
        }"#;
        let root: RootScene = serde_json::from_str(json).unwrap();
        assert_eq!(root.params.orientation, crate::pose::OrientationBasis::Cursor);
        assert_eq!(root.params.resolution_u, 3);
        assert_eq!(root.params.resolution_v, 2);

        let scene = Scene::from_json(&root.scene, Path::new("scene.json")).unwrap();
        let suzanne = scene.find("Suzanne").unwrap();
        let cage = scene.find("Cage").unwrap();
        assert_eq!(scene.active_object(), Some(suzanne));

        let links = scene.lattice_links(suzanne).unwrap();
        assert_eq!(links[0].cage, Some(cage));
        assert_eq!(links[1].cage, None);

        let x = scene.cursor_rotation() * Vector3::X;
        assert!(x.abs_diff_eq(Vector3::Y, 1e-12));
    }

    #[test]
    fn test_unknown_reference_is_an_error() {
        let json = r#"{ "Scene": { "Objects": { "Object":
            { "_name": "A", "LatticeModifier": {"_name": "SimpleLattice", "Object": "Nope"} } } } }"#;
        let root: RootScene = serde_json::from_str(json).unwrap();
        let res = Scene::from_json(&root.scene, Path::new("scene.json"));
        assert!(matches!(res, Err(SceneError::UnknownReference { .. })));
    }
}
