/*

    The boundary between the lattice pipeline and whatever
    application owns the scene.

    Objects are never held by reference across calls. Every
    component receives an ObjectId and resolves it through the
    SceneHost trait, so a cage created by one invocation can be
    found again (or found missing) by the next one.

    Object "types" are a closed enum, see ObjectKind, and the
    pipeline only asks it the two questions it cares about:
    is_deformable( ) and supports_vertex_addressing( ).

    @date: Oct, 2025
    @author: bartu
*/

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer};

use crate::binder::DeformationLink;
use crate::error::CageResult;
use crate::pose::CagePose;
use crate::weights::WeightCombine;
use crate::prelude::*;


#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ObjectId(u64);

impl ObjectId {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, SmartDefault)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    #[default]
    Mesh,
    Curve,
    Surface,
    Font,
    #[serde(alias = "gpencil")]
    GreasePencil,
    Lattice,
    Empty,
    Camera,
    Light,
}

impl ObjectKind {
    /// Kinds a lattice modifier can be attached to
    pub fn is_deformable(&self) -> bool {
        matches!(
            self,
            ObjectKind::Mesh
                | ObjectKind::Curve
                | ObjectKind::Surface
                | ObjectKind::Font
                | ObjectKind::GreasePencil
                | ObjectKind::Lattice
        )
    }

    /// Kinds that expose per-vertex selection and weight groups
    pub fn supports_vertex_addressing(&self) -> bool {
        matches!(self, ObjectKind::Mesh)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, SmartDefault)]
#[serde(rename_all = "lowercase")]
pub enum ObjectMode {
    #[default]
    Object,
    Edit,
}

/// A mesh vertex as the host stores it, coordinates are object local
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshVertex {
    pub index: usize,
    pub co: Vector3,
    pub selected: bool,
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, SmartDefault)]
pub enum Interpolation {
    #[default]
    Linear,
    Cardinal,
    CatmullRom,
    BSpline,
}

impl Interpolation {
    /// Key the host uses for lattice interpolation_type_{u,v,w}
    pub fn host_key(&self) -> &'static str {
        match self {
            Interpolation::Linear => "KEY_LINEAR",
            Interpolation::Cardinal => "KEY_CARDINAL",
            Interpolation::CatmullRom => "KEY_CATMULL_ROM",
            Interpolation::BSpline => "KEY_BSPLINE",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Interpolation::Linear => "Linear",
            Interpolation::Cardinal => "Cardinal",
            Interpolation::CatmullRom => "Catmull-Rom",
            Interpolation::BSpline => "BSpline",
        }
    }
}

impl FromStr for Interpolation {
    type Err = String;

    /// Accepts display names and host keys, e.g. "Catmull-Rom" or "KEY_CATMULL_ROM"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace(['-', '_', ' '], "");
        let key = key.strip_prefix("key").unwrap_or(&key);
        match key {
            "linear" => Ok(Interpolation::Linear),
            "cardinal" => Ok(Interpolation::Cardinal),
            "catmullrom" => Ok(Interpolation::CatmullRom),
            "bspline" => Ok(Interpolation::BSpline),
            _ => Err(format!("unknown interpolation '{s}'")),
        }
    }
}

impl<'de> Deserialize<'de> for Interpolation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}


/// Data block settings of a lattice object, applied on every pose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, SmartDefault)]
pub struct LatticeSettings {
    #[default([2, 2, 2])]
    pub resolution: [usize; 3],
    pub interpolation: Interpolation,
}


/// Everything the pipeline reads from or writes to the host scene.
///
/// Lookups of an id that no longer exists return CageError::StaleObject.
pub trait SceneHost {

    // ---- queries ----------------------------------------------------------

    /// Selected objects in the host's selection order
    fn selected_objects(&self) -> Vec<ObjectId>;
    fn active_object(&self) -> Option<ObjectId>;
    fn contains(&self, id: ObjectId) -> bool;

    fn object_name(&self, id: ObjectId) -> CageResult<String>;
    fn object_kind(&self, id: ObjectId) -> CageResult<ObjectKind>;
    fn object_mode(&self, id: ObjectId) -> CageResult<ObjectMode>;
    fn world_matrix(&self, id: ObjectId) -> CageResult<Matrix4>;

    /// The 8 corners of the object's local bound box, see BBox::corners( ) for the order
    fn local_bound_corners(&self, id: ObjectId) -> CageResult<[Vector3; 8]>;

    /// Vertices in the host's stable order. CageError::NotMesh for other kinds.
    fn mesh_vertices(&self, id: ObjectId) -> CageResult<Vec<MeshVertex>>;

    fn cursor_rotation(&self) -> Quaternion;

    fn weight_groups(&self, id: ObjectId) -> CageResult<Vec<String>>;

    /// Lattice modifier entries on the object, in stack order
    fn lattice_links(&self, id: ObjectId) -> CageResult<Vec<DeformationLink>>;

    // ---- mutations --------------------------------------------------------

    fn set_object_mode(&mut self, id: ObjectId, mode: ObjectMode) -> CageResult<()>;
    fn set_selected(&mut self, id: ObjectId, selected: bool) -> CageResult<()>;
    fn set_active(&mut self, id: ObjectId) -> CageResult<()>;

    /// Create and link a new lattice object. The host may rename it to keep names unique.
    fn create_lattice(&mut self, name: &str) -> CageResult<ObjectId>;
    fn configure_lattice(&mut self, id: ObjectId, settings: &LatticeSettings) -> CageResult<()>;
    fn set_transform(&mut self, id: ObjectId, pose: &CagePose) -> CageResult<()>;
    fn remove_object(&mut self, id: ObjectId) -> CageResult<()>;

    /// Returns the name the group was actually created with
    fn create_weight_group(&mut self, id: ObjectId, name: &str) -> CageResult<String>;
    fn assign_weights(&mut self, id: ObjectId, group: &str, indices: &[usize], weight: Float, mode: WeightCombine) -> CageResult<()>;
    fn remove_weight_group(&mut self, id: ObjectId, name: &str) -> CageResult<()>;

    /// Append a lattice modifier entry, returns the name it was stored under
    fn add_lattice_link(&mut self, id: ObjectId, link: DeformationLink) -> CageResult<String>;
    fn rename_lattice_link(&mut self, id: ObjectId, from: &str, to: &str) -> CageResult<String>;
    fn remove_lattice_link(&mut self, id: ObjectId, name: &str) -> CageResult<()>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_capabilities() {
        assert!(ObjectKind::Mesh.supports_vertex_addressing());
        assert!(!ObjectKind::Curve.supports_vertex_addressing());
        assert!(ObjectKind::Curve.is_deformable());
        assert!(ObjectKind::Lattice.is_deformable());
        assert!(!ObjectKind::Camera.is_deformable());
        assert!(!ObjectKind::Empty.is_deformable());
    }

    #[test]
    fn test_interpolation_parsing() {
        assert_eq!("Linear".parse::<Interpolation>(), Ok(Interpolation::Linear));
        assert_eq!("KEY_CATMULL_ROM".parse::<Interpolation>(), Ok(Interpolation::CatmullRom));
        assert_eq!("catmull-rom".parse::<Interpolation>(), Ok(Interpolation::CatmullRom));
        assert_eq!("BSpline".parse::<Interpolation>(), Ok(Interpolation::BSpline));
        assert_eq!("key_cardinal".parse::<Interpolation>(), Ok(Interpolation::Cardinal));
        assert!("cubic".parse::<Interpolation>().is_err());
    }

    #[test]
    fn test_kind_from_json() {
        let kinds: Vec<ObjectKind> = serde_json::from_str(r#"["mesh", "gpencil", "font"]"#).unwrap();
        assert_eq!(kinds, vec![ObjectKind::Mesh, ObjectKind::GreasePencil, ObjectKind::Font]);
    }
}
