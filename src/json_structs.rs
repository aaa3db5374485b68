/*

    Declare data structs needed to parse scene JSON.

    - VertexData: inline "_data" string and/or a "_plyFile" path
    - SingleOrVec: a JSON field holding one item or an array
    - PlyMesh: vertex block of a .ply file

    @date: 13 Oct, 2025
    @author: Bartu
*/

use serde::Deserialize;
use std::str::FromStr;
use tracing::warn;
use void::Void;

use crate::json_parser::{deser_vertex_data, parse_string_vecvec3};
use crate::numeric::Vector3;

/// Mesh vertices in object local coordinates. Either written inline as
/// "x y z x y z ..." or as {"_data": "...", "_plyFile": "mesh.ply"}.
/// PLY vertices are appended after the inline ones.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VertexData {
    #[serde(rename = "_data", deserialize_with = "deser_vertex_data")]
    pub points: Vec<Vector3>,

    /// Relative to the scene file
    #[serde(rename = "_plyFile")]
    pub ply_file: String,
}

impl VertexData {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

// See deser_string_or_struct( ), the string form lands here
impl FromStr for VertexData {
    type Err = Void;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Malformed strings fall back to no vertices
        let points = parse_string_vecvec3(s).unwrap_or_else(|e| {
            warn!("Ignoring malformed inline vertex data: {}", e);
            Vec::new()
        });
        Ok(VertexData {
            points,
            ply_file: String::new(),
        })
    }
}


// To handle JSON file having a single <object>
// or an array of <object>s
#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum SingleOrVec<T> {
    Empty,
    Single(T),
    Multiple(Vec<T>),
}

impl<T: Clone> SingleOrVec<T>  {
    pub fn all(&self) -> Vec<T> {
        match &self {
            SingleOrVec::Empty => vec![],
            SingleOrVec::Single(t) => vec![t.clone()],
            SingleOrVec::Multiple(vec) => vec.clone(),
        }
    }
}

impl<T> Default for SingleOrVec<T> {
    fn default() -> Self {
        SingleOrVec::Empty
    }
}


#[derive(Deserialize)]
pub struct PlyVertex {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

// Faces are not needed for bounds, only the vertex element is read
#[derive(Deserialize)]
pub struct PlyMesh {
    pub vertex: Vec<PlyVertex>,
}
