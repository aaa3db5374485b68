/*

    Summary of a scene after the operator ran, printed by the
    command line tool as JSON.

    @date: Nov, 2025
    @author: bartu
*/

use crate::host::{ObjectId, ObjectKind, SceneHost};
use crate::pose::CagePose;
use crate::registry::Status;
use crate::scene::Scene;
use crate::prelude::*;


#[derive(Debug, Clone, Serialize)]
pub struct CageSummary {
    pub name: String,
    pub location: Vector3,
    /// XYZ euler angles in degrees
    pub rotation: Vector3,
    pub scale: Vector3,
    pub resolution: [usize; 3],
    pub interpolation: String,
    /// Same interpolation as the host's KEY_* identifier
    pub interpolation_key: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkSummary {
    pub name: String,
    /// None once the lattice was deleted
    pub cage: Option<String>,
    pub weight_group: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupSummary {
    pub name: String,
    pub vertices: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ObjectSummary {
    pub name: String,
    pub kind: ObjectKind,
    pub selected: bool,
    pub links: Vec<LinkSummary>,
    pub weight_groups: Vec<GroupSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CageReport {
    pub status: Status,
    /// The active lattice, if the active object is one
    pub cage: Option<CageSummary>,
    pub objects: Vec<ObjectSummary>,
}

impl CageReport {
    pub fn collect(scene: &Scene, status: Status) -> Self {
        let cage = scene
            .active_object()
            .and_then(|id| scene.object(id))
            .filter(|obj| obj.kind == ObjectKind::Lattice)
            .map(|obj| {
                let settings = obj.lattice.unwrap_or_default();
                let pose = CagePose { location: obj.location, rotation: obj.rotation, scale: obj.scale };
                CageSummary {
                    name: obj.name.clone(),
                    location: pose.location,
                    rotation: radians_to_degrees(pose.rotation_euler()),
                    scale: pose.scale,
                    resolution: settings.resolution,
                    interpolation: settings.interpolation.label().to_string(),
                    interpolation_key: settings.interpolation.host_key().to_string(),
                }
            });

        let name_of = |id: ObjectId| scene.object(id).map(|o| o.name.clone());
        let objects = scene
            .iter()
            .filter(|(_, obj)| obj.kind != ObjectKind::Lattice)
            .map(|(_, obj)| ObjectSummary {
                name: obj.name.clone(),
                kind: obj.kind,
                selected: obj.selected,
                links: obj
                    .links
                    .iter()
                    .map(|l| LinkSummary {
                        name: l.name.clone(),
                        cage: l.cage.and_then(name_of),
                        weight_group: l.weight_group.clone(),
                    })
                    .collect(),
                weight_groups: obj
                    .vertex_groups
                    .iter()
                    .map(|g| GroupSummary { name: g.name.clone(), vertices: g.len() })
                    .collect(),
            })
            .collect();

        Self { status, cage, objects }
    }
}
