/*

    The "create lattice" operator.

    Lifecycle of the cage it manages:

        Uninitialized --invoke--> Created --execute--> Posed --execute--> Posed
                                     |                   |
                                     +---- host deleted the cage ----> Discarded

    invoke runs the whole pipeline: selection, extraction, bounds,
    pose, cleanup, weight groups (vertex mode only) and binding.
    execute only re-runs bounds and pose from what invoke stored,
    so weights and links are never touched again.

    Everything that can fail for a user reason (nothing selected,
    no vertex selected) fails before the first write to the host.
    If the host fails after the cage was created, the cage is
    deleted again before the error is returned.

    @date: Oct, 2025
    @author: bartu
*/

use crate::bbox::compute_bounds;
use crate::binder::bind;
use crate::error::{CageError, CageResult};
use crate::extract::{PointCloud, SelectionSet, VertexMapping, count_selected_vertices, extract_vertex_points, extract_whole_object_points};
use crate::host::{Interpolation, LatticeSettings, ObjectId, ObjectMode, SceneHost};
use crate::pose::{CagePose, OrientationBasis, solve_pose};
use crate::registry::{Command, Status};
use crate::weights::{GroupMapping, GROUP_PREFIX, assign_weight_groups, cleanup};
use crate::prelude::*;

pub const OPERATOR_ID: &str = "object.op_latticecreate";
pub const OPERATOR_LABEL: &str = "SimpleLattice";


/// User facing parameters, fixed at creation and re-applied on every pose
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize, SmartDefault)]
#[serde(rename_all = "PascalCase")]
#[serde(default)]
pub struct CageParams {
    pub orientation: OrientationBasis,

    #[default = 2]
    #[serde(deserialize_with = "deser_usize")]
    pub resolution_u: usize,

    #[default = 2]
    #[serde(deserialize_with = "deser_usize")]
    pub resolution_v: usize,

    #[default = 2]
    #[serde(deserialize_with = "deser_usize")]
    pub resolution_w: usize,

    pub interpolation: Interpolation,
}

impl CageParams {
    pub fn lattice_settings(&self) -> CageResult<LatticeSettings> {
        for (axis, value) in [('u', self.resolution_u), ('v', self.resolution_v), ('w', self.resolution_w)] {
            if value < 2 {
                return Err(CageError::InvalidResolution { axis, value });
            }
        }
        Ok(LatticeSettings {
            resolution: [self.resolution_u, self.resolution_v, self.resolution_w],
            interpolation: self.interpolation,
        })
    }
}


/// What invoke keeps around so execute can re-pose without the selection
#[derive(Debug, Clone)]
pub struct CageRecord {
    pub cage: ObjectId,
    pub objects: SelectionSet,
    pub points: PointCloud,
    /// World rotation of the active object at creation
    pub local_reference: Quaternion,
    /// Cursor rotation at creation
    pub cursor_reference: Quaternion,
    pub vertex_mapping: Option<VertexMapping>,
    pub group_mapping: Option<GroupMapping>,
}

impl CageRecord {
    pub fn reference_rotation(&self, basis: OrientationBasis) -> Quaternion {
        match basis {
            OrientationBasis::Global => Quaternion::IDENTITY,
            OrientationBasis::Local => self.local_reference,
            OrientationBasis::Cursor => self.cursor_reference,
        }
    }

    pub fn vertex_mode(&self) -> bool {
        self.vertex_mapping.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub enum CageState {
    #[default]
    Uninitialized,
    Created(CageRecord),
    Posed(CageRecord),
    /// The host no longer has the cage
    Discarded(ObjectId),
}


#[derive(Debug, Clone, Default)]
pub struct LatticeCreateOperator {
    pub params: CageParams,
    state: CageState,
}

impl LatticeCreateOperator {
    pub fn new(params: CageParams) -> Self {
        Self {
            params,
            state: CageState::Uninitialized,
        }
    }

    pub fn state(&self) -> &CageState {
        &self.state
    }

    pub fn record(&self) -> Option<&CageRecord> {
        match &self.state {
            CageState::Created(record) | CageState::Posed(record) => Some(record),
            _ => None,
        }
    }

    pub fn cage(&self) -> Option<ObjectId> {
        self.record().map(|r| r.cage)
    }

    /// True if at least one selected object can carry a lattice
    pub fn poll<H: SceneHost + ?Sized>(host: &H) -> bool {
        !SelectionSet::gather(host).is_empty()
    }

    /// Full pipeline. Leaves the new cage selected and active.
    pub fn create<H: SceneHost + ?Sized>(&mut self, host: &mut H) -> CageResult<CagePose> {
        let objects = SelectionSet::gather(host);
        if objects.is_empty() {
            return Err(CageError::NoEligibleObjects);
        }
        let settings = self.params.lattice_settings()?;

        let vertex_mode = objects.wants_vertex_mode(host)?;
        if vertex_mode && count_selected_vertices(host, &objects)? == 0 {
            return Err(CageError::NoSelectedVertices(objects.len()));
        }

        let local_reference = match host.active_object().filter(|id| host.contains(*id)) {
            Some(active) => rotation_of(&host.world_matrix(active)?),
            None => {
                if self.params.orientation == OrientationBasis::Local {
                    warn!("No active object, using the first selected object as local reference");
                }
                match objects.first() {
                    Some(first) => rotation_of(&host.world_matrix(first)?),
                    None => Quaternion::IDENTITY,
                }
            }
        };
        let cursor_reference = host.cursor_rotation();

        info!("Creating lattice around {} object(s), vertex mode: {}, orientation: {}", objects.len(), vertex_mode, self.params.orientation);

        let (points, vertex_mapping) = if vertex_mode {
            let (points, mapping) = extract_vertex_points(host, &objects)?;
            (points, Some(mapping))
        } else {
            (extract_whole_object_points(host, &objects)?, None)
        };

        let basis = self.params.orientation;
        let reference = match basis {
            OrientationBasis::Global => Quaternion::IDENTITY,
            OrientationBasis::Local => local_reference,
            OrientationBasis::Cursor => cursor_reference,
        };
        let bbox = compute_bounds(&points, &basis.rotation(&reference))?;
        let pose = solve_pose(&bbox, basis, &reference);

        let cage = host.create_lattice(OPERATOR_LABEL)?;
        let mut record = CageRecord {
            cage,
            objects,
            points,
            local_reference,
            cursor_reference,
            vertex_mapping,
            group_mapping: None,
        };

        if let Err(e) = Self::finish_creation(host, &mut record, &settings, &pose) {
            error!("Lattice creation failed after the cage was created: {}", e);
            if let Err(remove_err) = host.remove_object(cage) {
                warn!("Could not remove the partial cage {}: {}", cage, remove_err);
            }
            return Err(e);
        }

        info!("Created lattice '{}' at {} with scale {}", host.object_name(cage)?, pose.location, pose.scale);
        self.state = CageState::Created(record);
        Ok(pose)
    }

    fn finish_creation<H: SceneHost + ?Sized>(host: &mut H, record: &mut CageRecord, settings: &LatticeSettings, pose: &CagePose) -> CageResult<()> {
        let report = cleanup(host, &record.objects);
        if !report.removed_links.is_empty() || !report.removed_groups.is_empty() {
            debug!("Cleanup removed {} stale {} link(s) and {} group(s)", report.removed_links.len(), GROUP_PREFIX, report.removed_groups.len());
        }

        if let Some(vertex_mapping) = &record.vertex_mapping {
            record.group_mapping = Some(assign_weight_groups(host, &record.objects, vertex_mapping)?);
        }

        Self::update_lattice(host, record.cage, settings, pose)?;
        bind(host, &record.objects, record.cage, record.group_mapping.as_ref())?;

        host.set_selected(record.cage, true)?;
        host.set_active(record.cage)?;
        Ok(())
    }

    fn update_lattice<H: SceneHost + ?Sized>(host: &mut H, cage: ObjectId, settings: &LatticeSettings, pose: &CagePose) -> CageResult<()> {
        host.configure_lattice(cage, settings)?;
        host.set_transform(cage, pose)?;
        Ok(())
    }

    /// Bounds and pose only, from the points stored at creation
    pub fn repose<H: SceneHost + ?Sized>(&mut self, host: &mut H) -> CageResult<CagePose> {
        let record = match &self.state {
            CageState::Created(record) | CageState::Posed(record) => record,
            CageState::Uninitialized => return Err(CageError::NotInvoked),
            CageState::Discarded(cage) => return Err(CageError::StaleObject(*cage)),
        };

        let cage = record.cage;
        if !host.contains(cage) {
            warn!("Cage {} was removed, nothing to re-pose", cage);
            self.state = CageState::Discarded(cage);
            return Err(CageError::StaleObject(cage));
        }
        if let Some(missing) = record.objects.ids().into_iter().find(|id| !host.contains(*id)) {
            warn!("Source object {} of cage {} was removed, aborting re-pose", missing, cage);
            return Err(CageError::StaleObject(missing));
        }

        let settings = self.params.lattice_settings()?;
        let basis = self.params.orientation;
        let reference = record.reference_rotation(basis);
        let bbox = compute_bounds(&record.points, &basis.rotation(&reference))?;
        let pose = solve_pose(&bbox, basis, &reference);

        Self::update_lattice(host, cage, &settings, &pose)?;
        host.set_selected(cage, true)?;
        host.set_active(cage)?;
        if host.object_mode(cage)? == ObjectMode::Edit {
            host.set_object_mode(cage, ObjectMode::Object)?;
        }

        debug!("Re-posed cage {} at {}", cage, pose.location);
        self.state = match std::mem::take(&mut self.state) {
            CageState::Created(record) | CageState::Posed(record) => CageState::Posed(record),
            other => other,
        };
        Ok(pose)
    }
}

impl<H: SceneHost + ?Sized> Command<H> for LatticeCreateOperator {
    fn id(&self) -> &'static str {
        OPERATOR_ID
    }

    fn label(&self) -> &'static str {
        OPERATOR_LABEL
    }

    fn poll(&self, host: &H) -> bool {
        Self::poll(host)
    }

    fn invoke(&mut self, host: &mut H) -> CageResult<Status> {
        self.create(host)?;
        Ok(Status::Finished)
    }

    fn execute(&mut self, host: &mut H) -> CageResult<Status> {
        self.repose(host)?;
        Ok(Status::Finished)
    }
}
