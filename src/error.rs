/*

    Errors raised while building or re-posing a lattice cage.

    Selection and stale-state errors are cancellations rather than
    faults, the command registry turns them into Status::Cancelled.
    See CageError::is_cancellation( ).

    @date: Oct, 2025
    @author: bartu
*/

use thiserror::Error;

use crate::host::ObjectId;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CageError {
    /// Nothing deformable is selected.
    #[error("no eligible objects selected")]
    NoEligibleObjects,

    /// Vertex mode was requested but no object has a selected vertex.
    #[error("no vertices selected on any of {0} object(s)")]
    NoSelectedVertices(usize),

    /// Bounds requested for an empty point cloud. Orchestration must prevent this.
    #[error("cannot compute bounds of an empty point cloud")]
    EmptyInput,

    /// A point or the basis rotation has a NaN or infinite component.
    #[error("non-finite {0} in bounds input")]
    NonFinite(&'static str),

    /// A stored identifier no longer resolves in the host.
    #[error("object {0} no longer exists")]
    StaleObject(ObjectId),

    /// Re-pose requested before any cage was created.
    #[error("no cage has been created yet")]
    NotInvoked,

    #[error("object {0} has no mesh data")]
    NotMesh(ObjectId),

    #[error("lattice resolution along {axis} must be at least 2, got {value}")]
    InvalidResolution { axis: char, value: usize },

    #[error("weight group '{name}' not found on object {object}")]
    MissingGroup { object: ObjectId, name: String },

    #[error("lattice link '{name}' not found on object {object}")]
    MissingLink { object: ObjectId, name: String },

    #[error("unknown command '{0}'")]
    UnknownCommand(String),
}

impl CageError {
    /// True for errors that abort the operator without being a fault
    pub fn is_cancellation(&self) -> bool {
        matches!(
            self,
            CageError::NoEligibleObjects
                | CageError::NoSelectedVertices(_)
                | CageError::StaleObject(_)
                | CageError::NotInvoked
        )
    }
}

pub type CageResult<T> = Result<T, CageError>;
