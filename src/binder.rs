/*

    Attach the cage to its source objects.

    One lattice link per object. In vertex mode the link points
    at the object's weight group and is renamed after it, so a
    later cleanup( ) can match links and groups by name.

    A degenerate (flat) cage is bound like any other.

    @date: Oct, 2025
    @author: bartu
*/

use crate::error::CageResult;
use crate::extract::SelectionSet;
use crate::host::{ObjectId, SceneHost};
use crate::weights::{GroupMapping, GROUP_PREFIX, is_reserved_name};
use crate::prelude::*;


/// Lattice modifier entry on a source object
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeformationLink {
    pub name: String,
    /// None once the host deleted the lattice the link pointed at
    pub cage: Option<ObjectId>,
    /// None means the whole object is deformed
    pub weight_group: Option<String>,
}

impl DeformationLink {
    pub fn new(cage: ObjectId) -> Self {
        Self {
            name: GROUP_PREFIX.to_string(),
            cage: Some(cage),
            weight_group: None,
        }
    }

    pub fn with_weight_group(mut self, group: &str) -> Self {
        self.weight_group = Some(group.to_string());
        self
    }

    pub fn is_whole_object(&self) -> bool {
        self.weight_group.is_none()
    }

    pub fn is_reserved(&self) -> bool {
        is_reserved_name(&self.name)
    }
}

pub fn bind<H: SceneHost + ?Sized>(host: &mut H, objects: &SelectionSet, cage: ObjectId, group_mapping: Option<&GroupMapping>) -> CageResult<()> {
    for id in objects.ids() {
        if host.lattice_links(id)?.iter().any(|l| l.cage == Some(cage)) {
            warn!("Object {} is already bound to cage {}, skipping", id, cage);
            continue;
        }

        let group = group_mapping.and_then(|m| m.get(&id));
        let mut link = DeformationLink::new(cage);
        if let Some(group) = group {
            link = link.with_weight_group(group);
        }

        let name = host.add_lattice_link(id, link)?;
        let name = match group {
            Some(group) if *group != name => host.rename_lattice_link(id, &name, group)?,
            _ => name,
        };
        debug!("Bound {} to cage {} through '{}'", id, cage, name);
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_link_is_whole_object() {
        let link = DeformationLink::new(ObjectId::from_raw(3));
        assert!(link.is_whole_object());
        assert!(link.is_reserved());
        assert_eq!(link.name, "SimpleLattice");

        let link = link.with_weight_group("SimpleLattice.1");
        assert!(!link.is_whole_object());
    }
}
