use super::{Id, Placement};

use std::collections::BTreeSet;

/// Reserved prefix of the indicator arrays written for groups
pub const GROUP_PREFIX: &str = "_group ";

/// Reserved prefix of the face bitmask arrays written for surfaces
pub const SURFACE_PREFIX: &str = "_surface ";

/// named set of nodes or elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub(crate) name: String,
    pub(crate) kind: Placement,
    pub(crate) members: BTreeSet<Id>,
}

impl Group {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> Placement {
        self.kind
    }

    pub fn members(&self) -> &BTreeSet<Id> {
        &self.members
    }

    pub fn contains(&self, id: Id) -> bool {
        self.members.contains(&id)
    }

    /// name of the indicator array written for this group
    pub fn array_name(&self) -> String {
        format!("{GROUP_PREFIX}{}", self.name)
    }

    pub(crate) fn restricted<F: Fn(Id) -> bool>(&self, keep: F) -> Self {
        Self {
            name: self.name.clone(),
            kind: self.kind,
            members: self.members.iter().copied().filter(|id| keep(*id)).collect(),
        }
    }
}

/// Named set of element faces
///
/// Faces are addressed by element id and a one-based local face index, following
/// the numbering of the producing solver. On write every element gets a bitmask
/// with bit `face - 1` set for each of its faces on the surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    pub(crate) name: String,
    pub(crate) faces: BTreeSet<(Id, u8)>,
}

impl Surface {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn faces(&self) -> &BTreeSet<(Id, u8)> {
        &self.faces
    }

    pub fn array_name(&self) -> String {
        format!("{SURFACE_PREFIX}{}", self.name)
    }

    /// bitmask of the faces of `element` that lie on this surface
    pub fn mask(&self, element: Id) -> u8 {
        self.faces
            .range((element, 0)..=(element, u8::MAX))
            .fold(0u8, |mask, (_, face)| mask | 1 << (face - 1))
    }

    pub(crate) fn restricted<F: Fn(Id) -> bool>(&self, keep: F) -> Self {
        Self {
            name: self.name.clone(),
            faces: self.faces.iter().copied().filter(|(id, _)| keep(*id)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_mask_sets_one_bit_per_face() {
        let surface = Surface {
            name: "contact".into(),
            faces: [(4, 1), (4, 3), (5, 6)].into_iter().collect(),
        };

        assert_eq!(surface.mask(4), 0b101);
        assert_eq!(surface.mask(5), 0b100000);
        assert_eq!(surface.mask(6), 0);
        assert_eq!(surface.array_name(), "_surface contact");
    }
}
