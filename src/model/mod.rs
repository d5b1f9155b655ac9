//! In-memory mesh and result representation
//!
//! A [`Model`] holds one part of a mesh at one result increment: its nodes,
//! elements, and the fields, groups, and surfaces attached to them. Models are
//! validated when they are built and every later mutation is checked against
//! the node and element tables, so a model handed to a writer always has
//! consistent references.
//!
//! ```
//! use fevtk::model::{Layout, ModelBuilder, Placement};
//!
//! let mut model = ModelBuilder::new("beam")
//!     .part("PART-1")
//!     .time(0.5)
//!     .node(1, [0.0, 0.0])
//!     .node(2, [1.0, 0.0])
//!     .element(1, "line2", [1, 2])
//!     .build()
//!     .unwrap();
//!
//! model
//!     .add_field("T", Placement::Nodes, [(1, [20.0]), (2, [25.0])], Layout::Scalar)
//!     .unwrap();
//!
//! assert_eq!(model.get_node_field("T").unwrap().len(), 2);
//! ```

mod field;
mod group;

pub use field::{Field, FieldKind, Layout, Placement, Reduction};
pub use group::{Group, Surface, GROUP_PREFIX, SURFACE_PREFIX};

use crate::element;
use crate::Error;

use std::collections::{BTreeMap, BTreeSet};

/// node and element identifier
pub type Id = u64;

/// Reasons a model is rejected at construction or mutation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{placement} id {id} is defined more than once")]
    DuplicateId { placement: Placement, id: Id },
    #[error("{context} references {placement} {id}, which does not exist")]
    DanglingReference {
        context: String,
        placement: Placement,
        id: Id,
    },
    #[error("element {element} of type `{tag}` has {actual} nodes, expected {expected}")]
    Connectivity {
        element: Id,
        tag: String,
        expected: usize,
        actual: usize,
    },
    #[error("element {element} has no nodes")]
    EmptyConnectivity { element: Id },
    #[error("node {node} has {dimensions} coordinates, expected {expected}")]
    Dimension {
        node: Id,
        dimensions: usize,
        expected: usize,
    },
    #[error("coordinates must have one to three components, got {0}")]
    UnsupportedDimension(usize),
    #[error("value for id {id} of field `{field}` has {actual} components, expected {expected}")]
    ComponentMismatch {
        field: String,
        id: Id,
        expected: usize,
        actual: usize,
    },
    #[error("field `{field}` was registered as {previous}, cannot add values as {requested}")]
    LayoutMismatch {
        field: String,
        previous: Layout,
        requested: Layout,
    },
    #[error("layout {0} is not supported")]
    InvalidLayout(Layout),
    #[error("`{name}` contains no members")]
    EmptySet { name: String },
    #[error("a {kind} named `{name}` already exists")]
    DuplicateName { kind: &'static str, name: String },
    #[error("face {face} of element {element} is out of range, elements of type `{tag}` have {faces} faces")]
    FaceIndex {
        element: Id,
        tag: String,
        face: u8,
        faces: u8,
    },
}

/// a field lookup by name that did not match anything
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("no {placement} field named `{name}`")]
pub struct NotFound {
    pub placement: Placement,
    pub name: String,
}

/// connectivity and element type tag of one element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub nodes: Vec<Id>,
}

/// One mesh part at one result increment, with everything attached to it
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    name: String,
    part: String,
    step: String,
    frame: u64,
    time: f64,
    dimensions: usize,
    nodes: BTreeMap<Id, [f64; 3]>,
    elements: BTreeMap<Id, Element>,
    fields: Vec<Field>,
    groups: Vec<Group>,
    surfaces: Vec<Surface>,
}

/// Collects nodes and elements and validates them into a [`Model`]
#[derive(Debug, Clone, Default)]
pub struct ModelBuilder {
    name: String,
    part: String,
    step: String,
    frame: u64,
    time: f64,
    nodes: Vec<(Id, Vec<f64>)>,
    elements: Vec<(Id, Element)>,
}

impl ModelBuilder {
    pub fn new<T: Into<String>>(name: T) -> Self {
        Self {
            name: name.into(),
            part: "part".into(),
            step: "step".into(),
            ..Default::default()
        }
    }

    pub fn part<T: Into<String>>(mut self, part: T) -> Self {
        self.part = part.into();
        self
    }

    pub fn step<T: Into<String>>(mut self, step: T) -> Self {
        self.step = step.into();
        self
    }

    /// increment tag of the producing solver
    pub fn frame(mut self, frame: u64) -> Self {
        self.frame = frame;
        self
    }

    pub fn time(mut self, time: f64) -> Self {
        self.time = time;
        self
    }

    pub fn node<C: AsRef<[f64]>>(mut self, id: Id, coordinates: C) -> Self {
        self.nodes.push((id, coordinates.as_ref().to_vec()));
        self
    }

    pub fn nodes<I, C>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = (Id, C)>,
        C: AsRef<[f64]>,
    {
        self.nodes.extend(
            nodes
                .into_iter()
                .map(|(id, c)| (id, c.as_ref().to_vec())),
        );
        self
    }

    pub fn element<T, N>(mut self, id: Id, tag: T, nodes: N) -> Self
    where
        T: Into<String>,
        N: AsRef<[Id]>,
    {
        let element = Element {
            tag: tag.into(),
            nodes: nodes.as_ref().to_vec(),
        };
        self.elements.push((id, element));
        self
    }

    pub fn elements<I, T, N>(mut self, elements: I) -> Self
    where
        I: IntoIterator<Item = (Id, T, N)>,
        T: Into<String>,
        N: AsRef<[Id]>,
    {
        for (id, tag, nodes) in elements {
            self = self.element(id, tag, nodes);
        }
        self
    }

    /// Validate ids, coordinates, and connectivity and produce the model
    ///
    /// Element tags that the mapping table does not know are accepted here;
    /// whether they abort a write or are skipped is decided by the writer.
    pub fn build(self) -> Result<Model, Error> {
        let dimensions = self.nodes.first().map(|(_, c)| c.len()).unwrap_or(3);
        if !(1..=3).contains(&dimensions) {
            return Err(ValidationError::UnsupportedDimension(dimensions).into());
        }

        let mut nodes = BTreeMap::new();
        for (id, coordinates) in self.nodes {
            if coordinates.len() != dimensions {
                return Err(ValidationError::Dimension {
                    node: id,
                    dimensions: coordinates.len(),
                    expected: dimensions,
                }
                .into());
            }

            let mut padded = [0.0; 3];
            padded[..dimensions].copy_from_slice(&coordinates);

            if nodes.insert(id, padded).is_some() {
                return Err(ValidationError::DuplicateId {
                    placement: Placement::Nodes,
                    id,
                }
                .into());
            }
        }

        let mut elements = BTreeMap::new();
        for (id, element) in self.elements {
            validate_element(id, &element, &nodes)?;

            if elements.insert(id, element).is_some() {
                return Err(ValidationError::DuplicateId {
                    placement: Placement::Elements,
                    id,
                }
                .into());
            }
        }

        Ok(Model {
            name: self.name,
            part: self.part,
            step: self.step,
            frame: self.frame,
            time: self.time,
            dimensions,
            nodes,
            elements,
            fields: Vec::new(),
            groups: Vec::new(),
            surfaces: Vec::new(),
        })
    }
}

fn validate_element(
    id: Id,
    element: &Element,
    nodes: &BTreeMap<Id, [f64; 3]>,
) -> Result<(), ValidationError> {
    if element.nodes.is_empty() {
        return Err(ValidationError::EmptyConnectivity { element: id });
    }

    if let Ok(mapping) = element::lookup(&element.tag) {
        if mapping.node_count != element.nodes.len() {
            return Err(ValidationError::Connectivity {
                element: id,
                tag: element.tag.clone(),
                expected: mapping.node_count,
                actual: element.nodes.len(),
            });
        }
    }

    if let Some(missing) = element.nodes.iter().find(|n| !nodes.contains_key(n)) {
        return Err(ValidationError::DanglingReference {
            context: format!("element {id}"),
            placement: Placement::Nodes,
            id: *missing,
        });
    }

    Ok(())
}

impl Model {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn part(&self) -> &str {
        &self.part
    }

    pub fn step(&self) -> &str {
        &self.step
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// number of coordinates supplied per node
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// node coordinates, padded to three dimensions, ascending by id
    pub fn nodes(&self) -> &BTreeMap<Id, [f64; 3]> {
        &self.nodes
    }

    pub fn elements(&self) -> &BTreeMap<Id, Element> {
        &self.elements
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn surfaces(&self) -> &[Surface] {
        &self.surfaces
    }

    fn contains(&self, placement: Placement, id: Id) -> bool {
        match placement {
            Placement::Nodes => self.nodes.contains_key(&id),
            Placement::Elements => self.elements.contains_key(&id),
        }
    }

    /// Attach values to nodes or elements
    ///
    /// Every value must carry exactly `layout.components()` entries. Adding a
    /// field whose name and placement already exist appends a further sample
    /// per id; the layout must then match the earlier registration. Nothing is
    /// stored unless every value is valid.
    pub fn add_field<N, I, V>(
        &mut self,
        name: N,
        placement: Placement,
        values: I,
        layout: Layout,
    ) -> Result<(), Error>
    where
        N: Into<String>,
        I: IntoIterator<Item = (Id, V)>,
        V: AsRef<[f64]>,
    {
        let name = name.into();

        if !layout.is_valid() {
            return Err(ValidationError::InvalidLayout(layout).into());
        }

        let existing = self
            .fields
            .iter()
            .position(|f| f.name == name && f.placement == placement);

        if let Some(index) = existing {
            let previous = self.fields[index].layout;
            if previous != layout {
                return Err(ValidationError::LayoutMismatch {
                    field: name,
                    previous,
                    requested: layout,
                }
                .into());
            }
        }

        let components = layout.components();
        let mut staged = Vec::new();

        for (id, value) in values {
            let value = value.as_ref();

            if !self.contains(placement, id) {
                return Err(ValidationError::DanglingReference {
                    context: format!("field `{name}`"),
                    placement,
                    id,
                }
                .into());
            }

            if value.len() != components {
                return Err(ValidationError::ComponentMismatch {
                    field: name,
                    id,
                    expected: components,
                    actual: value.len(),
                }
                .into());
            }

            staged.push((id, value.to_vec()));
        }

        let index = match existing {
            Some(index) => index,
            None => {
                self.fields.push(Field::new(name, placement, layout));
                self.fields.len() - 1
            }
        };

        let field = &mut self.fields[index];
        for (id, value) in staged {
            field.values.entry(id).or_default().extend(value);
        }

        Ok(())
    }

    /// Choose how multiple samples per id of a field are collapsed on write
    pub fn set_field_reduction(
        &mut self,
        placement: Placement,
        name: &str,
        reduction: Reduction,
    ) -> Result<(), Error> {
        let field = self
            .fields
            .iter_mut()
            .find(|f| f.placement == placement && f.name == name)
            .ok_or_else(|| NotFound {
                placement,
                name: name.into(),
            })?;

        field.reduction = Some(reduction);
        Ok(())
    }

    pub fn add_node_group<N, I>(&mut self, name: N, ids: I) -> Result<(), Error>
    where
        N: Into<String>,
        I: IntoIterator<Item = Id>,
    {
        self.add_group(name.into(), Placement::Nodes, ids.into_iter().collect())
    }

    pub fn add_element_group<N, I>(&mut self, name: N, ids: I) -> Result<(), Error>
    where
        N: Into<String>,
        I: IntoIterator<Item = Id>,
    {
        self.add_group(name.into(), Placement::Elements, ids.into_iter().collect())
    }

    fn add_group(
        &mut self,
        name: String,
        kind: Placement,
        members: BTreeSet<Id>,
    ) -> Result<(), Error> {
        if members.is_empty() {
            return Err(ValidationError::EmptySet { name }.into());
        }

        if self.groups.iter().any(|g| g.kind == kind && g.name == name) {
            let kind = match kind {
                Placement::Nodes => "node group",
                Placement::Elements => "element group",
            };
            return Err(ValidationError::DuplicateName { kind, name }.into());
        }

        if let Some(missing) = members.iter().find(|id| !self.contains(kind, **id)) {
            return Err(ValidationError::DanglingReference {
                context: format!("group `{name}`"),
                placement: kind,
                id: *missing,
            }
            .into());
        }

        self.groups.push(Group {
            name,
            kind,
            members,
        });
        Ok(())
    }

    /// Add a surface made of (element id, one-based local face index) pairs
    pub fn add_surface<N, I>(&mut self, name: N, faces: I) -> Result<(), Error>
    where
        N: Into<String>,
        I: IntoIterator<Item = (Id, u8)>,
    {
        let name = name.into();
        let faces: BTreeSet<(Id, u8)> = faces.into_iter().collect();

        if faces.is_empty() {
            return Err(ValidationError::EmptySet { name }.into());
        }

        if self.surfaces.iter().any(|s| s.name == name) {
            return Err(ValidationError::DuplicateName {
                kind: "surface",
                name,
            }
            .into());
        }

        for &(id, face) in &faces {
            let element = self.elements.get(&id).ok_or_else(|| {
                ValidationError::DanglingReference {
                    context: format!("surface `{name}`"),
                    placement: Placement::Elements,
                    id,
                }
            })?;

            // faces of unknown element types can only be bounded by the bitmask width
            let count = element::lookup(&element.tag)
                .map(|m| m.cell_type.num_faces())
                .unwrap_or(8);

            if face == 0 || face > count {
                return Err(ValidationError::FaceIndex {
                    element: id,
                    tag: element.tag.clone(),
                    face,
                    faces: count,
                }
                .into());
            }
        }

        self.surfaces.push(Surface { name, faces });
        Ok(())
    }

    /// fields with the given placement, in registration order
    pub fn get_fields_by_type(&self, placement: Placement) -> Vec<&Field> {
        self.fields
            .iter()
            .filter(|f| f.placement == placement)
            .collect()
    }

    /// fields with the given placement and kind, in registration order
    pub fn get_fields_by_kind(&self, placement: Placement, kind: FieldKind) -> Vec<&Field> {
        self.fields
            .iter()
            .filter(|f| f.placement == placement && f.layout.kind() == kind)
            .collect()
    }

    pub fn get_node_field(&self, name: &str) -> Result<&Field, Error> {
        self.get_field(Placement::Nodes, name)
    }

    pub fn get_element_field(&self, name: &str) -> Result<&Field, Error> {
        self.get_field(Placement::Elements, name)
    }

    fn get_field(&self, placement: Placement, name: &str) -> Result<&Field, Error> {
        self.fields
            .iter()
            .find(|f| f.placement == placement && f.name == name)
            .ok_or_else(|| {
                NotFound {
                    placement,
                    name: name.into(),
                }
                .into()
            })
    }

    pub(crate) fn retain_fields<F: FnMut(&Field) -> bool>(&mut self, keep: F) {
        self.fields.retain(keep);
    }

    pub(crate) fn retain_groups<F: FnMut(&Group) -> bool>(&mut self, keep: F) {
        self.groups.retain(keep);
    }

    pub(crate) fn retain_surfaces<F: FnMut(&Surface) -> bool>(&mut self, keep: F) {
        self.surfaces.retain(keep);
    }

    /// Build a new model from a subset of the elements
    ///
    /// The new model keeps the nodes those elements reference, and every field,
    /// group, and surface restricted to the kept ids. Groups and surfaces stay
    /// registered even when none of their members survive.
    pub fn extract_submodel<I>(&self, element_ids: I) -> Result<Model, Error>
    where
        I: IntoIterator<Item = Id>,
    {
        let mut elements = BTreeMap::new();
        for id in element_ids {
            let element = self.elements.get(&id).ok_or_else(|| {
                ValidationError::DanglingReference {
                    context: "submodel selection".into(),
                    placement: Placement::Elements,
                    id,
                }
            })?;
            elements.insert(id, element.clone());
        }

        let node_ids: BTreeSet<Id> = elements
            .values()
            .flat_map(|e| e.nodes.iter().copied())
            .collect();

        let nodes = node_ids
            .iter()
            .map(|id| (*id, self.nodes[id]))
            .collect();

        let keep = |placement: Placement, id: Id| match placement {
            Placement::Nodes => node_ids.contains(&id),
            Placement::Elements => elements.contains_key(&id),
        };

        let fields = self
            .fields
            .iter()
            .map(|f| f.restricted(|id| keep(f.placement, id)))
            .collect();

        let groups = self
            .groups
            .iter()
            .map(|g| g.restricted(|id| keep(g.kind, id)))
            .collect();

        let surfaces = self
            .surfaces
            .iter()
            .map(|s| s.restricted(|id| elements.contains_key(&id)))
            .collect();

        Ok(Model {
            name: self.name.clone(),
            part: self.part.clone(),
            step: self.step.clone(),
            frame: self.frame,
            time: self.time,
            dimensions: self.dimensions,
            nodes,
            elements,
            fields,
            groups,
            surfaces,
        })
    }

    /// Partition the elements into `pieces` contiguous runs of ascending ids
    ///
    /// Every run holds `num_elements / pieces` elements and the last one also
    /// takes the remainder, so with fewer elements than pieces the leading
    /// pieces are empty.
    pub fn split_model(&self, pieces: usize) -> Result<Vec<Model>, Error> {
        if pieces == 0 {
            return Err(crate::UsageError::ZeroPieces.into());
        }

        let ids: Vec<Id> = self.elements.keys().copied().collect();
        let chunk = ids.len() / pieces;

        (0..pieces)
            .map(|piece| {
                let start = piece * chunk;
                let end = if piece + 1 == pieces {
                    ids.len()
                } else {
                    start + chunk
                };
                self.extract_submodel(ids[start..end].iter().copied())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip() -> Model {
        // three quads in a row
        ModelBuilder::new("strip")
            .nodes((1..=8).map(|id| {
                let x = ((id - 1) / 2) as f64;
                let y = ((id - 1) % 2) as f64;
                (id, [x, y])
            }))
            .element(10, "quad4", [1, 3, 4, 2])
            .element(11, "quad4", [3, 5, 6, 4])
            .element(12, "quad4", [5, 7, 8, 6])
            .build()
            .unwrap()
    }

    fn validation(err: Error) -> ValidationError {
        match err {
            Error::Validation(v) => v,
            other => panic!("expected a validation error, got {other}"),
        }
    }

    #[test]
    fn coordinates_are_padded() {
        let model = strip();
        assert_eq!(model.dimensions(), 2);
        assert_eq!(model.nodes()[&8], [3.0, 1.0, 0.0]);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = ModelBuilder::new("m")
            .node(1, [0.0])
            .node(1, [1.0])
            .build()
            .unwrap_err();
        assert_eq!(
            validation(err),
            ValidationError::DuplicateId {
                placement: Placement::Nodes,
                id: 1
            }
        );

        let err = ModelBuilder::new("m")
            .node(1, [0.0])
            .node(2, [1.0])
            .element(1, "line2", [1, 2])
            .element(1, "line2", [2, 1])
            .build()
            .unwrap_err();
        assert!(matches!(
            validation(err),
            ValidationError::DuplicateId {
                placement: Placement::Elements,
                ..
            }
        ));
    }

    #[test]
    fn dangling_nodes_and_bad_connectivity() {
        let err = ModelBuilder::new("m")
            .node(1, [0.0, 0.0, 0.0])
            .element(1, "line2", [1, 7])
            .build()
            .unwrap_err();
        assert!(matches!(
            validation(err),
            ValidationError::DanglingReference { id: 7, .. }
        ));

        let err = ModelBuilder::new("m")
            .node(1, [0.0, 0.0, 0.0])
            .node(2, [1.0, 0.0, 0.0])
            .element(1, "tri3", [1, 2])
            .build()
            .unwrap_err();
        assert_eq!(
            validation(err),
            ValidationError::Connectivity {
                element: 1,
                tag: "tri3".into(),
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn mixed_dimensions_are_rejected() {
        let err = ModelBuilder::new("m")
            .node(1, [0.0, 0.0])
            .node(2, [1.0, 0.0, 0.0])
            .build()
            .unwrap_err();
        assert!(matches!(
            validation(err),
            ValidationError::Dimension { node: 2, .. }
        ));

        let err = ModelBuilder::new("m")
            .node(1, [0.0; 4])
            .build()
            .unwrap_err();
        assert_eq!(validation(err), ValidationError::UnsupportedDimension(4));
    }

    #[test]
    fn unknown_tags_pass_construction() {
        let model = ModelBuilder::new("m")
            .node(1, [0.0])
            .element(1, "SPRINGA", [1])
            .build()
            .unwrap();
        assert_eq!(model.num_elements(), 1);
    }

    #[test]
    fn add_field_checks_ids_and_components() {
        let mut model = strip();

        let err = model
            .add_field("S", Placement::Elements, [(99, [1.0])], Layout::Scalar)
            .unwrap_err();
        assert!(matches!(
            validation(err),
            ValidationError::DanglingReference { id: 99, .. }
        ));

        let err = model
            .add_field("U", Placement::Nodes, [(1, [1.0, 2.0])], Layout::Vector(3))
            .unwrap_err();
        assert!(matches!(
            validation(err),
            ValidationError::ComponentMismatch { expected: 3, actual: 2, .. }
        ));

        // a failed call leaves nothing behind
        assert!(model.fields().is_empty());
    }

    #[test]
    fn repeated_registration_appends_samples() {
        let mut model = strip();
        model
            .add_field("S", Placement::Elements, [(10, [1.0]), (11, [2.0])], Layout::Scalar)
            .unwrap();
        model
            .add_field("S", Placement::Elements, [(10, [-4.0])], Layout::Scalar)
            .unwrap();

        let field = model.get_element_field("S").unwrap();
        assert_eq!(field.samples(10), Some(&[1.0, -4.0][..]));
        assert_eq!(field.sample_count(11), 1);
        assert_eq!(model.fields().len(), 1);

        let err = model
            .add_field("S", Placement::Elements, [(10, [1.0, 2.0])], Layout::Vector(2))
            .unwrap_err();
        assert!(matches!(
            validation(err),
            ValidationError::LayoutMismatch { .. }
        ));
    }

    #[test]
    fn same_name_different_placement_are_distinct() {
        let mut model = strip();
        model
            .add_field("T", Placement::Nodes, [(1, [1.0])], Layout::Scalar)
            .unwrap();
        model
            .add_field("T", Placement::Elements, [(10, [1.0, 0.0])], Layout::Vector(2))
            .unwrap();

        assert_eq!(model.get_fields_by_type(Placement::Nodes).len(), 1);
        assert_eq!(model.get_fields_by_type(Placement::Elements).len(), 1);
        assert_eq!(
            model
                .get_fields_by_kind(Placement::Elements, FieldKind::Vector)
                .len(),
            1
        );
    }

    #[test]
    fn lookups_fail_with_not_found() {
        let model = strip();
        match model.get_node_field("U") {
            Err(Error::NotFound(e)) => {
                assert_eq!(e.name, "U");
                assert_eq!(e.placement, Placement::Nodes);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn fields_by_type_keep_registration_order() {
        let mut model = strip();
        for name in ["c", "a", "b"] {
            model
                .add_field(name, Placement::Nodes, [(1, [0.0])], Layout::Scalar)
                .unwrap();
        }
        let names: Vec<_> = model
            .get_fields_by_type(Placement::Nodes)
            .iter()
            .map(|f| f.name())
            .collect();
        assert_eq!(names, ["c", "a", "b"]);
    }

    #[test]
    fn groups_reject_empty_unknown_and_duplicate() {
        let mut model = strip();

        let err = model.add_node_group("none", Vec::<Id>::new()).unwrap_err();
        assert!(matches!(validation(err), ValidationError::EmptySet { .. }));

        let err = model.add_element_group("far", [10, 42]).unwrap_err();
        assert!(matches!(
            validation(err),
            ValidationError::DanglingReference { id: 42, .. }
        ));

        model.add_element_group("left", [10]).unwrap();
        let err = model.add_element_group("left", [11]).unwrap_err();
        assert!(matches!(
            validation(err),
            ValidationError::DuplicateName { .. }
        ));

        // node and element groups live in separate namespaces
        model.add_node_group("left", [1, 2]).unwrap();
        assert_eq!(model.groups().len(), 2);
    }

    #[test]
    fn surfaces_check_face_range() {
        let mut model = strip();
        model.add_surface("bottom", [(10, 1), (11, 1)]).unwrap();

        let err = model.add_surface("bad", [(10, 5)]).unwrap_err();
        assert!(matches!(
            validation(err),
            ValidationError::FaceIndex { face: 5, faces: 4, .. }
        ));

        let err = model.add_surface("zero", [(10, 0)]).unwrap_err();
        assert!(matches!(validation(err), ValidationError::FaceIndex { .. }));
    }

    #[test]
    fn split_absorbs_remainder_in_last_piece() {
        let mut model = strip();
        model
            .add_field("U", Placement::Nodes, [(1, [1.0]), (8, [2.0])], Layout::Scalar)
            .unwrap();
        model.add_element_group("right", [12]).unwrap();

        let pieces = model.split_model(2).unwrap();
        assert_eq!(pieces.len(), 2);

        let first: Vec<_> = pieces[0].elements().keys().copied().collect();
        let last: Vec<_> = pieces[1].elements().keys().copied().collect();
        assert_eq!(first, [10]);
        assert_eq!(last, [11, 12]);

        assert_eq!(pieces[0].nodes().keys().copied().collect::<Vec<_>>(), [1, 2, 3, 4]);
        assert_eq!(pieces[0].get_node_field("U").unwrap().len(), 1);
        assert_eq!(pieces[1].get_node_field("U").unwrap().len(), 1);

        // groups are kept even when no member survives
        assert!(pieces[0].groups()[0].members().is_empty());
        assert!(pieces[1].groups()[0].contains(12));

        // the source model is left untouched
        assert_eq!(model.num_elements(), 3);
    }

    #[test]
    fn more_pieces_than_elements() {
        let pieces = strip().split_model(5).unwrap();
        assert_eq!(pieces.len(), 5);
        assert!(pieces[..4].iter().all(|p| p.num_elements() == 0));
        assert_eq!(pieces[4].num_elements(), 3);
    }

    #[test]
    fn zero_pieces_is_a_usage_error() {
        assert!(matches!(
            strip().split_model(0),
            Err(Error::Usage(crate::UsageError::ZeroPieces))
        ));
    }
}
