//! Mapping from producer element tags to VTK cell types.
//!
//! Two families of tags are understood:
//!
//! * neutral tags (`line2`, `tri6`, `hex20`, ...) whose node order already
//!   follows the VTK convention, and
//! * Abaqus element names (`C3D8R`, `CPS4`, `B32`, `DC2D3`, ...), decoded from
//!   their family prefix and node count.
//!
//! ```
//! use fevtk::element::{lookup, CellType};
//!
//! let mapping = lookup("C3D20R").unwrap();
//! assert_eq!(mapping.cell_type, CellType::QuadraticHexahedron);
//! assert_eq!(mapping.node_count, 20);
//! ```

use crate::model::Id;

/// VTK linear and quadratic cell types, with their `types` array codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CellType {
    Line = 3,
    Triangle = 5,
    Quad = 9,
    Tetra = 10,
    Hexahedron = 12,
    Wedge = 13,
    Pyramid = 14,
    QuadraticEdge = 21,
    QuadraticTriangle = 22,
    QuadraticQuad = 23,
    QuadraticTetra = 24,
    QuadraticHexahedron = 25,
    QuadraticWedge = 26,
    QuadraticPyramid = 27,
    BiquadraticQuad = 28,
    TriquadraticHexahedron = 29,
}

impl CellType {
    /// the code written to the `types` array of a piece
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        let cell = match code {
            3 => Self::Line,
            5 => Self::Triangle,
            9 => Self::Quad,
            10 => Self::Tetra,
            12 => Self::Hexahedron,
            13 => Self::Wedge,
            14 => Self::Pyramid,
            21 => Self::QuadraticEdge,
            22 => Self::QuadraticTriangle,
            23 => Self::QuadraticQuad,
            24 => Self::QuadraticTetra,
            25 => Self::QuadraticHexahedron,
            26 => Self::QuadraticWedge,
            27 => Self::QuadraticPyramid,
            28 => Self::BiquadraticQuad,
            29 => Self::TriquadraticHexahedron,
            _ => return None,
        };
        Some(cell)
    }

    /// number of points a cell of this type is made of
    pub fn num_points(self) -> usize {
        match self {
            Self::Line => 2,
            Self::Triangle => 3,
            Self::Quad => 4,
            Self::Tetra => 4,
            Self::Hexahedron => 8,
            Self::Wedge => 6,
            Self::Pyramid => 5,
            Self::QuadraticEdge => 3,
            Self::QuadraticTriangle => 6,
            Self::QuadraticQuad => 8,
            Self::QuadraticTetra => 10,
            Self::QuadraticHexahedron => 20,
            Self::QuadraticWedge => 15,
            Self::QuadraticPyramid => 13,
            Self::BiquadraticQuad => 9,
            Self::TriquadraticHexahedron => 27,
        }
    }

    /// number of local faces (edges for planar cells, ends for lines)
    ///
    /// surface definitions address faces with one-based indices up to this value
    pub fn num_faces(self) -> u8 {
        match self {
            Self::Line | Self::QuadraticEdge => 2,
            Self::Triangle | Self::QuadraticTriangle => 3,
            Self::Quad | Self::QuadraticQuad | Self::BiquadraticQuad => 4,
            Self::Tetra | Self::QuadraticTetra => 4,
            Self::Wedge | Self::QuadraticWedge => 5,
            Self::Pyramid | Self::QuadraticPyramid => 5,
            Self::Hexahedron | Self::QuadraticHexahedron | Self::TriquadraticHexahedron => 6,
        }
    }
}

/// Result of looking up an element tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementMapping {
    pub cell_type: CellType,
    /// number of nodes an element with this tag must reference
    pub node_count: usize,
    /// `permutation[i]` is the producer node position written at VTK position `i`
    pub permutation: Option<&'static [usize]>,
}

impl ElementMapping {
    fn new(cell_type: CellType) -> Self {
        Self {
            cell_type,
            node_count: cell_type.num_points(),
            permutation: None,
        }
    }

    fn permuted(cell_type: CellType, permutation: &'static [usize]) -> Self {
        Self {
            cell_type,
            node_count: cell_type.num_points(),
            permutation: Some(permutation),
        }
    }

    /// reorder a producer connectivity list into VTK node order
    pub fn reorder<T: Copy>(&self, nodes: &[T]) -> Vec<T> {
        match self.permutation {
            Some(permutation) => permutation.iter().map(|&i| nodes[i]).collect(),
            None => nodes.to_vec(),
        }
    }
}

/// Abaqus places the midside node of quadratic lines between the end nodes
const QUADRATIC_LINE_ORDER: &[usize] = &[0, 2, 1];

/// Abaqus numbers the face centers of 27 node bricks bottom, top, front, right, back, left
const TRIQUADRATIC_HEX_ORDER: &[usize] = &[
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 25, 23, 22, 24, 20,
    21, 26,
];

/// element tag that has no VTK counterpart
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("unsupported element type `{tag}`{}", .element.map(|id| format!(" on element {id}")).unwrap_or_default())]
pub struct UnsupportedElement {
    pub tag: String,
    pub element: Option<Id>,
}

impl UnsupportedElement {
    pub fn new<T: Into<String>>(tag: T) -> Self {
        Self {
            tag: tag.into(),
            element: None,
        }
    }

    pub(crate) fn on_element(mut self, element: Id) -> Self {
        self.element = Some(element);
        self
    }
}

/// Look up the VTK cell type, node count, and node order for an element tag
pub fn lookup(tag: &str) -> Result<ElementMapping, UnsupportedElement> {
    neutral(tag)
        .or_else(|| abaqus(tag))
        .ok_or_else(|| UnsupportedElement::new(tag))
}

fn neutral(tag: &str) -> Option<ElementMapping> {
    let cell = match tag {
        "line2" => CellType::Line,
        "line3" => CellType::QuadraticEdge,
        "tri3" => CellType::Triangle,
        "tri6" => CellType::QuadraticTriangle,
        "quad4" => CellType::Quad,
        "quad8" => CellType::QuadraticQuad,
        "quad9" => CellType::BiquadraticQuad,
        "tet4" => CellType::Tetra,
        "tet10" => CellType::QuadraticTetra,
        "hex8" => CellType::Hexahedron,
        "hex20" => CellType::QuadraticHexahedron,
        "hex27" => CellType::TriquadraticHexahedron,
        "wedge6" => CellType::Wedge,
        "wedge15" => CellType::QuadraticWedge,
        "pyramid5" => CellType::Pyramid,
        "pyramid13" => CellType::QuadraticPyramid,
        _ => return None,
    };
    Some(ElementMapping::new(cell))
}

#[derive(Clone, Copy)]
enum Family {
    Line,
    Planar,
    Solid,
}

/// element name prefixes, longest first so that `CPEG` wins over `CPE`
const ABAQUS_FAMILIES: &[(&str, Family)] = &[
    ("DCC1D", Family::Line),
    ("DCC2D", Family::Planar),
    ("DCC3D", Family::Solid),
    ("DCCAX", Family::Planar),
    ("SFM3D", Family::Planar),
    ("EMC2D", Family::Planar),
    ("EMC3D", Family::Solid),
    ("SHEAR", Family::Planar),
    ("CPEG", Family::Planar),
    ("CGAX", Family::Planar),
    ("DC1D", Family::Line),
    ("DC2D", Family::Planar),
    ("DC3D", Family::Solid),
    ("DCAX", Family::Planar),
    ("AC1D", Family::Line),
    ("AC2D", Family::Planar),
    ("AC3D", Family::Solid),
    ("ACAX", Family::Planar),
    ("EC3D", Family::Solid),
    ("STRI", Family::Planar),
    ("CPE", Family::Planar),
    ("CPS", Family::Planar),
    ("CAX", Family::Planar),
    ("C3D", Family::Solid),
    ("Q3D", Family::Solid),
    ("CSS", Family::Solid),
    ("M3D", Family::Planar),
    ("R2D", Family::Line),
    ("R3D", Family::Planar),
    ("T2D", Family::Line),
    ("T3D", Family::Line),
    ("DS", Family::Planar),
    // continuum shells are bricks and wedges
    ("SC", Family::Solid),
    ("S", Family::Planar),
];

/// a dimension digit then the interpolation order: `B21`, `PIPE32H`, `ELBOW31B`
const ABAQUS_BEAMS: &[&str] = &["ELBOW", "PIPE", "B"];

/// the interpolation order alone: `SAX1`, `DSAX2`
const ABAQUS_AXISYMMETRIC_SHELLS: &[&str] = &["DSAX", "SAX"];

/// names that carry no node count
fn abaqus_named(tag: &str) -> Option<ElementMapping> {
    let cell = match tag {
        "FRAME2D" | "FRAME3D" | "RAX2" | "RB2D2" | "RB3D2" | "DCCAX2" | "DCCAX2D" => {
            CellType::Line
        }
        "STRI65" => CellType::QuadraticTriangle,
        _ => return None,
    };
    Some(ElementMapping::new(cell))
}

fn strip_any<'a>(tag: &'a str, prefixes: &[&str]) -> Option<&'a str> {
    prefixes.iter().find_map(|prefix| tag.strip_prefix(prefix))
}

/// two node line for linear and cubic interpolation, midside node for quadratic
fn line_of_order(order: char) -> Option<ElementMapping> {
    match order {
        '1' | '3' => Some(ElementMapping::new(CellType::Line)),
        '2' => Some(ElementMapping::permuted(
            CellType::QuadraticEdge,
            QUADRATIC_LINE_ORDER,
        )),
        _ => None,
    }
}

fn abaqus(tag: &str) -> Option<ElementMapping> {
    let upper = tag.to_ascii_uppercase();

    if let Some(mapping) = abaqus_named(&upper) {
        return Some(mapping);
    }

    if let Some(rest) = strip_any(&upper, ABAQUS_BEAMS) {
        let mut digits = rest.chars();
        if !matches!(digits.next()?, '2' | '3') {
            return None;
        }
        return line_of_order(digits.next()?);
    }

    if let Some(rest) = strip_any(&upper, ABAQUS_AXISYMMETRIC_SHELLS) {
        return match rest.chars().next()? {
            '3' => None,
            order => line_of_order(order),
        };
    }

    let (family, rest) = ABAQUS_FAMILIES
        .iter()
        .find_map(|(prefix, family)| upper.strip_prefix(prefix).map(|rest| (*family, rest)))?;

    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    let nodes: usize = digits.parse().ok()?;

    let mapping = match (family, nodes) {
        (Family::Line, 2) => ElementMapping::new(CellType::Line),
        (Family::Line, 3) => ElementMapping::permuted(CellType::QuadraticEdge, QUADRATIC_LINE_ORDER),
        (Family::Planar, 3) => ElementMapping::new(CellType::Triangle),
        (Family::Planar, 4) => ElementMapping::new(CellType::Quad),
        (Family::Planar, 6) => ElementMapping::new(CellType::QuadraticTriangle),
        (Family::Planar, 8) => ElementMapping::new(CellType::QuadraticQuad),
        (Family::Planar, 9) => ElementMapping::new(CellType::BiquadraticQuad),
        (Family::Solid, 4) => ElementMapping::new(CellType::Tetra),
        (Family::Solid, 5) => ElementMapping::new(CellType::Pyramid),
        (Family::Solid, 6) => ElementMapping::new(CellType::Wedge),
        (Family::Solid, 8) => ElementMapping::new(CellType::Hexahedron),
        (Family::Solid, 10) => ElementMapping::new(CellType::QuadraticTetra),
        (Family::Solid, 13) => ElementMapping::new(CellType::QuadraticPyramid),
        (Family::Solid, 15) => ElementMapping::new(CellType::QuadraticWedge),
        (Family::Solid, 20) => ElementMapping::new(CellType::QuadraticHexahedron),
        (Family::Solid, 27) => {
            ElementMapping::permuted(CellType::TriquadraticHexahedron, TRIQUADRATIC_HEX_ORDER)
        }
        _ => return None,
    };

    Some(mapping)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_tags_cover_linear_and_quadratic_shapes() {
        let expected = [
            ("line2", 3, 2),
            ("line3", 21, 3),
            ("tri3", 5, 3),
            ("tri6", 22, 6),
            ("quad4", 9, 4),
            ("quad8", 23, 8),
            ("tet4", 10, 4),
            ("tet10", 24, 10),
            ("hex8", 12, 8),
            ("hex20", 25, 20),
            ("wedge6", 13, 6),
            ("wedge15", 26, 15),
            ("pyramid5", 14, 5),
            ("pyramid13", 27, 13),
        ];

        for (tag, code, nodes) in expected {
            let mapping = lookup(tag).unwrap();
            assert_eq!(mapping.cell_type.code(), code, "{tag}");
            assert_eq!(mapping.node_count, nodes, "{tag}");
            assert!(mapping.permutation.is_none());
        }
    }

    #[test]
    fn abaqus_suffixes_are_ignored() {
        assert_eq!(lookup("C3D8R").unwrap().cell_type, CellType::Hexahedron);
        assert_eq!(lookup("C3D10MH").unwrap().cell_type, CellType::QuadraticTetra);
        assert_eq!(lookup("CPEG8RH").unwrap().cell_type, CellType::QuadraticQuad);
        assert_eq!(lookup("CAX4RT").unwrap().cell_type, CellType::Quad);
        assert_eq!(lookup("S3R").unwrap().cell_type, CellType::Triangle);
        assert_eq!(lookup("DC1D2").unwrap().cell_type, CellType::Line);
        assert_eq!(lookup("T3D2").unwrap().cell_type, CellType::Line);
    }

    #[test]
    fn shells_pipes_and_special_purpose_elements() {
        let expected = [
            ("SC6R", CellType::Wedge),
            ("SC8RT", CellType::Hexahedron),
            ("Q3D10MH", CellType::QuadraticTetra),
            ("Q3D20R", CellType::QuadraticHexahedron),
            ("EMC2D3", CellType::Triangle),
            ("EMC3D6", CellType::Wedge),
            ("EC3D8RT", CellType::Hexahedron),
            ("CSS8", CellType::Hexahedron),
            ("DS6", CellType::QuadraticTriangle),
            ("DS8", CellType::QuadraticQuad),
            ("STRI3", CellType::Triangle),
            ("STRI65", CellType::QuadraticTriangle),
            ("SHEAR4", CellType::Quad),
            ("PIPE31H", CellType::Line),
            ("PIPE22", CellType::QuadraticEdge),
            ("ELBOW31B", CellType::Line),
            ("ELBOW32", CellType::QuadraticEdge),
            ("FRAME3D", CellType::Line),
            ("SAX1", CellType::Line),
            ("DSAX2", CellType::QuadraticEdge),
            ("RAX2", CellType::Line),
            ("RB2D2", CellType::Line),
            ("RB3D2", CellType::Line),
            ("DCCAX2D", CellType::Line),
            ("DCCAX4", CellType::Quad),
        ];

        for (tag, cell) in expected {
            assert_eq!(lookup(tag).unwrap().cell_type, cell, "{tag}");
        }

        assert_eq!(lookup("PIPE32").unwrap().reorder(&[1, 2, 3]), vec![1, 3, 2]);
        assert!(lookup("SAX3").is_err());
        assert!(lookup("PIPE41").is_err());
    }

    #[test]
    fn quadratic_lines_move_the_midside_node_last() {
        let mapping = lookup("B32").unwrap();
        assert_eq!(mapping.cell_type, CellType::QuadraticEdge);
        assert_eq!(mapping.reorder(&[10, 11, 12]), vec![10, 12, 11]);

        let mapping = lookup("DC1D3").unwrap();
        assert_eq!(mapping.reorder(&["a", "mid", "b"]), vec!["a", "b", "mid"]);
    }

    #[test]
    fn triquadratic_brick_face_centers() {
        let mapping = lookup("C3D27").unwrap();
        let nodes: Vec<usize> = (0..27).collect();
        let ordered = mapping.reorder(&nodes);
        assert_eq!(&ordered[..20], &nodes[..20]);
        assert_eq!(&ordered[20..], &[25, 23, 22, 24, 20, 21, 26]);
    }

    #[test]
    fn unknown_tags_are_rejected() {
        for tag in ["SPRINGA", "C3D7", "B41", "", "hex7", "MASS"] {
            let err = lookup(tag).unwrap_err();
            assert_eq!(err.tag, tag);
        }
    }

    #[test]
    fn codes_round_trip() {
        for code in 0..=40u8 {
            if let Some(cell) = CellType::from_code(code) {
                assert_eq!(cell.code(), code);
            }
        }
    }
}
