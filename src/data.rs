//! Dense, write-ready rendition of one piece
//!
//! Output arrays cover every point and every cell, in ascending id order.
//! Sparse model fields are spread onto that grid with [`SENTINEL`] in the
//! gaps, samples are reduced to one tuple per id, and groups and surfaces
//! become one-byte indicator arrays.

use crate::array::{self, DataArray};
use crate::element;
use crate::model::{Field, Id, Model, Placement, Reduction};
use crate::{Error, SENTINEL};

use ndarray::Array2;

use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PieceData {
    pub(crate) time: f64,
    pub(crate) points: DataArray,
    pub(crate) connectivity: DataArray,
    pub(crate) offsets: DataArray,
    pub(crate) types: DataArray,
    pub(crate) point_data: Vec<DataArray>,
    pub(crate) cell_data: Vec<DataArray>,
}

impl PieceData {
    /// Prepare every array of `model`
    ///
    /// Elements whose tag has no VTK counterpart abort with
    /// [`Error::UnsupportedElement`] when `strict` is set and are left out of
    /// the piece, cell data included, otherwise. `fallback` applies to fields
    /// that carry no reduction of their own.
    pub(crate) fn from_model(model: &Model, strict: bool, fallback: Reduction) -> Result<Self, Error> {
        let node_ids: Vec<Id> = model.nodes().keys().copied().collect();
        let node_index: HashMap<Id, usize> = node_ids
            .iter()
            .enumerate()
            .map(|(index, id)| (*id, index))
            .collect();

        let mut points = array::zeros::<f64>(node_ids.len(), 3);
        for (chunk, coordinates) in points.chunks_exact_mut(3).zip(model.nodes().values()) {
            chunk.copy_from_slice(coordinates);
        }

        let mut cell_ids = Vec::with_capacity(model.num_elements());
        let mut connectivity = Vec::new();
        let mut offsets = Vec::with_capacity(model.num_elements());
        let mut types = Vec::with_capacity(model.num_elements());
        let mut skipped: BTreeMap<&str, usize> = BTreeMap::new();

        for (id, element) in model.elements() {
            let mapping = match element::lookup(&element.tag) {
                Ok(mapping) => mapping,
                Err(e) if strict => return Err(e.on_element(*id).into()),
                Err(_) => {
                    *skipped.entry(element.tag.as_str()).or_default() += 1;
                    continue;
                }
            };

            connectivity.extend(
                mapping
                    .reorder(&element.nodes)
                    .into_iter()
                    .map(|node| node_index[&node] as i64),
            );
            offsets.push(connectivity.len() as i64);
            types.push(mapping.cell_type.code());
            cell_ids.push(*id);
        }

        for (tag, count) in skipped {
            log::warn!(
                "skipped {count} element(s) of unsupported type `{tag}` in part `{}` of model `{}`",
                model.part(),
                model.name()
            );
        }

        let mut point_data: Vec<DataArray> = model
            .get_fields_by_type(Placement::Nodes)
            .into_iter()
            .map(|field| dense_field(field, &node_ids, fallback))
            .collect();

        let mut cell_data: Vec<DataArray> = model
            .get_fields_by_type(Placement::Elements)
            .into_iter()
            .map(|field| dense_field(field, &cell_ids, fallback))
            .collect();

        for group in model.groups() {
            let ids = match group.kind() {
                Placement::Nodes => &node_ids,
                Placement::Elements => &cell_ids,
            };
            let flags = ids.iter().map(|id| group.contains(*id) as u8).collect();
            let array = DataArray::uint8(group.array_name(), 1, flags);

            match group.kind() {
                Placement::Nodes => point_data.push(array),
                Placement::Elements => cell_data.push(array),
            }
        }

        for surface in model.surfaces() {
            let masks = cell_ids.iter().map(|id| surface.mask(*id)).collect();
            cell_data.push(DataArray::uint8(surface.array_name(), 1, masks));
        }

        Ok(Self {
            time: model.time(),
            points: DataArray::float64("Points", 3, points),
            connectivity: DataArray::int64("connectivity", 1, connectivity),
            offsets: DataArray::int64("offsets", 1, offsets),
            types: DataArray::uint8("types", 1, types),
            point_data,
            cell_data,
        })
    }

    pub(crate) fn num_points(&self) -> usize {
        self.points.num_tuples()
    }

    pub(crate) fn num_cells(&self) -> usize {
        self.types.len()
    }

    pub(crate) fn time_value(&self) -> DataArray {
        DataArray::float64("TimeValue", 1, vec![self.time])
    }
}

/// spread a sparse field onto `ids`, reducing samples and padding components
fn dense_field(field: &Field, ids: &[Id], fallback: Reduction) -> DataArray {
    let layout = field.layout();
    let width = layout.components();
    let padded = layout.padded_components();
    let reduction = field.reduction().unwrap_or(fallback);

    let mut block = Array2::from_elem((ids.len(), padded), SENTINEL);
    let mut tuple = vec![0.0; width];

    for (row, id) in ids.iter().enumerate() {
        if let Some(samples) = field.samples(*id) {
            reduction.reduce(samples, width, &mut tuple);

            let mut out = block.row_mut(row);
            out.fill(0.0);
            out.iter_mut()
                .zip(tuple.iter())
                .for_each(|(slot, value)| *slot = *value);
        }
    }

    DataArray::float64(field.name(), padded, block.into_raw_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Layout, ModelBuilder};

    fn two_quads() -> Model {
        ModelBuilder::new("m")
            .nodes([
                (1, [0.0, 0.0]),
                (2, [1.0, 0.0]),
                (3, [2.0, 0.0]),
                (4, [0.0, 1.0]),
                (5, [1.0, 1.0]),
                (6, [2.0, 1.0]),
            ])
            .element(7, "quad4", [1, 2, 5, 4])
            .element(8, "CPS4R", [2, 3, 6, 5])
            .build()
            .unwrap()
    }

    #[test]
    fn geometry_uses_zero_based_indices() {
        let piece = PieceData::from_model(&two_quads(), true, Reduction::MaxAbs).unwrap();

        assert_eq!(piece.num_points(), 6);
        assert_eq!(piece.num_cells(), 2);
        assert_eq!(
            piece.connectivity.data,
            array::ArrayData::Int64(vec![0, 1, 4, 3, 1, 2, 5, 4])
        );
        assert_eq!(piece.offsets.data, array::ArrayData::Int64(vec![4, 8]));
        assert_eq!(piece.types.data, array::ArrayData::UInt8(vec![9, 9]));
        assert_eq!(piece.points.to_f64()[15..], [2.0, 1.0, 0.0]);
    }

    #[test]
    fn vectors_are_padded_and_gaps_filled() {
        let mut model = two_quads();
        model
            .add_field("U", Placement::Nodes, [(2, [1.0, 2.0])], Layout::Vector(2))
            .unwrap();

        let piece = PieceData::from_model(&model, true, Reduction::MaxAbs).unwrap();
        let values = piece.point_data[0].to_f64();

        assert_eq!(piece.point_data[0].components, 3);
        assert_eq!(values.len(), 18);
        assert!(values[..3].iter().all(|v| v.is_nan()));
        assert_eq!(values[3..6], [1.0, 2.0, 0.0]);
        assert!(values[6..].iter().all(|v| v.is_nan()));
    }

    #[test]
    fn groups_and_surfaces_become_indicators() {
        let mut model = two_quads();
        model.add_node_group("left", [1, 4]).unwrap();
        model.add_element_group("second", [8]).unwrap();
        model.add_surface("top", [(7, 3), (8, 3), (8, 2)]).unwrap();

        let piece = PieceData::from_model(&model, true, Reduction::MaxAbs).unwrap();

        assert_eq!(piece.point_data[0].name, "_group left");
        assert_eq!(
            piece.point_data[0].data,
            array::ArrayData::UInt8(vec![1, 0, 0, 1, 0, 0])
        );
        assert_eq!(piece.cell_data[0].name, "_group second");
        assert_eq!(piece.cell_data[0].data, array::ArrayData::UInt8(vec![0, 1]));
        assert_eq!(piece.cell_data[1].name, "_surface top");
        assert_eq!(piece.cell_data[1].data, array::ArrayData::UInt8(vec![4, 6]));
    }

    #[test]
    fn lenient_mode_drops_unknown_elements_with_their_cell_data() {
        let mut model = ModelBuilder::new("m")
            .node(1, [0.0])
            .node(2, [1.0])
            .element(1, "line2", [1, 2])
            .element(2, "SPRINGA", [2])
            .build()
            .unwrap();
        model
            .add_field("E", Placement::Elements, [(1, [1.0]), (2, [2.0])], Layout::Scalar)
            .unwrap();

        let piece = PieceData::from_model(&model, false, Reduction::MaxAbs).unwrap();
        assert_eq!(piece.num_cells(), 1);
        assert_eq!(piece.cell_data[0].to_f64(), [1.0]);

        match PieceData::from_model(&model, true, Reduction::MaxAbs) {
            Err(Error::UnsupportedElement(e)) => {
                assert_eq!(e.tag, "SPRINGA");
                assert_eq!(e.element, Some(2));
            }
            other => panic!("expected an unsupported element, got {other:?}"),
        }
    }

    #[test]
    fn field_reduction_overrides_fallback() {
        let mut model = two_quads();
        model
            .add_field("S", Placement::Elements, [(7, [1.0]), (8, [2.0])], Layout::Scalar)
            .unwrap();
        model
            .add_field("S", Placement::Elements, [(7, [-5.0]), (8, [3.0])], Layout::Scalar)
            .unwrap();

        let piece = PieceData::from_model(&model, true, Reduction::MaxAbs).unwrap();
        assert_eq!(piece.cell_data[0].to_f64(), [-5.0, 3.0]);

        model
            .set_field_reduction(Placement::Elements, "S", Reduction::First)
            .unwrap();
        let piece = PieceData::from_model(&model, true, Reduction::MaxAbs).unwrap();
        assert_eq!(piece.cell_data[0].to_f64(), [1.0, 2.0]);
    }
}
