use super::Id;

use derive_more::Display;
use serde::{Deserialize, Serialize};

use std::collections::BTreeMap;

/// whether values attach to nodes or to elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    #[display(fmt = "node")]
    Nodes,
    #[display(fmt = "element")]
    Elements,
}

/// scalar / vector / tensor, without the component count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    #[display(fmt = "scalar")]
    Scalar,
    #[display(fmt = "vector")]
    Vector,
    #[display(fmt = "tensor")]
    Tensor,
}

/// Component layout of a field
///
/// Vectors hold one to three components and are padded to three on write.
/// Symmetric tensors hold up to six components (`xx yy zz xy yz xz`) and are
/// padded to six; full tensors hold nine and are written as they are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Layout {
    #[display(fmt = "scalar")]
    Scalar,
    #[display(fmt = "vector({_0})")]
    Vector(usize),
    #[display(fmt = "tensor({_0})")]
    Tensor(usize),
}

impl Layout {
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Scalar => FieldKind::Scalar,
            Self::Vector(_) => FieldKind::Vector,
            Self::Tensor(_) => FieldKind::Tensor,
        }
    }

    /// number of components supplied per value
    pub fn components(&self) -> usize {
        match self {
            Self::Scalar => 1,
            Self::Vector(n) | Self::Tensor(n) => *n,
        }
    }

    /// number of components per tuple in the written array
    pub fn padded_components(&self) -> usize {
        match self {
            Self::Scalar => 1,
            Self::Vector(_) => 3,
            Self::Tensor(9) => 9,
            Self::Tensor(_) => 6,
        }
    }

    pub(crate) fn is_valid(&self) -> bool {
        match self {
            Self::Scalar => true,
            Self::Vector(n) => (1..=3).contains(n),
            Self::Tensor(n) => (1..=6).contains(n) || *n == 9,
        }
    }
}

/// How several values supplied for the same id are collapsed into one tuple
///
/// `MaxAbs` and `Mean` work per component and ignore `NaN` samples. `MaxAbs`
/// keeps the sign of the value with the largest magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reduction {
    #[default]
    #[display(fmt = "max_abs")]
    MaxAbs,
    #[display(fmt = "mean")]
    Mean,
    #[display(fmt = "first")]
    First,
    #[display(fmt = "last")]
    Last,
}

impl Reduction {
    /// collapse `samples` (a flat list of tuples with `components` entries each) into `out`
    pub(crate) fn reduce(&self, samples: &[f64], components: usize, out: &mut [f64]) {
        let count = samples.len() / components;

        match self {
            Self::First => out.copy_from_slice(&samples[..components]),
            Self::Last => out.copy_from_slice(&samples[(count - 1) * components..]),
            Self::MaxAbs => {
                for (c, slot) in out.iter_mut().enumerate() {
                    *slot = column(samples, components, c)
                        .filter(|v| !v.is_nan())
                        .fold(f64::NAN, |best, v| {
                            if best.is_nan() || v.abs() > best.abs() {
                                v
                            } else {
                                best
                            }
                        });
                }
            }
            Self::Mean => {
                for (c, slot) in out.iter_mut().enumerate() {
                    let (sum, n) = column(samples, components, c)
                        .filter(|v| !v.is_nan())
                        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
                    *slot = if n == 0 { f64::NAN } else { sum / n as f64 };
                }
            }
        }
    }
}

fn column(samples: &[f64], components: usize, c: usize) -> impl Iterator<Item = f64> + '_ {
    samples.iter().skip(c).step_by(components).copied()
}

/// A named, sparse set of values attached to nodes or elements
///
/// Every id maps to one or more samples of `layout.components()` values each.
/// Samples accumulate when the same field is added more than once; they are
/// reduced to a single tuple when a piece is written, never in the model itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub(crate) name: String,
    pub(crate) placement: Placement,
    pub(crate) layout: Layout,
    pub(crate) values: BTreeMap<Id, Vec<f64>>,
    pub(crate) reduction: Option<Reduction>,
}

impl Field {
    pub(crate) fn new(name: String, placement: Placement, layout: Layout) -> Self {
        Self {
            name,
            placement,
            layout,
            values: BTreeMap::new(),
            reduction: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn reduction(&self) -> Option<Reduction> {
        self.reduction
    }

    /// all samples stored for `id`, flattened
    pub fn samples(&self, id: Id) -> Option<&[f64]> {
        self.values.get(&id).map(Vec::as_slice)
    }

    /// number of samples stored for `id`
    pub fn sample_count(&self, id: Id) -> usize {
        self.values
            .get(&id)
            .map(|v| v.len() / self.layout.components())
            .unwrap_or(0)
    }

    /// ids with at least one value, ascending
    pub fn ids(&self) -> impl Iterator<Item = Id> + '_ {
        self.values.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn restricted<F: Fn(Id) -> bool>(&self, keep: F) -> Self {
        Self {
            name: self.name.clone(),
            placement: self.placement,
            layout: self.layout,
            values: self
                .values
                .iter()
                .filter(|(id, _)| keep(**id))
                .map(|(id, v)| (*id, v.clone()))
                .collect(),
            reduction: self.reduction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_abs_keeps_sign() {
        let mut out = [0.0; 2];
        Reduction::MaxAbs.reduce(&[1.0, -2.0, -3.0, 1.5, 2.0, f64::NAN], 2, &mut out);
        assert_eq!(out, [-3.0, -2.0]);
    }

    #[test]
    fn mean_ignores_nan() {
        let mut out = [0.0];
        Reduction::Mean.reduce(&[1.0, f64::NAN, 3.0], 1, &mut out);
        assert_eq!(out, [2.0]);

        Reduction::Mean.reduce(&[f64::NAN, f64::NAN], 1, &mut out);
        assert!(out[0].is_nan());
    }

    #[test]
    fn first_and_last_pick_whole_tuples() {
        let samples = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let mut out = [0.0; 3];
        Reduction::First.reduce(&samples, 3, &mut out);
        assert_eq!(out, [1.0, 2.0, 3.0]);
        Reduction::Last.reduce(&samples, 3, &mut out);
        assert_eq!(out, [4.0, 5.0, 6.0]);
    }

    #[test]
    fn layout_padding() {
        assert_eq!(Layout::Vector(2).padded_components(), 3);
        assert_eq!(Layout::Tensor(4).padded_components(), 6);
        assert_eq!(Layout::Tensor(9).padded_components(), 9);
        assert!(!Layout::Vector(4).is_valid());
        assert!(!Layout::Tensor(7).is_valid());
        assert!(!Layout::Vector(0).is_valid());
    }
}
