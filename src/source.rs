//! Producers of models and the single pass export loop
//!
//! A solver specific reader implements [`ModelSource`], yielding one model per
//! part per requested increment. [`export`] and [`export_collection`] pull
//! from a source one model at a time and write each model before asking for
//! the next, so only one model is held in memory at once.

use crate::collection::CollectionWriter;
use crate::model::{Model, Placement};
use crate::traits::{Encode, ModelSource};
use crate::writer::{VtkWriter, WriteOutput};
use crate::Error;

use serde::{Deserialize, Serialize};

/// Something a producer is asked to attach to each model it yields
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "export", rename_all = "snake_case")]
pub enum ExportRequest {
    Field { name: String, placement: Placement },
    Group { name: String, kind: Placement },
    Surface { name: String },
}

impl ExportRequest {
    pub fn field<T: Into<String>>(name: T, placement: Placement) -> Self {
        Self::Field {
            name: name.into(),
            placement,
        }
    }

    pub fn group<T: Into<String>>(name: T, kind: Placement) -> Self {
        Self::Group {
            name: name.into(),
            kind,
        }
    }

    pub fn surface<T: Into<String>>(name: T) -> Self {
        Self::Surface { name: name.into() }
    }
}

impl Model {
    /// Drop every field, group, and surface that `requests` does not name
    ///
    /// Requested items the model does not carry are reported with a warning;
    /// a result increment that lacks a field is not an error.
    pub fn retain_requested(&mut self, requests: &[ExportRequest]) {
        for request in requests {
            let present = match request {
                ExportRequest::Field { name, placement } => self
                    .fields()
                    .iter()
                    .any(|f| f.name() == name && f.placement() == *placement),
                ExportRequest::Group { name, kind } => self
                    .groups()
                    .iter()
                    .any(|g| g.name() == name && g.kind() == *kind),
                ExportRequest::Surface { name } => {
                    self.surfaces().iter().any(|s| s.name() == name)
                }
            };

            if !present {
                log::warn!(
                    "{request:?} is not available in part `{}` at time {}",
                    self.part(),
                    self.time()
                );
            }
        }

        self.retain_fields(|f| {
            requests.iter().any(|r| {
                matches!(r, ExportRequest::Field { name, placement }
                    if name == f.name() && *placement == f.placement())
            })
        });
        self.retain_groups(|g| {
            requests.iter().any(|r| {
                matches!(r, ExportRequest::Group { name, kind }
                    if name == g.name() && *kind == g.kind())
            })
        });
        self.retain_surfaces(|s| {
            requests
                .iter()
                .any(|r| matches!(r, ExportRequest::Surface { name } if name == s.name()))
        });
    }
}

/// Fused iterator over a [`ModelSource`]
///
/// The source is dropped as soon as it is exhausted or fails, so it is never
/// pulled again.
#[derive(Debug)]
pub struct Models<S> {
    source: Option<S>,
}

impl<S> Models<S> {
    pub(crate) fn new(source: S) -> Self {
        Self {
            source: Some(source),
        }
    }
}

impl<S: ModelSource> Iterator for Models<S> {
    type Item = Result<Model, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let source = self.source.as_mut()?;
        match source.next_model() {
            Ok(Some(model)) => Some(Ok(model)),
            Ok(None) => {
                self.source = None;
                None
            }
            Err(e) => {
                self.source = None;
                Some(Err(e))
            }
        }
    }
}

impl<S: ModelSource> std::iter::FusedIterator for Models<S> {}

/// Source backed by any iterator of models
#[derive(Debug, Clone)]
pub struct IterSource<I> {
    iter: I,
}

impl<I> ModelSource for IterSource<I>
where
    I: Iterator<Item = Result<Model, Error>>,
{
    fn next_model(&mut self) -> Result<Option<Model>, Error> {
        self.iter.next().transpose()
    }
}

/// wrap an iterator of fallible models as a source
pub fn from_iter<I>(iter: I) -> IterSource<I::IntoIter>
where
    I: IntoIterator<Item = Result<Model, Error>>,
{
    IterSource {
        iter: iter.into_iter(),
    }
}

/// Source that trims every model to a request list
#[derive(Debug, Clone)]
pub struct Requested<S> {
    source: S,
    requests: Vec<ExportRequest>,
}

impl<S> Requested<S> {
    pub fn new(source: S, requests: Vec<ExportRequest>) -> Self {
        Self { source, requests }
    }
}

impl<S: ModelSource> ModelSource for Requested<S> {
    fn next_model(&mut self) -> Result<Option<Model>, Error> {
        let mut model = match self.source.next_model()? {
            Some(model) => model,
            None => return Ok(None),
        };
        model.retain_requested(&self.requests);
        Ok(Some(model))
    }
}

/// Write every model of `source`, in order, stopping at the first error
pub fn export<S, E>(source: S, writer: &mut VtkWriter<E>) -> Result<Vec<WriteOutput>, Error>
where
    S: ModelSource,
    E: Encode,
{
    source
        .models()
        .map(|model| writer.write(&model?))
        .collect()
}

/// Write every model of `source` through a collection, stopping at the first error
///
/// The collection stays open; entries written before an error are kept.
pub fn export_collection<S, E>(
    source: S,
    collection: &mut CollectionWriter<E>,
) -> Result<Vec<WriteOutput>, Error>
where
    S: ModelSource,
    E: Encode,
{
    source
        .models()
        .map(|model| collection.write(&model?))
        .collect()
}
