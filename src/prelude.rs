//! Common traits and types that are useful for exporting models with `fevtk`

pub use crate::collection::{with_collection, CollectionWriter};
pub use crate::model::{Layout, Model, ModelBuilder, Placement, Reduction};
pub use crate::source::{export, export_collection, ExportRequest};
pub use crate::traits::{Encode, ModelSource};
pub use crate::writer::{VtkWriter, WriterOptions};
pub use crate::{Ascii, Base64, Binary, Error};
