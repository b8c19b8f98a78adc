//! Shape Module - target type classification
//!
//! - `descriptor`: declared type syntax (`TypeDescriptor`, parsed from text)
//! - `resolve`: classification into the closed `Shape` vocabulary
//!
//! ```text
//! "HashMap<String, IndexSet<String>>"  →  TypeDescriptor  →  Shape::MapOfContainer(IndexSet<String>)
//! ```

mod descriptor;
mod resolve;

pub use descriptor::TypeDescriptor;
pub use resolve::{resolve_shape, Container, ContainerKind, Element, Shape};
