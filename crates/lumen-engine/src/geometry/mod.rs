//! Scene geometry: polygons with baked world positions and instanced objects.

mod graph_object;
mod material;
mod polygon;

pub use graph_object::{GraphObject, ObjectId, DEFAULT_BORDER_WIDTH};
pub use material::{Material, TextureSet};
pub use polygon::{Polygon, PolygonId};
