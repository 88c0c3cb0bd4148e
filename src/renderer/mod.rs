//! Presentation meshes
//!
//! Builds plain vertex lists from simulation state. Uploading and drawing is
//! left to the host.

pub mod liquid;
pub mod shapes;
pub mod vertex;

pub use liquid::liquid_vertices;
pub use vertex::{Vertex, as_floats};
