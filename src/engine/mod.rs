//! The geospatial layer engine: validation, styling, clustering, and
//! interaction dispatch, independent of any rendering framework. The shell
//! (`app`, `ui`, `map`) consumes the primitives a render pass emits.

pub mod basemap;
pub mod centroid;
pub mod cluster;
pub mod export;
pub mod feature;
pub mod interact;
pub mod layers;
pub mod popup;
pub mod render;
pub mod style;
pub mod zoom;

pub use basemap::Basemap;
pub use feature::{GeoFeature, Geometry, PropValue, Village};
pub use interact::{Event, InteractionDispatcher, Outgoing};
pub use layers::{LayerCategory, LayerRegistry, MapLayer};
pub use render::{hit_test, Hit, HitIndex, IndexHit, Primitive, RenderPass};
