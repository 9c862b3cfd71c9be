pub mod marker;

pub use marker::{place_markers, PlacedMarker};
