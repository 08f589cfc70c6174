// Application layer - Map engine and the seams to its collaborators
pub mod bounds;
pub mod feed;
pub mod location;
pub mod location_index;
pub mod map_surface;
pub mod map_widget;
pub mod pattern;
pub mod reconciler;
pub mod style;
