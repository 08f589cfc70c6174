// Infrastructure layer - Concrete collaborators and adapters
pub mod color;
pub mod config;
pub mod pattern;
pub mod replay_feed;
pub mod rules;
pub mod scene_surface;
pub mod schema;
