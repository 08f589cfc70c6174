// Domain layer - plain data shared by every other layer
pub mod geo;
pub mod pattern;
pub mod snapshot;
pub mod telemetry;
