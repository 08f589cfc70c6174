// Location reconciliation and styling engine for telemetry maps
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
