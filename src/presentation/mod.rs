// Presentation layer - Event loop driving the map widget
pub mod event_loop;
