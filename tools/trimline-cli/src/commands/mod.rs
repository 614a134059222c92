pub mod config;
pub mod drag;
pub mod thumbs;
pub mod zoom;
