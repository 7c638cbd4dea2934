//! Maritime Watch: a desktop dashboard of shipping disruptions gathered by a
//! search-grounded AI model, shown as a severity-sorted sidebar and a world
//! map.

pub mod config;
pub mod controller;
pub mod data;
pub mod error;
pub mod fetcher;
pub mod gemini;
pub mod geometry;
pub mod map_scene;
pub mod projection;
pub mod sidebar;

#[cfg(feature = "gui")]
pub mod ui;
