//! BunnySteps library
//!
//! Productivity backend core: tasks, focus sessions, hobbies, journal,
//! shopping, and the reward engine that ties them together. An API layer
//! drives it through the services in `AppState`.

pub mod app;
pub mod clock;
pub mod config;
pub mod database;
pub mod error;
pub mod rewards;
pub mod services;
