// HTTP front-end that renders equipped-item previews through an external renderer.

pub mod artifacts;
pub mod catalog;
pub mod error;
pub mod item_dump;
pub mod pipeline;
pub mod playerkit;
pub mod renderer;
pub mod shutdown_signal;
pub mod web;
