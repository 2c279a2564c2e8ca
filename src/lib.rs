pub mod api;
pub mod config;
pub mod crowd;
pub mod error;
pub mod pipeline;
pub mod recommend;
pub mod spot;
pub mod state;
