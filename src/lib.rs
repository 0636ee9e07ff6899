pub mod collect;
pub mod config;
pub mod copywrite;
pub mod history;
pub mod image;
pub mod pipeline;
pub mod providers;
pub mod publish;
pub mod scheduler;
pub mod selector;
pub mod sources;
pub mod styles;
pub mod types;
pub mod utils;

pub use config::{AccountProfile, Config};
pub use history::History;
pub use pipeline::Pipeline;
pub use scheduler::Scheduler;
pub use types::*;
