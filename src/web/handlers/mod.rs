pub mod config_handlers;
pub mod jobs_handlers;
pub mod pipeline_handlers;
pub mod system_handlers;

pub use config_handlers::*;
pub use jobs_handlers::*;
pub use pipeline_handlers::*;
pub use system_handlers::*;
