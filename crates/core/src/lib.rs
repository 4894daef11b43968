pub mod config;
pub mod error;
pub mod logging;
pub mod paths;
pub mod store;

pub use config::{CONFIG_VERSION, ConfigDocument, RECENT_SCRIPTS_LIMIT, Settings, WindowSize};
pub use error::{ConfigIoError, ConfigOp, Error, Result};
pub use logging::{LogFormat, LoggingConfig, init_logging};
pub use paths::ConfigPaths;
pub use store::ConfigStore;
