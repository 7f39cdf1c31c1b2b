// Declare the feature-gated modules
#[cfg(feature = "campus")]
pub mod campus;
#[cfg(feature = "configs")]
pub mod configs;
#[cfg(feature = "connections")]
pub mod connections;
#[cfg(feature = "loggers")]
pub mod loggers;
#[cfg(feature = "retrieve")]
pub mod retrieve;
#[cfg(feature = "utils")]
pub mod utils;

// Re-export the commonly wired pieces
#[cfg(feature = "campus")]
pub use campus::CampusApi;
#[cfg(feature = "configs")]
pub use configs::config_sys::{get_sys_config, load_sys_config, SysConfig, SysConfigError};
#[cfg(feature = "connections")]
pub use connections::cache_redis::RedisCache;
#[cfg(feature = "connections")]
pub use connections::QueryCache;
#[cfg(feature = "loggers")]
pub use loggers::loggerlocal::{LoggerLocal, LoggerLocalOptions};
#[cfg(feature = "retrieve")]
pub use retrieve::odata_http::{ODataClient, ODataError, RequestFailure};
