pub mod http;
pub mod logging;

pub use http::HttpBackend;
pub use logging::LoggingBackend;
