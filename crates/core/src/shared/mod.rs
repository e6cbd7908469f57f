pub mod config;
pub mod constants;
pub mod model_resolver;
pub mod validation;
