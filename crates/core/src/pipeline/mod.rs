pub mod compose_reel_use_case;
pub mod job_error;
pub mod pipeline_logger;
