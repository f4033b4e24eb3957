pub mod chapter_processor;
pub mod job_runner;
pub mod orchestrator;
pub mod prefetch;
