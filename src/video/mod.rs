pub(crate) mod clip;
pub(crate) mod job;
pub(crate) mod orchestrator;
pub(crate) mod workspace;
