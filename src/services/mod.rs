pub mod orchestrator;
pub mod storage;
pub mod translator;
