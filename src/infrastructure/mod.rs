pub mod storage;
pub mod translator;
