pub mod download;
mod form;
pub mod health;
pub mod translate;
pub mod upload;
