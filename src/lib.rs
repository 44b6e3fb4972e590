//! Book catalog service: the books module and the application bootstrap.

pub mod app;
pub mod modules;

pub use app::Application;
