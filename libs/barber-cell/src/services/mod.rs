pub mod catalog;

pub use catalog::{InMemoryScheduleCatalog, ScheduleCatalog};
