pub mod delete;
pub mod names;
pub mod navigator;

pub use delete::DeleteEngine;
pub use names::NameResolver;
pub use navigator::{Crumb, Navigator};
