pub mod fs;
pub mod store;
pub mod tree;
