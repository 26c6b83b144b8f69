pub mod analysis;
pub mod bootstrap;
