pub mod cache;
pub mod controller;
pub mod injection;
pub mod types;

#[cfg(test)]
pub(crate) mod fixtures;
