mod canvas;
mod components;
mod create_results;
mod types;

pub use components::{Results, StoreErrorMessage};
