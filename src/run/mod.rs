mod components;

pub use components::RunTest;
