pub mod core;
pub mod expander;
pub mod interrupts;
pub mod loader;
