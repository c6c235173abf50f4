pub mod settings;

pub use settings::{CONFIG_FILE, CONNECTION_ENV, StateConfig};
