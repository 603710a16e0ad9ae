mod setup;

pub use setup::{DATA_DIR_ENV, PASSWORD_ENV, SetupConfig};
