mod secret;

pub use secret::{SecretHasher, generate_secret};
