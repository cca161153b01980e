pub mod password;

pub use password::{hash_password, validate_password_policy, verify_password};
