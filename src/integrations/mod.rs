//! External service integrations.

pub mod provider {
    pub use crate::provider::*;
}

pub mod auth {
    pub use crate::auth::*;
}
