//! Client-side navigation.

use serde::{Deserialize, Serialize};

/// Moves the user between screens. Fire-and-forget.
pub trait Navigator: Send + Sync {
    fn go_to(&self, path: &str);
}

/// Entry points the session manager and route guard navigate to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Routes {
    pub public: String,
    pub login: String,
    pub register: String,
    pub authenticated: String,
}

impl Default for Routes {
    fn default() -> Self {
        Self {
            public: "/".to_string(),
            login: "/login".to_string(),
            register: "/register".to_string(),
            authenticated: "/dashboard".to_string(),
        }
    }
}
