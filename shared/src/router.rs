//! Client-side routes. Page modules are loaded lazily by the shell; the core
//! only decides which page a path maps to.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    #[default]
    Home,
    CreatePoint,
}

impl Route {
    pub const ALL: [Route; 2] = [Route::Home, Route::CreatePoint];

    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::CreatePoint => "/create-point",
        }
    }

    /// `/` matches exactly; `/create-point` also matches its sub-paths.
    /// Query strings and fragments are ignored.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');

        if trimmed.is_empty() {
            return Some(Self::Home);
        }

        let create = Self::CreatePoint.path();
        if trimmed == create || trimmed.starts_with(&format!("{create}/")) {
            return Some(Self::CreatePoint);
        }

        None
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}
