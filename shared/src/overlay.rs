use serde::{Deserialize, Serialize};

use crate::router::Route;

/// Inputs of the success overlay. Visibility and redirect target always
/// travel together in one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayProps {
    pub visible: bool,
    pub redirect: Route,
}

impl OverlayProps {
    #[must_use]
    pub const fn hidden(redirect: Route) -> Self {
        Self {
            visible: false,
            redirect,
        }
    }

    #[must_use]
    pub const fn shown(redirect: Route) -> Self {
        Self {
            visible: true,
            redirect,
        }
    }
}

/// Success acknowledgment shown over the registration form.
///
/// The overlay keeps its own mirror of the props so it can hide itself on
/// dismissal. Whenever the observed props change, the mirror is reset to them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlay {
    observed: OverlayProps,
    state: OverlayProps,
}

impl Overlay {
    #[must_use]
    pub const fn new(props: OverlayProps) -> Self {
        Self {
            observed: props,
            state: props,
        }
    }

    /// Resets the mirror to `props` if they differ from the last observed ones.
    pub fn observe(&mut self, props: OverlayProps) {
        if props != self.observed {
            self.observed = props;
            self.state = props;
        }
    }

    /// Hides the overlay and returns where to navigate.
    pub fn dismiss(&mut self) -> Route {
        self.state = OverlayProps::hidden(self.state.redirect);
        self.state.redirect
    }

    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.state.visible
    }

    #[must_use]
    pub const fn redirect(&self) -> Route {
        self.state.redirect
    }

    #[must_use]
    pub const fn state(&self) -> OverlayProps {
        self.state
    }
}
