//! Screen routing.
//!
//! [`target_route`] is the pure policy; [`Navigator`] applies it whenever
//! the inputs change and tracks explicit navigation in between.

use serde::{Deserialize, Serialize};

use crate::onboarding::ConnectionStep;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Route {
    /// Wallet setup instructions.
    Onboarding,
    /// Registration screen.
    Home,
    CreateBattle,
    JoinBattle,
    Battle(String),
    Battleground,
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Self::Onboarding => "/onboarding".to_string(),
            Self::Home => "/".to_string(),
            Self::CreateBattle => "/create-battle".to_string(),
            Self::JoinBattle => "/join-battle".to_string(),
            Self::Battle(name) => format!("/battle/{name}"),
            Self::Battleground => "/battleground".to_string(),
        }
    }
}

/// Everything the routing policy looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationInputs {
    pub step: ConnectionStep,
    pub active_battle: Option<String>,
    pub registered: bool,
    pub token_minted: bool,
}

/// Where the client should be given `inputs`.
pub fn target_route(inputs: &NavigationInputs) -> Route {
    if !inputs.step.is_ready() {
        return Route::Onboarding;
    }
    if let Some(name) = &inputs.active_battle {
        return Route::Battle(name.clone());
    }
    if inputs.registered && inputs.token_minted {
        return Route::CreateBattle;
    }
    Route::Home
}

#[derive(Debug)]
pub struct Navigator {
    current: Route,
    previous: Option<Route>,
    last_inputs: Option<NavigationInputs>,
}

impl Navigator {
    pub fn new() -> Self {
        Self {
            current: Route::Onboarding,
            previous: None,
            last_inputs: None,
        }
    }

    pub fn current(&self) -> &Route {
        &self.current
    }

    /// Re-run the policy if the inputs changed since the last evaluation.
    ///
    /// Returns the new route when the client moved.
    pub fn evaluate(&mut self, inputs: &NavigationInputs) -> Option<Route> {
        if self.last_inputs.as_ref() == Some(inputs) {
            return None;
        }
        self.last_inputs = Some(inputs.clone());
        self.go(target_route(inputs))
    }

    /// Explicit navigation. Ignored until onboarding is complete.
    pub fn navigate(&mut self, route: Route) -> Option<Route> {
        if !self.is_ready() && route != Route::Onboarding {
            tracing::debug!(path = %route.path(), "ignoring navigation before onboarding");
            return None;
        }
        self.go(route)
    }

    /// Return to the screen visited before the current one.
    pub fn back(&mut self) -> Option<Route> {
        let previous = self.previous.clone()?;
        self.navigate(previous)
    }

    fn is_ready(&self) -> bool {
        self.last_inputs
            .as_ref()
            .is_some_and(|inputs| inputs.step.is_ready())
    }

    fn go(&mut self, route: Route) -> Option<Route> {
        if route == self.current {
            return None;
        }
        let previous = std::mem::replace(&mut self.current, route.clone());
        self.previous = Some(previous);
        Some(route)
    }
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}
