//! `waypoint` — a reactive, coordinator-based navigation engine for
//! hierarchical UI state machines.
//!
//! The engine owns a tree of [`Coordinator`]s, each holding a [`Router`]
//! with a [`NavigationState`]: a root, a push stack, a selected tab, a
//! presented modal, a presented detour, pushed child coordinators, and modal
//! detent configuration. Calling [`Coordinator::navigate`] runs a
//! side-effect-free validation pass across the reachable subtree, then — on
//! success — an execution pass that mutates routers and publishes state.
//!
//! The view layer (the concrete UI toolkit rendering the result) and the
//! [`ViewFactory`] (route → view) are supplied by the embedder; this crate
//! only pins the interface they need.
//!
//! ```
//! use waypoint::{Coordinator, CoordinatorDelegate, FnViewFactory, NavigationType, Route};
//! use std::any::Any;
//!
//! #[derive(Debug, Clone, PartialEq, waypoint::Route)]
//! enum AppRoute {
//!     Home,
//!     Settings,
//! }
//!
//! struct AppDelegate;
//! impl CoordinatorDelegate<AppRoute> for AppDelegate {
//!     fn can_handle(&self, route: &AppRoute) -> bool {
//!         matches!(route, AppRoute::Settings)
//!     }
//!     fn navigation_type(&self, _route: &AppRoute) -> NavigationType {
//!         NavigationType::Push
//!     }
//! }
//!
//! let root = Coordinator::new(
//!     "app",
//!     AppRoute::Home,
//!     Box::new(AppDelegate),
//!     Box::new(FnViewFactory::new(|_: &AppRoute| Some(Box::new(()) as Box<dyn Any>))),
//! );
//! assert!(root.navigate(AppRoute::Settings));
//! ```

pub mod coordinator;
pub mod detent;
pub mod error;
pub mod flow;
pub mod navigation_type;
pub mod node;
pub mod prelude;
pub mod presentation;
pub mod route;
pub mod router;
pub mod state;
pub mod tab;
pub mod view;

pub use coordinator::{
    AnyCoordinator, AnyCoordinatorHandle, Coordinator, CoordinatorDelegate, DefaultDelegate,
    WeakAnyCoordinatorHandle,
};
pub use detent::{Detent, ModalDetentConfiguration};
pub use error::{report, set_reporter, NavError, NavErrorReporter, ViewSlot};
pub use flow::FlowOrchestrator;
pub use navigation_type::NavigationType;
pub use node::NodeId;
pub use presentation::PresentationContext;
pub use route::{routes_equal, AnyRoute, Route};
pub use router::Router;
pub use state::NavigationState;
pub use tab::TabCoordinator;
pub use view::{FnViewFactory, ViewFactory};

// The derive macro lives in a separate namespace from the `Route` trait
// above, so re-exporting both under the same name is unambiguous — exactly
// how `serde` re-exports `Serialize` the trait alongside `Serialize` the
// derive.
pub use waypoint_macros::Route;
