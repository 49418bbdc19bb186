//! Convenience re-export of the types most embedders need.

pub use crate::{
    coordinator::{AnyCoordinator, AnyCoordinatorHandle, Coordinator, CoordinatorDelegate, DefaultDelegate},
    detent::{Detent, ModalDetentConfiguration},
    error::{set_reporter, NavError, NavErrorReporter, ViewSlot},
    flow::FlowOrchestrator,
    navigation_type::NavigationType,
    presentation::PresentationContext,
    route::AnyRoute,
    router::Router,
    state::NavigationState,
    tab::TabCoordinator,
    view::{FnViewFactory, ViewFactory},
    // Brings both the `Route` trait and the `#[derive(Route)]` macro into
    // scope at once — they occupy separate namespaces, same as `serde`'s
    // `Serialize` trait and derive.
    Route,
};
