//! Atomic replacement of one entire root-level flow coordinator with another.

use std::cell::RefCell;
use std::rc::Rc;

use crate::coordinator::{AnyCoordinatorHandle, Coordinator, CoordinatorDelegate};
use crate::route::Route;
use crate::view::ViewFactory;

/// Owns exactly one active flow child at a time and swaps it atomically.
///
/// A flow orchestrator never `can_handle`s routes itself — its delegate is
/// expected to answer bubbling through `can_handle_flow_change` /
/// `handle_flow_change` instead, making the orchestrator the point where a
/// bubbled route terminates by swapping in a new flow.
pub struct FlowOrchestrator<R: Route + Clone + PartialEq + 'static> {
    coordinator: Rc<Coordinator<R>>,
    current_flow: RefCell<Option<AnyCoordinatorHandle>>,
}

impl<R: Route + Clone + PartialEq + 'static> FlowOrchestrator<R> {
    pub fn new(
        name: impl Into<String>,
        root: R,
        delegate: Box<dyn CoordinatorDelegate<R>>,
        factory: Box<dyn ViewFactory<R>>,
    ) -> Self {
        Self {
            coordinator: Coordinator::new(name, root, delegate, factory),
            current_flow: RefCell::new(None),
        }
    }

    /// The underlying coordinator, for access to its router and `navigate`.
    pub fn coordinator(&self) -> &Rc<Coordinator<R>> {
        &self.coordinator
    }

    pub fn current_flow(&self) -> Option<AnyCoordinatorHandle> {
        self.current_flow.borrow().clone()
    }

    /// Removes the previous flow child (clearing its parent so the embedder
    /// is free to drop its own reference and release it), installs
    /// `new_flow` as the sole child, and resets this orchestrator's own
    /// router to `root` with all derived state cleared.
    pub fn transition_to_flow(&self, new_flow: AnyCoordinatorHandle, root: R) {
        if let Some(previous) = self.current_flow.borrow_mut().take() {
            self.coordinator.remove_child(&previous);
        }
        let _ = self.coordinator.add_child(new_flow.clone());
        *self.current_flow.borrow_mut() = Some(new_flow);
        self.coordinator.transition_to_new_flow(root);
    }
}

impl<R: Route + Clone + PartialEq + 'static> std::ops::Deref for FlowOrchestrator<R> {
    type Target = Coordinator<R>;
    fn deref(&self) -> &Self::Target {
        &self.coordinator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::{AnyCoordinator, DefaultDelegate};
    use crate::view::FnViewFactory;
    use std::any::Any;

    #[derive(Debug, Clone, PartialEq)]
    struct R(&'static str);
    impl Route for R {
        fn identifier(&self) -> &str {
            self.0
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn flow_child(name: &'static str, root: &'static str) -> Rc<Coordinator<R>> {
        Coordinator::new(
            name,
            R(root),
            Box::new(DefaultDelegate),
            Box::new(FnViewFactory::new(|_: &R| Some(Box::new(()) as Box<dyn Any>))),
        )
    }

    fn orchestrator() -> FlowOrchestrator<R> {
        FlowOrchestrator::new(
            "orchestrator",
            R("boot"),
            Box::new(DefaultDelegate),
            Box::new(FnViewFactory::new(|_: &R| Some(Box::new(()) as Box<dyn Any>))),
        )
    }

    #[test]
    fn transition_to_flow_swaps_the_only_active_child() {
        let orchestrator = orchestrator();
        let onboarding = flow_child("onboarding", "welcome");
        orchestrator.transition_to_flow(onboarding.clone(), R("welcome"));

        assert_eq!(orchestrator.current_flow().unwrap().id(), onboarding.id());
        assert!(onboarding.parent().is_some());

        let home = flow_child("home", "dashboard");
        orchestrator.transition_to_flow(home.clone(), R("dashboard"));

        assert_eq!(orchestrator.current_flow().unwrap().id(), home.id());
        assert!(home.parent().is_some());
        assert!(
            onboarding.parent().is_none(),
            "previous flow child must lose its parent once replaced"
        );
    }

    #[test]
    fn transition_to_flow_resets_own_router_state() {
        let orchestrator = orchestrator();
        orchestrator.navigate(R("detour-ish"));
        let onboarding = flow_child("onboarding", "welcome");
        orchestrator.transition_to_flow(onboarding, R("welcome"));

        let state = orchestrator.router().state();
        assert_eq!(state.root, R("welcome"));
        assert!(state.stack.is_empty());
        assert!(state.presented.is_none());
        assert!(state.detour.is_none());
        assert!(state.pushed_children.is_empty());
    }
}
