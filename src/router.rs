//! The sole mutator of a coordinator's [`NavigationState`].

use std::cell::RefCell;
use std::rc::Rc;

use crate::coordinator::AnyCoordinatorHandle;
use crate::detent::{Detent, ModalDetentConfiguration};
use crate::error::{report, NavError, ViewSlot};
use crate::route::{AnyRoute, Route};
use crate::state::NavigationState;
use crate::view::ViewFactory;

type Subscriber<R> = Box<dyn Fn(&NavigationState<R>)>;

/// Owns one [`NavigationState`] and a [`ViewFactory`]. Every mutator here is
/// `pub(crate)` — the router is reachable from the embedder only through its
/// read-only state, its change publisher, and [`Router::view`].
pub struct Router<R: Route + Clone> {
    state: RefCell<NavigationState<R>>,
    factory: Box<dyn ViewFactory<R>>,
    subscribers: RefCell<Vec<Subscriber<R>>>,
}

impl<R: Route + Clone> Router<R> {
    pub fn new(root: R, factory: Box<dyn ViewFactory<R>>) -> Self {
        Self {
            state: RefCell::new(NavigationState::new(root)),
            factory,
            subscribers: RefCell::new(Vec::new()),
        }
    }

    /// A read-only snapshot of the current state.
    pub fn state(&self) -> NavigationState<R> {
        self.state.borrow().clone()
    }

    pub fn current_route(&self) -> R {
        self.state.borrow().current_route().clone()
    }

    /// Subscribes to state-change notifications, delivered synchronously
    /// in the exact order mutations occur.
    pub fn subscribe(&self, f: impl Fn(&NavigationState<R>) + 'static) {
        self.subscribers.borrow_mut().push(Box::new(f));
    }

    /// Builds the view for `route`, raising `ViewCreationFailed` for the
    /// given slot if the factory returns `None`.
    pub fn view(&self, route: &R, slot: ViewSlot) -> Option<Box<dyn std::any::Any>> {
        let view = self.factory.build_view(route);
        if view.is_none() {
            report(NavError::ViewCreationFailed {
                coordinator: String::new(),
                route_id: route.identifier().to_string(),
                route_type: std::any::type_name::<R>(),
                slot,
            });
        }
        view
    }

    fn publish(&self) {
        let snapshot = self.state.borrow().clone();
        for subscriber in self.subscribers.borrow().iter() {
            subscriber(&snapshot);
        }
    }

    pub(crate) fn push(&self, route: R) {
        self.state.borrow_mut().stack.push(route);
        self.publish();
    }

    pub(crate) fn pop(&self) {
        let popped = self.state.borrow_mut().stack.pop();
        if popped.is_some() {
            self.publish();
        }
    }

    /// Truncates the stack to the first occurrence of `route`, inclusive.
    pub(crate) fn pop_to(&self, route: &R)
    where
        R: PartialEq,
    {
        let mut state = self.state.borrow_mut();
        if let Some(index) = state.stack.iter().position(|r| r == route) {
            state.stack.truncate(index + 1);
            drop(state);
            self.publish();
        }
    }

    pub(crate) fn pop_to_root(&self) {
        let mut state = self.state.borrow_mut();
        let changed = !state.stack.is_empty();
        state.stack.clear();
        drop(state);
        if changed {
            self.publish();
        }
    }

    pub(crate) fn replace(&self, route: R) {
        let mut state = self.state.borrow_mut();
        if let Some(last) = state.stack.last_mut() {
            *last = route;
        } else {
            state.stack.push(route);
        }
        drop(state);
        self.publish();
    }

    pub(crate) fn present(&self, route: R, detent: ModalDetentConfiguration) {
        {
            let mut state = self.state.borrow_mut();
            state.presented = Some(route);
            state.modal_detent_configuration = Some(detent);
        }
        self.publish();
    }

    pub(crate) fn dismiss_modal(&self) {
        let mut state = self.state.borrow_mut();
        let was_presented = state.presented.take().is_some();
        state.modal_detent_configuration = None;
        drop(state);
        if was_presented {
            self.publish();
        }
    }

    pub(crate) fn present_detour(&self, route: AnyRoute) {
        self.state.borrow_mut().detour = Some(route);
        self.publish();
    }

    pub(crate) fn dismiss_detour(&self) {
        let had_detour = self.state.borrow_mut().detour.take().is_some();
        if had_detour {
            self.publish();
        }
    }

    pub(crate) fn push_child(&self, child: AnyCoordinatorHandle) {
        self.state.borrow_mut().pushed_children.push(child);
        self.publish();
    }

    pub(crate) fn pop_child(&self) -> Option<AnyCoordinatorHandle> {
        let popped = self.state.borrow_mut().pushed_children.pop();
        if popped.is_some() {
            self.publish();
        }
        popped
    }

    pub(crate) fn select_tab(&self, index: usize) {
        let changed = self.state.borrow().selected_tab != index;
        self.state.borrow_mut().selected_tab = index;
        if changed {
            self.publish();
        }
    }

    /// Sets `root`, clearing every piece of derived state (stack, presented
    /// modal, detour, pushed children, detent configuration).
    pub(crate) fn set_root(&self, root: R) {
        let mut state = self.state.borrow_mut();
        state.root = root;
        state.stack.clear();
        state.presented = None;
        state.detour = None;
        state.pushed_children.clear();
        state.modal_detent_configuration = None;
        drop(state);
        self.publish();
    }

    pub(crate) fn update_modal_ideal_height(&self, height: f64) {
        let mut state = self.state.borrow_mut();
        if let Some(cfg) = state.modal_detent_configuration.as_mut() {
            cfg.set_ideal_height(height);
            drop(state);
            self.publish();
        }
    }

    pub(crate) fn update_modal_min_height(&self, height: f64) {
        let mut state = self.state.borrow_mut();
        if let Some(cfg) = state.modal_detent_configuration.as_mut() {
            cfg.set_min_height(height);
            drop(state);
            self.publish();
        }
    }

    pub(crate) fn update_modal_selected_detent(&self, detent: Detent) {
        let mut state = self.state.borrow_mut();
        if let Some(cfg) = state.modal_detent_configuration.as_mut() {
            cfg.set_selected_detent(detent);
            drop(state);
            self.publish();
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::FnViewFactory;

    #[derive(Debug, Clone, PartialEq)]
    struct Home(&'static str);
    impl Route for Home {
        fn identifier(&self) -> &str {
            self.0
        }
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    fn router() -> Router<Home> {
        Router::new(
            Home("home"),
            Box::new(FnViewFactory::new(|_: &Home| {
                Some(Box::new(()) as Box<dyn std::any::Any>)
            })),
        )
    }

    #[test]
    fn push_then_pop_to_existing_truncates_inclusive() {
        let router = router();
        router.push(Home("a"));
        router.push(Home("b"));
        router.push(Home("c"));
        router.pop_to(&Home("a"));
        assert_eq!(router.state().stack, vec![Home("a")]);
    }

    #[test]
    fn replace_on_empty_stack_pushes() {
        let router = router();
        router.replace(Home("a"));
        assert_eq!(router.state().stack, vec![Home("a")]);
    }

    #[test]
    fn set_root_clears_all_derived_state() {
        let router = router();
        router.push(Home("a"));
        router.present(Home("modal"), ModalDetentConfiguration::large());
        router.set_root(Home("new-root"));

        let state = router.state();
        assert_eq!(state.root, Home("new-root"));
        assert!(state.stack.is_empty());
        assert!(state.presented.is_none());
        assert!(state.modal_detent_configuration.is_none());
    }

    #[test]
    fn subscribers_see_every_mutation_in_order() {
        let router = router();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = seen.clone();
        router.subscribe(move |state| {
            seen_clone.borrow_mut().push(state.current_route().clone());
        });

        router.push(Home("a"));
        router.push(Home("b"));

        assert_eq!(*seen.borrow(), vec![Home("a"), Home("b")]);
    }
}
