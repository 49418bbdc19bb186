//! The orchestration core: parent/child tree, modal and detour children,
//! the validation/execution passes, smart navigation, path building, and
//! bubbling.

use std::any::{Any, TypeId};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use crate::detent::{Detent, ModalDetentConfiguration};
use crate::error::{report, NavError};
use crate::navigation_type::NavigationType;
use crate::node::NodeId;
use crate::presentation::PresentationContext;
use crate::route::{AnyRoute, Route};
use crate::router::Router;
use crate::view::ViewFactory;

/// A strong, type-erased handle to any coordinator in the tree.
pub type AnyCoordinatorHandle = Rc<dyn AnyCoordinator>;
/// A weak, type-erased back-reference (used for `parent`).
pub type WeakAnyCoordinatorHandle = Weak<dyn AnyCoordinator>;

/// The type-erased surface every coordinator kind implements so the engine
/// can recurse across coordinator-route-type boundaries.
pub trait AnyCoordinator: Any {
    fn id(&self) -> NodeId;
    fn as_any(&self) -> &dyn Any;
    fn route_type_id(&self) -> TypeId;
    fn debug_name(&self) -> String;

    fn parent(&self) -> Option<AnyCoordinatorHandle>;
    fn set_parent(&self, parent: Option<WeakAnyCoordinatorHandle>);
    fn presentation_context(&self) -> PresentationContext;
    fn set_presentation_context(&self, context: PresentationContext);

    /// Does `id` appear anywhere in this coordinator's permanent child tree?
    fn contains_descendant(&self, id: NodeId) -> bool;

    /// Direct capability only: does this coordinator itself claim `route`?
    fn can_handle_directly(&self, route: &dyn Route) -> bool;

    /// Transitive capability: self, or any child/modal/detour descendant.
    fn can_navigate(&self, route: &dyn Route, caller: Option<NodeId>) -> bool;

    fn validate_navigate(&self, route: &dyn Route, caller: Option<NodeId>) -> Result<(), NavError>;
    fn execute_navigate(&self, route: &dyn Route, caller: Option<NodeId>) -> Result<(), NavError>;

    fn pop(&self);
    fn dismiss_modal(&self);
    fn dismiss_detour(&self);
    fn reset_to_clean_state(&self);

    fn can_handle_flow_change(&self, route: &dyn Route) -> bool;
    fn handle_flow_change(&self, route: &dyn Route) -> bool;

    /// The `(label, icon)` pair a hosting [`crate::TabCoordinator`] shows for
    /// this child, if its delegate supplies one.
    fn tab_item(&self) -> Option<(String, String)>;
}

/// Embedder-overridable behavior for a [`Coordinator`]. Every method has a
/// conservative default so a coordinator that only wants to override one
/// hook doesn't have to implement the rest.
#[allow(unused_variables)]
pub trait CoordinatorDelegate<R: Route> {
    /// Pure query; must not mutate. May be called many times per navigation,
    /// including during validation.
    fn can_handle(&self, route: &R) -> bool {
        false
    }

    fn navigation_type(&self, route: &R) -> NavigationType {
        NavigationType::Push
    }

    /// Declarative prerequisites for deep-linking. Every entry must resolve
    /// to `Push` or `Replace` via [`CoordinatorDelegate::navigation_type`];
    /// anything else is a configuration error caught at runtime.
    fn navigation_path(&self, route: &R) -> Option<Vec<R>> {
        None
    }

    fn can_handle_flow_change(&self, route: &dyn Route) -> bool {
        false
    }

    fn handle_flow_change(&self, route: &dyn Route) -> bool {
        false
    }

    fn should_clean_state_for_bubbling(&self, route: &R) -> bool {
        false
    }

    fn should_dismiss_modal_for(&self, route: &R) -> bool {
        true
    }

    fn should_dismiss_detour_for(&self, route: &dyn Route) -> bool {
        true
    }

    fn tab_item(&self) -> Option<(String, String)> {
        None
    }

    fn modal_detent_configuration(&self, route: &R) -> ModalDetentConfiguration {
        ModalDetentConfiguration::large()
    }
}

/// A no-op delegate: claims nothing. Useful for coordinators whose only job
/// is to host children.
pub struct DefaultDelegate;
impl<R: Route> CoordinatorDelegate<R> for DefaultDelegate {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CoordinatorKind {
    Plain,
    Tab,
}

/// A node in the navigation tree: owns a [`Router`], a permanent child
/// list, a registered modal-coordinator list, at most one active modal and
/// one active detour, a weak `parent`, and a [`PresentationContext`].
///
/// Holds a weak reference to its own `Rc` (set up via [`Rc::new_cyclic`] in
/// the constructors) so methods can hand out a handle to themselves — for
/// example when reassigning a presented child's `parent` — without needing
/// an exotic method receiver.
pub struct Coordinator<R: Route + Clone + PartialEq + 'static> {
    pub(crate) id: NodeId,
    pub(crate) name: String,
    pub(crate) kind: CoordinatorKind,
    pub(crate) router: Router<R>,
    pub(crate) delegate: Box<dyn CoordinatorDelegate<R>>,
    pub(crate) children: RefCell<Vec<AnyCoordinatorHandle>>,
    pub(crate) modal_coordinators: RefCell<Vec<AnyCoordinatorHandle>>,
    pub(crate) current_modal: RefCell<Option<AnyCoordinatorHandle>>,
    pub(crate) detour_coordinator: RefCell<Option<AnyCoordinatorHandle>>,
    pub(crate) parent: RefCell<Option<WeakAnyCoordinatorHandle>>,
    pub(crate) presentation_context: Cell<PresentationContext>,
    self_weak: Weak<Coordinator<R>>,
    navigating: Cell<bool>,
    deferred: RefCell<VecDeque<R>>,
}

impl<R: Route + Clone + PartialEq + 'static> Coordinator<R> {
    pub fn new(
        name: impl Into<String>,
        root: R,
        delegate: Box<dyn CoordinatorDelegate<R>>,
        factory: Box<dyn ViewFactory<R>>,
    ) -> Rc<Self> {
        Self::build(CoordinatorKind::Plain, name, root, delegate, factory)
    }

    pub(crate) fn new_tab(
        name: impl Into<String>,
        root: R,
        delegate: Box<dyn CoordinatorDelegate<R>>,
        factory: Box<dyn ViewFactory<R>>,
    ) -> Rc<Self> {
        Self::build(CoordinatorKind::Tab, name, root, delegate, factory)
    }

    fn build(
        kind: CoordinatorKind,
        name: impl Into<String>,
        root: R,
        delegate: Box<dyn CoordinatorDelegate<R>>,
        factory: Box<dyn ViewFactory<R>>,
    ) -> Rc<Self> {
        let name = name.into();
        Rc::new_cyclic(|weak| Self {
            id: NodeId::next(),
            name,
            kind,
            router: Router::new(root, factory),
            delegate,
            children: RefCell::new(Vec::new()),
            modal_coordinators: RefCell::new(Vec::new()),
            current_modal: RefCell::new(None),
            detour_coordinator: RefCell::new(None),
            parent: RefCell::new(None),
            presentation_context: Cell::new(PresentationContext::Root),
            self_weak: weak.clone(),
            navigating: Cell::new(false),
            deferred: RefCell::new(VecDeque::new()),
        })
    }

    /// An owned, type-erased handle to this coordinator.
    fn me(&self) -> AnyCoordinatorHandle {
        self.self_weak
            .upgrade()
            .expect("coordinator outlived its own handle") as AnyCoordinatorHandle
    }

    fn me_weak(&self) -> WeakAnyCoordinatorHandle {
        Rc::downgrade(&self.me())
    }

    pub fn router(&self) -> &Router<R> {
        &self.router
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reports a measured `ideal_height` for the currently presented modal's
    /// `custom`/`small` detent back to the router. No-op if no modal is
    /// presented. Part of the view layer's measurement report-back contract.
    pub fn update_modal_ideal_height(&self, height: f64) {
        self.router.update_modal_ideal_height(height);
    }

    /// Reports a measured `min_height` for the currently presented modal's
    /// `custom`/`small` detent back to the router. No-op if no modal is
    /// presented.
    pub fn update_modal_min_height(&self, height: f64) {
        self.router.update_modal_min_height(height);
    }

    /// Reports a user-driven detent change for the currently presented modal
    /// back to the router. No-op if no modal is presented.
    pub fn update_modal_selected_detent(&self, detent: Detent) {
        self.router.update_modal_selected_detent(detent);
    }

    /// The default presentation context new children get; `Tab` for
    /// [`crate::TabCoordinator`], `Pushed` otherwise (reassigned to `Modal`
    /// or `Detour` on presentation).
    fn default_child_context(&self) -> PresentationContext {
        match self.kind {
            CoordinatorKind::Tab => PresentationContext::Tab,
            CoordinatorKind::Plain => PresentationContext::Pushed,
        }
    }

    pub fn add_child(&self, child: AnyCoordinatorHandle) -> Result<(), NavError> {
        if child.parent().is_some() {
            return Err(NavError::DuplicateChild {
                coordinator: self.name.clone(),
                child: child.debug_name(),
            });
        }
        if child.contains_descendant(self.id) {
            return Err(NavError::CircularReference {
                coordinator: self.name.clone(),
            });
        }
        child.set_parent(Some(self.me_weak()));
        child.set_presentation_context(self.default_child_context());
        self.children.borrow_mut().push(child);
        Ok(())
    }

    pub fn remove_child(&self, child: &AnyCoordinatorHandle) {
        let mut children = self.children.borrow_mut();
        if let Some(index) = children.iter().position(|c| c.id() == child.id()) {
            children.remove(index);
            drop(children);
            child.set_parent(None);
        }
    }

    pub fn add_modal_coordinator(&self, modal: AnyCoordinatorHandle) -> Result<(), NavError> {
        if modal.route_type_id() != TypeId::of::<R>() {
            return Err(NavError::ConfigurationError(format!(
                "modal coordinator registered on {} must share its route type",
                self.name
            )));
        }
        self.modal_coordinators.borrow_mut().push(modal);
        Ok(())
    }

    pub fn remove_modal_coordinator(&self, modal: &AnyCoordinatorHandle) {
        self.modal_coordinators
            .borrow_mut()
            .retain(|m| m.id() != modal.id());
    }

    /// Explicit detour presentation (never reachable via `navigate`).
    pub fn present_detour(&self, detour: AnyCoordinatorHandle, presenting: AnyRoute) {
        detour.set_parent(Some(self.me_weak()));
        detour.set_presentation_context(PresentationContext::Detour);
        self.router.present_detour(presenting);
        *self.detour_coordinator.borrow_mut() = Some(detour);
    }

    pub fn transition_to_new_flow(&self, root: R) {
        self.router.set_root(root);
    }

    /// Public entry point. Always starts a fresh validation pass; reentrant
    /// calls arriving while a navigation is already in progress on this
    /// coordinator (typically from a state-change subscriber) are queued
    /// and replayed, in order, once the outer call returns.
    pub fn navigate(&self, route: R) -> bool {
        if self.navigating.get() {
            tracing::debug!(
                target: "waypoint",
                coordinator = %self.name,
                route = %route.identifier(),
                "navigate deferred: reentrant call while already navigating"
            );
            self.deferred.borrow_mut().push_back(route);
            return true;
        }
        tracing::debug!(target: "waypoint", coordinator = %self.name, route = %route.identifier(), "navigate start");
        self.navigating.set(true);
        let validation = self.validate_navigate_impl(&route, None);
        let ok = validation.is_ok();
        let result = if ok {
            match self.execute_navigate_impl(&route, None) {
                Ok(()) => true,
                Err(err) => {
                    tracing::warn!(
                        target: "waypoint",
                        coordinator = %self.name,
                        route = %route.identifier(),
                        %err,
                        "navigate execution failed"
                    );
                    report(err);
                    false
                }
            }
        } else {
            if let Err(err) = validation {
                tracing::warn!(
                    target: "waypoint",
                    coordinator = %self.name,
                    route = %route.identifier(),
                    %err,
                    "navigate validation failed"
                );
                report(err);
            }
            false
        };
        self.navigating.set(false);
        tracing::debug!(target: "waypoint", coordinator = %self.name, route = %route.identifier(), result, "navigate finished");

        loop {
            let next = self.deferred.borrow_mut().pop_front();
            match next {
                Some(next_route) => {
                    self.navigate(next_route);
                }
                None => break,
            }
        }
        result
    }
}

// ---------------------------------------------------------------------
// Shared algorithm, parameterized only by `CoordinatorKind` for the
// children-delegation step (generic vs. tab-switching). Validation and
// execution deliberately mirror each other step for step; validation must
// never mutate.
// ---------------------------------------------------------------------

impl<R: Route + Clone + PartialEq + 'static> Coordinator<R> {
    fn is_caller(&self, handle: &AnyCoordinatorHandle, caller: Option<NodeId>) -> bool {
        caller == Some(handle.id())
    }

    fn caller_is_registered_child(&self, caller: Option<NodeId>) -> bool {
        match caller {
            Some(id) => self.children.borrow().iter().any(|c| c.id() == id),
            None => false,
        }
    }

    fn smart_navigation_applies(&self, route: &R) -> bool {
        let state = self.router.state();
        route == state.current_route() || state.stack.iter().any(|r| r == route) || *route == state.root
    }

    fn smart_navigation_execute(&self, caller: Option<NodeId>, route: &R) {
        let (already, in_stack) = {
            let state = self.router.state();
            (
                route == state.current_route(),
                state.stack.iter().any(|r| r == route),
            )
        };

        if let Some(caller_id) = caller {
            let caller_is_pushed_child = self
                .router
                .state()
                .pushed_children
                .iter()
                .any(|c| c.id() == caller_id);
            if caller_is_pushed_child {
                self.router.pop_child();
            }
        }

        if already {
            return;
        }
        if in_stack {
            self.router.pop_to(route);
        } else {
            self.router.pop_to_root();
        }
    }

    fn modal_is_caller(&self, caller: Option<NodeId>) -> bool {
        caller
            .zip(self.current_modal.borrow().as_ref().map(|m| m.id()))
            .map_or(false, |(c, m)| c == m)
    }

    fn detour_is_caller(&self, caller: Option<NodeId>) -> bool {
        caller
            .zip(self.detour_coordinator.borrow().as_ref().map(|d| d.id()))
            .map_or(false, |(c, d)| c == d)
    }

    fn validate_modal_and_detour(&self, route: &dyn Route, caller: Option<NodeId>) -> bool {
        let caller_is_child = self.caller_is_registered_child(caller);

        if !caller_is_child && !self.modal_is_caller(caller) {
            if let Some(modal) = self.current_modal.borrow().clone() {
                if modal.validate_navigate(route, Some(self.id)).is_ok() {
                    return true;
                }
            }
        }
        if !caller_is_child && !self.detour_is_caller(caller) {
            if let Some(detour) = self.detour_coordinator.borrow().clone() {
                if detour.validate_navigate(route, Some(self.id)).is_ok() {
                    return true;
                }
            }
        }
        false
    }

    fn validate_direct(&self, typed: Option<&R>) -> Result<bool, NavError> {
        let Some(route) = typed else {
            return Ok(false);
        };
        if !self.delegate.can_handle(route) {
            return Ok(false);
        }
        match self.delegate.navigation_type(route) {
            NavigationType::Push | NavigationType::Replace | NavigationType::TabSwitch(_) => {
                Ok(true)
            }
            NavigationType::Modal => {
                let current_ok = self
                    .current_modal
                    .borrow()
                    .as_ref()
                    .map_or(false, |m| m.can_navigate(route, None));
                let registered_ok = self
                    .modal_coordinators
                    .borrow()
                    .iter()
                    .any(|m| m.can_navigate(route, None));
                if current_ok || registered_ok {
                    Ok(true)
                } else {
                    Err(NavError::ModalCoordinatorNotConfigured {
                        coordinator: self.name.clone(),
                        route_id: route.identifier().to_string(),
                        route_type: std::any::type_name::<R>(),
                    })
                }
            }
        }
    }

    fn validate_children_generic(&self, route: &dyn Route, caller: Option<NodeId>) -> bool {
        let children = self.children.borrow().clone();
        for child in children {
            if self.is_caller(&child, caller) {
                continue;
            }
            if child.can_navigate(route, None) && child.validate_navigate(route, None).is_ok() {
                return true;
            }
        }
        let modals = self.modal_coordinators.borrow().clone();
        for modal in modals {
            if modal.can_navigate(route, None) && modal.validate_navigate(route, None).is_ok() {
                return true;
            }
        }
        false
    }

    fn validate_children_tab(&self, route: &dyn Route, caller: Option<NodeId>) -> bool {
        for child in self.tab_order(caller) {
            if child.can_navigate(route, None) && child.validate_navigate(route, None).is_ok() {
                return true;
            }
        }
        false
    }

    fn tab_order(&self, caller: Option<NodeId>) -> Vec<AnyCoordinatorHandle> {
        let children = self.children.borrow();
        let selected = self.router.state().selected_tab;
        let n = children.len();
        let mut order = Vec::with_capacity(n);
        if selected < n {
            order.push(children[selected].clone());
        }
        for (i, child) in children.iter().enumerate() {
            if i != selected {
                order.push(child.clone());
            }
        }
        drop(children);
        order.retain(|c| Some(c.id()) != caller);
        order
    }

    fn validate_bubble(&self, route: &dyn Route) -> Result<(), NavError> {
        match self.parent.borrow().as_ref().and_then(|p| p.upgrade()) {
            None => {
                if self.delegate.can_handle_flow_change(route) {
                    Ok(())
                } else {
                    Err(NavError::NavigationFailed {
                        coordinator: self.name.clone(),
                        route_id: route.identifier().to_string(),
                        route_type: "<type-erased>",
                        context: "reached the root of the tree with no handler and no flow change"
                            .to_string(),
                    })
                }
            }
            Some(parent) => parent.validate_navigate(route, Some(self.id)),
        }
    }

    pub(crate) fn validate_navigate_impl(
        &self,
        route: &dyn Route,
        caller: Option<NodeId>,
    ) -> Result<(), NavError> {
        tracing::debug!(
            target: "waypoint",
            coordinator = %self.name,
            route = %route.identifier(),
            ?caller,
            "validate_navigate"
        );
        let typed = route.as_any().downcast_ref::<R>();

        if let Some(typed_route) = typed {
            if self.smart_navigation_applies(typed_route) {
                return Ok(());
            }
        }

        if self.validate_modal_and_detour(route, caller) {
            return Ok(());
        }

        if self.validate_direct(typed)? {
            return Ok(());
        }

        let children_matched = match self.kind {
            CoordinatorKind::Plain => self.validate_children_generic(route, caller),
            CoordinatorKind::Tab => self.validate_children_tab(route, caller),
        };
        if children_matched {
            return Ok(());
        }

        self.validate_bubble(route)
    }

    fn build_path(&self, path: &[R]) -> bool {
        for step in path {
            match self.delegate.navigation_type(step) {
                NavigationType::Push => self.router.push(step.clone()),
                NavigationType::Replace => self.router.replace(step.clone()),
                other => {
                    report(NavError::ConfigurationError(format!(
                        "{}: navigation_path entry `{}` must resolve to Push or Replace, got {:?}",
                        self.name,
                        step.identifier(),
                        other
                    )));
                    return false;
                }
            }
        }
        true
    }

    fn dismiss_modal_impl(&self) {
        if let Some(modal) = self.current_modal.borrow_mut().take() {
            modal.set_parent(None);
        }
        self.router.dismiss_modal();
    }

    fn dismiss_detour_impl(&self) {
        if let Some(detour) = self.detour_coordinator.borrow_mut().take() {
            detour.set_parent(None);
        }
        self.router.dismiss_detour();
    }

    fn execute_modal_delegation(
        &self,
        route: &dyn Route,
        caller: Option<NodeId>,
        typed: Option<&R>,
    ) -> bool {
        let caller_is_child = self.caller_is_registered_child(caller);
        if caller_is_child || self.modal_is_caller(caller) {
            return false;
        }
        let Some(modal) = self.current_modal.borrow().clone() else {
            return false;
        };
        let ok = modal.execute_navigate(route, Some(self.id)).is_ok();
        let still_active = self.current_modal.borrow().is_some();
        if ok && still_active {
            return true;
        }
        let should_dismiss = !ok || typed.map_or(true, |r| self.delegate.should_dismiss_modal_for(r));
        if should_dismiss && self.current_modal.borrow().is_some() {
            self.dismiss_modal_impl();
        }
        false
    }

    fn execute_detour_delegation(&self, route: &dyn Route, caller: Option<NodeId>) -> bool {
        let caller_is_child = self.caller_is_registered_child(caller);
        if caller_is_child || self.detour_is_caller(caller) {
            return false;
        }
        let Some(detour) = self.detour_coordinator.borrow().clone() else {
            return false;
        };
        let ok = detour.execute_navigate(route, Some(self.id)).is_ok();
        let still_active = self.detour_coordinator.borrow().is_some();
        if ok && still_active {
            return true;
        }
        let should_dismiss = !ok || self.delegate.should_dismiss_detour_for(route);
        if should_dismiss && self.detour_coordinator.borrow().is_some() {
            self.dismiss_detour_impl();
        }
        false
    }

    fn execute_direct(&self, typed: Option<&R>) -> Result<bool, NavError> {
        let Some(route) = typed else {
            return Ok(false);
        };
        if !self.delegate.can_handle(route) {
            return Ok(false);
        }

        if let Some(path) = self.delegate.navigation_path(route) {
            if !path.is_empty() && self.router.state().stack.is_empty() && self.build_path(&path) {
                if path.iter().any(|step| step == route) {
                    return Ok(true);
                }
            }
        }

        match self.delegate.navigation_type(route) {
            NavigationType::Push => {
                self.router.push(route.clone());
                Ok(true)
            }
            NavigationType::Replace => {
                self.router.replace(route.clone());
                Ok(true)
            }
            NavigationType::TabSwitch(index) => {
                let count = self.children.borrow().len();
                if index >= count {
                    return Err(NavError::InvalidTabIndex {
                        index,
                        valid_range: count,
                    });
                }
                self.router.select_tab(index);
                Ok(true)
            }
            NavigationType::Modal => {
                let chosen = {
                    let current = self.current_modal.borrow().clone();
                    current
                        .filter(|c| c.can_handle_directly(route))
                        .or_else(|| {
                            self.modal_coordinators
                                .borrow()
                                .iter()
                                .find(|m| m.can_handle_directly(route))
                                .cloned()
                        })
                        .or_else(|| {
                            self.modal_coordinators
                                .borrow()
                                .iter()
                                .find(|m| m.can_navigate(route, None))
                                .cloned()
                        })
                };
                let Some(modal) = chosen else {
                    return Err(NavError::ModalCoordinatorNotConfigured {
                        coordinator: self.name.clone(),
                        route_id: route.identifier().to_string(),
                        route_type: std::any::type_name::<R>(),
                    });
                };
                let already_current = self
                    .current_modal
                    .borrow()
                    .as_ref()
                    .map_or(false, |c| c.id() == modal.id());
                if !already_current {
                    modal.set_parent(Some(self.me_weak()));
                    modal.set_presentation_context(PresentationContext::Modal);
                    let detent = self.delegate.modal_detent_configuration(route);
                    self.router.present(route.clone(), detent);
                    *self.current_modal.borrow_mut() = Some(modal.clone());
                }
                modal.execute_navigate(route, None)?;
                Ok(true)
            }
        }
    }

    /// Whether a child, once delegated into, should be pushed onto this
    /// coordinator's own stack (flattened rendering) or simply delegated
    /// into as-is. A child that claims the route directly with
    /// `Modal`/`Replace`/`TabSwitch` handles its own presentation; anything
    /// else (including "a deeper descendant handles it") defaults to push,
    /// since pushing is the generic mechanism for handing control to a
    /// subtree.
    fn child_presentation_kind(&self, child: &AnyCoordinatorHandle, route: &dyn Route) -> ChildPresentation {
        if child.can_handle_directly(route) {
            ChildPresentation::Delegate
        } else {
            ChildPresentation::Push
        }
    }

    fn execute_children_generic(
        &self,
        route: &dyn Route,
        caller: Option<NodeId>,
        typed: Option<&R>,
    ) -> bool {
        let children = self.children.borrow().clone();
        for child in children {
            if self.is_caller(&child, caller) || !child.can_navigate(route, None) {
                continue;
            }
            if matches!(
                self.child_presentation_kind(&child, route),
                ChildPresentation::Push
            ) {
                if self.router.state().stack.is_empty() {
                    if let Some(path) = typed.and_then(|r| self.delegate.navigation_path(r)) {
                        self.build_path(&path);
                    }
                }
                self.router.push_child(child.clone());
                child.set_parent(Some(self.me_weak()));
                child.set_presentation_context(PresentationContext::Pushed);
            }
            if child.execute_navigate(route, Some(self.id)).is_ok() {
                return true;
            }
        }

        if let Some(route_typed) = typed {
            let modals = self.modal_coordinators.borrow().clone();
            for modal in modals {
                if modal.can_navigate(route, None) {
                    if self.router.state().stack.is_empty() {
                        if let Some(path) = self.delegate.navigation_path(route_typed) {
                            self.build_path(&path);
                        }
                    }
                    modal.set_parent(Some(self.me_weak()));
                    modal.set_presentation_context(PresentationContext::Modal);
                    let detent = self.delegate.modal_detent_configuration(route_typed);
                    self.router.present(route_typed.clone(), detent);
                    *self.current_modal.borrow_mut() = Some(modal.clone());
                    if modal.execute_navigate(route, None).is_ok() {
                        return true;
                    }
                }
            }
        }
        false
    }

    fn execute_children_tab(&self, route: &dyn Route, caller: Option<NodeId>) -> bool {
        for child in self.tab_order(caller) {
            if !child.can_navigate(route, None) {
                continue;
            }
            let index = self.children.borrow().iter().position(|c| c.id() == child.id());
            if let Some(index) = index {
                self.router.select_tab(index);
            }
            if child.execute_navigate(route, None).is_ok() {
                return true;
            }
        }
        false
    }

    fn execute_bubble(&self, route: &dyn Route) -> Result<(), NavError> {
        let should_clean = route
            .as_any()
            .downcast_ref::<R>()
            .map_or(false, |r| self.delegate.should_clean_state_for_bubbling(r));
        if should_clean {
            self.clean_state_for_bubbling();
        }

        match self.parent.borrow().as_ref().and_then(|p| p.upgrade()) {
            None => {
                if self.delegate.handle_flow_change(route) {
                    Ok(())
                } else {
                    Err(NavError::NavigationFailed {
                        coordinator: self.name.clone(),
                        route_id: route.identifier().to_string(),
                        route_type: "<type-erased>",
                        context: "reached the root of the tree with no handler and no flow change"
                            .to_string(),
                    })
                }
            }
            Some(parent) => parent.execute_navigate(route, Some(self.id)),
        }
    }

    /// Clears this coordinator's active modal; subclasses may widen.
    pub(crate) fn clean_state_for_bubbling(&self) {
        if self.current_modal.borrow().is_some() {
            self.dismiss_modal_impl();
        }
    }

    pub(crate) fn execute_navigate_impl(
        &self,
        route: &dyn Route,
        caller: Option<NodeId>,
    ) -> Result<(), NavError> {
        tracing::debug!(
            target: "waypoint",
            coordinator = %self.name,
            route = %route.identifier(),
            ?caller,
            "execute_navigate"
        );
        let typed = route.as_any().downcast_ref::<R>();

        if let Some(typed_route) = typed {
            if self.smart_navigation_applies(typed_route) {
                self.smart_navigation_execute(caller, typed_route);
                return Ok(());
            }
        }

        if self.execute_modal_delegation(route, caller, typed) {
            return Ok(());
        }
        if self.execute_detour_delegation(route, caller) {
            return Ok(());
        }
        if self.execute_direct(typed)? {
            return Ok(());
        }

        let children_matched = match self.kind {
            CoordinatorKind::Plain => self.execute_children_generic(route, caller, typed),
            CoordinatorKind::Tab => self.execute_children_tab(route, caller),
        };
        if children_matched {
            return Ok(());
        }

        self.execute_bubble(route)
    }

    pub(crate) fn can_navigate_impl(&self, route: &dyn Route) -> bool {
        if self.can_handle_directly(route) {
            return true;
        }
        if self
            .children
            .borrow()
            .iter()
            .any(|c| c.can_navigate(route, None))
        {
            return true;
        }
        if self
            .modal_coordinators
            .borrow()
            .iter()
            .any(|m| m.can_navigate(route, None))
        {
            return true;
        }
        if let Some(modal) = self.current_modal.borrow().clone() {
            if modal.can_navigate(route, None) {
                return true;
            }
        }
        if let Some(detour) = self.detour_coordinator.borrow().clone() {
            if detour.can_navigate(route, None) {
                return true;
            }
        }
        false
    }

    pub(crate) fn pop_impl(&self) {
        if !self.router.state().stack.is_empty() {
            self.router.pop();
            return;
        }
        match self.presentation_context.get() {
            PresentationContext::Modal => {
                if let Some(parent) = self.parent.borrow().as_ref().and_then(|p| p.upgrade()) {
                    parent.dismiss_modal();
                }
            }
            PresentationContext::Detour => {
                if let Some(parent) = self.parent.borrow().as_ref().and_then(|p| p.upgrade()) {
                    parent.dismiss_detour();
                }
            }
            _ => {}
        }
    }

    pub(crate) fn reset_to_clean_state_impl(&self) {
        self.router.pop_to_root();
        self.dismiss_modal_impl();
        self.dismiss_detour_impl();
        for child in self.children.borrow().iter() {
            child.reset_to_clean_state();
        }
    }
}

enum ChildPresentation {
    Push,
    Delegate,
}

impl<R: Route + Clone + PartialEq + 'static> AnyCoordinator for Coordinator<R> {
    fn id(&self) -> NodeId {
        self.id
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn route_type_id(&self) -> TypeId {
        TypeId::of::<R>()
    }

    fn debug_name(&self) -> String {
        self.name.clone()
    }

    fn parent(&self) -> Option<AnyCoordinatorHandle> {
        self.parent.borrow().as_ref().and_then(|w| w.upgrade())
    }

    fn set_parent(&self, parent: Option<WeakAnyCoordinatorHandle>) {
        *self.parent.borrow_mut() = parent;
    }

    fn presentation_context(&self) -> PresentationContext {
        self.presentation_context.get()
    }

    fn set_presentation_context(&self, context: PresentationContext) {
        self.presentation_context.set(context);
    }

    fn contains_descendant(&self, id: NodeId) -> bool {
        self.id == id
            || self
                .children
                .borrow()
                .iter()
                .any(|c| c.contains_descendant(id))
    }

    fn can_handle_directly(&self, route: &dyn Route) -> bool {
        route
            .as_any()
            .downcast_ref::<R>()
            .map_or(false, |r| self.delegate.can_handle(r))
    }

    fn can_navigate(&self, route: &dyn Route, _caller: Option<NodeId>) -> bool {
        self.can_navigate_impl(route)
    }

    fn validate_navigate(&self, route: &dyn Route, caller: Option<NodeId>) -> Result<(), NavError> {
        self.validate_navigate_impl(route, caller)
    }

    fn execute_navigate(&self, route: &dyn Route, caller: Option<NodeId>) -> Result<(), NavError> {
        self.execute_navigate_impl(route, caller)
    }

    fn pop(&self) {
        self.pop_impl()
    }

    fn dismiss_modal(&self) {
        self.dismiss_modal_impl();
    }

    fn dismiss_detour(&self) {
        self.dismiss_detour_impl();
    }

    fn reset_to_clean_state(&self) {
        self.reset_to_clean_state_impl()
    }

    fn can_handle_flow_change(&self, route: &dyn Route) -> bool {
        self.delegate.can_handle_flow_change(route)
    }

    fn handle_flow_change(&self, route: &dyn Route) -> bool {
        self.delegate.handle_flow_change(route)
    }

    fn tab_item(&self) -> Option<(String, String)> {
        self.delegate.tab_item()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::FnViewFactory;
    use std::any::Any as StdAny;

    #[derive(Debug, Clone, PartialEq)]
    struct R(&'static str);
    impl Route for R {
        fn identifier(&self) -> &str {
            self.0
        }
        fn as_any(&self) -> &dyn StdAny {
            self
        }
    }

    struct Delegate {
        handles: Vec<&'static str>,
    }
    impl CoordinatorDelegate<R> for Delegate {
        fn can_handle(&self, route: &R) -> bool {
            self.handles.contains(&route.0)
        }
    }

    fn coordinator(name: &str, handles: Vec<&'static str>) -> Rc<Coordinator<R>> {
        Coordinator::new(
            name,
            R("home"),
            Box::new(Delegate { handles }),
            Box::new(FnViewFactory::new(|_: &R| Some(Box::new(()) as Box<dyn StdAny>))),
        )
    }

    #[test]
    fn smart_pop_to_existing() {
        let root = coordinator("root", vec![]);
        root.navigate(R("a"));
        root.navigate(R("b"));
        root.navigate(R("c"));
        assert!(root.navigate(R("a")));
        assert_eq!(root.router().state().stack, vec![R("a")]);
    }

    #[test]
    fn idempotent_self_navigation_produces_no_mutation() {
        let root = coordinator("root", vec![]);
        root.navigate(R("a"));
        let before = root.router().state();
        assert!(root.navigate(R("a")));
        let after = root.router().state();
        assert_eq!(before.stack, after.stack);
    }

    #[test]
    fn navigation_failed_when_nobody_handles() {
        let root = coordinator("root", vec![]);
        assert!(!root.navigate(R("unhandled")));
    }

    // The reporter is process-wide; serialize against other tests that
    // install a capturing reporter (see `error::tests`) so this assertion
    // isn't vulnerable to an unrelated concurrently running `navigate()`
    // failure landing in the same buffer.
    #[test]
    #[serial_test::serial(nav_reporter)]
    fn modal_not_configured_reports_error_and_mutates_nothing() {
        struct ModalDelegate;
        impl CoordinatorDelegate<R> for ModalDelegate {
            fn can_handle(&self, route: &R) -> bool {
                route.0 == "settings"
            }
            fn navigation_type(&self, _route: &R) -> NavigationType {
                NavigationType::Modal
            }
        }
        let root = Coordinator::new(
            "root",
            R("home"),
            Box::new(ModalDelegate),
            Box::new(FnViewFactory::new(|_: &R| Some(Box::new(()) as Box<dyn StdAny>))),
        );
        let before = root.router().state().stack.clone();

        let captured = crate::error::tests_support::install_capturing_reporter();
        assert!(!root.navigate(R("settings")));
        assert_eq!(root.router().state().stack, before);

        let reported = captured.lock().unwrap();
        assert!(reported
            .iter()
            .any(|err| matches!(err, NavError::ModalCoordinatorNotConfigured { .. })));
    }

    #[test]
    fn modal_detent_updates_reach_the_presented_modal() {
        struct ModalDelegate;
        impl CoordinatorDelegate<R> for ModalDelegate {
            fn can_handle(&self, route: &R) -> bool {
                route.0 == "settings"
            }
            fn navigation_type(&self, _route: &R) -> NavigationType {
                NavigationType::Modal
            }
        }
        struct ModalRootDelegate;
        impl CoordinatorDelegate<R> for ModalRootDelegate {
            fn can_handle(&self, route: &R) -> bool {
                route.0 == "settings"
            }
        }

        let root = Coordinator::new(
            "root",
            R("home"),
            Box::new(ModalDelegate),
            Box::new(FnViewFactory::new(|_: &R| Some(Box::new(()) as Box<dyn StdAny>))),
        );
        let modal = Coordinator::new(
            "settings-modal",
            R("settings"),
            Box::new(ModalRootDelegate),
            Box::new(FnViewFactory::new(|_: &R| Some(Box::new(()) as Box<dyn StdAny>))),
        );
        root.add_modal_coordinator(modal.clone()).unwrap();

        assert!(root.navigate(R("settings")));
        assert!(root.router().state().modal_detent_configuration.is_some());

        root.update_modal_ideal_height(240.0);
        root.update_modal_min_height(120.0);
        root.update_modal_selected_detent(crate::detent::Detent::Medium);

        let cfg = root
            .router()
            .state()
            .modal_detent_configuration
            .expect("modal still presented");
        assert_eq!(cfg.ideal_height(), Some(240.0));
        assert_eq!(cfg.min_height(), Some(120.0));
        assert_eq!(cfg.selected_detent(), Some(crate::detent::Detent::Medium));
    }

    #[test]
    fn child_gets_pushed_and_reached() {
        let root = coordinator("root", vec![]);
        let child = coordinator("child", vec!["detail"]);
        root.add_child(child.clone()).unwrap();

        assert!(root.navigate(R("detail")));
        assert_eq!(root.router().state().pushed_children.len(), 1);
        assert_eq!(child.presentation_context(), PresentationContext::Pushed);
        assert_eq!(child.router().state().stack, vec![R("detail")]);
    }

    #[test]
    fn cycle_rejected() {
        let a = coordinator("a", vec![]);
        let b = coordinator("b", vec![]);
        a.add_child(b.clone()).unwrap();
        let err = b.add_child(a.clone());
        assert!(matches!(err, Err(NavError::CircularReference { .. })));
    }

    #[test]
    fn duplicate_child_rejected() {
        let a = coordinator("a", vec![]);
        let b = coordinator("b", vec![]);
        let c = coordinator("c", vec![]);
        a.add_child(b.clone()).unwrap();
        let err = c.add_child(b.clone());
        assert!(matches!(err, Err(NavError::DuplicateChild { .. })));
    }
}
