//! The value container a [`crate::Router`] owns and publishes.

use std::rc::Rc;

use crate::coordinator::AnyCoordinatorHandle;
use crate::detent::ModalDetentConfiguration;
use crate::route::{AnyRoute, Route};

/// A coordinator's navigation state: root, push stack, selected tab,
/// presented modal, presented detour, pushed-child coordinators, and modal
/// detent configuration.
#[derive(Debug, Clone)]
pub struct NavigationState<R: Route + Clone> {
    pub root: R,
    pub stack: Vec<R>,
    pub selected_tab: usize,
    pub presented: Option<R>,
    pub detour: Option<AnyRoute>,
    pub pushed_children: Vec<AnyCoordinatorHandle>,
    pub modal_detent_configuration: Option<ModalDetentConfiguration>,
}

impl<R: Route + Clone> NavigationState<R> {
    pub fn new(root: R) -> Self {
        Self {
            root,
            stack: Vec::new(),
            selected_tab: 0,
            presented: None,
            detour: None,
            pushed_children: Vec::new(),
            modal_detent_configuration: None,
        }
    }

    /// `presented OR last(stack) OR root`.
    pub fn current_route(&self) -> &R {
        self.presented
            .as_ref()
            .or_else(|| self.stack.last())
            .unwrap_or(&self.root)
    }
}

impl<R: Route + Clone + PartialEq> PartialEq for NavigationState<R> {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root
            && self.stack == other.stack
            && self.selected_tab == other.selected_tab
            && self.presented == other.presented
            && self.detour == other.detour
            && self.pushed_children.len() == other.pushed_children.len()
            && self
                .pushed_children
                .iter()
                .zip(other.pushed_children.iter())
                .all(|(a, b)| Rc::ptr_eq(a, b))
            && detent_eq(&self.modal_detent_configuration, &other.modal_detent_configuration)
    }
}

fn detent_eq(a: &Option<ModalDetentConfiguration>, b: &Option<ModalDetentConfiguration>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => {
            a.detents() == b.detents()
                && a.selected_detent() == b.selected_detent()
                && a.min_height() == b.min_height()
                && a.ideal_height() == b.ideal_height()
        }
        _ => false,
    }
}
