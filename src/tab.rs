//! A coordinator specialized for tab-bar navigation.

use std::rc::Rc;

use crate::coordinator::{AnyCoordinatorHandle, Coordinator, CoordinatorDelegate};
use crate::error::NavError;
use crate::route::Route;
use crate::view::ViewFactory;

/// Wraps a [`Coordinator`] configured to try the selected tab first, then
/// the remaining tabs in order, switching the selected tab only for a
/// child that passes `can_navigate`. Falls straight through to bubbling —
/// never the generic children loop — when no tab can handle a route.
pub struct TabCoordinator<R: Route + Clone + PartialEq + 'static>(Rc<Coordinator<R>>);

impl<R: Route + Clone + PartialEq + 'static> TabCoordinator<R> {
    pub fn new(
        name: impl Into<String>,
        root: R,
        delegate: Box<dyn CoordinatorDelegate<R>>,
        factory: Box<dyn ViewFactory<R>>,
    ) -> Self {
        Self(Coordinator::new_tab(name, root, delegate, factory))
    }

    /// The underlying coordinator, for access to its router, `navigate`,
    /// `add_child`, and so on.
    pub fn coordinator(&self) -> &Rc<Coordinator<R>> {
        &self.0
    }

    /// `(label, icon)` pairs for every tab, in child order, as supplied by
    /// each child's own delegate.
    pub fn tab_items(&self) -> Vec<Option<(String, String)>> {
        self.0
            .children
            .borrow()
            .iter()
            .map(|child| child.tab_item())
            .collect()
    }

    pub fn select_tab(&self, index: usize) -> Result<(), NavError> {
        let count = self.0.children.borrow().len();
        if index >= count {
            return Err(NavError::InvalidTabIndex {
                index,
                valid_range: count,
            });
        }
        self.0.router().select_tab(index);
        Ok(())
    }

    pub fn selected_tab(&self) -> usize {
        self.0.router().state().selected_tab
    }

    pub fn add_tab(&self, child: AnyCoordinatorHandle) -> Result<(), NavError> {
        self.0.add_child(child)
    }
}

impl<R: Route + Clone + PartialEq + 'static> std::ops::Deref for TabCoordinator<R> {
    type Target = Coordinator<R>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::DefaultDelegate;
    use crate::navigation_type::NavigationType;
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

    struct Delegate(&'static str);
    impl CoordinatorDelegate<R> for Delegate {
        fn can_handle(&self, route: &R) -> bool {
            route.0 == self.0
        }
        fn navigation_type(&self, _route: &R) -> NavigationType {
            NavigationType::Push
        }
        fn tab_item(&self) -> Option<(String, String)> {
            Some((self.0.to_string(), "icon".to_string()))
        }
    }

    fn leaf(handles: &'static str) -> Rc<Coordinator<R>> {
        Coordinator::new(
            handles,
            R("root"),
            Box::new(Delegate(handles)),
            Box::new(FnViewFactory::new(|_: &R| Some(Box::new(()) as Box<dyn Any>))),
        )
    }

    #[test]
    fn cross_tab_navigation_switches_selected_tab() {
        let tabs = TabCoordinator::new(
            "tabs",
            R("root"),
            Box::new(DefaultDelegate),
            Box::new(FnViewFactory::new(|_: &R| Some(Box::new(()) as Box<dyn Any>))),
        );
        tabs.add_tab(leaf("home")).unwrap();
        tabs.add_tab(leaf("settings")).unwrap();

        assert!(tabs.coordinator().navigate(R("settings")));
        assert_eq!(tabs.selected_tab(), 1);
        assert_eq!(
            tabs.tab_items(),
            vec![
                Some(("home".to_string(), "icon".to_string())),
                Some(("settings".to_string(), "icon".to_string())),
            ]
        );
    }

    #[test]
    fn out_of_range_tab_rejected() {
        let tabs = TabCoordinator::new(
            "tabs",
            R("root"),
            Box::new(DefaultDelegate),
            Box::new(FnViewFactory::new(|_: &R| Some(Box::new(()) as Box<dyn Any>))),
        );
        tabs.add_tab(leaf("home")).unwrap();
        assert!(matches!(
            tabs.select_tab(5),
            Err(NavError::InvalidTabIndex { .. })
        ));
    }
}
