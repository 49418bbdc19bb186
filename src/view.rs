//! The pure route-to-view mapping supplied by the embedder.

use std::any::Any;

use crate::route::Route;

/// Builds whatever the view layer renders for a route. Pure and synchronous;
/// the engine never interprets the returned value, only asks for it. The
/// view is type-erased (`Box<dyn Any>`) so [`crate::Router`] can stay
/// generic over the route type alone; the view layer downcasts it back to
/// its concrete widget type.
pub trait ViewFactory<R: Route> {
    /// Returns `None` to signal the defined "no view for this route" error
    /// condition (surfaced by the router as `ViewCreationFailed`).
    fn build_view(&self, route: &R) -> Option<Box<dyn Any>>;
}

/// A [`ViewFactory`] built from a closure, for embedders who don't need a
/// dedicated type.
pub struct FnViewFactory<R, F>
where
    F: Fn(&R) -> Option<Box<dyn Any>>,
{
    f: F,
    _marker: std::marker::PhantomData<R>,
}

impl<R, F> FnViewFactory<R, F>
where
    F: Fn(&R) -> Option<Box<dyn Any>>,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<R: Route, F> ViewFactory<R> for FnViewFactory<R, F>
where
    F: Fn(&R) -> Option<Box<dyn Any>>,
{
    fn build_view(&self, route: &R) -> Option<Box<dyn Any>> {
        (self.f)(route)
    }
}
