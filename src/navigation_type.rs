//! How a claimed route is brought on screen.

/// Tags the way a coordinator presents a route it has claimed via
/// `can_handle`. There is deliberately no `Detour` variant — detours are
/// presented through an explicit API and never returned from
/// `navigation_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationType {
    Push,
    Replace,
    Modal,
    TabSwitch(usize),
}

impl Default for NavigationType {
    fn default() -> Self {
        NavigationType::Push
    }
}
