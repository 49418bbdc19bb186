//! Modal detent configuration: data the engine stores and publishes, never
//! renders.

use std::collections::HashSet;

/// A sheet/cover detent the view layer may offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Detent {
    Small,
    Medium,
    Large,
    ExtraLarge,
    Fullscreen,
    Custom,
}

/// The set of allowed detents for a presented modal, plus the currently
/// selected one and any measured heights the view layer has reported back.
#[derive(Debug, Clone, Default)]
pub struct ModalDetentConfiguration {
    detents: HashSet<Detent>,
    selected: Option<Detent>,
    min_height: Option<f64>,
    ideal_height: Option<f64>,
}

impl ModalDetentConfiguration {
    pub fn new(detents: impl IntoIterator<Item = Detent>) -> Self {
        Self {
            detents: detents.into_iter().collect(),
            selected: None,
            min_height: None,
            ideal_height: None,
        }
    }

    /// `large`, the default fallback the original implementation uses when no
    /// configuration is supplied for a presented modal.
    pub fn large() -> Self {
        Self::new([Detent::Large])
    }

    pub fn detents(&self) -> &HashSet<Detent> {
        &self.detents
    }

    pub fn selected_detent(&self) -> Option<Detent> {
        self.selected
    }

    pub fn min_height(&self) -> Option<f64> {
        self.min_height
    }

    pub fn ideal_height(&self) -> Option<f64> {
        self.ideal_height
    }

    /// `true` iff this configuration allows exactly one detent and it is
    /// `Fullscreen` — the signal the view layer uses to pick a fullscreen
    /// cover over a sheet.
    pub fn should_use_fullscreen_cover(&self) -> bool {
        self.detents.len() == 1 && self.detents.contains(&Detent::Fullscreen)
    }

    pub(crate) fn set_selected_detent(&mut self, detent: Detent) {
        self.selected = Some(detent);
    }

    pub(crate) fn set_min_height(&mut self, height: f64) {
        self.min_height = Some(height);
    }

    pub(crate) fn set_ideal_height(&mut self, height: f64) {
        self.ideal_height = Some(height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fullscreen_cover_requires_exactly_one_fullscreen_detent() {
        let cfg = ModalDetentConfiguration::new([Detent::Fullscreen]);
        assert!(cfg.should_use_fullscreen_cover());

        let cfg = ModalDetentConfiguration::new([Detent::Fullscreen, Detent::Large]);
        assert!(!cfg.should_use_fullscreen_cover());

        let cfg = ModalDetentConfiguration::large();
        assert!(!cfg.should_use_fullscreen_cover());
    }
}
