// src/pages/page_manager.rs
//! Screen rotation state machine.
//!
//! The manager stores the current screen as a raw index plus a tick counter.
//! Each tick it renders the screen, bumps the counter and, once the counter
//! reaches the screen's duration, moves to the next screen with the counter
//! back at zero. A stored index that names no screen renders nothing and
//! restarts the rotation at the animation.

use embedded_hal::delay::DelayNs;
use log::{debug, warn};

use crate::app_state::MonitorState;
use crate::config::MonitorConfig;
use crate::display::Display;
use crate::pages::animation::CatAnimation;
use crate::pages::page::{Acquisition, Page, PageId, PageWrapper};

pub struct PageManager {
    index: u8,
    elapsed: u8,
    /// Screen whose labels are currently on the panel.
    drawn: Option<PageId>,
    animation: CatAnimation,
}

impl PageManager {
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            index: PageId::Animation.index(),
            elapsed: 0,
            drawn: None,
            animation: CatAnimation::from_config(config),
        }
    }

    /// Resume from a stored position. The index is not validated here; an
    /// out-of-range value is repaired on the next tick.
    pub fn from_raw(config: &MonitorConfig, index: u8, elapsed: u8) -> Self {
        Self {
            index,
            elapsed,
            ..Self::new(config)
        }
    }

    /// The current screen, or `None` if the stored index is out of range.
    pub fn current(&self) -> Option<PageId> {
        PageId::from_index(self.index)
    }

    pub fn elapsed(&self) -> u8 {
        self.elapsed
    }

    pub fn drawn(&self) -> Option<PageId> {
        self.drawn
    }

    /// What the current screen wants acquired before this tick renders.
    pub fn needs(&self) -> Acquisition {
        self.current()
            .map(PageId::needs)
            .unwrap_or(Acquisition::Nothing)
    }

    /// Render the current screen and advance the rotation.
    ///
    /// The rotation advances even when rendering fails; the error is handed
    /// back for the caller to log.
    pub fn tick<D, T>(
        &mut self,
        display: &mut D,
        delay: &mut T,
        state: &MonitorState,
    ) -> Result<(), D::Error>
    where
        D: Display,
        T: DelayNs,
    {
        let Some(page) = self.current() else {
            warn!("Invalid screen index {}, restarting rotation", self.index);
            self.index = PageId::Animation.index();
            self.elapsed = 0;
            self.drawn = None;
            return Ok(());
        };

        let result = self.render(page, display, delay, state);
        self.advance(page);
        result
    }

    fn render<D, T>(
        &mut self,
        page: PageId,
        display: &mut D,
        delay: &mut T,
        state: &MonitorState,
    ) -> Result<(), D::Error>
    where
        D: Display,
        T: DelayNs,
    {
        let Some(text_page) = PageWrapper::for_id(page) else {
            // The animation clears the panel every frame, so whatever comes
            // next must redraw its labels.
            self.drawn = None;
            return self.animation.play(display, delay, state.overall);
        };

        if self.drawn != Some(page) {
            display.clear()?;
            text_page.draw_labels(display)?;
            self.drawn = Some(page);
        }
        text_page.draw_values(display, state)?;
        display.flush()
    }

    fn advance(&mut self, page: PageId) {
        self.elapsed = self.elapsed.saturating_add(1);
        if self.elapsed >= page.duration_ticks() {
            let next = page.next();
            debug!("Screen {:?} -> {:?}", page, next);
            self.index = next.index();
            self.elapsed = 0;
        }
    }
}

impl Default for PageManager {
    fn default() -> Self {
        Self::new(&MonitorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::TextGridDisplay;
    use embedded_hal_mock::eh1::delay::NoopDelay;

    fn tick(manager: &mut PageManager, display: &mut TextGridDisplay) {
        manager
            .tick(display, &mut NoopDelay::new(), &MonitorState::default())
            .unwrap();
    }

    #[test]
    fn animation_lasts_three_ticks() {
        let mut manager = PageManager::default();
        let mut display = TextGridDisplay::new();

        for expected_elapsed in 1..3 {
            tick(&mut manager, &mut display);
            assert_eq!(manager.current(), Some(PageId::Animation));
            assert_eq!(manager.elapsed(), expected_elapsed);
        }

        tick(&mut manager, &mut display);
        assert_eq!(manager.current(), Some(PageId::EnvironmentValues));
        assert_eq!(manager.elapsed(), 0);
    }

    #[test]
    fn full_cycle_is_seventeen_ticks() {
        let mut manager = PageManager::default();
        let mut display = TextGridDisplay::new();
        let mut visited: heapless::Vec<PageId, 32> = heapless::Vec::new();

        for _ in 0..17 {
            visited.push(manager.current().unwrap()).unwrap();
            tick(&mut manager, &mut display);
        }

        assert_eq!(manager.current(), Some(PageId::Animation));
        assert_eq!(manager.elapsed(), 0);
        for id in PageId::ALL {
            let ticks = visited.iter().filter(|seen| **seen == id).count();
            assert_eq!(ticks, id.duration_ticks() as usize, "{:?}", id);
        }
    }

    #[test]
    fn out_of_range_index_resets_without_drawing() {
        let config = MonitorConfig::default();
        let mut manager = PageManager::from_raw(&config, 9, 4);
        let mut display = TextGridDisplay::new();

        assert_eq!(manager.current(), None);
        assert_eq!(manager.needs(), Acquisition::Nothing);

        tick(&mut manager, &mut display);

        assert_eq!(manager.current(), Some(PageId::Animation));
        assert_eq!(manager.elapsed(), 0);
        assert_eq!(display.clears(), 0);
        assert_eq!(display.flushes(), 0);
    }

    #[test]
    fn labels_are_drawn_once_per_visit() {
        let config = MonitorConfig::default();
        let mut manager = PageManager::from_raw(&config, PageId::EnvironmentValues.index(), 0);
        let mut display = TextGridDisplay::new();

        for _ in 0..5 {
            tick(&mut manager, &mut display);
        }

        assert_eq!(display.clears(), 1);
        assert_eq!(display.flushes(), 5);
        assert_eq!(manager.drawn(), Some(PageId::EnvironmentValues));
        assert_eq!(display.row_text(2), "Temperature : 25 C");

        // Moving to the levels screen clears and draws its own labels.
        tick(&mut manager, &mut display);
        assert_eq!(display.clears(), 2);
        assert_eq!(manager.drawn(), Some(PageId::EnvironmentLevels));
        assert_eq!(display.row_text(7), "");
    }

    #[test]
    fn animation_forces_next_screen_to_redraw() {
        let config = MonitorConfig::default().with_animation(1, 0);
        let mut manager = PageManager::from_raw(&config, PageId::ParticulateLevels.index(), 0);
        let mut display = TextGridDisplay::new();

        tick(&mut manager, &mut display);
        assert_eq!(manager.drawn(), Some(PageId::ParticulateLevels));
        tick(&mut manager, &mut display);
        assert_eq!(manager.current(), Some(PageId::Animation));

        tick(&mut manager, &mut display);
        assert_eq!(manager.drawn(), None);
        assert_eq!(display.row_text(7), "  Air quality: GOOD");
    }

    #[test]
    fn needs_follow_the_current_screen() {
        let config = MonitorConfig::default();

        let manager = PageManager::from_raw(&config, PageId::EnvironmentValues.index(), 2);
        assert_eq!(manager.needs(), Acquisition::Environment);

        let manager = PageManager::from_raw(&config, PageId::ParticulateValues.index(), 0);
        assert_eq!(manager.needs(), Acquisition::Particulate);

        assert_eq!(PageManager::default().needs(), Acquisition::Nothing);
    }
}
