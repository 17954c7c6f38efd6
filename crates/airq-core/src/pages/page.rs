// src/pages/page.rs
//! Screen identifiers and the text page abstraction.
//!
//! Four of the five screens are static label columns with a few fields that
//! change every tick. They implement [`Page`] and are stored through
//! [`PageWrapper`], an enum that dispatches without trait objects. The
//! animation screen plays frames with delays and is driven directly by the
//! [`PageManager`](super::page_manager::PageManager).

use crate::app_state::MonitorState;
use crate::display::Display;
use crate::pages::constants::*;
use crate::pages::environment::{EnvironmentLevelsPage, EnvironmentValuesPage};
use crate::pages::particulate::{ParticulateLevelsPage, ParticulateValuesPage};

// ---------------------------------------------------------------------------
// PageId
// ---------------------------------------------------------------------------

/// The screens in rotation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PageId {
    Animation = 0,
    EnvironmentValues = 1,
    EnvironmentLevels = 2,
    ParticulateValues = 3,
    ParticulateLevels = 4,
}

/// Fresh data a screen wants before it is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquisition {
    /// Levels and the overall rating are enough.
    Nothing,
    /// Read the DHT11.
    Environment,
    /// Read the SDS018.
    Particulate,
}

impl PageId {
    pub const ALL: [PageId; 5] = [
        PageId::Animation,
        PageId::EnvironmentValues,
        PageId::EnvironmentLevels,
        PageId::ParticulateValues,
        PageId::ParticulateLevels,
    ];

    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Animation),
            1 => Some(Self::EnvironmentValues),
            2 => Some(Self::EnvironmentLevels),
            3 => Some(Self::ParticulateValues),
            4 => Some(Self::ParticulateLevels),
            _ => None,
        }
    }

    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Ticks the screen stays up before the rotation moves on.
    pub const fn duration_ticks(self) -> u8 {
        match self {
            Self::Animation => ANIMATION_TICKS,
            Self::EnvironmentValues => ENVIRONMENT_VALUES_TICKS,
            Self::EnvironmentLevels => ENVIRONMENT_LEVELS_TICKS,
            Self::ParticulateValues => PARTICULATE_VALUES_TICKS,
            Self::ParticulateLevels => PARTICULATE_LEVELS_TICKS,
        }
    }

    /// The following screen, wrapping back to the animation.
    pub const fn next(self) -> Self {
        match self {
            Self::Animation => Self::EnvironmentValues,
            Self::EnvironmentValues => Self::EnvironmentLevels,
            Self::EnvironmentLevels => Self::ParticulateValues,
            Self::ParticulateValues => Self::ParticulateLevels,
            Self::ParticulateLevels => Self::Animation,
        }
    }

    pub const fn needs(self) -> Acquisition {
        match self {
            Self::EnvironmentValues => Acquisition::Environment,
            Self::ParticulateValues => Acquisition::Particulate,
            _ => Acquisition::Nothing,
        }
    }
}

// ---------------------------------------------------------------------------
// Page trait
// ---------------------------------------------------------------------------

/// A text screen: labels drawn once on entry, fields refreshed every tick.
pub trait Page {
    fn id(&self) -> PageId;

    /// Draw the static labels onto a cleared panel.
    fn draw_labels<D: Display>(&self, display: &mut D) -> Result<(), D::Error>;

    /// Blank and rewrite every changing field.
    fn draw_values<D: Display>(&self, display: &mut D, state: &MonitorState)
    -> Result<(), D::Error>;
}

/// Write `text` starting at a cell.
pub(crate) fn write_at<D: Display>(
    display: &mut D,
    col: u8,
    row: u8,
    text: &str,
) -> Result<(), D::Error> {
    display.move_cursor(col, row)?;
    display.write_text(text)
}

const BLANK: &str = "                     ";

/// Blank `width` cells at a position, then write `text` there.
pub(crate) fn write_field<D: Display>(
    display: &mut D,
    col: u8,
    row: u8,
    width: usize,
    text: &str,
) -> Result<(), D::Error> {
    write_at(display, col, row, &BLANK[..width.min(BLANK.len())])?;
    write_at(display, col, row, text)
}

// ---------------------------------------------------------------------------
// PageWrapper
// ---------------------------------------------------------------------------

/// One of the text screens.
///
/// When adding a text screen, add a variant here and the delegation in the
/// [`Page`] impl below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageWrapper {
    EnvironmentValues(EnvironmentValuesPage),
    EnvironmentLevels(EnvironmentLevelsPage),
    ParticulateValues(ParticulateValuesPage),
    ParticulateLevels(ParticulateLevelsPage),
}

impl PageWrapper {
    /// The text page for `id`, or `None` for the animation.
    pub const fn for_id(id: PageId) -> Option<Self> {
        match id {
            PageId::Animation => None,
            PageId::EnvironmentValues => Some(Self::EnvironmentValues(EnvironmentValuesPage)),
            PageId::EnvironmentLevels => Some(Self::EnvironmentLevels(EnvironmentLevelsPage)),
            PageId::ParticulateValues => Some(Self::ParticulateValues(ParticulateValuesPage)),
            PageId::ParticulateLevels => Some(Self::ParticulateLevels(ParticulateLevelsPage)),
        }
    }
}

impl Page for PageWrapper {
    fn id(&self) -> PageId {
        match self {
            PageWrapper::EnvironmentValues(page) => page.id(),
            PageWrapper::EnvironmentLevels(page) => page.id(),
            PageWrapper::ParticulateValues(page) => page.id(),
            PageWrapper::ParticulateLevels(page) => page.id(),
        }
    }

    fn draw_labels<D: Display>(&self, display: &mut D) -> Result<(), D::Error> {
        match self {
            PageWrapper::EnvironmentValues(page) => page.draw_labels(display),
            PageWrapper::EnvironmentLevels(page) => page.draw_labels(display),
            PageWrapper::ParticulateValues(page) => page.draw_labels(display),
            PageWrapper::ParticulateLevels(page) => page.draw_labels(display),
        }
    }

    fn draw_values<D: Display>(
        &self,
        display: &mut D,
        state: &MonitorState,
    ) -> Result<(), D::Error> {
        match self {
            PageWrapper::EnvironmentValues(page) => page.draw_values(display, state),
            PageWrapper::EnvironmentLevels(page) => page.draw_values(display, state),
            PageWrapper::ParticulateValues(page) => page.draw_values(display, state),
            PageWrapper::ParticulateLevels(page) => page.draw_values(display, state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::TextGridDisplay;

    #[test]
    fn rotation_visits_every_screen_and_wraps() {
        let mut id = PageId::Animation;
        for expected in PageId::ALL.iter().skip(1) {
            id = id.next();
            assert_eq!(id, *expected);
        }
        assert_eq!(id.next(), PageId::Animation);
    }

    #[test]
    fn index_round_trips_and_rejects_out_of_range() {
        for id in PageId::ALL {
            assert_eq!(PageId::from_index(id.index()), Some(id));
        }
        assert_eq!(PageId::from_index(5), None);
        assert_eq!(PageId::from_index(u8::MAX), None);
    }

    #[test]
    fn durations_and_needs() {
        let durations: [u8; 5] = PageId::ALL.map(PageId::duration_ticks);
        assert_eq!(durations, [3, 5, 2, 5, 2]);

        assert_eq!(PageId::EnvironmentValues.needs(), Acquisition::Environment);
        assert_eq!(PageId::ParticulateValues.needs(), Acquisition::Particulate);
        assert_eq!(PageId::Animation.needs(), Acquisition::Nothing);
        assert_eq!(PageId::EnvironmentLevels.needs(), Acquisition::Nothing);
    }

    #[test]
    fn wrapper_exists_for_text_screens_only() {
        assert!(PageWrapper::for_id(PageId::Animation).is_none());
        for id in PageId::ALL.iter().skip(1) {
            assert_eq!(PageWrapper::for_id(*id).map(|page| page.id()), Some(*id));
        }
    }

    #[test]
    fn field_is_blanked_before_rewrite() {
        let mut display = TextGridDisplay::new();
        write_at(&mut display, 0, 1, "0123456789ABCDEFGHIJK").unwrap();

        write_field(&mut display, 4, 1, 6, "xy").unwrap();

        assert_eq!(display.row_text(1), "0123xy    ABCDEFGHIJK");
    }
}
