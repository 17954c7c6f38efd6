//! Temperature, humidity and gas screens

use core::fmt::Write;

use heapless::String;

use crate::app_state::MonitorState;
use crate::display::Display;
use crate::pages::constants::*;
use crate::pages::page::{Page, PageId, write_at, write_field};

const TEMPERATURE_LABEL: &str = "Temperature : ";
const HUMIDITY_LABEL: &str = "Humidity    : ";
const GAS_LEVEL_LABEL: &str = "CO2 level   : ";
const GAS_RAW_LABEL: &str = "CO2 raw     : ";

fn draw_common_labels<D: Display>(display: &mut D) -> Result<(), D::Error> {
    write_at(display, 0, TEMPERATURE_ROW, TEMPERATURE_LABEL)?;
    write_at(display, 0, HUMIDITY_ROW, HUMIDITY_LABEL)?;
    write_at(display, 0, GAS_LEVEL_ROW, GAS_LEVEL_LABEL)
}

fn field<D: Display>(display: &mut D, row: u8, text: &str) -> Result<(), D::Error> {
    write_field(
        display,
        ENVIRONMENT_FIELD_COLUMN,
        row,
        ENVIRONMENT_FIELD_WIDTH,
        text,
    )
}

/// Temperature in C, humidity in %, gas level and the raw gas value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnvironmentValuesPage;

impl Page for EnvironmentValuesPage {
    fn id(&self) -> PageId {
        PageId::EnvironmentValues
    }

    fn draw_labels<D: Display>(&self, display: &mut D) -> Result<(), D::Error> {
        draw_common_labels(display)?;
        write_at(display, 0, GAS_RAW_ROW, GAS_RAW_LABEL)
    }

    fn draw_values<D: Display>(
        &self,
        display: &mut D,
        state: &MonitorState,
    ) -> Result<(), D::Error> {
        let mut text: String<8> = String::new();

        write!(text, "{} C", state.environment.temperature).ok();
        field(display, TEMPERATURE_ROW, &text)?;

        text.clear();
        write!(text, "{} %", state.environment.humidity).ok();
        field(display, HUMIDITY_ROW, &text)?;

        field(display, GAS_LEVEL_ROW, state.levels.gas.label())?;

        text.clear();
        write!(text, "{}", state.gas.value()).ok();
        field(display, GAS_RAW_ROW, &text)
    }
}

/// Quality levels for temperature, humidity and gas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnvironmentLevelsPage;

impl Page for EnvironmentLevelsPage {
    fn id(&self) -> PageId {
        PageId::EnvironmentLevels
    }

    fn draw_labels<D: Display>(&self, display: &mut D) -> Result<(), D::Error> {
        draw_common_labels(display)
    }

    fn draw_values<D: Display>(
        &self,
        display: &mut D,
        state: &MonitorState,
    ) -> Result<(), D::Error> {
        field(display, TEMPERATURE_ROW, state.levels.temperature.label())?;
        field(display, HUMIDITY_ROW, state.levels.humidity.label())?;
        field(display, GAS_LEVEL_ROW, state.levels.gas.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::QualityLevel;
    use crate::sensors::{EnvironmentReading, RawGasSample};
    use crate::sim::TextGridDisplay;

    fn state() -> MonitorState {
        let mut state = MonitorState::default();
        state.record_environment(Ok(EnvironmentReading::new(23, 45)));
        state.record_gas(RawGasSample::new(321));
        state
    }

    #[test]
    fn values_screen_layout() {
        let mut display = TextGridDisplay::new();
        let page = EnvironmentValuesPage;

        page.draw_labels(&mut display).unwrap();
        page.draw_values(&mut display, &state()).unwrap();

        assert_eq!(display.row_text(2), "Temperature : 23 C");
        assert_eq!(display.row_text(4), "Humidity    : 45 %");
        assert_eq!(display.row_text(6), "CO2 level   : NORMAL");
        assert_eq!(display.row_text(7), "CO2 raw     : 321");
    }

    #[test]
    fn shorter_value_leaves_no_residue() {
        let mut display = TextGridDisplay::new();
        let page = EnvironmentValuesPage;
        let mut state = state();
        page.draw_labels(&mut display).unwrap();
        page.draw_values(&mut display, &state).unwrap();

        state.record_gas(RawGasSample::new(7));
        page.draw_values(&mut display, &state).unwrap();

        assert_eq!(display.row_text(6), "CO2 level   : GOOD");
        assert_eq!(display.row_text(7), "CO2 raw     : 7");
    }

    #[test]
    fn levels_screen_shows_error_label() {
        let mut display = TextGridDisplay::new();
        let page = EnvironmentLevelsPage;
        let mut state = state();
        state.levels.temperature = QualityLevel::Error;
        state.levels.humidity = QualityLevel::Error;

        page.draw_labels(&mut display).unwrap();
        page.draw_values(&mut display, &state).unwrap();

        assert_eq!(display.row_text(2), "Temperature : ERR");
        assert_eq!(display.row_text(4), "Humidity    : ERR");
        assert_eq!(display.row_text(6), "CO2 level   : NORMAL");
        assert_eq!(display.row_text(7), "");
    }
}
