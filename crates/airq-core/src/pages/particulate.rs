//! PM2.5 and PM10 screens

use core::fmt::Write;

use heapless::String;

use crate::app_state::MonitorState;
use crate::display::Display;
use crate::pages::constants::*;
use crate::pages::page::{Page, PageId, write_at, write_field};

const PM25_LABEL: &str = "PM2.5 : ";
const PM10_LABEL: &str = "PM10  : ";

fn draw_pm_labels<D: Display>(display: &mut D) -> Result<(), D::Error> {
    write_at(display, 0, PM25_ROW, PM25_LABEL)?;
    write_at(display, 0, PM10_ROW, PM10_LABEL)
}

fn field<D: Display>(display: &mut D, row: u8, text: &str) -> Result<(), D::Error> {
    write_field(
        display,
        PARTICULATE_FIELD_COLUMN,
        row,
        PARTICULATE_FIELD_WIDTH,
        text,
    )
}

/// Format tenths of ug/m3 with one decimal place, e.g. `150` -> `15.0 ug/m3`.
fn concentration(tenths: u16) -> String<16> {
    let mut text = String::new();
    write!(text, "{}.{} ug/m3", tenths / 10, tenths % 10).ok();
    text
}

/// Particulate concentrations in ug/m3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParticulateValuesPage;

impl Page for ParticulateValuesPage {
    fn id(&self) -> PageId {
        PageId::ParticulateValues
    }

    fn draw_labels<D: Display>(&self, display: &mut D) -> Result<(), D::Error> {
        draw_pm_labels(display)
    }

    fn draw_values<D: Display>(
        &self,
        display: &mut D,
        state: &MonitorState,
    ) -> Result<(), D::Error> {
        field(display, PM25_ROW, &concentration(state.particulate.pm25_tenths))?;
        field(display, PM10_ROW, &concentration(state.particulate.pm10_tenths))
    }
}

/// Particulate quality levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParticulateLevelsPage;

impl Page for ParticulateLevelsPage {
    fn id(&self) -> PageId {
        PageId::ParticulateLevels
    }

    fn draw_labels<D: Display>(&self, display: &mut D) -> Result<(), D::Error> {
        draw_pm_labels(display)
    }

    fn draw_values<D: Display>(
        &self,
        display: &mut D,
        state: &MonitorState,
    ) -> Result<(), D::Error> {
        field(display, PM25_ROW, state.levels.pm25.label())?;
        field(display, PM10_ROW, state.levels.pm10.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::ParticulateReading;
    use crate::sim::TextGridDisplay;

    #[test]
    fn concentration_has_one_decimal() {
        assert_eq!(concentration(150).as_str(), "15.0 ug/m3");
        assert_eq!(concentration(7).as_str(), "0.7 ug/m3");
        assert_eq!(concentration(u16::MAX).as_str(), "6553.5 ug/m3");
    }

    #[test]
    fn values_screen_layout() {
        let mut display = TextGridDisplay::new();
        let page = ParticulateValuesPage;
        let state = MonitorState::default();

        page.draw_labels(&mut display).unwrap();
        page.draw_values(&mut display, &state).unwrap();

        assert_eq!(display.row_text(2), "PM2.5 : 15.0 ug/m3");
        assert_eq!(display.row_text(6), "PM10  : 20.0 ug/m3");
    }

    #[test]
    fn levels_screen_layout() {
        let mut display = TextGridDisplay::new();
        let page = ParticulateLevelsPage;
        let mut state = MonitorState::default();
        state.record_particulate(Ok(ParticulateReading::new(420, 655)));

        page.draw_labels(&mut display).unwrap();
        page.draw_values(&mut display, &state).unwrap();

        assert_eq!(display.row_text(2), "PM2.5 : NORMAL");
        assert_eq!(display.row_text(6), "PM10  : BAD");
    }
}
