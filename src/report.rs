//! Sensor report payload
//!
//! Stations exchange their readings as plain text, one report per frame:
//!
//! ```text
//! Temp: 23.50;Press: 1013.20;Umidade: 55.00
//! ```
//!
//! Values carry two decimals. Temperature is in °C, pressure in hPa and
//! relative humidity in percent.

use core::fmt::Write;

use heapless::String;

use crate::Error;

/// Longest report that fits in one frame.
pub const MAX_FRAME_LEN: usize = 255;

/// Encoded report, ready for [`Radio::send`](crate::Radio::send).
pub type Frame = String<MAX_FRAME_LEN>;

const TEMPERATURE_LABEL: &str = "Temp:";
const PRESSURE_LABEL: &str = "Press:";
const HUMIDITY_LABEL: &str = "Umidade:";

/// One set of station readings.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Report {
    /// Air temperature, °C
    pub temperature: f32,
    /// Barometric pressure, hPa
    pub pressure: f32,
    /// Relative humidity, %
    pub humidity: f32,
}

impl Report {
    /// Renders the report in its over-the-air form.
    ///
    /// # Errors
    /// * `Error::PayloadTooLarge` - the text does not fit in one frame
    pub fn encode(&self) -> Result<Frame, Error> {
        let mut frame = Frame::new();
        write!(
            frame,
            "{} {:.2};{} {:.2};{} {:.2}",
            TEMPERATURE_LABEL,
            self.temperature,
            PRESSURE_LABEL,
            self.pressure,
            HUMIDITY_LABEL,
            self.humidity
        )
        .map_err(|_| Error::PayloadTooLarge)?;
        Ok(frame)
    }

    /// Reads a report back from received bytes.
    ///
    /// Anything from the first NUL on is ignored, as is surrounding
    /// whitespace. All three fields must be present, in order, or nothing is
    /// returned.
    ///
    /// # Errors
    /// * `Error::MalformedFrame` - the text is not a report
    pub fn parse(frame: &[u8]) -> Result<Self, Error> {
        let text = frame.split(|byte| *byte == 0).next().unwrap_or_default();
        let text = core::str::from_utf8(text).map_err(|_| Error::MalformedFrame)?;

        let mut fields = text.trim().split(';');
        let report = Self {
            temperature: field(fields.next(), TEMPERATURE_LABEL)?,
            pressure: field(fields.next(), PRESSURE_LABEL)?,
            humidity: field(fields.next(), HUMIDITY_LABEL)?,
        };

        if fields.any(|rest| !rest.trim().is_empty()) {
            return Err(Error::MalformedFrame);
        }
        Ok(report)
    }
}

fn field(part: Option<&str>, label: &str) -> Result<f32, Error> {
    part.and_then(|part| part.trim_start().strip_prefix(label))
        .and_then(|value| value.trim().parse().ok())
        .ok_or(Error::MalformedFrame)
}
