//! Weather station loop state
//!
//! A [`Station`] is one node of the link. In transmit mode every
//! [`tick`](Station::tick) reads the local sensors and broadcasts a
//! [`Report`]; in receive mode it picks up the peer's report, if one arrived,
//! and keeps it as the current readings.
//!
//! Buttons switch modes. Their interrupt handler only pushes a
//! [`ButtonEvent`] into an [`EventQueue`]; the loop drains it through
//! [`handle_events`](Station::handle_events), which also debounces.
//!
//! ```ignore
//! static mut EVENTS: EventQueue = EventQueue::new();
//! let (mut producer, mut consumer) = unsafe { EVENTS.split() };
//!
//! // interrupt handler
//! producer.enqueue(ButtonEvent { button: Button::B, at_ms: now_ms() }).ok();
//!
//! // main loop
//! loop {
//!     station.handle_events(&mut consumer, &mut radio)?;
//!     let tick = station.tick(&mut radio, &mut sensors)?;
//!     display.show(station.readings(), tick);
//!     delay.delay_ms(LOOP_PERIOD_MS);
//! }
//! ```

use core::fmt::Debug;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;
use heapless::spsc::{Consumer, Queue};
use log::{debug, info, warn};

use crate::{report::MAX_FRAME_LEN, Error, Radio, Report};

/// Presses of the same button closer than this are dropped.
pub const DEBOUNCE_MS: u32 = 200;

/// Pause the main loop takes between two ticks.
pub const LOOP_PERIOD_MS: u32 = 200;

/// Slots in the button event queue; one is kept free by the queue.
pub const EVENT_QUEUE_LEN: usize = 8;

/// Queue shared between the button interrupt and the main loop.
pub type EventQueue = Queue<ButtonEvent, EVENT_QUEUE_LEN>;

/// Source of local readings.
pub trait Sensors {
    type Error: Debug;

    fn read(&mut self) -> Result<Report, Self::Error>;
}

/// What the node is doing with the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StationMode {
    /// Broadcast local readings every tick
    Transmit,
    /// Listen for the peer's readings
    Receive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Button {
    /// Selects transmit mode
    A,
    /// Selects receive mode
    B,
}

impl Button {
    fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }
}

/// Button press as recorded by the interrupt handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonEvent {
    pub button: Button,
    /// Milliseconds since boot at the falling edge
    pub at_ms: u32,
}

/// Outcome of one loop iteration, for whoever drives the display.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Tick {
    /// Local readings went out
    Transmitted(Report),
    /// Peer readings came in and are now current
    Received(Report),
    /// A frame came in but was not usable; readings unchanged
    Rejected,
    /// Nothing happened
    Idle,
}

/// State of one station node.
#[derive(Debug)]
pub struct Station {
    mode: StationMode,
    readings: Report,
    last_press: [Option<u32>; 2],
}

impl Default for Station {
    fn default() -> Self {
        Self::new(StationMode::Transmit)
    }
}

impl Station {
    /// Station state only. The radio is left as it is, so a station that
    /// starts in [`StationMode::Receive`] also needs
    /// [`set_mode`](Station::set_mode), or use [`with_radio`](Station::with_radio).
    pub fn new(mode: StationMode) -> Self {
        Self {
            mode,
            readings: Report::default(),
            last_press: [None; 2],
        }
    }

    pub fn mode(&self) -> StationMode {
        self.mode
    }

    /// Latest readings, local or received depending on the mode.
    pub fn readings(&self) -> &Report {
        &self.readings
    }

    /// Takes in received text.
    ///
    /// Readings only change when the whole report parses.
    pub fn apply_frame(&mut self, frame: &[u8]) -> Tick {
        match Report::parse(frame) {
            Ok(report) => {
                self.readings = report;
                Tick::Received(report)
            }
            Err(err) => {
                warn!("ignoring frame: {}", err);
                Tick::Rejected
            }
        }
    }

    /// Whether a press at `at_ms` counts, recording it if so.
    fn debounce(&mut self, event: &ButtonEvent) -> bool {
        let last = &mut self.last_press[event.button.index()];
        if last.is_some_and(|previous| event.at_ms.wrapping_sub(previous) <= DEBOUNCE_MS) {
            return false;
        }
        *last = Some(event.at_ms);
        true
    }
}

impl Station {
    /// Creates a station and puts `radio` where `mode` wants it.
    pub fn with_radio<SPI, RST, DELAY>(
        mode: StationMode,
        radio: &mut Radio<SPI, RST, DELAY>,
    ) -> Result<Self, Error>
    where
        SPI: SpiDevice,
        RST: OutputPin,
        DELAY: DelayNs,
    {
        let mut station = Self::new(mode);
        station.set_mode(mode, radio)?;
        Ok(station)
    }

    /// Switches the node's mode and puts the radio where that mode wants it.
    pub fn set_mode<SPI, RST, DELAY>(
        &mut self,
        mode: StationMode,
        radio: &mut Radio<SPI, RST, DELAY>,
    ) -> Result<(), Error>
    where
        SPI: SpiDevice,
        RST: OutputPin,
        DELAY: DelayNs,
    {
        match mode {
            StationMode::Transmit => radio.standby()?,
            StationMode::Receive => radio.enter_receive_mode()?,
        }
        if mode != self.mode {
            info!("station mode {:?} -> {:?}", self.mode, mode);
        }
        self.mode = mode;
        Ok(())
    }

    /// Drains queued button presses and applies the ones that survive the
    /// debounce.
    pub fn handle_events<SPI, RST, DELAY>(
        &mut self,
        events: &mut Consumer<'_, ButtonEvent, EVENT_QUEUE_LEN>,
        radio: &mut Radio<SPI, RST, DELAY>,
    ) -> Result<(), Error>
    where
        SPI: SpiDevice,
        RST: OutputPin,
        DELAY: DelayNs,
    {
        while let Some(event) = events.dequeue() {
            if !self.debounce(&event) {
                debug!("bounce on {:?} at {} ms", event.button, event.at_ms);
                continue;
            }
            let mode = match event.button {
                Button::A => StationMode::Transmit,
                Button::B => StationMode::Receive,
            };
            self.set_mode(mode, radio)?;
        }
        Ok(())
    }

    /// Runs one loop iteration.
    ///
    /// A sensor failure skips the broadcast; the previous readings stay.
    pub fn tick<SPI, RST, DELAY, S>(
        &mut self,
        radio: &mut Radio<SPI, RST, DELAY>,
        sensors: &mut S,
    ) -> Result<Tick, Error>
    where
        SPI: SpiDevice,
        RST: OutputPin,
        DELAY: DelayNs,
        S: Sensors,
    {
        match self.mode {
            StationMode::Transmit => {
                let report = match sensors.read() {
                    Ok(report) => report,
                    Err(err) => {
                        warn!("sensor read failed: {:?}", err);
                        return Ok(Tick::Idle);
                    }
                };
                self.readings = report;
                let frame = report.encode()?;
                radio.send(frame.as_bytes())?;
                Ok(Tick::Transmitted(report))
            }
            StationMode::Receive => {
                if !radio.is_data_available()? {
                    return Ok(Tick::Idle);
                }
                let mut buffer = [0u8; MAX_FRAME_LEN];
                match radio.receive(&mut buffer) {
                    Ok(Some(len)) => Ok(self.apply_frame(&buffer[..len])),
                    Ok(None) => Ok(Tick::Idle),
                    Err(Error::CrcMismatch) => Ok(Tick::Rejected),
                    Err(err) => Err(err),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{self, Shared, SimDelay, SimReset, SimSpi};
    use crate::registers::{IrqFlags, OperatingMode};
    use crate::Config;

    struct FixedSensors(Option<Report>);

    impl Sensors for FixedSensors {
        type Error = ();

        fn read(&mut self) -> Result<Report, ()> {
            self.0.ok_or(())
        }
    }

    fn sample() -> Report {
        Report {
            temperature: 23.5,
            pressure: 1013.2,
            humidity: 55.0,
        }
    }

    fn radio() -> (Shared, Radio<SimSpi, SimReset, SimDelay>) {
        let (chip, spi, reset, delay) = mock::sim();
        let mut radio = Radio::new(spi, reset, delay, Config::default());
        radio.init().unwrap();
        (chip, radio)
    }

    #[test]
    fn transmit_tick_broadcasts_readings() {
        let (chip, mut radio) = radio();
        let mut station = Station::default();
        let mut sensors = FixedSensors(Some(sample()));

        assert_eq!(
            Ok(Tick::Transmitted(sample())),
            station.tick(&mut radio, &mut sensors)
        );

        assert_eq!(&sample(), station.readings());
        let writes = chip.borrow().fifo_writes();
        assert_eq!(
            Some(&(0x00, b"Temp: 23.50;Press: 1013.20;Umidade: 55.00".to_vec())),
            writes.last()
        );
    }

    #[test]
    fn sensor_failure_skips_broadcast() {
        let (chip, mut radio) = radio();
        let mut station = Station::default();

        assert_eq!(
            Ok(Tick::Idle),
            station.tick(&mut radio, &mut FixedSensors(None))
        );
        assert!(chip.borrow().fifo_writes().is_empty());
    }

    #[test]
    fn receive_tick_takes_peer_readings() {
        let (chip, mut radio) = radio();
        let mut station = Station::new(StationMode::Receive);
        let mut sensors = FixedSensors(None);

        assert_eq!(Ok(Tick::Idle), station.tick(&mut radio, &mut sensors));

        chip.borrow_mut()
            .deliver(b"Temp: 18.25;Press: 990.50;Umidade: 71.00");
        let expected = Report {
            temperature: 18.25,
            pressure: 990.5,
            humidity: 71.0,
        };
        assert_eq!(
            Ok(Tick::Received(expected)),
            station.tick(&mut radio, &mut sensors)
        );
        assert_eq!(&expected, station.readings());
        assert!(!chip.borrow().irq_flags().contains(IrqFlags::RX_DONE));
    }

    #[test]
    fn receive_station_starts_listening() {
        let (chip, mut radio) = radio();
        assert_eq!(OperatingMode::Standby, radio.mode());

        let mut station = Station::with_radio(StationMode::Receive, &mut radio).unwrap();

        assert_eq!(StationMode::Receive, station.mode());
        assert_eq!(OperatingMode::ReceiveContinuous, radio.mode());
        assert_eq!(0x85, chip.borrow().reg(0x01));

        chip.borrow_mut()
            .deliver(b"Temp: 10.00;Press: 1000.00;Umidade: 50.00");
        assert!(matches!(
            station.tick(&mut radio, &mut FixedSensors(None)),
            Ok(Tick::Received(_))
        ));
    }

    #[test]
    fn malformed_frame_keeps_readings() {
        let (chip, mut radio) = radio();
        let mut station = Station::new(StationMode::Receive);
        station.apply_frame(b"Temp: 10.00;Press: 1000.00;Umidade: 50.00");
        let before = *station.readings();

        chip.borrow_mut().deliver(b"garbage");

        assert_eq!(
            Ok(Tick::Rejected),
            station.tick(&mut radio, &mut FixedSensors(None))
        );
        assert_eq!(&before, station.readings());
    }

    #[test]
    fn buttons_switch_mode() {
        let (chip, mut radio) = radio();
        let mut station = Station::default();
        let mut queue = EventQueue::new();
        let (mut producer, mut consumer) = queue.split();

        producer
            .enqueue(ButtonEvent {
                button: Button::B,
                at_ms: 1_000,
            })
            .unwrap();
        station.handle_events(&mut consumer, &mut radio).unwrap();

        assert_eq!(StationMode::Receive, station.mode());
        assert_eq!(OperatingMode::ReceiveContinuous, radio.mode());
        assert_eq!(0x85, chip.borrow().reg(0x01));

        producer
            .enqueue(ButtonEvent {
                button: Button::A,
                at_ms: 1_050,
            })
            .unwrap();
        station.handle_events(&mut consumer, &mut radio).unwrap();

        assert_eq!(StationMode::Transmit, station.mode());
        assert_eq!(OperatingMode::Standby, radio.mode());
    }

    #[test]
    fn bounces_are_dropped() {
        let (_, mut radio) = radio();
        let mut station = Station::default();
        let mut queue = EventQueue::new();
        let (mut producer, mut consumer) = queue.split();

        for (button, at_ms) in [
            (Button::B, 500),
            (Button::A, 600),
            (Button::A, 700),
            (Button::B, 650),
        ] {
            producer.enqueue(ButtonEvent { button, at_ms }).unwrap();
        }
        station.handle_events(&mut consumer, &mut radio).unwrap();

        // B at 650 is within 200 ms of B at 500, A at 700 of A at 600
        assert_eq!(StationMode::Transmit, station.mode());

        producer
            .enqueue(ButtonEvent {
                button: Button::B,
                at_ms: 701,
            })
            .unwrap();
        station.handle_events(&mut consumer, &mut radio).unwrap();
        assert_eq!(StationMode::Receive, station.mode());
    }
}
