//! # Raspberry Pi Transport
//!
//! [`Transport`] implementation for an SX1278 module wired to the 40-pin
//! header of a Raspberry Pi, using the `rppal` crate for SPI and GPIO.
//!
//! ## Wiring (defaults, BCM numbering)
//!
//! ```text
//! Pi Pin │ BCM GPIO │ SX1278 Pin │ Function
//! ───────┼──────────┼────────────┼─────────────
//! 19     │ GPIO 10  │ MOSI       │ SPI data out
//! 21     │ GPIO 9   │ MISO       │ SPI data in
//! 23     │ GPIO 11  │ SCK        │ SPI clock
//! 24     │ GPIO 8   │ NSS        │ Chip select (CE0)
//! 15     │ GPIO 22  │ RESET      │ Reset (output, active low)
//! 12     │ GPIO 18  │ DIO0       │ RxDone / TxDone (input)
//! 16     │ GPIO 23  │ DIO1       │ RxTimeout (input, unused)
//! ```
//!
//! SPI must be enabled in `/boot/config.txt` (`dtparam=spi=on`).

use super::{ControlLine, Transport, TransportError};
use crate::config::BusConfig;
use rppal::gpio::{Gpio, InputPin, Level, OutputPin};
use rppal::spi::{BitOrder, Bus, Mode, SlaveSelect, Spi};

/// Resources held while the transport is open
struct OpenBus {
    spi: Spi,
    reset: OutputPin,
    dio0: InputPin,
    // Held so the pin stays configured as input
    _dio1: InputPin,
}

/// SPI + GPIO transport for the Raspberry Pi
#[derive(Default)]
pub struct RaspberryPiTransport {
    bus: Option<OpenBus>,
}

impl RaspberryPiTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn bus(&mut self) -> Result<&mut OpenBus, TransportError> {
        self.bus.as_mut().ok_or(TransportError::NotOpen)
    }

    fn spi_handle(config: &BusConfig) -> Result<Spi, TransportError> {
        let bus = match config.spi_bus {
            0 => Bus::Spi0,
            1 => Bus::Spi1,
            other => {
                return Err(TransportError::InvalidConfig(format!(
                    "Invalid SPI bus {other}, only 0 and 1 are supported"
                )))
            }
        };
        let slave_select = match config.spi_device {
            0 => SlaveSelect::Ss0,
            1 => SlaveSelect::Ss1,
            2 => SlaveSelect::Ss2,
            other => {
                return Err(TransportError::InvalidConfig(format!(
                    "Invalid SPI chip select {other}"
                )))
            }
        };

        let spi = Spi::new(bus, slave_select, config.spi_speed_hz, Mode::Mode0)
            .map_err(|e| TransportError::Spi(e.to_string()))?;
        spi.set_bit_order(BitOrder::MsbFirst)
            .map_err(|e| TransportError::Spi(e.to_string()))?;
        Ok(spi)
    }

    fn transfer(&mut self, address: u8, value: u8) -> Result<u8, TransportError> {
        let bus = self.bus()?;
        let write = [address, value];
        let mut read = [0u8; 2];
        bus.spi
            .transfer(&mut read, &write)
            .map_err(|e| TransportError::Spi(e.to_string()))?;
        Ok(read[1])
    }
}

impl Transport for RaspberryPiTransport {
    fn open(&mut self, config: &BusConfig) -> Result<(), TransportError> {
        // Drop any previous handles before claiming the pins again
        self.bus = None;

        let spi = Self::spi_handle(config)?;
        let gpio = Gpio::new().map_err(|e| TransportError::Gpio(e.to_string()))?;
        let pin = |number: u8| {
            gpio.get(number)
                .map_err(|e| TransportError::Gpio(format!("GPIO {number}: {e}")))
        };

        let mut reset = pin(config.reset_pin)?.into_output();
        reset.set_high();
        let dio0 = pin(config.dio0_pin)?.into_input();
        let dio1 = pin(config.dio1_pin)?.into_input();

        log::info!(
            "Raspberry Pi transport opened: SPI{}.{} @ {} Hz, RESET GPIO {}, DIO0 GPIO {}, DIO1 GPIO {}",
            config.spi_bus,
            config.spi_device,
            config.spi_speed_hz,
            config.reset_pin,
            config.dio0_pin,
            config.dio1_pin
        );

        self.bus = Some(OpenBus {
            spi,
            reset,
            dio0,
            _dio1: dio1,
        });
        Ok(())
    }

    fn close(&mut self) {
        if self.bus.take().is_some() {
            log::debug!("Raspberry Pi transport closed");
        }
    }

    fn is_open(&self) -> bool {
        self.bus.is_some()
    }

    fn write_register(&mut self, address: u8, value: u8) -> Result<(), TransportError> {
        self.transfer(address | 0x80, value).map(|_| ())
    }

    fn read_register(&mut self, address: u8) -> Result<u8, TransportError> {
        self.transfer(address & 0x7F, 0x00)
    }

    fn set_control_line(&mut self, line: ControlLine, high: bool) -> Result<(), TransportError> {
        let bus = self.bus()?;
        match line {
            ControlLine::Reset => {
                if high {
                    bus.reset.set_high();
                } else {
                    bus.reset.set_low();
                }
                Ok(())
            }
            ControlLine::PacketReady => Err(TransportError::LineUnavailable(line)),
        }
    }

    fn read_control_line(&mut self, line: ControlLine) -> Result<bool, TransportError> {
        let bus = self.bus()?;
        match line {
            ControlLine::Reset => Ok(bus.reset.is_set_high()),
            ControlLine::PacketReady => Ok(bus.dio0.read() == Level::High),
        }
    }
}
