//! In-memory SX127x stand-in
//!
//! [`SimulatedTransport`] implements [`Transport`] without any hardware so
//! the driver, the listener and the gateway can run on a development host.
//! It models just enough of the chip for the driver's register sequences:
//!
//! - a 128-entry register file; untouched registers read as zero
//! - the 256-byte FIFO addressed through `RegFifoAddrPtr`
//! - write-1-to-clear `RegIrqFlags`, with DIO0 following RxDone or TxDone
//!   as selected by `RegDioMapping1`
//! - transmit completion: entering TX mode captures the frame and raises
//!   TxDone (disable with [`SimulatedTransport::set_auto_tx_done`])
//! - a queue of inbound frames delivered one at a time
//!
//! Clones share the same simulated chip, so a test can keep a handle after
//! moving the transport into the driver.

use super::{ControlLine, Transport, TransportError};
use crate::config::BusConfig;
use crate::constants::MAX_PAYLOAD_LEN;
use crate::radio::irq::IrqFlags;
use crate::radio::registers::*;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Raw RSSI register value used by [`SimulatedTransport::inject_frame`] (-64 dBm)
pub const DEFAULT_SIM_RSSI_RAW: u8 = 100;

/// Raw SNR register value used by [`SimulatedTransport::inject_frame`] (+10 dB)
pub const DEFAULT_SIM_SNR_RAW: u8 = 40;

/// A frame the simulated radio put on the air
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransmittedFrame {
    /// Bytes taken from the FIFO at `RegFifoTxBaseAddr`
    pub payload: Vec<u8>,
    /// Carrier register value programmed at transmit time
    pub frf: u32,
}

#[derive(Debug, Clone)]
struct PendingFrame {
    payload: Vec<u8>,
    rssi_raw: u8,
    snr_raw: u8,
    crc_error: bool,
}

struct SimState {
    open: bool,
    registers: [u8; 128],
    fifo: [u8; 256],
    reset_high: bool,
    reset_pulses: u32,
    auto_tx_done: bool,
    fail_transfers: bool,
    pending: VecDeque<PendingFrame>,
    transmitted: Vec<TransmittedFrame>,
    write_log: Vec<(u8, u8)>,
    open_count: u32,
    close_count: u32,
}

impl SimState {
    fn new() -> Self {
        Self {
            open: false,
            registers: [0; 128],
            fifo: [0; 256],
            reset_high: true,
            reset_pulses: 0,
            auto_tx_done: true,
            fail_transfers: false,
            pending: VecDeque::new(),
            transmitted: Vec::new(),
            write_log: Vec::new(),
            open_count: 0,
            close_count: 0,
        }
    }

    fn reg(&self, address: u8) -> u8 {
        self.registers[(address & 0x7F) as usize]
    }

    fn set_reg(&mut self, address: u8, value: u8) {
        self.registers[(address & 0x7F) as usize] = value;
    }

    fn irq_flags(&self) -> IrqFlags {
        IrqFlags::from_bits_retain(self.reg(REG_IRQ_FLAGS))
    }

    fn raise(&mut self, flags: IrqFlags) {
        let current = self.irq_flags() | flags;
        self.set_reg(REG_IRQ_FLAGS, current.bits());
    }

    fn check_transfer(&self) -> Result<(), TransportError> {
        if !self.open {
            return Err(TransportError::NotOpen);
        }
        if self.fail_transfers {
            return Err(TransportError::Spi("simulated transfer failure".to_string()));
        }
        Ok(())
    }

    fn fifo_next(&mut self) -> usize {
        let ptr = self.reg(REG_FIFO_ADDR_PTR);
        self.set_reg(REG_FIFO_ADDR_PTR, ptr.wrapping_add(1));
        ptr as usize
    }

    fn dio0(&self) -> bool {
        let flags = self.irq_flags();
        match self.reg(REG_DIO_MAPPING_1) & 0xC0 {
            DIO0_RX_DONE => flags.rx_done(),
            DIO0_TX_DONE => flags.tx_done(),
            _ => false,
        }
    }

    fn frf(&self) -> u32 {
        (self.reg(REG_FRF_MSB) as u32) << 16
            | (self.reg(REG_FRF_MID) as u32) << 8
            | self.reg(REG_FRF_LSB) as u32
    }

    fn transmit(&mut self) {
        let base = self.reg(REG_FIFO_TX_BASE_ADDR);
        let len = self.reg(REG_PAYLOAD_LENGTH) as usize;
        let payload = (0..len)
            .map(|i| self.fifo[base.wrapping_add(i as u8) as usize])
            .collect();
        let frf = self.frf();
        self.transmitted.push(TransmittedFrame { payload, frf });
        self.raise(IrqFlags::TX_DONE);
    }

    /// Deliver the next queued frame once the previous one was acknowledged.
    fn load_next_frame(&mut self) {
        if self.irq_flags().rx_done() {
            return;
        }
        let Some(frame) = self.pending.pop_front() else {
            return;
        };

        let base = self.reg(REG_FIFO_RX_BASE_ADDR);
        for (i, byte) in frame.payload.iter().enumerate() {
            self.fifo[base.wrapping_add(i as u8) as usize] = *byte;
        }
        self.set_reg(REG_FIFO_RX_CURRENT_ADDR, base);
        self.set_reg(REG_RX_NB_BYTES, frame.payload.len() as u8);
        self.set_reg(REG_PKT_RSSI_VALUE, frame.rssi_raw);
        self.set_reg(REG_PKT_SNR_VALUE, frame.snr_raw);

        let mut flags = IrqFlags::RX_DONE | IrqFlags::VALID_HEADER;
        if frame.crc_error {
            flags |= IrqFlags::PAYLOAD_CRC_ERROR;
        }
        self.raise(flags);
    }
}

/// Simulated transport backed by an in-memory chip model
#[derive(Clone)]
pub struct SimulatedTransport {
    state: Arc<Mutex<SimState>>,
}

impl Default for SimulatedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedTransport {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState::new())),
        }
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue an inbound frame with default link quality.
    pub fn inject_frame(&self, payload: &[u8]) {
        self.inject_frame_with_quality(payload, DEFAULT_SIM_RSSI_RAW, DEFAULT_SIM_SNR_RAW);
    }

    /// Queue an inbound frame with explicit raw RSSI and SNR register values.
    ///
    /// Payloads longer than the hardware FIFO are cut at 255 bytes, as the
    /// radio would never deliver more.
    pub fn inject_frame_with_quality(&self, payload: &[u8], rssi_raw: u8, snr_raw: u8) {
        let len = payload.len().min(MAX_PAYLOAD_LEN);
        let mut state = self.state();
        state.pending.push_back(PendingFrame {
            payload: payload[..len].to_vec(),
            rssi_raw,
            snr_raw,
            crc_error: false,
        });
        state.load_next_frame();
    }

    /// Queue a frame that the radio will report with PayloadCrcError set.
    pub fn inject_crc_error(&self, payload: &[u8]) {
        let len = payload.len().min(MAX_PAYLOAD_LEN);
        let mut state = self.state();
        state.pending.push_back(PendingFrame {
            payload: payload[..len].to_vec(),
            rssi_raw: DEFAULT_SIM_RSSI_RAW,
            snr_raw: DEFAULT_SIM_SNR_RAW,
            crc_error: true,
        });
        state.load_next_frame();
    }

    /// Frames queued or waiting in the FIFO and not yet acknowledged.
    pub fn pending_frames(&self) -> usize {
        let state = self.state();
        state.pending.len() + usize::from(state.irq_flags().rx_done())
    }

    /// Frames put on the air so far.
    pub fn transmitted(&self) -> Vec<TransmittedFrame> {
        self.state().transmitted.clone()
    }

    /// Every register write as `(address, value)`, in order.
    pub fn write_log(&self) -> Vec<(u8, u8)> {
        self.state().write_log.clone()
    }

    pub fn clear_write_log(&self) {
        self.state().write_log.clear();
    }

    /// Current value of a register, without side effects on the FIFO.
    pub fn register(&self, address: u8) -> u8 {
        self.state().reg(address)
    }

    /// Whether entering TX mode completes the transmission immediately.
    pub fn set_auto_tx_done(&self, enabled: bool) {
        self.state().auto_tx_done = enabled;
    }

    /// Raise TxDone by hand, for use with auto completion disabled.
    pub fn complete_transmission(&self) {
        let mut state = self.state();
        if state.reg(REG_OPMODE) & MODE_MASK == MODE_TX {
            state.transmit();
        }
    }

    /// Make every subsequent register transfer fail.
    pub fn fail_transfers(&self, fail: bool) {
        self.state().fail_transfers = fail;
    }

    pub fn open_count(&self) -> u32 {
        self.state().open_count
    }

    pub fn close_count(&self) -> u32 {
        self.state().close_count
    }

    /// Completed low-then-high cycles on the reset line.
    pub fn reset_pulses(&self) -> u32 {
        self.state().reset_pulses
    }
}

impl Transport for SimulatedTransport {
    fn open(&mut self, _bus: &BusConfig) -> Result<(), TransportError> {
        let mut state = self.state();
        state.open = true;
        state.open_count += 1;
        Ok(())
    }

    fn close(&mut self) {
        let mut state = self.state();
        if state.open {
            state.open = false;
            state.close_count += 1;
        }
    }

    fn is_open(&self) -> bool {
        self.state().open
    }

    fn write_register(&mut self, address: u8, value: u8) -> Result<(), TransportError> {
        let mut state = self.state();
        state.check_transfer()?;
        let address = address & 0x7F;
        state.write_log.push((address, value));

        match address {
            REG_FIFO => {
                let ptr = state.fifo_next();
                state.fifo[ptr] = value;
            }
            REG_IRQ_FLAGS => {
                let remaining = state.reg(REG_IRQ_FLAGS) & !value;
                state.set_reg(REG_IRQ_FLAGS, remaining);
                state.load_next_frame();
            }
            REG_OPMODE => {
                state.set_reg(REG_OPMODE, value);
                if value & MODE_MASK == MODE_TX && state.auto_tx_done {
                    state.transmit();
                }
            }
            _ => state.set_reg(address, value),
        }
        Ok(())
    }

    fn read_register(&mut self, address: u8) -> Result<u8, TransportError> {
        let mut state = self.state();
        state.check_transfer()?;
        let address = address & 0x7F;

        if address == REG_FIFO {
            let ptr = state.fifo_next();
            return Ok(state.fifo[ptr]);
        }
        Ok(state.reg(address))
    }

    fn set_control_line(&mut self, line: ControlLine, high: bool) -> Result<(), TransportError> {
        let mut state = self.state();
        if !state.open {
            return Err(TransportError::NotOpen);
        }
        match line {
            ControlLine::Reset => {
                if high && !state.reset_high {
                    state.reset_pulses += 1;
                    // A reset pulse returns the chip to its power-on state
                    state.registers = [0; 128];
                }
                state.reset_high = high;
                Ok(())
            }
            // DIO0 is driven by the chip model; external levels are ignored
            ControlLine::PacketReady => Ok(()),
        }
    }

    fn read_control_line(&mut self, line: ControlLine) -> Result<bool, TransportError> {
        let state = self.state();
        if !state.open {
            return Err(TransportError::NotOpen);
        }
        match line {
            ControlLine::Reset => Ok(state.reset_high),
            ControlLine::PacketReady => Ok(state.dio0()),
        }
    }

    fn settle_delay(&self) -> Duration {
        Duration::ZERO
    }
}
