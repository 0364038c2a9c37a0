//! # SX127x Register Definitions and Constants
//!
//! Register addresses and bit fields of the Semtech SX1276/77/78 family in
//! LoRa mode (`RegOpMode.LongRangeMode = 1`). Addresses 0x0D-0x3F use the
//! LoRa page layout; FSK-only registers are not listed.
//!
//! ## SPI Access
//!
//! Every access is a two-byte transfer: the address byte with the MSB set
//! for a write (`addr | 0x80`) or cleared for a read (`addr & 0x7F`),
//! followed by the data byte.

use crate::constants::FXOSC_HZ;

// =============================================================================
// Register Addresses (LoRa page)
// =============================================================================

/// FIFO read/write access
pub const REG_FIFO: u8 = 0x00;

/// Operating mode and LoRa/FSK selection
pub const REG_OPMODE: u8 = 0x01;

/// RF carrier frequency (MSB)
pub const REG_FRF_MSB: u8 = 0x06;

/// RF carrier frequency (MID)
pub const REG_FRF_MID: u8 = 0x07;

/// RF carrier frequency (LSB)
pub const REG_FRF_LSB: u8 = 0x08;

/// PA selection and output power control
pub const REG_PA_CONFIG: u8 = 0x09;

/// SPI interface address pointer in FIFO data buffer
pub const REG_FIFO_ADDR_PTR: u8 = 0x0D;

/// Write base address in FIFO data buffer for TX modulator
pub const REG_FIFO_TX_BASE_ADDR: u8 = 0x0E;

/// Read base address in FIFO data buffer for RX demodulator
pub const REG_FIFO_RX_BASE_ADDR: u8 = 0x0F;

/// Start address of last packet received
pub const REG_FIFO_RX_CURRENT_ADDR: u8 = 0x10;

/// IRQ flags (write 1 to clear)
pub const REG_IRQ_FLAGS: u8 = 0x12;

/// Number of payload bytes of latest packet received
pub const REG_RX_NB_BYTES: u8 = 0x13;

/// SNR estimate of last packet (two's complement, 0.25 dB steps)
pub const REG_PKT_SNR_VALUE: u8 = 0x19;

/// RSSI of last packet
pub const REG_PKT_RSSI_VALUE: u8 = 0x1A;

/// Bandwidth, coding rate, header mode
pub const REG_MODEM_CONFIG_1: u8 = 0x1D;

/// Spreading factor, TX continuous mode, RX payload CRC
pub const REG_MODEM_CONFIG_2: u8 = 0x1E;

/// Preamble length (MSB)
pub const REG_PREAMBLE_MSB: u8 = 0x20;

/// Preamble length (LSB)
pub const REG_PREAMBLE_LSB: u8 = 0x21;

/// Payload length for TX in explicit header mode
pub const REG_PAYLOAD_LENGTH: u8 = 0x22;

/// Low data rate optimisation, AGC
pub const REG_MODEM_CONFIG_3: u8 = 0x26;

/// LoRa sync word
pub const REG_SYNC_WORD: u8 = 0x39;

/// Mapping of pins DIO0 to DIO3
pub const REG_DIO_MAPPING_1: u8 = 0x40;

/// Silicon revision (0x12 on SX1276/77/78)
pub const REG_VERSION: u8 = 0x42;

// =============================================================================
// Operating Modes
// =============================================================================

/// LongRangeMode bit: LoRa modem selected
pub const MODE_LONG_RANGE: u8 = 0x80;

/// Sleep mode
pub const MODE_SLEEP: u8 = 0x00;

/// Standby mode
pub const MODE_STANDBY: u8 = 0x01;

/// Transmit mode
pub const MODE_TX: u8 = 0x03;

/// Continuous receive mode
pub const MODE_RX_CONTINUOUS: u8 = 0x05;

/// Mask of the mode bits in RegOpMode
pub const MODE_MASK: u8 = 0x07;

// =============================================================================
// Bit Fields
// =============================================================================

/// RegPaConfig: select PA_BOOST output pin
pub const PA_BOOST: u8 = 0x80;

/// RegPaConfig: MaxPower field at its maximum
pub const PA_MAX_POWER: u8 = 0x70;

/// RegModemConfig2: enable CRC generation and check on payload
pub const RX_PAYLOAD_CRC_ON: u8 = 0x04;

/// RegModemConfig3: LNA gain set by the internal AGC loop
pub const AGC_AUTO_ON: u8 = 0x04;

/// RegModemConfig3: mandated when symbol length exceeds 16 ms
pub const LOW_DATA_RATE_OPTIMIZE: u8 = 0x08;

/// RegDioMapping1: DIO0 signals RxDone
pub const DIO0_RX_DONE: u8 = 0x00;

/// RegDioMapping1: DIO0 signals TxDone
pub const DIO0_TX_DONE: u8 = 0x40;

/// FIFO offset where outbound payloads are staged (chip reset default)
pub const FIFO_TX_BASE: u8 = 0x80;

/// FIFO offset where the demodulator stores received payloads
pub const FIFO_RX_BASE: u8 = 0x00;

/// Write to RegIrqFlags to clear every flag
pub const IRQ_CLEAR_ALL: u8 = 0xFF;

/// Offset subtracted from RegPktRssiValue on the HF port (dBm)
pub const RSSI_OFFSET_DBM: i16 = 164;

/// Supported signal bandwidths in Hz, indexed by their RegModemConfig1 code
pub const BANDWIDTHS_HZ: [u32; 10] = [
    7_800, 10_400, 15_600, 20_800, 31_250, 41_700, 62_500, 125_000, 250_000, 500_000,
];

/// RegModemConfig1 bandwidth code for a bandwidth in Hz
pub fn bandwidth_index(bandwidth_hz: u32) -> Option<u8> {
    BANDWIDTHS_HZ
        .iter()
        .position(|&bw| bw == bandwidth_hz)
        .map(|i| i as u8)
}

/// Frequency synthesizer value: `frf = frequency * 2^19 / FXOSC`
pub fn frf_from_frequency(frequency_hz: u32) -> u32 {
    (((frequency_hz as u64) << 19) / FXOSC_HZ) as u32
}
