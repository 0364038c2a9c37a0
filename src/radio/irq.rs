//! # SX127x LoRa Interrupt Flags
//!
//! `RegIrqFlags` (0x12) latches radio events until the host writes a 1 to
//! the corresponding bit. DIO0 mirrors RxDone or TxDone depending on
//! `RegDioMapping1`, which lets the host poll a GPIO instead of the
//! register while idle.
//!
//! ```text
//! Bit 7: RxTimeout
//! Bit 6: RxDone
//! Bit 5: PayloadCrcError
//! Bit 4: ValidHeader
//! Bit 3: TxDone
//! Bit 2: CadDone
//! Bit 1: FhssChangeChannel
//! Bit 0: CadDetected
//! ```

use bitflags::bitflags;

bitflags! {
    /// Decoded view of `RegIrqFlags`
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct IrqFlags: u8 {
        const RX_TIMEOUT          = 0b1000_0000;
        const RX_DONE             = 0b0100_0000;
        const PAYLOAD_CRC_ERROR   = 0b0010_0000;
        const VALID_HEADER        = 0b0001_0000;
        const TX_DONE             = 0b0000_1000;
        const CAD_DONE            = 0b0000_0100;
        const FHSS_CHANGE_CHANNEL = 0b0000_0010;
        const CAD_DETECTED        = 0b0000_0001;
    }
}

impl IrqFlags {
    /// A complete packet is waiting in the FIFO.
    pub fn rx_done(self) -> bool {
        self.contains(IrqFlags::RX_DONE)
    }

    /// The hardware CRC check failed for the received payload.
    pub fn crc_error(self) -> bool {
        self.contains(IrqFlags::PAYLOAD_CRC_ERROR)
    }

    pub fn tx_done(self) -> bool {
        self.contains(IrqFlags::TX_DONE)
    }
}
