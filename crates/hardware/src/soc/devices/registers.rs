//! Memory-mapped register file.
//!
//! A small table of named 8-bit registers addressed by a one-byte address.
//! Writes are masked to 8 bits; accesses to addresses that are not in the
//! table are ignored (writes) or read as zero.
//!
//! # Register Map
//!
//! | Address | Name  | Purpose                          |
//! |---------|-------|----------------------------------|
//! | `0x00`  | PORTA | Port A data                      |
//! | `0x01`  | PORTB | Port B data                      |
//! | `0x02`  | PORTC | Port C data                      |
//! | `0x03`  | DDRA  | Port A direction                 |
//! | `0x04`  | DDRB  | Port B direction                 |
//! | `0x05`  | DDRC  | Port C direction                 |
//! | `0x06`  | TCCR0 | Timer 0 control                  |
//! | `0x07`  | TCNT0 | Timer 0 counter                  |
//! | `0x08`  | UCSRA | USART control and status A       |
//! | `0x09`  | UCSRB | USART control and status B       |
//! | `0x0A`  | UDR   | USART data                       |
//! | `0x0B`  | ADCL  | ADC data, low byte               |
//! | `0x0C`  | ADCH  | ADC data, high byte              |

use serde::Serialize;

use crate::common::constants::REGISTER_MASK;

/// Default register layout: (name, address, description).
const REGISTER_MAP: [(&str, u8, &str); 13] = [
    ("PORTA", 0x00, "Port A data register"),
    ("PORTB", 0x01, "Port B data register"),
    ("PORTC", 0x02, "Port C data register"),
    ("DDRA", 0x03, "Port A data direction register"),
    ("DDRB", 0x04, "Port B data direction register"),
    ("DDRC", 0x05, "Port C data direction register"),
    ("TCCR0", 0x06, "Timer 0 control register"),
    ("TCNT0", 0x07, "Timer 0 counter"),
    ("UCSRA", 0x08, "USART control and status register A"),
    ("UCSRB", 0x09, "USART control and status register B"),
    ("UDR", 0x0A, "USART data register"),
    ("ADCL", 0x0B, "ADC data register low byte"),
    ("ADCH", 0x0C, "ADC data register high byte"),
];

/// One named 8-bit register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Register {
    /// Mnemonic, e.g. `"DDRA"`.
    pub name: String,
    /// Unique one-byte address.
    pub address: u8,
    /// Current value.
    pub value: u8,
    /// Human-readable purpose.
    pub description: String,
}

/// The register table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RegisterFile {
    registers: Vec<Register>,
}

impl RegisterFile {
    /// Creates the default table with every register cleared.
    pub fn new() -> Self {
        let registers = REGISTER_MAP
            .iter()
            .map(|&(name, address, description)| Register {
                name: name.to_string(),
                address,
                value: 0,
                description: description.to_string(),
            })
            .collect();
        Self { registers }
    }

    /// Reads the register at `address`; unknown addresses read as zero.
    pub fn read(&self, address: u8) -> u8 {
        self.get(address).map_or(0, |r| r.value)
    }

    /// Writes `value & 0xFF` to the register at `address`.
    ///
    /// Returns `false` (and changes nothing) if no register lives there.
    pub fn write(&mut self, address: u8, value: i64) -> bool {
        match self.registers.iter_mut().find(|r| r.address == address) {
            Some(reg) => {
                reg.value = (value & REGISTER_MASK) as u8;
                true
            }
            None => false,
        }
    }

    /// Looks a register up by address.
    pub fn get(&self, address: u8) -> Option<&Register> {
        self.registers.iter().find(|r| r.address == address)
    }

    /// Looks a register up by mnemonic.
    pub fn by_name(&self, name: &str) -> Option<&Register> {
        self.registers.iter().find(|r| r.name == name)
    }

    /// Iterates over all registers in address order.
    pub fn iter(&self) -> impl Iterator<Item = &Register> {
        self.registers.iter()
    }

    /// Number of registers in the table.
    pub fn len(&self) -> usize {
        self.registers.len()
    }

    /// Returns `true` if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}
