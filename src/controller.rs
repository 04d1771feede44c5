//! NES controller input handling.
//!
//! Implements the standard NES controller shift register protocol:
//! write $01 to $4016 to latch current state; then read $4016 (port 1) or $4017 (port 2)
//! repeatedly to get one bit per read (A, B, Select, Start, Up, Down, Left, Right).

pub const BUTTON_A: u8 = 0x01;
pub const BUTTON_B: u8 = 0x02;
pub const BUTTON_SELECT: u8 = 0x04;
pub const BUTTON_START: u8 = 0x08;
pub const BUTTON_UP: u8 = 0x10;
pub const BUTTON_DOWN: u8 = 0x20;
pub const BUTTON_LEFT: u8 = 0x40;
pub const BUTTON_RIGHT: u8 = 0x80;

/// Represents a single NES controller.
#[derive(Debug, Default, Clone, Copy)]
pub struct Controller {
    /// Current button states: bit 0 = A, 1 = B, 2 = Select, 3 = Start, 4 = Up, 5 = Down, 6 = Left, 7 = Right.
    pub state: u8,
    /// Shift register: latched from `state` on write; shifted out LSB-first on read.
    pub shift: u8,
}

impl Controller {
    /// Create a new controller with no buttons pressed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read one button state. Returns LSB of shift register OR'd with open bus ($40).
    /// Each read advances the shift; once all eight bits are out, reads return 1 like official pads.
    pub fn read(&mut self) -> u8 {
        let bit = self.shift & 1;
        self.shift = (self.shift >> 1) | 0x80;
        bit | 0x40
    }

    /// Write to $4016. When bit 0 is 1, latch current button state into the shift register.
    pub fn write(&mut self, data: u8) {
        if data & 1 != 0 {
            self.shift = self.state;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shifts_out_latched_buttons_in_order() {
        let mut pad = Controller::new();
        pad.state = BUTTON_A | BUTTON_START | BUTTON_RIGHT;
        pad.write(1);

        let bits: Vec<u8> = (0..8).map(|_| pad.read() & 1).collect();
        assert_eq!(bits, [1, 0, 0, 1, 0, 0, 0, 1]);
        assert_eq!(pad.read() & 1, 1);
    }

    #[test]
    fn state_change_after_latch_is_not_visible() {
        let mut pad = Controller::new();
        pad.write(1);
        pad.state = BUTTON_A;
        assert_eq!(pad.read() & 1, 0);
    }
}
