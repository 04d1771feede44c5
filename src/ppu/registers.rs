//! PPU register bitfields as plain integers with named accessors.
//!
//! See [PPU registers](https://www.nesdev.org/wiki/PPU_registers) and
//! [PPU scrolling](https://www.nesdev.org/wiki/PPU_scrolling) for the internal `v`/`t` layout.

/// PPUCTRL ($2000).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Control(pub u8);

impl Control {
    pub fn nametable_x(self) -> u16 {
        (self.0 & 0x01) as u16
    }

    pub fn nametable_y(self) -> u16 {
        ((self.0 >> 1) & 0x01) as u16
    }

    /// VRAM address increment per $2007 access: 1 (across) or 32 (down).
    pub fn increment(self) -> u16 {
        if self.0 & 0x04 != 0 { 32 } else { 1 }
    }

    pub fn sprite_table(self) -> u16 {
        if self.0 & 0x08 != 0 { 0x1000 } else { 0x0000 }
    }

    pub fn background_table(self) -> u16 {
        if self.0 & 0x10 != 0 { 0x1000 } else { 0x0000 }
    }

    /// Sprite height in pixels: 8 or 16.
    pub fn sprite_height(self) -> i16 {
        if self.0 & 0x20 != 0 { 16 } else { 8 }
    }

    pub fn nmi_enabled(self) -> bool {
        self.0 & 0x80 != 0
    }
}

/// PPUMASK ($2001).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Mask(pub u8);

impl Mask {
    pub fn greyscale(self) -> bool {
        self.0 & 0x01 != 0
    }

    pub fn background_left(self) -> bool {
        self.0 & 0x02 != 0
    }

    pub fn sprites_left(self) -> bool {
        self.0 & 0x04 != 0
    }

    pub fn show_background(self) -> bool {
        self.0 & 0x08 != 0
    }

    pub fn show_sprites(self) -> bool {
        self.0 & 0x10 != 0
    }

    pub fn rendering(self) -> bool {
        self.show_background() || self.show_sprites()
    }
}

/// PPUSTATUS ($2002). Only the top three bits are real.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Status(pub u8);

impl Status {
    const OVERFLOW: u8 = 0x20;
    const SPRITE_ZERO_HIT: u8 = 0x40;
    const VBLANK: u8 = 0x80;

    fn set(&mut self, bit: u8, on: bool) {
        if on {
            self.0 |= bit;
        } else {
            self.0 &= !bit;
        }
    }

    pub fn vblank(self) -> bool {
        self.0 & Self::VBLANK != 0
    }

    pub fn set_vblank(&mut self, on: bool) {
        self.set(Self::VBLANK, on);
    }

    pub fn sprite_zero_hit(self) -> bool {
        self.0 & Self::SPRITE_ZERO_HIT != 0
    }

    pub fn set_sprite_zero_hit(&mut self, on: bool) {
        self.set(Self::SPRITE_ZERO_HIT, on);
    }

    pub fn sprite_overflow(self) -> bool {
        self.0 & Self::OVERFLOW != 0
    }

    pub fn set_sprite_overflow(&mut self, on: bool) {
        self.set(Self::OVERFLOW, on);
    }
}

/// Internal 15-bit VRAM address / scroll register (`v` and `t`).
///
/// ```text
/// yyy NN YYYYY XXXXX
/// ||| || ||||| +++++-- coarse X
/// ||| || +++++-------- coarse Y
/// ||| ++-------------- nametable select (Y, X)
/// +++----------------- fine Y
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct VramAddr(pub u16);

impl VramAddr {
    fn field(self, shift: u16, mask: u16) -> u16 {
        (self.0 >> shift) & mask
    }

    fn set_field(&mut self, shift: u16, mask: u16, value: u16) {
        self.0 = (self.0 & !(mask << shift)) | ((value & mask) << shift);
    }

    pub fn coarse_x(self) -> u16 {
        self.field(0, 0x1F)
    }

    pub fn set_coarse_x(&mut self, v: u16) {
        self.set_field(0, 0x1F, v);
    }

    pub fn coarse_y(self) -> u16 {
        self.field(5, 0x1F)
    }

    pub fn set_coarse_y(&mut self, v: u16) {
        self.set_field(5, 0x1F, v);
    }

    pub fn nametable_x(self) -> u16 {
        self.field(10, 0x01)
    }

    pub fn set_nametable_x(&mut self, v: u16) {
        self.set_field(10, 0x01, v);
    }

    pub fn nametable_y(self) -> u16 {
        self.field(11, 0x01)
    }

    pub fn set_nametable_y(&mut self, v: u16) {
        self.set_field(11, 0x01, v);
    }

    pub fn fine_y(self) -> u16 {
        self.field(12, 0x07)
    }

    pub fn set_fine_y(&mut self, v: u16) {
        self.set_field(12, 0x07, v);
    }

    /// 14-bit address as seen on the PPU bus.
    pub fn addr(self) -> u16 {
        self.0 & 0x3FFF
    }
}
