//! NES PPU (Picture Processing Unit) implementation.
//!
//! A dot-by-dot 2C02 model: 341 cycles per scanline, scanlines −1 (pre-render) through 260.
//! Background tiles flow through the fetch pipeline into 16-bit shift registers; sprites are
//! evaluated once per line and fetched into per-slot shift registers; every visible dot composites
//! one pixel into the 256×240 RGBA framebuffer. Registers: $2000–$2007 (mirrored).

use crate::cartridge::{cartridge::Cartridge, mapper::Mirroring};
use crate::ppu::palette::SYSTEM_PALETTE;
use crate::ppu::registers::{Control, Mask, Status, VramAddr};

pub const WIDTH: usize = 256;
pub const HEIGHT: usize = 240;

/// OAM (Object Attribute Memory): 64 sprites × 4 bytes. Each entry: Y, tile, attr, X.
pub const OAM_LEN: usize = 256;

pub const CYCLES_PER_SCANLINE: u16 = 341;
pub const PRE_RENDER_SCANLINE: i16 = -1;
pub const VBLANK_SCANLINE: i16 = 241;
const LAST_SCANLINE: i16 = 260;

/// Sprites the hardware can show on one scanline.
const MAX_LINE_SPRITES: usize = 8;

/// One OAM entry copied into secondary OAM during evaluation.
#[derive(Debug, Default, Clone, Copy)]
struct SpriteSlot {
    /// Pattern row for this line, already vertically flipped, fixed at evaluation time.
    row: u8,
    tall: bool,
    tile: u8,
    attr: u8,
    x: u8,
}

/// PPU state: timing, loopy scroll registers, VRAM, palettes, OAM, render pipeline, and framebuffer.
pub struct PPU {
    pub cycle: u16,
    pub scanline: i16,
    /// NMI request raised at vblank start; consumed by the driver.
    pub nmi: bool,
    /// Set when scanline 260 wraps to the pre-render line.
    pub frame_complete: bool,
    pub ctrl: Control,
    pub mask: Mask,
    pub status: Status,
    /// Current VRAM address (`v`).
    pub vram_addr: VramAddr,
    /// Temporary VRAM address (`t`); the top-left of the screen.
    pub temp_addr: VramAddr,
    pub fine_x: u8,
    /// Shared first/second write toggle for $2005/$2006 (`w`).
    pub write_latch: bool,
    /// $2007 read buffer.
    pub data_buffer: u8,
    /// 2 KiB nametable RAM; the cartridge's mirroring picks which half backs each logical table.
    pub nametable: [u8; 0x800],
    /// Palette RAM $3F00-$3F1F (32 bytes, with NES mirroring).
    pub palette: [u8; 32],
    /// OAM: 64 sprites × 4 bytes (Y, tile, attr, X). Written via $2003/$2004 or $4014 DMA.
    pub oam: [u8; OAM_LEN],
    /// OAM address for $2003/$2004 (byte index 0..255).
    pub oam_addr: u8,
    /// 256×240 framebuffer (0xRRGGBBAA per pixel). Row-major, left-to-right, top-to-bottom.
    pub framebuffer: Vec<u32>,

    next_tile_id: u8,
    next_tile_attr: u8,
    next_tile_lo: u8,
    next_tile_hi: u8,
    bg_pattern_lo: u16,
    bg_pattern_hi: u16,
    bg_attr_lo: u16,
    bg_attr_hi: u16,

    sprites: [SpriteSlot; MAX_LINE_SPRITES],
    sprite_count: usize,
    sprite_pattern_lo: [u8; MAX_LINE_SPRITES],
    sprite_pattern_hi: [u8; MAX_LINE_SPRITES],
    sprite_zero_on_line: bool,
}

impl Default for PPU {
    fn default() -> Self {
        Self::new()
    }
}

impl PPU {
    /// Create PPU in initial state (pre-render scanline -1, cycle 0).
    pub fn new() -> Self {
        Self {
            cycle: 0,
            scanline: PRE_RENDER_SCANLINE,
            nmi: false,
            frame_complete: false,
            ctrl: Control::default(),
            mask: Mask::default(),
            status: Status::default(),
            vram_addr: VramAddr::default(),
            temp_addr: VramAddr::default(),
            fine_x: 0,
            write_latch: false,
            data_buffer: 0,
            nametable: [0; 0x800],
            palette: [0; 32],
            oam: [0; OAM_LEN],
            oam_addr: 0,
            framebuffer: vec![0; WIDTH * HEIGHT],
            next_tile_id: 0,
            next_tile_attr: 0,
            next_tile_lo: 0,
            next_tile_hi: 0,
            bg_pattern_lo: 0,
            bg_pattern_hi: 0,
            bg_attr_lo: 0,
            bg_attr_hi: 0,
            sprites: [SpriteSlot::default(); MAX_LINE_SPRITES],
            sprite_count: 0,
            sprite_pattern_lo: [0; MAX_LINE_SPRITES],
            sprite_pattern_hi: [0; MAX_LINE_SPRITES],
            sprite_zero_on_line: false,
        }
    }

    /// Advance the PPU by one dot.
    pub fn tick(&mut self, cart: &mut Cartridge) {
        let rendering_line = self.scanline < HEIGHT as i16;

        if rendering_line {
            if self.scanline == PRE_RENDER_SCANLINE && self.cycle == 1 {
                self.status.set_vblank(false);
                self.status.set_sprite_overflow(false);
                self.status.set_sprite_zero_hit(false);
                self.sprite_pattern_lo = [0; MAX_LINE_SPRITES];
                self.sprite_pattern_hi = [0; MAX_LINE_SPRITES];
            }

            if (2..258).contains(&self.cycle) || (321..338).contains(&self.cycle) {
                self.shift_background();
                self.fetch_background(cart);
            }

            if self.cycle == 256 {
                self.increment_scroll_y();
            }
            if self.cycle == 257 {
                self.load_background_shifters();
                self.transfer_address_x();
                self.evaluate_sprites();
            }
            // Unused nametable fetches at the end of the line.
            if self.cycle == 338 || self.cycle == 340 {
                self.next_tile_id = self.read_vram(0x2000 | (self.vram_addr.0 & 0x0FFF), cart);
            }
            if self.scanline == PRE_RENDER_SCANLINE && (280..305).contains(&self.cycle) {
                self.transfer_address_y();
            }
            if self.cycle == 340 {
                self.fetch_sprite_patterns(cart);
            }
            if self.cycle == 260 && self.mask.rendering() {
                cart.scanline();
            }
        }

        if self.scanline == VBLANK_SCANLINE && self.cycle == 1 {
            self.status.set_vblank(true);
            if self.ctrl.nmi_enabled() {
                self.nmi = true;
            }
        }

        if self.scanline >= 0 && rendering_line && (1..=WIDTH as u16).contains(&self.cycle) {
            if (2..258).contains(&self.cycle) {
                self.shift_sprites();
            }
            self.render_pixel();
        }

        self.cycle += 1;
        if self.cycle >= CYCLES_PER_SCANLINE {
            self.cycle = 0;
            self.scanline += 1;
            if self.scanline > LAST_SCANLINE {
                self.scanline = PRE_RENDER_SCANLINE;
                self.frame_complete = true;
            }
        }
    }

    /// One step of the 8-dot background fetch cycle: nametable, attribute, pattern low, pattern high.
    fn fetch_background(&mut self, cart: &Cartridge) {
        let v = self.vram_addr;
        match (self.cycle - 1) % 8 {
            0 => {
                self.load_background_shifters();
                self.next_tile_id = self.read_vram(0x2000 | (v.0 & 0x0FFF), cart);
            }
            2 => {
                let addr = 0x23C0
                    | (v.nametable_y() << 11)
                    | (v.nametable_x() << 10)
                    | ((v.coarse_y() >> 2) << 3)
                    | (v.coarse_x() >> 2);
                let mut attr = self.read_vram(addr, cart);
                if v.coarse_y() & 0x02 != 0 {
                    attr >>= 4;
                }
                if v.coarse_x() & 0x02 != 0 {
                    attr >>= 2;
                }
                self.next_tile_attr = attr & 0x03;
            }
            4 => {
                let addr = self.background_row_addr();
                self.next_tile_lo = self.read_vram(addr, cart);
            }
            6 => {
                let addr = self.background_row_addr() + 8;
                self.next_tile_hi = self.read_vram(addr, cart);
            }
            7 => self.increment_scroll_x(),
            _ => {}
        }
    }

    fn background_row_addr(&self) -> u16 {
        self.ctrl.background_table() + ((self.next_tile_id as u16) << 4) + self.vram_addr.fine_y()
    }

    fn load_background_shifters(&mut self) {
        self.bg_pattern_lo = (self.bg_pattern_lo & 0xFF00) | self.next_tile_lo as u16;
        self.bg_pattern_hi = (self.bg_pattern_hi & 0xFF00) | self.next_tile_hi as u16;
        let lo = if self.next_tile_attr & 0x01 != 0 { 0xFF } else { 0x00 };
        let hi = if self.next_tile_attr & 0x02 != 0 { 0xFF } else { 0x00 };
        self.bg_attr_lo = (self.bg_attr_lo & 0xFF00) | lo;
        self.bg_attr_hi = (self.bg_attr_hi & 0xFF00) | hi;
    }

    fn shift_background(&mut self) {
        if self.mask.show_background() {
            self.bg_pattern_lo <<= 1;
            self.bg_pattern_hi <<= 1;
            self.bg_attr_lo <<= 1;
            self.bg_attr_hi <<= 1;
        }
    }

    /// Count down sprite X positions; once a sprite is reached, shift its pattern out.
    fn shift_sprites(&mut self) {
        if !self.mask.show_sprites() {
            return;
        }
        for i in 0..self.sprite_count {
            if self.sprites[i].x > 0 {
                self.sprites[i].x -= 1;
            } else {
                self.sprite_pattern_lo[i] <<= 1;
                self.sprite_pattern_hi[i] <<= 1;
            }
        }
    }

    /// Coarse X increment, wrapping into the horizontally adjacent nametable after 32 tiles.
    fn increment_scroll_x(&mut self) {
        if !self.mask.rendering() {
            return;
        }
        let v = &mut self.vram_addr;
        if v.coarse_x() == 31 {
            v.set_coarse_x(0);
            v.set_nametable_x(v.nametable_x() ^ 1);
        } else {
            v.set_coarse_x(v.coarse_x() + 1);
        }
    }

    /// Fine/coarse Y increment. Row 29 wraps into the vertically adjacent nametable; row 31
    /// (attribute memory, reachable only by writing it directly) wraps without switching.
    pub(crate) fn increment_scroll_y(&mut self) {
        if !self.mask.rendering() {
            return;
        }
        let v = &mut self.vram_addr;
        if v.fine_y() < 7 {
            v.set_fine_y(v.fine_y() + 1);
            return;
        }
        v.set_fine_y(0);
        match v.coarse_y() {
            29 => {
                v.set_coarse_y(0);
                v.set_nametable_y(v.nametable_y() ^ 1);
            }
            31 => v.set_coarse_y(0),
            y => v.set_coarse_y(y + 1),
        }
    }

    fn transfer_address_x(&mut self) {
        if self.mask.rendering() {
            self.vram_addr.set_nametable_x(self.temp_addr.nametable_x());
            self.vram_addr.set_coarse_x(self.temp_addr.coarse_x());
        }
    }

    fn transfer_address_y(&mut self) {
        if self.mask.rendering() {
            self.vram_addr.set_fine_y(self.temp_addr.fine_y());
            self.vram_addr.set_nametable_y(self.temp_addr.nametable_y());
            self.vram_addr.set_coarse_y(self.temp_addr.coarse_y());
        }
    }

    /// Sprite evaluation for the next scanline: first 8 OAM entries (lowest index first) whose
    /// vertical span covers this line. A ninth match sets sprite overflow. Each slot records its
    /// pattern row and size as of this dot.
    fn evaluate_sprites(&mut self) {
        self.sprite_count = 0;
        self.sprite_zero_on_line = false;
        self.sprite_pattern_lo = [0; MAX_LINE_SPRITES];
        self.sprite_pattern_hi = [0; MAX_LINE_SPRITES];
        if !self.mask.rendering() {
            return;
        }

        let height = self.ctrl.sprite_height();
        for (index, entry) in self.oam.chunks_exact(4).enumerate() {
            let diff = self.scanline - entry[0] as i16;
            if !(0..height).contains(&diff) {
                continue;
            }
            if self.sprite_count == MAX_LINE_SPRITES {
                self.status.set_sprite_overflow(true);
                break;
            }
            if index == 0 {
                self.sprite_zero_on_line = true;
            }
            let row = if entry[2] & 0x80 != 0 {
                height - 1 - diff
            } else {
                diff
            };
            self.sprites[self.sprite_count] = SpriteSlot {
                row: row as u8,
                tall: height == 16,
                tile: entry[1],
                attr: entry[2],
                x: entry[3],
            };
            self.sprite_count += 1;
        }
    }

    /// Fetch pattern rows for the evaluated sprites, applying horizontal flip. Row and size come
    /// from evaluation, so a PPUCTRL write during hblank cannot move the row outside the sprite.
    fn fetch_sprite_patterns(&mut self, cart: &Cartridge) {
        for i in 0..self.sprite_count {
            let sprite = self.sprites[i];
            let row = sprite.row as u16;

            let addr = if !sprite.tall {
                self.ctrl.sprite_table() | ((sprite.tile as u16) << 4) | row
            } else {
                let table = (sprite.tile as u16 & 0x01) << 12;
                let tile = (sprite.tile as u16 & 0xFE) + (row >> 3);
                table | (tile << 4) | (row & 0x07)
            };

            let mut lo = self.read_vram(addr, cart);
            let mut hi = self.read_vram(addr + 8, cart);
            if sprite.attr & 0x40 != 0 {
                lo = lo.reverse_bits();
                hi = hi.reverse_bits();
            }
            self.sprite_pattern_lo[i] = lo;
            self.sprite_pattern_hi[i] = hi;
        }
    }

    /// Composite the pixel for dot `cycle - 1` of the current scanline.
    fn render_pixel(&mut self) {
        let x = (self.cycle - 1) as usize;
        let y = self.scanline as usize;

        let mut bg_pixel = 0u8;
        let mut bg_palette = 0u8;
        if self.mask.show_background() && (self.mask.background_left() || x >= 8) {
            let mux = 0x8000 >> self.fine_x;
            let p0 = (self.bg_pattern_lo & mux != 0) as u8;
            let p1 = (self.bg_pattern_hi & mux != 0) as u8;
            bg_pixel = (p1 << 1) | p0;
            let a0 = (self.bg_attr_lo & mux != 0) as u8;
            let a1 = (self.bg_attr_hi & mux != 0) as u8;
            bg_palette = (a1 << 1) | a0;
        }

        let mut fg_pixel = 0u8;
        let mut fg_palette = 0u8;
        let mut fg_in_front = false;
        let mut sprite_zero = false;
        if self.mask.show_sprites() && (self.mask.sprites_left() || x >= 8) {
            for i in 0..self.sprite_count {
                if self.sprites[i].x != 0 {
                    continue;
                }
                let p0 = (self.sprite_pattern_lo[i] & 0x80 != 0) as u8;
                let p1 = (self.sprite_pattern_hi[i] & 0x80 != 0) as u8;
                let pixel = (p1 << 1) | p0;
                if pixel == 0 {
                    continue;
                }
                let attr = self.sprites[i].attr;
                fg_pixel = pixel;
                fg_palette = (attr & 0x03) + 4;
                fg_in_front = attr & 0x20 == 0;
                sprite_zero = i == 0 && self.sprite_zero_on_line;
                break;
            }
        }

        let (pixel, palette) = match (bg_pixel, fg_pixel) {
            (0, 0) => (0, 0),
            (0, _) => (fg_pixel, fg_palette),
            (_, 0) => (bg_pixel, bg_palette),
            _ => {
                if sprite_zero && x != 255 {
                    self.status.set_sprite_zero_hit(true);
                }
                if fg_in_front {
                    (fg_pixel, fg_palette)
                } else {
                    (bg_pixel, bg_palette)
                }
            }
        };

        let index = self.read_palette(0x3F00 + ((palette as u16) << 2) + pixel as u16);
        self.framebuffer[y * WIDTH + x] = SYSTEM_PALETTE[(index & 0x3F) as usize];
    }

    /// Resolve PPU palette address $3F00–$3F1F (and $3F20–$3FFF mirrors) to 32-byte index.
    /// Addresses $3F10, $3F14, $3F18, $3F1C mirror $3F00, $3F04, $3F08, $3F0C.
    pub fn palette_index(addr: u16) -> usize {
        let i = (addr & 0x1F) as usize;
        if i >= 16 && i % 4 == 0 { i - 16 } else { i }
    }

    fn read_palette(&self, addr: u16) -> u8 {
        let mask = if self.mask.greyscale() { 0x30 } else { 0x3F };
        self.palette[Self::palette_index(addr)] & mask
    }

    /// Map PPU nametable VRAM address ($2000–$3EFF) to internal 2 KiB index using mirroring.
    pub fn map_nametable_addr(addr: u16, mirroring: Mirroring) -> u16 {
        let addr = (addr - 0x2000) & 0x0FFF;
        let table = addr / 0x400;
        let offset = addr & 0x3FF;

        match mirroring {
            Mirroring::Vertical => (table & 1) * 0x400 + offset,
            Mirroring::Horizontal => (table >> 1) * 0x400 + offset,
            Mirroring::SingleLower => offset,
            Mirroring::SingleUpper => 0x400 + offset,
        }
    }

    /// Read from the PPU address space: pattern tables via the cartridge, nametables, palette.
    pub fn read_vram(&self, addr: u16, cart: &Cartridge) -> u8 {
        let addr = addr & 0x3FFF;
        match addr {
            0x0000..=0x1FFF => cart.read_chr(addr),
            0x2000..=0x3EFF => {
                self.nametable[Self::map_nametable_addr(addr, cart.mirroring()) as usize]
            }
            _ => self.read_palette(addr),
        }
    }

    /// Write to the PPU address space. Pattern-table writes only land on CHR RAM.
    pub fn write_vram(&mut self, addr: u16, data: u8, cart: &mut Cartridge) {
        let addr = addr & 0x3FFF;
        match addr {
            0x0000..=0x1FFF => cart.write_chr(addr, data),
            0x2000..=0x3EFF => {
                let index = Self::map_nametable_addr(addr, cart.mirroring());
                self.nametable[index as usize] = data;
            }
            // Upper 2 bits of palette entries do not exist on real hardware.
            _ => self.palette[Self::palette_index(addr)] = data & 0x3F,
        }
    }

    /// CPU read of $2000–$3FFF (mirrored every 8 bytes). Write-only registers read as 0.
    pub fn read_register(&mut self, addr: u16, cart: &Cartridge) -> u8 {
        match addr & 0x0007 {
            2 => self.read_status(),
            4 => self.read_oam_data(),
            7 => self.read_data(cart),
            _ => 0,
        }
    }

    /// CPU write of $2000–$3FFF (mirrored every 8 bytes).
    pub fn write_register(&mut self, addr: u16, data: u8, cart: &mut Cartridge) {
        match addr & 0x0007 {
            0 => self.write_ctrl(data),
            1 => self.mask = Mask(data),
            3 => self.write_oam_addr(data),
            4 => self.write_oam_data(data),
            5 => self.write_scroll(data),
            6 => self.write_addr(data),
            7 => self.write_data(cart, data),
            _ => {}
        }
    }

    /// Read PPUSTATUS ($2002); clears vblank and the $2005/$2006 write toggle.
    /// The low 5 bits are stale read-buffer contents.
    pub fn read_status(&mut self) -> u8 {
        let status = (self.status.0 & 0xE0) | (self.data_buffer & 0x1F);
        self.status.set_vblank(false);
        self.write_latch = false;
        status
    }

    /// Write PPUCTRL ($2000). Enabling NMI while vblank is already set raises NMI immediately.
    pub fn write_ctrl(&mut self, data: u8) {
        let was_enabled = self.ctrl.nmi_enabled();
        self.ctrl = Control(data);
        self.temp_addr.set_nametable_x(self.ctrl.nametable_x());
        self.temp_addr.set_nametable_y(self.ctrl.nametable_y());
        if !was_enabled && self.ctrl.nmi_enabled() && self.status.vblank() {
            self.nmi = true;
        }
    }

    /// Write OAMADDR ($2003).
    pub fn write_oam_addr(&mut self, data: u8) {
        self.oam_addr = data;
    }

    /// Read OAMDATA ($2004); returns OAM byte at current OAMADDR (read does not increment on real NES).
    pub fn read_oam_data(&mut self) -> u8 {
        self.oam[self.oam_addr as usize]
    }

    /// Write OAMDATA ($2004); writes OAM and increments OAMADDR. Also the OAM DMA sink.
    pub fn write_oam_data(&mut self, data: u8) {
        self.oam[self.oam_addr as usize] = data;
        self.oam_addr = self.oam_addr.wrapping_add(1);
    }

    /// Write PPUSCROLL ($2005): first write = fine X and coarse X, second write = fine Y and coarse Y.
    pub fn write_scroll(&mut self, data: u8) {
        if !self.write_latch {
            self.fine_x = data & 0x07;
            self.temp_addr.set_coarse_x((data >> 3) as u16);
        } else {
            self.temp_addr.set_fine_y((data & 0x07) as u16);
            self.temp_addr.set_coarse_y((data >> 3) as u16);
        }
        self.write_latch = !self.write_latch;
    }

    /// Write PPUADDR ($2006): high byte (6 bits) into `t`, then low byte; the second write copies `t` to `v`.
    pub fn write_addr(&mut self, data: u8) {
        if !self.write_latch {
            self.temp_addr.0 = ((data as u16 & 0x3F) << 8) | (self.temp_addr.0 & 0x00FF);
        } else {
            self.temp_addr.0 = (self.temp_addr.0 & 0xFF00) | data as u16;
            self.vram_addr = self.temp_addr;
        }
        self.write_latch = !self.write_latch;
    }

    /// Read PPUDATA ($2007). Returns the buffered byte from the previous read, except palette
    /// reads which are immediate (the buffer is refilled from the nametable underneath).
    pub fn read_data(&mut self, cart: &Cartridge) -> u8 {
        let addr = self.vram_addr.addr();
        let mut data = self.data_buffer;
        self.data_buffer = self.read_vram(addr, cart);
        if addr >= 0x3F00 {
            data = self.data_buffer;
            self.data_buffer = self.read_vram(addr - 0x1000, cart);
        }
        self.increment_vram_addr();
        data
    }

    /// Write PPUDATA ($2007): writes VRAM at current address, then increments (by 1 or 32 per PPUCTRL).
    pub fn write_data(&mut self, cart: &mut Cartridge, data: u8) {
        self.write_vram(self.vram_addr.addr(), data, cart);
        self.increment_vram_addr();
    }

    fn increment_vram_addr(&mut self) {
        self.vram_addr.0 = self.vram_addr.0.wrapping_add(self.ctrl.increment()) & 0x7FFF;
    }
}
