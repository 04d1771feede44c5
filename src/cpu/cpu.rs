use tracing::{error, trace};

use crate::{
    bus::Bus,
    cpu::{
        flags::{
            FLAG_BREAK, FLAG_CARRY, FLAG_DECIMAL, FLAG_INTERRUPT_DISABLE, FLAG_NEGATIVE, FLAG_OVERFLOW,
            FLAG_UNUSED, FLAG_ZERO,
        },
        opcodes::{AddrMode, OPCODES, Op},
    },
    error::{Error, Result},
};

pub const NMI_VECTOR: u16 = 0xFFFA;
pub const RESET_VECTOR: u16 = 0xFFFC;
pub const IRQ_VECTOR: u16 = 0xFFFE;

/// Cycles taken by interrupt entry (NMI, IRQ, BRK).
pub const INTERRUPT_CYCLES: u8 = 7;

pub struct CPU<B: Bus> {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    pub pc: u16,
    pub status: u8,
    /// Total CPU cycles since power-on.
    pub cycles: u64,
    /// Cycles the last instruction, interrupt, or DMC fetch still owes the clock.
    pub remaining: u16,
    pub bus: B,
}

impl<B: Bus> CPU<B> {
    pub fn new(bus: B) -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            sp: 0xFD,
            pc: 0,
            status: FLAG_INTERRUPT_DISABLE | FLAG_UNUSED,
            cycles: 0,
            remaining: 0,
            bus,
        }
    }

    pub fn reset(&mut self) {
        self.pc = self.read_word(RESET_VECTOR);

        self.sp = 0xFD; // reset performs three phantom pushes from 0x00
        self.status = FLAG_INTERRUPT_DISABLE | FLAG_UNUSED;

        self.a = 0;
        self.x = 0;
        self.y = 0;

        self.cycles = 7;
        self.remaining = 0;
    }

    /// Execute one instruction and return the cycles it took.
    pub fn step(&mut self) -> Result<u8> {
        trace!("{}", self.trace_line());

        let pc = self.pc;
        let opcode = self.fetch_byte();
        let instruction = OPCODES[opcode as usize];
        if instruction.op == Op::Jam {
            error!("illegal opcode ${opcode:02X} at ${pc:04X}");
            return Err(Error::IllegalOpcode { opcode, pc });
        }

        let (addr, page_crossed) = self.resolve(instruction.mode);
        let mut cycles = instruction.cycles + self.execute(instruction.op, instruction.mode, addr);
        if page_crossed && instruction.op.page_penalty() {
            cycles += 1;
        }

        self.cycles += cycles as u64;
        Ok(cycles)
    }

    /// Non-maskable interrupt entry.
    pub fn nmi(&mut self) -> u8 {
        self.interrupt(NMI_VECTOR);
        INTERRUPT_CYCLES
    }

    /// Maskable interrupt entry. Returns 0 without doing anything while interrupts are disabled.
    pub fn irq(&mut self) -> u8 {
        if self.status & FLAG_INTERRUPT_DISABLE != 0 {
            return 0;
        }
        self.interrupt(IRQ_VECTOR);
        INTERRUPT_CYCLES
    }

    fn interrupt(&mut self, vector: u16) {
        self.push_word(self.pc);
        self.push((self.status & !FLAG_BREAK) | FLAG_UNUSED);
        self.status |= FLAG_INTERRUPT_DISABLE;
        self.pc = self.read_word(vector);
        self.cycles += INTERRUPT_CYCLES as u64;
    }

    fn fetch_byte(&mut self) -> u8 {
        let byte = self.bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        byte
    }

    fn fetch_word(&mut self) -> u16 {
        let lo = self.fetch_byte() as u16;
        let hi = self.fetch_byte() as u16;
        (hi << 8) | lo
    }

    fn read_word(&mut self, addr: u16) -> u16 {
        let lo = self.bus.read(addr) as u16;
        let hi = self.bus.read(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }

    /// Little-endian pointer read that stays inside zero page.
    fn read_zero_page_word(&mut self, ptr: u8) -> u16 {
        let lo = self.bus.read(ptr as u16) as u16;
        let hi = self.bus.read(ptr.wrapping_add(1) as u16) as u16;
        (hi << 8) | lo
    }

    /// Resolve the effective address for `mode`. Immediate mode yields the operand's own
    /// address so every operand is fetched with a plain bus read. The flag reports an indexed
    /// access that crossed a page.
    fn resolve(&mut self, mode: AddrMode) -> (u16, bool) {
        match mode {
            AddrMode::Imp | AddrMode::Acc => (0, false),
            AddrMode::Imm => {
                let addr = self.pc;
                self.pc = self.pc.wrapping_add(1);
                (addr, false)
            }
            AddrMode::Zp0 => (self.fetch_byte() as u16, false),
            AddrMode::Zpx => (self.fetch_byte().wrapping_add(self.x) as u16, false),
            AddrMode::Zpy => (self.fetch_byte().wrapping_add(self.y) as u16, false),
            AddrMode::Rel => {
                let offset = self.fetch_byte() as i8;
                (self.pc.wrapping_add(offset as u16), false)
            }
            AddrMode::Abs => (self.fetch_word(), false),
            AddrMode::Abx => {
                let base = self.fetch_word();
                let addr = base.wrapping_add(self.x as u16);
                (addr, (base & 0xFF00) != (addr & 0xFF00))
            }
            AddrMode::Aby => {
                let base = self.fetch_word();
                let addr = base.wrapping_add(self.y as u16);
                (addr, (base & 0xFF00) != (addr & 0xFF00))
            }
            AddrMode::Ind => {
                let ptr = self.fetch_word();
                // The high byte never carries: ($10FF) reads $10FF and $1000.
                let lo = self.bus.read(ptr) as u16;
                let hi = self.bus.read((ptr & 0xFF00) | (ptr.wrapping_add(1) & 0x00FF)) as u16;
                ((hi << 8) | lo, false)
            }
            AddrMode::Izx => {
                let ptr = self.fetch_byte().wrapping_add(self.x);
                (self.read_zero_page_word(ptr), false)
            }
            AddrMode::Izy => {
                let ptr = self.fetch_byte();
                let base = self.read_zero_page_word(ptr);
                let addr = base.wrapping_add(self.y as u16);
                (addr, (base & 0xFF00) != (addr & 0xFF00))
            }
        }
    }

    /// Run `op` against the resolved address. Returns extra cycles (taken branches only).
    fn execute(&mut self, op: Op, mode: AddrMode, addr: u16) -> u8 {
        match op {
            Op::Lda => {
                self.a = self.bus.read(addr);
                self.update_zero_and_negative_flags(self.a);
            }
            Op::Ldx => {
                self.x = self.bus.read(addr);
                self.update_zero_and_negative_flags(self.x);
            }
            Op::Ldy => {
                self.y = self.bus.read(addr);
                self.update_zero_and_negative_flags(self.y);
            }
            Op::Lax => {
                let value = self.bus.read(addr);
                self.a = value;
                self.x = value;
                self.update_zero_and_negative_flags(value);
            }
            Op::Sta => self.bus.write(addr, self.a),
            Op::Stx => self.bus.write(addr, self.x),
            Op::Sty => self.bus.write(addr, self.y),
            Op::Sax => self.bus.write(addr, self.a & self.x),

            Op::Tax => {
                self.x = self.a;
                self.update_zero_and_negative_flags(self.x);
            }
            Op::Tay => {
                self.y = self.a;
                self.update_zero_and_negative_flags(self.y);
            }
            Op::Txa => {
                self.a = self.x;
                self.update_zero_and_negative_flags(self.a);
            }
            Op::Tya => {
                self.a = self.y;
                self.update_zero_and_negative_flags(self.a);
            }
            Op::Tsx => {
                self.x = self.sp;
                self.update_zero_and_negative_flags(self.x);
            }
            Op::Txs => self.sp = self.x,

            Op::And => {
                self.a &= self.bus.read(addr);
                self.update_zero_and_negative_flags(self.a);
            }
            Op::Ora => {
                self.a |= self.bus.read(addr);
                self.update_zero_and_negative_flags(self.a);
            }
            Op::Eor => {
                self.a ^= self.bus.read(addr);
                self.update_zero_and_negative_flags(self.a);
            }
            Op::Adc => {
                let value = self.bus.read(addr);
                self.add_with_carry(value);
            }
            Op::Sbc => {
                let value = self.bus.read(addr);
                self.add_with_carry(value ^ 0xFF);
            }
            Op::Cmp => {
                let value = self.bus.read(addr);
                self.compare(self.a, value);
            }
            Op::Cpx => {
                let value = self.bus.read(addr);
                self.compare(self.x, value);
            }
            Op::Cpy => {
                let value = self.bus.read(addr);
                self.compare(self.y, value);
            }
            Op::Bit => {
                let value = self.bus.read(addr);
                self.set_flag(FLAG_ZERO, self.a & value == 0);
                self.set_flag(FLAG_OVERFLOW, value & 0x40 != 0);
                self.set_flag(FLAG_NEGATIVE, value & 0x80 != 0);
            }

            Op::Asl => {
                let value = self.read_operand(mode, addr);
                let result = self.asl(value);
                self.write_operand(mode, addr, result);
            }
            Op::Lsr => {
                let value = self.read_operand(mode, addr);
                let result = self.lsr(value);
                self.write_operand(mode, addr, result);
            }
            Op::Rol => {
                let value = self.read_operand(mode, addr);
                let result = self.rol(value);
                self.write_operand(mode, addr, result);
            }
            Op::Ror => {
                let value = self.read_operand(mode, addr);
                let result = self.ror(value);
                self.write_operand(mode, addr, result);
            }
            Op::Inc => {
                let result = self.bus.read(addr).wrapping_add(1);
                self.bus.write(addr, result);
                self.update_zero_and_negative_flags(result);
            }
            Op::Dec => {
                let result = self.bus.read(addr).wrapping_sub(1);
                self.bus.write(addr, result);
                self.update_zero_and_negative_flags(result);
            }
            Op::Inx => {
                self.x = self.x.wrapping_add(1);
                self.update_zero_and_negative_flags(self.x);
            }
            Op::Iny => {
                self.y = self.y.wrapping_add(1);
                self.update_zero_and_negative_flags(self.y);
            }
            Op::Dex => {
                self.x = self.x.wrapping_sub(1);
                self.update_zero_and_negative_flags(self.x);
            }
            Op::Dey => {
                self.y = self.y.wrapping_sub(1);
                self.update_zero_and_negative_flags(self.y);
            }

            Op::Slo => {
                let value = self.bus.read(addr);
                let result = self.asl(value);
                self.bus.write(addr, result);
                self.a |= result;
                self.update_zero_and_negative_flags(self.a);
            }
            Op::Rla => {
                let value = self.bus.read(addr);
                let result = self.rol(value);
                self.bus.write(addr, result);
                self.a &= result;
                self.update_zero_and_negative_flags(self.a);
            }
            Op::Sre => {
                let value = self.bus.read(addr);
                let result = self.lsr(value);
                self.bus.write(addr, result);
                self.a ^= result;
                self.update_zero_and_negative_flags(self.a);
            }
            Op::Rra => {
                let value = self.bus.read(addr);
                let result = self.ror(value);
                self.bus.write(addr, result);
                self.add_with_carry(result);
            }
            Op::Dcp => {
                let result = self.bus.read(addr).wrapping_sub(1);
                self.bus.write(addr, result);
                self.compare(self.a, result);
            }
            Op::Isc => {
                let result = self.bus.read(addr).wrapping_add(1);
                self.bus.write(addr, result);
                self.add_with_carry(result ^ 0xFF);
            }

            Op::Bcc => return self.branch(self.status & FLAG_CARRY == 0, addr),
            Op::Bcs => return self.branch(self.status & FLAG_CARRY != 0, addr),
            Op::Bne => return self.branch(self.status & FLAG_ZERO == 0, addr),
            Op::Beq => return self.branch(self.status & FLAG_ZERO != 0, addr),
            Op::Bpl => return self.branch(self.status & FLAG_NEGATIVE == 0, addr),
            Op::Bmi => return self.branch(self.status & FLAG_NEGATIVE != 0, addr),
            Op::Bvc => return self.branch(self.status & FLAG_OVERFLOW == 0, addr),
            Op::Bvs => return self.branch(self.status & FLAG_OVERFLOW != 0, addr),

            Op::Jmp => self.pc = addr,
            Op::Jsr => {
                self.push_word(self.pc.wrapping_sub(1));
                self.pc = addr;
            }
            Op::Rts => self.pc = self.pop_word().wrapping_add(1),
            Op::Rti => {
                self.status = (self.pop() & !FLAG_BREAK) | FLAG_UNUSED;
                self.pc = self.pop_word();
            }
            Op::Brk => self.brk(),

            Op::Pha => self.push(self.a),
            Op::Php => self.push(self.status | FLAG_BREAK | FLAG_UNUSED),
            Op::Pla => {
                self.a = self.pop();
                self.update_zero_and_negative_flags(self.a);
            }
            Op::Plp => self.status = (self.pop() & !FLAG_BREAK) | FLAG_UNUSED,

            Op::Clc => self.status &= !FLAG_CARRY,
            Op::Sec => self.status |= FLAG_CARRY,
            Op::Cli => self.status &= !FLAG_INTERRUPT_DISABLE,
            Op::Sei => self.status |= FLAG_INTERRUPT_DISABLE,
            Op::Clv => self.status &= !FLAG_OVERFLOW,
            Op::Cld => self.status &= !FLAG_DECIMAL,
            Op::Sed => self.status |= FLAG_DECIMAL,

            Op::Nop => {
                // Multi-byte NOPs still perform their operand read.
                if !matches!(mode, AddrMode::Imp | AddrMode::Acc) {
                    self.bus.read(addr);
                }
            }
            Op::Jam => {}
        }
        0
    }

    fn brk(&mut self) {
        self.pc = self.pc.wrapping_add(1); // +1 because of padding byte

        self.push_word(self.pc);
        self.push(self.status | FLAG_BREAK | FLAG_UNUSED);

        self.status |= FLAG_INTERRUPT_DISABLE;
        self.pc = self.read_word(IRQ_VECTOR);
    }

    /// Take the branch when `condition` holds: +1 cycle, +1 more if the target is on another page.
    fn branch(&mut self, condition: bool, target: u16) -> u8 {
        if !condition {
            return 0;
        }
        let extra = if (self.pc & 0xFF00) != (target & 0xFF00) { 2 } else { 1 };
        self.pc = target;
        extra
    }

    fn read_operand(&mut self, mode: AddrMode, addr: u16) -> u8 {
        if mode == AddrMode::Acc { self.a } else { self.bus.read(addr) }
    }

    fn write_operand(&mut self, mode: AddrMode, addr: u16, value: u8) {
        if mode == AddrMode::Acc {
            self.a = value;
        } else {
            self.bus.write(addr, value);
        }
    }

    /// A + value + C. Subtraction passes the one's complement of its operand.
    fn add_with_carry(&mut self, value: u8) {
        let carry_in = (self.status & FLAG_CARRY) as u16;
        let sum = self.a as u16 + value as u16 + carry_in;
        let result = sum as u8;

        self.set_flag(FLAG_CARRY, sum > 0xFF);
        self.set_flag(FLAG_OVERFLOW, (self.a ^ result) & (value ^ result) & 0x80 != 0);

        self.a = result;
        self.update_zero_and_negative_flags(self.a);
    }

    /// Carry means "no borrow": register >= value.
    fn compare(&mut self, register: u8, value: u8) {
        self.set_flag(FLAG_CARRY, register >= value);
        self.update_zero_and_negative_flags(register.wrapping_sub(value));
    }

    fn asl(&mut self, value: u8) -> u8 {
        self.set_flag(FLAG_CARRY, value & 0x80 != 0);
        let result = value << 1;
        self.update_zero_and_negative_flags(result);
        result
    }

    fn lsr(&mut self, value: u8) -> u8 {
        self.set_flag(FLAG_CARRY, value & 0x01 != 0);
        let result = value >> 1;
        self.update_zero_and_negative_flags(result);
        result
    }

    fn rol(&mut self, value: u8) -> u8 {
        let carry_in = self.status & FLAG_CARRY;
        self.set_flag(FLAG_CARRY, value & 0x80 != 0);
        let result = (value << 1) | carry_in;
        self.update_zero_and_negative_flags(result);
        result
    }

    fn ror(&mut self, value: u8) -> u8 {
        let carry_in = (self.status & FLAG_CARRY) << 7;
        self.set_flag(FLAG_CARRY, value & 0x01 != 0);
        let result = (value >> 1) | carry_in;
        self.update_zero_and_negative_flags(result);
        result
    }

    fn push(&mut self, value: u8) {
        self.bus.write(0x0100 | self.sp as u16, value);
        self.sp = self.sp.wrapping_sub(1);
    }

    fn pop(&mut self) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        self.bus.read(0x0100 | self.sp as u16)
    }

    fn push_word(&mut self, value: u16) {
        self.push((value >> 8) as u8);
        self.push(value as u8);
    }

    fn pop_word(&mut self) -> u16 {
        let lo = self.pop() as u16;
        let hi = self.pop() as u16;
        (hi << 8) | lo
    }

    fn set_flag(&mut self, flag: u8, on: bool) {
        if on {
            self.status |= flag;
        } else {
            self.status &= !flag;
        }
    }

    fn update_zero_and_negative_flags(&mut self, value: u8) {
        self.set_flag(FLAG_ZERO, value == 0);
        self.set_flag(FLAG_NEGATIVE, value & 0x80 != 0);
    }
}
