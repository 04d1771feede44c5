//! The 256-entry 6502 decode table.
//!
//! Each opcode maps to an operation, an addressing mode, and its base cycle cost. Page-crossing
//! and taken-branch penalties are added on top by the CPU. Opcodes the NMOS part executes
//! unpredictably (and the JAM/KIL family) decode to [`Op::Jam`], which the CPU reports as an
//! illegal opcode.

/// Addressing modes of the 6502.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddrMode {
    /// Implied: no operand.
    Imp,
    /// Accumulator: the shift/rotate operates on A.
    Acc,
    Imm,
    Zp0,
    Zpx,
    Zpy,
    /// Relative: signed 8-bit branch displacement.
    Rel,
    Abs,
    Abx,
    Aby,
    /// Indirect (JMP only), with the page-wrap pointer bug.
    Ind,
    /// (zp,X)
    Izx,
    /// (zp),Y
    Izy,
}

impl AddrMode {
    /// Instruction length in bytes, opcode included.
    pub fn len(self) -> u16 {
        match self {
            AddrMode::Imp | AddrMode::Acc => 1,
            AddrMode::Abs | AddrMode::Abx | AddrMode::Aby | AddrMode::Ind => 3,
            _ => 2,
        }
    }
}

/// Operations. Undocumented but stable NMOS opcodes are included alongside the official set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk, Bvc, Bvs, Clc,
    Cld, Cli, Clv, Cmp, Cpx, Cpy, Dec, Dex, Dey, Eor, Inc, Inx, Iny, Jmp,
    Jsr, Lda, Ldx, Ldy, Lsr, Nop, Ora, Pha, Php, Pla, Plp, Rol, Ror, Rti,
    Rts, Sbc, Sec, Sed, Sei, Sta, Stx, Sty, Tax, Tay, Tsx, Txa, Txs, Tya,
    // undocumented
    Lax, Sax, Dcp, Isc, Slo, Rla, Sre, Rra,
    /// No defined behavior.
    Jam,
}

impl Op {
    /// Read-type operations pay one extra cycle when indexed addressing crosses a page.
    /// Stores and read-modify-write ops always take the long path, which is in their base cost.
    pub fn page_penalty(self) -> bool {
        matches!(
            self,
            Op::Adc
                | Op::And
                | Op::Cmp
                | Op::Eor
                | Op::Lda
                | Op::Ldx
                | Op::Ldy
                | Op::Ora
                | Op::Sbc
                | Op::Lax
                | Op::Nop
        )
    }
}

/// One decoded opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub op: Op,
    pub mode: AddrMode,
    pub cycles: u8,
    /// Not part of the documented instruction set.
    pub undocumented: bool,
}

const fn ins(op: Op, mode: AddrMode, cycles: u8) -> Instruction {
    Instruction { op, mode, cycles, undocumented: false }
}

const fn und(op: Op, mode: AddrMode, cycles: u8) -> Instruction {
    Instruction { op, mode, cycles, undocumented: true }
}

const JAM: Instruction = Instruction { op: Op::Jam, mode: AddrMode::Imp, cycles: 0, undocumented: true };

use AddrMode::*;
use Op::*;

#[rustfmt::skip]
pub static OPCODES: [Instruction; 256] = [
    // 0x00
    ins(Brk, Imp, 7), ins(Ora, Izx, 6), JAM,              und(Slo, Izx, 8),
    und(Nop, Zp0, 3), ins(Ora, Zp0, 3), ins(Asl, Zp0, 5), und(Slo, Zp0, 5),
    ins(Php, Imp, 3), ins(Ora, Imm, 2), ins(Asl, Acc, 2), JAM,
    und(Nop, Abs, 4), ins(Ora, Abs, 4), ins(Asl, Abs, 6), und(Slo, Abs, 6),
    // 0x10
    ins(Bpl, Rel, 2), ins(Ora, Izy, 5), JAM,              und(Slo, Izy, 8),
    und(Nop, Zpx, 4), ins(Ora, Zpx, 4), ins(Asl, Zpx, 6), und(Slo, Zpx, 6),
    ins(Clc, Imp, 2), ins(Ora, Aby, 4), und(Nop, Imp, 2), und(Slo, Aby, 7),
    und(Nop, Abx, 4), ins(Ora, Abx, 4), ins(Asl, Abx, 7), und(Slo, Abx, 7),
    // 0x20
    ins(Jsr, Abs, 6), ins(And, Izx, 6), JAM,              und(Rla, Izx, 8),
    ins(Bit, Zp0, 3), ins(And, Zp0, 3), ins(Rol, Zp0, 5), und(Rla, Zp0, 5),
    ins(Plp, Imp, 4), ins(And, Imm, 2), ins(Rol, Acc, 2), JAM,
    ins(Bit, Abs, 4), ins(And, Abs, 4), ins(Rol, Abs, 6), und(Rla, Abs, 6),
    // 0x30
    ins(Bmi, Rel, 2), ins(And, Izy, 5), JAM,              und(Rla, Izy, 8),
    und(Nop, Zpx, 4), ins(And, Zpx, 4), ins(Rol, Zpx, 6), und(Rla, Zpx, 6),
    ins(Sec, Imp, 2), ins(And, Aby, 4), und(Nop, Imp, 2), und(Rla, Aby, 7),
    und(Nop, Abx, 4), ins(And, Abx, 4), ins(Rol, Abx, 7), und(Rla, Abx, 7),
    // 0x40
    ins(Rti, Imp, 6), ins(Eor, Izx, 6), JAM,              und(Sre, Izx, 8),
    und(Nop, Zp0, 3), ins(Eor, Zp0, 3), ins(Lsr, Zp0, 5), und(Sre, Zp0, 5),
    ins(Pha, Imp, 3), ins(Eor, Imm, 2), ins(Lsr, Acc, 2), JAM,
    ins(Jmp, Abs, 3), ins(Eor, Abs, 4), ins(Lsr, Abs, 6), und(Sre, Abs, 6),
    // 0x50
    ins(Bvc, Rel, 2), ins(Eor, Izy, 5), JAM,              und(Sre, Izy, 8),
    und(Nop, Zpx, 4), ins(Eor, Zpx, 4), ins(Lsr, Zpx, 6), und(Sre, Zpx, 6),
    ins(Cli, Imp, 2), ins(Eor, Aby, 4), und(Nop, Imp, 2), und(Sre, Aby, 7),
    und(Nop, Abx, 4), ins(Eor, Abx, 4), ins(Lsr, Abx, 7), und(Sre, Abx, 7),
    // 0x60
    ins(Rts, Imp, 6), ins(Adc, Izx, 6), JAM,              und(Rra, Izx, 8),
    und(Nop, Zp0, 3), ins(Adc, Zp0, 3), ins(Ror, Zp0, 5), und(Rra, Zp0, 5),
    ins(Pla, Imp, 4), ins(Adc, Imm, 2), ins(Ror, Acc, 2), JAM,
    ins(Jmp, Ind, 5), ins(Adc, Abs, 4), ins(Ror, Abs, 6), und(Rra, Abs, 6),
    // 0x70
    ins(Bvs, Rel, 2), ins(Adc, Izy, 5), JAM,              und(Rra, Izy, 8),
    und(Nop, Zpx, 4), ins(Adc, Zpx, 4), ins(Ror, Zpx, 6), und(Rra, Zpx, 6),
    ins(Sei, Imp, 2), ins(Adc, Aby, 4), und(Nop, Imp, 2), und(Rra, Aby, 7),
    und(Nop, Abx, 4), ins(Adc, Abx, 4), ins(Ror, Abx, 7), und(Rra, Abx, 7),
    // 0x80
    und(Nop, Imm, 2), ins(Sta, Izx, 6), und(Nop, Imm, 2), und(Sax, Izx, 6),
    ins(Sty, Zp0, 3), ins(Sta, Zp0, 3), ins(Stx, Zp0, 3), und(Sax, Zp0, 3),
    ins(Dey, Imp, 2), und(Nop, Imm, 2), ins(Txa, Imp, 2), JAM,
    ins(Sty, Abs, 4), ins(Sta, Abs, 4), ins(Stx, Abs, 4), und(Sax, Abs, 4),
    // 0x90
    ins(Bcc, Rel, 2), ins(Sta, Izy, 6), JAM,              JAM,
    ins(Sty, Zpx, 4), ins(Sta, Zpx, 4), ins(Stx, Zpy, 4), und(Sax, Zpy, 4),
    ins(Tya, Imp, 2), ins(Sta, Aby, 5), ins(Txs, Imp, 2), JAM,
    JAM,              ins(Sta, Abx, 5), JAM,              JAM,
    // 0xA0
    ins(Ldy, Imm, 2), ins(Lda, Izx, 6), ins(Ldx, Imm, 2), und(Lax, Izx, 6),
    ins(Ldy, Zp0, 3), ins(Lda, Zp0, 3), ins(Ldx, Zp0, 3), und(Lax, Zp0, 3),
    ins(Tay, Imp, 2), ins(Lda, Imm, 2), ins(Tax, Imp, 2), JAM,
    ins(Ldy, Abs, 4), ins(Lda, Abs, 4), ins(Ldx, Abs, 4), und(Lax, Abs, 4),
    // 0xB0
    ins(Bcs, Rel, 2), ins(Lda, Izy, 5), JAM,              und(Lax, Izy, 5),
    ins(Ldy, Zpx, 4), ins(Lda, Zpx, 4), ins(Ldx, Zpy, 4), und(Lax, Zpy, 4),
    ins(Clv, Imp, 2), ins(Lda, Aby, 4), ins(Tsx, Imp, 2), JAM,
    ins(Ldy, Abx, 4), ins(Lda, Abx, 4), ins(Ldx, Aby, 4), und(Lax, Aby, 4),
    // 0xC0
    ins(Cpy, Imm, 2), ins(Cmp, Izx, 6), und(Nop, Imm, 2), und(Dcp, Izx, 8),
    ins(Cpy, Zp0, 3), ins(Cmp, Zp0, 3), ins(Dec, Zp0, 5), und(Dcp, Zp0, 5),
    ins(Iny, Imp, 2), ins(Cmp, Imm, 2), ins(Dex, Imp, 2), JAM,
    ins(Cpy, Abs, 4), ins(Cmp, Abs, 4), ins(Dec, Abs, 6), und(Dcp, Abs, 6),
    // 0xD0
    ins(Bne, Rel, 2), ins(Cmp, Izy, 5), JAM,              und(Dcp, Izy, 8),
    und(Nop, Zpx, 4), ins(Cmp, Zpx, 4), ins(Dec, Zpx, 6), und(Dcp, Zpx, 6),
    ins(Cld, Imp, 2), ins(Cmp, Aby, 4), und(Nop, Imp, 2), und(Dcp, Aby, 7),
    und(Nop, Abx, 4), ins(Cmp, Abx, 4), ins(Dec, Abx, 7), und(Dcp, Abx, 7),
    // 0xE0
    ins(Cpx, Imm, 2), ins(Sbc, Izx, 6), und(Nop, Imm, 2), und(Isc, Izx, 8),
    ins(Cpx, Zp0, 3), ins(Sbc, Zp0, 3), ins(Inc, Zp0, 5), und(Isc, Zp0, 5),
    ins(Inx, Imp, 2), ins(Sbc, Imm, 2), ins(Nop, Imp, 2), und(Sbc, Imm, 2),
    ins(Cpx, Abs, 4), ins(Sbc, Abs, 4), ins(Inc, Abs, 6), und(Isc, Abs, 6),
    // 0xF0
    ins(Beq, Rel, 2), ins(Sbc, Izy, 5), JAM,              und(Isc, Izy, 8),
    und(Nop, Zpx, 4), ins(Sbc, Zpx, 4), ins(Inc, Zpx, 6), und(Isc, Zpx, 6),
    ins(Sed, Imp, 2), ins(Sbc, Aby, 4), und(Nop, Imp, 2), und(Isc, Aby, 7),
    und(Nop, Abx, 4), ins(Sbc, Abx, 4), ins(Inc, Abx, 7), und(Isc, Abx, 7),
];
