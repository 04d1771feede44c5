//! nestest-style trace lines.
//!
//! ```text
//! C000  4C F5 C5  JMP $C5F5                       A:00 X:00 Y:00 P:24 SP:FD CYC:7
//! ```

use crate::{
    bus::Bus,
    cpu::{
        cpu::CPU,
        opcodes::{AddrMode, OPCODES},
    },
};

impl<B: Bus> CPU<B> {
    /// Format the instruction at PC together with the register file, before it executes.
    /// Operand bytes are read through the bus, so point PC at ROM or RAM.
    pub fn trace_line(&mut self) -> String {
        let pc = self.pc;
        let opcode = self.bus.read(pc);
        let instruction = OPCODES[opcode as usize];
        let mode = instruction.mode;

        let bytes: Vec<u8> = (0..mode.len())
            .map(|i| self.bus.read(pc.wrapping_add(i)))
            .collect();
        let hex = bytes
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect::<Vec<_>>()
            .join(" ");

        let lo = bytes.get(1).copied().unwrap_or(0);
        let word = u16::from_le_bytes([lo, bytes.get(2).copied().unwrap_or(0)]);
        let operand = match mode {
            AddrMode::Imp => String::new(),
            AddrMode::Acc => "A".to_string(),
            AddrMode::Imm => format!("#${lo:02X}"),
            AddrMode::Zp0 => format!("${lo:02X}"),
            AddrMode::Zpx => format!("${lo:02X},X"),
            AddrMode::Zpy => format!("${lo:02X},Y"),
            AddrMode::Rel => {
                let target = pc.wrapping_add(2).wrapping_add(lo as i8 as u16);
                format!("${target:04X}")
            }
            AddrMode::Abs => format!("${word:04X}"),
            AddrMode::Abx => format!("${word:04X},X"),
            AddrMode::Aby => format!("${word:04X},Y"),
            AddrMode::Ind => format!("(${word:04X})"),
            AddrMode::Izx => format!("(${lo:02X},X)"),
            AddrMode::Izy => format!("(${lo:02X}),Y"),
        };

        let marker = if instruction.undocumented { '*' } else { ' ' };
        let mnemonic = format!("{:?}", instruction.op).to_uppercase();

        format!(
            "{:04X}  {:<8} {}{} {:<27} A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X} CYC:{}",
            pc, hex, marker, mnemonic, operand, self.a, self.x, self.y, self.status, self.sp, self.cycles
        )
    }
}
