use crate::{
    bus::Bus,
    cpu::{
        cpu::CPU,
        flags::{
            FLAG_BREAK, FLAG_CARRY, FLAG_INTERRUPT_DISABLE, FLAG_NEGATIVE, FLAG_OVERFLOW,
            FLAG_UNUSED, FLAG_ZERO,
        },
    },
    error::Error,
};

struct TestBus {
    mem: [u8; 65536],
}

impl TestBus {
    fn new() -> Self {
        Self { mem: [0; 65536] }
    }
}

impl Bus for TestBus {
    fn read(&mut self, addr: u16) -> u8 {
        self.mem[addr as usize]
    }

    fn write(&mut self, addr: u16, data: u8) {
        self.mem[addr as usize] = data;
    }
}

/// Program at $8000, reset vector pointing at it, IRQ vector at $9000, NMI vector at $A000.
fn new_cpu(program: &[u8]) -> CPU<TestBus> {
    let mut bus = TestBus::new();
    bus.mem[0x8000..0x8000 + program.len()].copy_from_slice(program);

    bus.mem[0xFFFC] = 0x00;
    bus.mem[0xFFFD] = 0x80;
    bus.mem[0xFFFE] = 0x00;
    bus.mem[0xFFFF] = 0x90;
    bus.mem[0xFFFA] = 0x00;
    bus.mem[0xFFFB] = 0xA0;

    let mut cpu = CPU::new(bus);
    cpu.reset();
    cpu
}

#[test]
fn lda_immediate_loads_value() {
    let mut cpu = new_cpu(&[0xA9, 0x42]); // LDA #$42
    cpu.step().unwrap();

    assert_eq!(cpu.a, 0x42)
}

#[test]
fn lda_sets_zero_flag() {
    let mut cpu = new_cpu(&[0xA9, 0x00]); // LDA #$00
    cpu.step().unwrap();

    assert!(cpu.status & FLAG_ZERO != 0);
    assert!(cpu.status & FLAG_NEGATIVE == 0);
}

#[test]
fn lda_sets_negative_flag() {
    let mut cpu = new_cpu(&[0xA9, 0x80]); // LDA #$80
    cpu.step().unwrap();

    assert!(cpu.status & FLAG_NEGATIVE != 0);
    assert!(cpu.status & FLAG_ZERO == 0);
}

#[test]
fn tax_transfers_a_to_x() {
    let mut cpu = new_cpu(&[
        0xA9, 0x10, // LDA #$10
        0xAA, // TAX
    ]);
    cpu.step().unwrap();
    cpu.step().unwrap();

    assert_eq!(cpu.x, 0x10);
}

#[test]
fn sta_writes_to_memory() {
    let mut cpu = new_cpu(&[
        0xA9, 0x33, // LDA #$33
        0x8D, 0x00, 0x02, // STA $0200
    ]);
    cpu.step().unwrap();
    assert_eq!(cpu.step().unwrap(), 4);

    assert_eq!(cpu.bus.mem[0x0200], 0x33);
}

#[test]
fn jmp_changes_program_counter() {
    let mut cpu = new_cpu(&[0x4C, 0x00, 0x90]); // JMP $9000
    cpu.bus.mem[0x9000] = 0xA9; // LDA #$55
    cpu.bus.mem[0x9001] = 0x55;

    assert_eq!(cpu.step().unwrap(), 3);
    assert_eq!(cpu.pc, 0x9000);
    cpu.step().unwrap();
    assert_eq!(cpu.a, 0x55);
}

#[test]
fn jmp_indirect_wraps_within_page() {
    let mut cpu = new_cpu(&[0x6C, 0xFF, 0x02]); // JMP ($02FF)
    cpu.bus.mem[0x02FF] = 0x34;
    cpu.bus.mem[0x0200] = 0x12;
    cpu.bus.mem[0x0300] = 0x56;

    assert_eq!(cpu.step().unwrap(), 5);
    assert_eq!(cpu.pc, 0x1234);
}

#[test]
fn inx_increments_x() {
    let mut cpu = new_cpu(&[
        0xA2, 0x01, // LDX #$01
        0xE8, // INX
    ]);
    cpu.step().unwrap();
    cpu.step().unwrap();

    assert_eq!(cpu.x, 0x02);
}

#[test]
fn dex_sets_zero_flag() {
    let mut cpu = new_cpu(&[
        0xA2, 0x01, // LDX #$01
        0xCA, // DEX
    ]);
    cpu.step().unwrap();
    cpu.step().unwrap();

    assert_eq!(cpu.x, 0x00);
    assert!(cpu.status & FLAG_ZERO != 0);
}

#[test]
fn bne_loops_until_zero() {
    let mut cpu = new_cpu(&[
        0xA2, 0x03, // LDX #3
        0xCA, // DEX
        0xD0, 0xFD, // BNE -3
    ]);
    cpu.step().unwrap();
    for _ in 0..3 {
        cpu.step().unwrap();
        cpu.step().unwrap();
    }

    assert_eq!(cpu.x, 0);
    assert_eq!(cpu.pc, 0x8005);
}

#[test]
fn branch_cycle_costs() {
    // Not taken: 2.
    let mut cpu = new_cpu(&[0xF0, 0x10]); // BEQ +16
    assert_eq!(cpu.step().unwrap(), 2);
    assert_eq!(cpu.pc, 0x8002);

    // Taken, same page: 3.
    let mut cpu = new_cpu(&[0xD0, 0x10]); // BNE +16
    assert_eq!(cpu.step().unwrap(), 3);
    assert_eq!(cpu.pc, 0x8012);

    // Taken, backwards across a page: 4.
    let mut cpu = new_cpu(&[0xD0, 0xF0]); // BNE -16
    assert_eq!(cpu.step().unwrap(), 4);
    assert_eq!(cpu.pc, 0x7FF2);
}

#[test]
fn page_crossing_penalty_applies_to_reads_only() {
    let mut cpu = new_cpu(&[
        0xA2, 0x01, // LDX #$01
        0xBD, 0x00, 0x02, // LDA $0200,X
        0xBD, 0xFF, 0x02, // LDA $02FF,X
        0x9D, 0xFF, 0x02, // STA $02FF,X
        0x1E, 0xFF, 0x02, // ASL $02FF,X
    ]);
    cpu.step().unwrap();
    assert_eq!(cpu.step().unwrap(), 4);
    assert_eq!(cpu.step().unwrap(), 5);
    assert_eq!(cpu.step().unwrap(), 5);
    assert_eq!(cpu.step().unwrap(), 7);
}

#[test]
fn indirect_y_penalty_on_page_cross() {
    let mut cpu = new_cpu(&[
        0xA0, 0x10, // LDY #$10
        0xB1, 0x40, // LDA ($40),Y
        0x91, 0x40, // STA ($40),Y
    ]);
    cpu.bus.mem[0x0040] = 0xF8;
    cpu.bus.mem[0x0041] = 0x03;
    cpu.bus.mem[0x0408] = 0x99;

    cpu.step().unwrap();
    assert_eq!(cpu.step().unwrap(), 6);
    assert_eq!(cpu.a, 0x99);
    assert_eq!(cpu.step().unwrap(), 6);
}

#[test]
fn indexed_zero_page_wraps() {
    let mut cpu = new_cpu(&[
        0xA2, 0x10, // LDX #$10
        0xB5, 0xF8, // LDA $F8,X
        0xA1, 0xF8, // LDA ($F8,X)
    ]);
    cpu.bus.mem[0x0008] = 0x77;
    cpu.bus.mem[0x0009] = 0x00;
    cpu.bus.mem[0x000A] = 0x03;
    cpu.bus.mem[0x0300] = 0x5A;

    cpu.step().unwrap();
    cpu.step().unwrap();
    assert_eq!(cpu.a, 0x77);

    // ($F8,X) with X = $11 takes its pointer from $09/$0A.
    cpu.x = 0x11;
    cpu.step().unwrap();
    assert_eq!(cpu.a, 0x5A);
}

#[test]
fn jsr_and_rts_work() {
    let mut cpu = new_cpu(&[
        0x20, 0x00, 0x90, // JSR $9000
        0xA9, 0x11, // LDA #$11
    ]);
    cpu.bus.mem[0x9000] = 0xA9; // LDA #$22
    cpu.bus.mem[0x9001] = 0x22;
    cpu.bus.mem[0x9002] = 0x60; // RTS

    assert_eq!(cpu.step().unwrap(), 6);
    assert_eq!(cpu.bus.mem[0x01FD], 0x80);
    assert_eq!(cpu.bus.mem[0x01FC], 0x02);
    cpu.step().unwrap();
    assert_eq!(cpu.a, 0x22);
    assert_eq!(cpu.step().unwrap(), 6);
    assert_eq!(cpu.pc, 0x8003);
    cpu.step().unwrap();
    assert_eq!(cpu.a, 0x11);
    assert_eq!(cpu.sp, 0xFD);
}

#[test]
fn stack_pointer_wraps_within_page_one() {
    let mut cpu = new_cpu(&[
        0x48, // PHA
        0x68, // PLA
    ]);
    cpu.sp = 0x00;
    cpu.a = 0xAB;

    cpu.step().unwrap();
    assert_eq!(cpu.bus.mem[0x0100], 0xAB);
    assert_eq!(cpu.sp, 0xFF);

    cpu.a = 0;
    cpu.step().unwrap();
    assert_eq!(cpu.a, 0xAB);
    assert_eq!(cpu.sp, 0x00);
}

#[test]
fn brk_jumps_to_irq_vector() {
    let mut cpu = new_cpu(&[0x00]); // BRK

    assert_eq!(cpu.step().unwrap(), 7);

    assert_eq!(cpu.pc, 0x9000);
    assert!(cpu.status & FLAG_INTERRUPT_DISABLE != 0);
    // Return address skips the padding byte.
    assert_eq!(cpu.bus.mem[0x01FD], 0x80);
    assert_eq!(cpu.bus.mem[0x01FC], 0x02);
    assert_eq!(cpu.bus.mem[0x01FB], 0x24 | FLAG_BREAK);
}

#[test]
fn nmi_pushes_state_with_break_clear() {
    let mut cpu = new_cpu(&[0xEA]);
    cpu.status = FLAG_CARRY | FLAG_UNUSED;

    assert_eq!(cpu.nmi(), 7);
    assert_eq!(cpu.pc, 0xA000);
    assert_eq!(cpu.bus.mem[0x01FD], 0x80);
    assert_eq!(cpu.bus.mem[0x01FC], 0x00);
    assert_eq!(cpu.bus.mem[0x01FB], FLAG_CARRY | FLAG_UNUSED);
    assert_eq!(cpu.sp, 0xFA);
    assert!(cpu.status & FLAG_INTERRUPT_DISABLE != 0);
}

#[test]
fn irq_is_masked_by_interrupt_disable() {
    let mut cpu = new_cpu(&[0xEA]);
    assert_eq!(cpu.irq(), 0);
    assert_eq!(cpu.pc, 0x8000);
    assert_eq!(cpu.sp, 0xFD);

    cpu.status &= !FLAG_INTERRUPT_DISABLE;
    assert_eq!(cpu.irq(), 7);
    assert_eq!(cpu.pc, 0x9000);
    assert_eq!(cpu.bus.mem[0x01FB] & FLAG_BREAK, 0);
}

#[test]
fn rti_restores_status_and_pc() {
    let mut cpu = new_cpu(&[0x58, 0xEA]); // CLI; NOP
    cpu.bus.mem[0x9000] = 0x40; // RTI
    cpu.step().unwrap();
    cpu.status |= FLAG_CARRY;
    cpu.irq();

    assert_eq!(cpu.step().unwrap(), 6);
    assert_eq!(cpu.pc, 0x8001);
    assert_eq!(cpu.status, FLAG_CARRY | FLAG_UNUSED);
}

#[test]
fn adc_sets_carry_and_overflow() {
    let mut cpu = new_cpu(&[
        0xA9, 0x7F, // LDA #$7F
        0x69, 0x01, // ADC #$01
        0x69, 0x80, // ADC #$80
    ]);
    cpu.step().unwrap();
    cpu.step().unwrap();
    assert_eq!(cpu.a, 0x80);
    assert!(cpu.status & FLAG_OVERFLOW != 0);
    assert!(cpu.status & FLAG_CARRY == 0);

    cpu.step().unwrap();
    assert_eq!(cpu.a, 0x00);
    assert!(cpu.status & FLAG_CARRY != 0);
    assert!(cpu.status & FLAG_OVERFLOW != 0);
    assert!(cpu.status & FLAG_ZERO != 0);
}

#[test]
fn sbc_borrows_through_carry() {
    let mut cpu = new_cpu(&[
        0x38, // SEC
        0xA9, 0x05, // LDA #$05
        0xE9, 0x06, // SBC #$06
    ]);
    for _ in 0..3 {
        cpu.step().unwrap();
    }
    assert_eq!(cpu.a, 0xFF);
    assert!(cpu.status & FLAG_CARRY == 0);
    assert!(cpu.status & FLAG_NEGATIVE != 0);
}

#[test]
fn compare_carry_means_no_borrow() {
    let mut cpu = new_cpu(&[
        0xA9, 0x40, // LDA #$40
        0xC9, 0x40, // CMP #$40
        0xC9, 0x41, // CMP #$41
    ]);
    cpu.step().unwrap();
    cpu.step().unwrap();
    assert!(cpu.status & FLAG_CARRY != 0);
    assert!(cpu.status & FLAG_ZERO != 0);

    cpu.step().unwrap();
    assert!(cpu.status & FLAG_CARRY == 0);
    assert!(cpu.status & FLAG_NEGATIVE != 0);
}

#[test]
fn rotate_accumulator_through_carry() {
    let mut cpu = new_cpu(&[
        0x38, // SEC
        0xA9, 0x80, // LDA #$80
        0x2A, // ROL A
        0x6A, // ROR A
    ]);
    for _ in 0..3 {
        cpu.step().unwrap();
    }
    assert_eq!(cpu.a, 0x01);
    assert!(cpu.status & FLAG_CARRY != 0);

    cpu.step().unwrap();
    assert_eq!(cpu.a, 0x80);
    assert!(cpu.status & FLAG_CARRY != 0);
}

#[test]
fn undocumented_lax_and_dcp() {
    let mut cpu = new_cpu(&[
        0xA7, 0x10, // LAX $10
        0xC7, 0x11, // DCP $11
    ]);
    cpu.bus.mem[0x0010] = 0x42;
    cpu.bus.mem[0x0011] = 0x43;

    assert_eq!(cpu.step().unwrap(), 3);
    assert_eq!((cpu.a, cpu.x), (0x42, 0x42));

    assert_eq!(cpu.step().unwrap(), 5);
    assert_eq!(cpu.bus.mem[0x0011], 0x42);
    assert!(cpu.status & FLAG_ZERO != 0);
    assert!(cpu.status & FLAG_CARRY != 0);
}

#[test]
fn illegal_opcode_is_an_error() {
    let mut cpu = new_cpu(&[0xEA, 0x02]);
    cpu.step().unwrap();

    match cpu.step() {
        Err(Error::IllegalOpcode { opcode, pc }) => {
            assert_eq!(opcode, 0x02);
            assert_eq!(pc, 0x8001);
        }
        other => panic!("expected illegal opcode, got {other:?}"),
    }
}

#[test]
fn cycle_counter_accumulates() {
    let mut cpu = new_cpu(&[0xEA, 0xEA, 0xA5, 0x00]);
    assert_eq!(cpu.cycles, 7);
    cpu.step().unwrap();
    cpu.step().unwrap();
    cpu.step().unwrap();
    assert_eq!(cpu.cycles, 7 + 2 + 2 + 3);
}

#[test]
fn trace_line_matches_nestest_layout() {
    let mut cpu = new_cpu(&[0x4C, 0xF5, 0xC5]);
    assert_eq!(
        cpu.trace_line(),
        "8000  4C F5 C5  JMP $C5F5                       A:00 X:00 Y:00 P:24 SP:FD CYC:7"
    );

    let mut cpu = new_cpu(&[0x04, 0xA9]);
    assert!(cpu.trace_line().starts_with("8000  04 A9    *NOP $A9 "));
}
