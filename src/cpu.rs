/*!
Instruction executor and run loop.

`Cpu` owns memory, the register file, and the interrupt controller, and is
the only thing that knows how an opcode byte turns into register and memory
effects.
*/

use log::{debug, error, trace};

use crate::alu::{self, AluOp};
use crate::error::CoreError;
use crate::host::Host;
use crate::interrupt::InterruptController;
use crate::memory::Memory;
use crate::opcode::{self, byte};
use crate::registers::Registers;
use crate::stack;

pub struct Cpu {
    pub memory: Memory,
    pub regs: Registers,
    interrupts: InterruptController,
}

impl Cpu {
    pub fn new(memory: Memory) -> Self {
        Self {
            memory,
            regs: Registers::new(),
            interrupts: InterruptController::new(),
        }
    }

    /// Run until HLT or a fatal error, logging the outcome either way.
    pub fn run(&mut self, host: &mut dyn Host) -> Result<(), CoreError> {
        loop {
            match self.step(host) {
                Ok(true) => {
                    debug!("halted at pc={:#04x}", self.regs.pc);
                    return Ok(());
                }
                Ok(false) => {}
                Err(e) => {
                    error!("{e}");
                    return Err(e);
                }
            }
        }
    }

    /// Execute one run-loop iteration. Returns `Ok(true)` if the machine
    /// halted.
    pub fn step(&mut self, host: &mut dyn Host) -> Result<bool, CoreError> {
        self.interrupts
            .poll_keyboard(&mut self.regs, &mut self.memory, host)?;

        if self.interrupts.is_enabled() {
            self.interrupts.poll_timer(&mut self.regs, host);
            if let Some(bit) = self.interrupts.pending(&self.regs) {
                debug!("servicing interrupt bit {bit}");
                self.interrupts.service(bit, &mut self.regs, &mut self.memory);
            }
        }

        let pc = self.regs.pc;
        let op = self.memory.read(pc);
        let info = opcode::info(op).ok_or(CoreError::InvalidInstruction { pc, opcode: op })?;
        trace!("pc={:#04x} op={} ({:#04x})", pc, info.mnemonic, op);

        let halted = self.dispatch(op, pc, host).map_err(|reason| CoreError::AluFault { pc, reason })?;

        if !opcode::sets_pc(op) {
            self.regs.pc = pc.wrapping_add(1 + info.operand_count);
        }

        Ok(halted)
    }

    fn operand(&self, pc: u8, n: u8) -> u8 {
        self.memory.read(pc.wrapping_add(1).wrapping_add(n))
    }

    /// Run the handler for `op` fetched at `pc`. Returns `Ok(true)` only for
    /// HLT. ALU faults are the only error a handler can raise.
    fn dispatch(&mut self, op: u8, pc: u8, host: &mut dyn Host) -> Result<bool, crate::error::AluFault> {
        match op {
            byte::NOP => {}
            byte::HLT => return Ok(true),
            byte::RET => {
                self.regs.pc = stack::pop(&mut self.regs, &self.memory);
            }
            byte::IRET => {
                self.interrupts.return_from_interrupt(&mut self.regs, &self.memory);
            }
            byte::PUSH => {
                let r = self.operand(pc, 0);
                let v = self.regs.get(r);
                stack::push(&mut self.regs, &mut self.memory, v);
            }
            byte::POP => {
                let r = self.operand(pc, 0);
                let v = stack::pop(&mut self.regs, &self.memory);
                self.regs.set(r, v);
            }
            byte::PRN => {
                let r = self.operand(pc, 0);
                let text = format!("{}\n", self.regs.get(r));
                host.write_bytes(text.as_bytes());
            }
            byte::PRA => {
                let r = self.operand(pc, 0);
                host.write_bytes(&[self.regs.get(r)]);
            }
            byte::CALL => {
                let r = self.operand(pc, 0);
                let target = self.regs.get(r);
                let return_pc = pc.wrapping_add(2);
                stack::push(&mut self.regs, &mut self.memory, return_pc);
                self.regs.pc = target;
            }
            byte::INT => {
                let r = self.operand(pc, 0);
                let bit = self.regs.get(r) & 0x07;
                self.regs.raise_is_bit(bit);
                self.regs.pc = pc.wrapping_add(2);
            }
            byte::JMP => {
                let r = self.operand(pc, 0);
                self.regs.pc = self.regs.get(r);
            }
            byte::JEQ => {
                let taken = self.regs.flag(crate::registers::FLAG_EQUAL);
                self.conditional_jump(pc, taken);
            }
            byte::JNE => {
                let taken = !self.regs.flag(crate::registers::FLAG_EQUAL);
                self.conditional_jump(pc, taken);
            }
            byte::JGT => {
                let taken = self.regs.flag(crate::registers::FLAG_GREATER);
                self.conditional_jump(pc, taken);
            }
            byte::JLT => {
                let taken = self.regs.flag(crate::registers::FLAG_LESS);
                self.conditional_jump(pc, taken);
            }
            byte::JLE => {
                let taken = self.regs.flag(crate::registers::FLAG_LESS)
                    || self.regs.flag(crate::registers::FLAG_EQUAL);
                self.conditional_jump(pc, taken);
            }
            byte::JGE => {
                let taken = self.regs.flag(crate::registers::FLAG_GREATER)
                    || self.regs.flag(crate::registers::FLAG_EQUAL);
                self.conditional_jump(pc, taken);
            }
            byte::INC => {
                let r = self.operand(pc, 0);
                alu::apply(&mut self.regs, AluOp::Inc, r, r)?;
            }
            byte::DEC => {
                let r = self.operand(pc, 0);
                alu::apply(&mut self.regs, AluOp::Dec, r, r)?;
            }
            byte::NOT => {
                let r = self.operand(pc, 0);
                alu::apply(&mut self.regs, AluOp::Not, r, r)?;
            }
            byte::LDI => {
                let r = self.operand(pc, 0);
                let imm = self.operand(pc, 1);
                self.regs.set(r, imm);
            }
            byte::LD => {
                let a = self.operand(pc, 0);
                let b = self.operand(pc, 1);
                let addr = self.regs.get(b);
                let value = self.memory.read(addr);
                self.regs.set(a, value);
            }
            byte::ST => {
                let a = self.operand(pc, 0);
                let b = self.operand(pc, 1);
                let addr = self.regs.get(a);
                let value = self.regs.get(b);
                self.memory.write(addr, value);
            }
            byte::ADD => self.alu2(pc, AluOp::Add)?,
            byte::SUB => self.alu2(pc, AluOp::Sub)?,
            byte::MUL => self.alu2(pc, AluOp::Mul)?,
            byte::DIV => self.alu2(pc, AluOp::Div)?,
            byte::MOD => self.alu2(pc, AluOp::Mod)?,
            byte::CMP => self.alu2(pc, AluOp::Cmp)?,
            byte::AND => self.alu2(pc, AluOp::And)?,
            byte::OR => self.alu2(pc, AluOp::Or)?,
            byte::XOR => self.alu2(pc, AluOp::Xor)?,
            byte::SHL => self.alu2(pc, AluOp::Shl)?,
            byte::SHR => self.alu2(pc, AluOp::Shr)?,
            _ => unreachable!("opcode {op:#04x} passed decode but has no handler"),
        }
        Ok(false)
    }

    fn conditional_jump(&mut self, pc: u8, taken: bool) {
        let r = self.operand(pc, 0);
        self.regs.pc = if taken {
            self.regs.get(r)
        } else {
            pc.wrapping_add(2)
        };
    }

    fn alu2(&mut self, pc: u8, op: AluOp) -> Result<(), crate::error::AluFault> {
        let a = self.operand(pc, 0);
        let b = self.operand(pc, 1);
        alu::apply(&mut self.regs, op, a, b)
    }
}
