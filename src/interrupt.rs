/*!
Interrupt controller.

Two interrupt sources are wired in: a 1Hz timer (bit 0) driven off the host's
monotonic clock, and the keyboard (bit 1), which also latches the read byte
into the memory-mapped keyboard cell before raising its IS bit. Masking,
lowest-bit-first servicing, and the atomic save/restore sequence around a
handler are all here rather than scattered through the executor.
*/

use crate::error::CoreError;
use crate::host::Host;
use crate::memory::{Memory, KEYBOARD_BYTE};
use crate::registers::Registers;
use crate::stack;

const TIMER_BIT: u8 = 0;
const KEYBOARD_BIT: u8 = 1;

pub struct InterruptController {
    /// Cleared while a handler runs; prevents a second interrupt from
    /// preempting the first.
    enabled: bool,
    last_tick_second: u64,
}

impl Default for InterruptController {
    fn default() -> Self {
        Self::new()
    }
}

impl InterruptController {
    pub fn new() -> Self {
        Self {
            enabled: true,
            last_tick_second: 0,
        }
    }

    /// Raise the timer bit once per elapsed second of host monotonic time.
    pub fn poll_timer(&mut self, regs: &mut Registers, host: &dyn Host) {
        let now = host.monotonic_seconds();
        let whole_seconds = now.floor() as u64;
        if whole_seconds > self.last_tick_second {
            self.last_tick_second = whole_seconds;
            regs.raise_is_bit(TIMER_BIT);
        }
    }

    /// Latch a waiting keyboard byte into memory and raise the keyboard bit.
    pub fn poll_keyboard(
        &mut self,
        regs: &mut Registers,
        mem: &mut Memory,
        host: &mut dyn Host,
    ) -> Result<(), CoreError> {
        if let Some(byte) = host.poll_keyboard()? {
            mem.write(KEYBOARD_BYTE, byte);
            regs.raise_is_bit(KEYBOARD_BIT);
        }
        Ok(())
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Lowest-numbered bit set in both IM and IS, if interrupts are currently
    /// enabled and any such bit exists.
    pub fn pending(&self, regs: &Registers) -> Option<u8> {
        if !self.enabled {
            return None;
        }
        let masked = regs.im() & regs.is();
        (0..8).find(|bit| masked & (1 << bit) != 0)
    }

    /// Enter the handler for `bit`: disable further servicing, clear the IS
    /// bit, push PC, FL, and R0..R6 (not SP), then jump to the vector.
    pub fn service(&mut self, bit: u8, regs: &mut Registers, mem: &mut Memory) {
        self.enabled = false;
        regs.clear_is_bit(bit);

        let pc = regs.pc;
        stack::push(regs, mem, pc);
        stack::push(regs, mem, regs.fl);
        for i in 0..=6u8 {
            stack::push(regs, mem, regs.get(i));
        }

        regs.pc = mem.vector(bit);
    }

    /// IRET: restore R6..R0, FL, PC in the mirror order of `service`, then
    /// re-enable interrupt servicing.
    pub fn return_from_interrupt(&mut self, regs: &mut Registers, mem: &Memory) {
        for i in (0..=6u8).rev() {
            let value = stack::pop(regs, mem);
            regs.set(i, value);
        }
        regs.fl = stack::pop(regs, mem);
        regs.pc = stack::pop(regs, mem);
        self.enabled = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::FakeHost;

    #[test]
    fn timer_raises_is_bit_once_per_second() {
        let mut ctl = InterruptController::new();
        let mut regs = Registers::new();
        let mut host = FakeHost::default();

        host.clock = 0.5;
        ctl.poll_timer(&mut regs, &host);
        assert_eq!(regs.is() & 0b1, 0);

        host.clock = 1.2;
        ctl.poll_timer(&mut regs, &host);
        assert_eq!(regs.is() & 0b1, 0b1);
    }

    #[test]
    fn keyboard_poll_latches_byte_and_raises_bit() {
        let mut ctl = InterruptController::new();
        let mut regs = Registers::new();
        let mut mem = Memory::new();
        let mut host = FakeHost::default();
        host.keyboard_queue.push_back(b'k');

        ctl.poll_keyboard(&mut regs, &mut mem, &mut host).unwrap();

        assert_eq!(mem.read(KEYBOARD_BYTE), b'k');
        assert_eq!(regs.is() & 0b10, 0b10);
    }

    #[test]
    fn pending_picks_lowest_masked_bit() {
        let ctl = InterruptController::new();
        let mut regs = Registers::new();
        regs.set(crate::registers::IM as u8, 0b0000_0110);
        regs.set_is(0b0000_0110);
        assert_eq!(ctl.pending(&regs), Some(1));
    }

    #[test]
    fn pending_is_none_when_disabled() {
        let mut ctl = InterruptController::new();
        let mut regs = Registers::new();
        regs.set(crate::registers::IM as u8, 0xFF);
        regs.set_is(0xFF);
        ctl.service(0, &mut regs, &mut Memory::new());
        assert_eq!(ctl.pending(&regs), None);
    }

    #[test]
    fn service_and_return_round_trips_registers_pc_and_flags() {
        let mut ctl = InterruptController::new();
        let mut regs = Registers::new();
        let mut mem = Memory::new();

        regs.pc = 0x10;
        regs.fl = 0b101;
        for i in 0..=6u8 {
            regs.set(i, i * 3);
        }
        let sp_before = regs.sp();

        mem.write(0xF8, 0x50);
        regs.set(crate::registers::IM as u8, 0b1);
        regs.raise_is_bit(0);

        let bit = ctl.pending(&regs).unwrap();
        ctl.service(bit, &mut regs, &mut mem);
        assert_eq!(regs.pc, 0x50);
        assert_eq!(regs.is() & 0b1, 0);

        regs.pc = 0x60; // handler runs, moves PC around
        ctl.return_from_interrupt(&mut regs, &mem);

        assert_eq!(regs.pc, 0x10);
        assert_eq!(regs.fl, 0b101);
        assert_eq!(regs.sp(), sp_before);
        for i in 0..=6u8 {
            assert_eq!(regs.get(i), i * 3);
        }
    }

    #[test]
    fn service_does_not_push_stack_pointer_register() {
        let mut ctl = InterruptController::new();
        let mut regs = Registers::new();
        let mut mem = Memory::new();
        regs.set(crate::registers::SP as u8, 0xAB); // SP register value itself, not via set_sp
        let real_sp = regs.sp();

        regs.set(crate::registers::IM as u8, 0b1);
        regs.raise_is_bit(0);
        let bit = ctl.pending(&regs).unwrap();
        ctl.service(bit, &mut regs, &mut mem);

        // PC, FL, and R0..R6 pushed: nine bytes, none of them the SP register.
        assert_eq!(regs.sp(), real_sp.wrapping_sub(9));
    }
}
