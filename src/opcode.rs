/*!
Opcode encoding and the instruction metadata table.

Every opcode byte is laid out `AABCDDDD`: the top two bits count trailing
operand bytes, bit 5 marks an ALU instruction, bit 4 marks an instruction
that sets the program counter itself (so the executor must not also apply
its default advance), and the low nibble is the instruction id.
*/

/// Decoded shape of an opcode byte, independent of what the instruction does.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OpInfo {
    pub mnemonic: &'static str,
    pub operand_count: u8,
    pub is_alu: bool,
    pub sets_pc: bool,
}

#[inline]
pub fn operand_count(opcode: u8) -> u8 {
    (opcode >> 6) & 0b11
}

#[inline]
pub fn is_alu(opcode: u8) -> bool {
    (opcode >> 5) & 1 != 0
}

#[inline]
pub fn sets_pc(opcode: u8) -> bool {
    (opcode >> 4) & 1 != 0
}

pub mod byte {
    pub const NOP: u8 = 0b0000_0000;
    pub const HLT: u8 = 0b0000_0001;
    pub const RET: u8 = 0b0001_0001;
    pub const IRET: u8 = 0b0001_0011;
    pub const PUSH: u8 = 0b0100_0101;
    pub const POP: u8 = 0b0100_0110;
    pub const PRN: u8 = 0b0100_0111;
    pub const PRA: u8 = 0b0100_1000;
    pub const CALL: u8 = 0b0101_0000;
    pub const INT: u8 = 0b0101_0010;
    pub const JMP: u8 = 0b0101_0100;
    pub const JEQ: u8 = 0b0101_0101;
    pub const JNE: u8 = 0b0101_0110;
    pub const JGT: u8 = 0b0101_0111;
    pub const JLT: u8 = 0b0101_1000;
    pub const JLE: u8 = 0b0101_1001;
    pub const JGE: u8 = 0b0101_1010;
    pub const INC: u8 = 0b0110_0101;
    pub const DEC: u8 = 0b0110_0110;
    pub const NOT: u8 = 0b0110_1001;
    pub const LDI: u8 = 0b1000_0010;
    pub const LD: u8 = 0b1000_0011;
    pub const ST: u8 = 0b1000_0100;
    pub const ADD: u8 = 0b1010_0000;
    pub const SUB: u8 = 0b1010_0001;
    pub const MUL: u8 = 0b1010_0010;
    pub const DIV: u8 = 0b1010_0011;
    pub const MOD: u8 = 0b1010_0100;
    pub const CMP: u8 = 0b1010_0111;
    pub const AND: u8 = 0b1010_1000;
    pub const OR: u8 = 0b1010_1010;
    pub const XOR: u8 = 0b1010_1011;
    pub const SHL: u8 = 0b1010_1100;
    pub const SHR: u8 = 0b1010_1101;
}

macro_rules! op_table {
    ($($byte:expr => $mnemonic:literal),+ $(,)?) => {
        /// Look up the decoded shape of `opcode`. `None` means the byte
        /// doesn't name a defined instruction.
        pub fn info(opcode: u8) -> Option<OpInfo> {
            match opcode {
                $(
                    $byte => Some(OpInfo {
                        mnemonic: $mnemonic,
                        operand_count: operand_count($byte),
                        is_alu: is_alu($byte),
                        sets_pc: sets_pc($byte),
                    }),
                )+
                _ => None,
            }
        }
    };
}

op_table! {
    byte::NOP => "NOP",
    byte::HLT => "HLT",
    byte::RET => "RET",
    byte::IRET => "IRET",
    byte::PUSH => "PUSH",
    byte::POP => "POP",
    byte::PRN => "PRN",
    byte::PRA => "PRA",
    byte::CALL => "CALL",
    byte::INT => "INT",
    byte::JMP => "JMP",
    byte::JEQ => "JEQ",
    byte::JNE => "JNE",
    byte::JGT => "JGT",
    byte::JLT => "JLT",
    byte::JLE => "JLE",
    byte::JGE => "JGE",
    byte::INC => "INC",
    byte::DEC => "DEC",
    byte::NOT => "NOT",
    byte::LDI => "LDI",
    byte::LD => "LD",
    byte::ST => "ST",
    byte::ADD => "ADD",
    byte::SUB => "SUB",
    byte::MUL => "MUL",
    byte::DIV => "DIV",
    byte::MOD => "MOD",
    byte::CMP => "CMP",
    byte::AND => "AND",
    byte::OR => "OR",
    byte::XOR => "XOR",
    byte::SHL => "SHL",
    byte::SHR => "SHR",
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operand_count_matches_top_two_bits() {
        assert_eq!(operand_count(byte::NOP), 0);
        assert_eq!(operand_count(byte::PRN), 1);
        assert_eq!(operand_count(byte::LDI), 2);
    }

    #[test]
    fn alu_flag_is_set_only_on_alu_instructions() {
        assert!(is_alu(byte::ADD));
        assert!(is_alu(byte::CMP));
        assert!(!is_alu(byte::PRN));
        assert!(!is_alu(byte::JMP));
    }

    #[test]
    fn sets_pc_flag_marks_control_flow_instructions() {
        assert!(sets_pc(byte::JMP));
        assert!(sets_pc(byte::CALL));
        assert!(sets_pc(byte::RET));
        assert!(!sets_pc(byte::LDI));
    }

    #[test]
    fn info_is_none_for_unassigned_bytes() {
        assert!(info(0b1111_1111).is_none());
    }

    #[test]
    fn info_operand_count_agrees_with_decoded_bits() {
        for b in 0u8..=255 {
            if let Some(op) = info(b) {
                assert_eq!(op.operand_count, operand_count(b), "mismatch for {}", op.mnemonic);
                assert_eq!(op.is_alu, is_alu(b));
                assert_eq!(op.sets_pc, sets_pc(b));
            }
        }
    }
}
