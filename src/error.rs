/*!
Error types for the LS-8 core and its host-facing glue.
*/

use thiserror::Error;

/// Fatal conditions the instruction executor can raise. Every variant aborts
/// the run loop; there is no in-machine exception mechanism.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid instruction: opcode {opcode:#04x} at pc {pc:#04x}")]
    InvalidInstruction { pc: u8, opcode: u8 },

    #[error("ALU fault at pc {pc:#04x}: {reason}")]
    AluFault { pc: u8, reason: AluFault },

    #[error("host I/O error: {0}")]
    HostIo(String),
}

/// Why an ALU operation failed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluFault {
    #[error("division by zero")]
    DivideByZero,
    #[error("unsupported ALU operation")]
    UnsupportedOp,
}

/// Errors from parsing a program image.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("line {line}: non-binary character in opcode column: {text:?}")]
    NonBinaryLine { line: usize, text: String },

    #[error("line {line}: line shorter than 8 columns: {text:?}")]
    ShortLine { line: usize, text: String },

    #[error("program exceeds 256 bytes of memory")]
    ProgramTooLarge,
}
