/*!
Program loader.

Reads a text file of ASCII 0/1 lines into a `Memory` image. `#`-prefixed and
blank lines are skipped; otherwise the first eight characters of a line are
binary digits for one byte, and anything past the eighth column is treated
as a trailing comment.
*/

use crate::error::LoadError;
use crate::memory::Memory;

/// Parse `text` into a fresh `Memory` image, one byte per non-comment,
/// non-blank line, starting at address 0x00.
pub fn load(text: &str) -> Result<Memory, LoadError> {
    let mut mem = Memory::new();
    let mut addr: usize = 0;

    for (line_no, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim_end();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.len() < 8 {
            return Err(LoadError::ShortLine {
                line: line_no + 1,
                text: line.to_string(),
            });
        }

        let bits = &line[..8];
        let mut byte = 0u8;
        for c in bits.chars() {
            byte <<= 1;
            match c {
                '0' => {}
                '1' => byte |= 1,
                _ => {
                    return Err(LoadError::NonBinaryLine {
                        line: line_no + 1,
                        text: bits.to_string(),
                    });
                }
            }
        }

        if addr >= crate::memory::SIZE {
            return Err(LoadError::ProgramTooLarge);
        }
        mem.write(addr as u8, byte);
        addr += 1;
    }

    Ok(mem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_contiguous_binary_lines() {
        let text = "10000010\n00000000\n00001000\n";
        let mem = load(text).unwrap();
        assert_eq!(mem.read(0), 0b1000_0010);
        assert_eq!(mem.read(1), 0b0000_0000);
        assert_eq!(mem.read(2), 0b0000_1000);
    }

    #[test]
    fn skips_comment_and_blank_lines() {
        let text = "# a header comment\n10000010\n\n# another\n00000001\n";
        let mem = load(text).unwrap();
        assert_eq!(mem.read(0), 0b1000_0010);
        assert_eq!(mem.read(1), 0b0000_0001);
    }

    #[test]
    fn ignores_trailing_comment_text_on_a_line() {
        let text = "10000010 # LDI R0, imm\n";
        let mem = load(text).unwrap();
        assert_eq!(mem.read(0), 0b1000_0010);
    }

    #[test]
    fn rejects_non_binary_characters() {
        let text = "1000X010\n";
        let err = load(text).unwrap_err();
        assert!(matches!(err, LoadError::NonBinaryLine { line: 1, .. }));
    }

    #[test]
    fn rejects_short_lines() {
        let text = "1010\n";
        let err = load(text).unwrap_err();
        assert!(matches!(err, LoadError::ShortLine { line: 1, .. }));
    }

    #[test]
    fn rejects_programs_over_256_bytes() {
        let mut text = String::new();
        for _ in 0..257 {
            text.push_str("00000000\n");
        }
        let err = load(&text).unwrap_err();
        assert_eq!(err, LoadError::ProgramTooLarge);
    }
}
