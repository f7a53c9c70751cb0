//! Shared pieces of the `ocp` and `ocp_dump` binaries.

use ocprs::Program;
use std::fs;
use std::path::Path;

pub mod logger;

/// Read a program file, compiled source or serialized bytecode.
/// Bytecode is recognized by its magic number unless `binary` forces it.
pub fn load_program(path: &str, binary: bool) -> Result<Program, String> {
    let data = fs::read(path).map_err(|e| format!("cannot open {path}: {e}"))?;
    if binary || data.starts_with(ocprs::limits::PROGRAM_MAGIC) {
        return ocprs::load(&data).map_err(|e| format!("{path}: {e}"));
    }

    let source = String::from_utf8(data).map_err(|_| format!("{path}: source is not UTF-8"))?;
    ocprs::compile(&source).map_err(|errors| {
        let mut message = String::new();
        for (i, err) in errors.errors().iter().enumerate() {
            if i > 0 {
                message.push('\n');
            }
            message.push_str(&format!("{path}: {err}"));
        }
        message
    })
}

/// Character codes for raw input bytes: UTF-8 when the bytes decode as
/// UTF-8, otherwise one code per byte (ISO-8859-1)
pub fn decode_input(bytes: &[u8]) -> Vec<u32> {
    match std::str::from_utf8(bytes) {
        Ok(text) => ocprs::to_codes(text),
        Err(_) => bytes.iter().map(|&b| b as u32).collect(),
    }
}

/// `<program>.ocp` next to the source
pub fn default_output_path(program_path: &str) -> String {
    Path::new(program_path)
        .with_extension("ocp")
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_input() {
        assert_eq!(decode_input("aé\n".as_bytes()), vec![0x61, 0xE9, 0x0A]);
        assert_eq!(decode_input(b"a\xe9\n"), vec![0x61, 0xE9, 0x0A]);
        assert_eq!(decode_input(b""), Vec::<u32>::new());
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(default_output_path("rules/greek.otp"), "rules/greek.ocp");
        assert_eq!(default_output_path("plain"), "plain.ocp");
    }
}
