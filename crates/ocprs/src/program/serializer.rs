// Program serializer/deserializer
// Custom little-endian binary format for compiled transliteration programs

use super::{Program, RuleBlock, State, StateId};
use crate::Instruction;
use crate::limits::{PROGRAM_MAGIC, PROGRAM_VERSION};
use smol_str::SmolStr;
use std::io::{Cursor, Read};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("not a compiled OCP program")]
    BadMagic,
    #[error("unsupported program version: {0}")]
    UnsupportedVersion(u8),
    #[error("truncated program data")]
    Truncated,
    #[error("malformed program: {0}")]
    Malformed(String),
    #[error("state {state}, rule {rule}: {reason}")]
    InvalidBlock {
        state: usize,
        rule: usize,
        reason: String,
    },
}

/// Serialize a Program to binary format
pub(crate) fn serialize_program(program: &Program) -> Vec<u8> {
    let mut buf = Vec::new();

    // Write header
    buf.extend_from_slice(PROGRAM_MAGIC);
    buf.push(PROGRAM_VERSION);
    write_u32(&mut buf, program.entry.0);

    // Write table pool
    write_u32(&mut buf, program.tables.len() as u32);
    for table in &program.tables {
        write_u32(&mut buf, table.len() as u32);
        for &value in table {
            write_u32(&mut buf, value);
        }
    }

    // Write states
    write_u32(&mut buf, program.states.len() as u32);
    for state in &program.states {
        write_string(&mut buf, &state.name);
        write_u32(&mut buf, state.rules.len() as u32);
        for rule in &state.rules {
            write_u32(&mut buf, rule.line);
            write_u32(&mut buf, rule.code.len() as u32);
            for instr in &rule.code {
                write_u32(&mut buf, instr.as_u32());
            }
        }
    }

    buf
}

/// Deserialize binary data to a verified Program
pub fn load(data: &[u8]) -> Result<Program, LoadError> {
    let mut cursor = Cursor::new(data);

    // Verify magic number
    let mut magic = [0u8; 4];
    cursor
        .read_exact(&mut magic)
        .map_err(|_| LoadError::BadMagic)?;
    if &magic[..] != PROGRAM_MAGIC {
        return Err(LoadError::BadMagic);
    }

    let version = read_u8(&mut cursor)?;
    if version != PROGRAM_VERSION {
        return Err(LoadError::UnsupportedVersion(version));
    }

    let entry = StateId(read_u32(&mut cursor)?);

    let table_count = read_len(&mut cursor)?;
    let mut tables = Vec::with_capacity(table_count);
    for _ in 0..table_count {
        let len = read_len(&mut cursor)?;
        let mut table = Vec::with_capacity(len);
        for _ in 0..len {
            table.push(read_u32(&mut cursor)?);
        }
        tables.push(table);
    }

    let state_count = read_len(&mut cursor)?;
    let mut states = Vec::with_capacity(state_count);
    for _ in 0..state_count {
        let name = read_string(&mut cursor)?;
        let rule_count = read_len(&mut cursor)?;
        let mut rules = Vec::with_capacity(rule_count);
        for _ in 0..rule_count {
            let line = read_u32(&mut cursor)?;
            let code_len = read_len(&mut cursor)?;
            let mut code = Vec::with_capacity(code_len);
            for _ in 0..code_len {
                code.push(Instruction::from_u32(read_u32(&mut cursor)?));
            }
            rules.push(RuleBlock { line, code });
        }
        states.push(State { name, rules });
    }

    if cursor.position() as usize != data.len() {
        return Err(LoadError::Malformed("trailing bytes after program".to_string()));
    }
    let program = validate(Program::from_parts(states, tables, entry))?;

    log::debug!(
        "loaded program: {} states, {} rules, {} tables",
        program.states.len(),
        program.rule_count(),
        program.tables.len()
    );
    Ok(program)
}

/// Reject programs a machine could not run safely
pub(crate) fn validate(program: Program) -> Result<Program, LoadError> {
    if program.states.is_empty() {
        return Err(LoadError::Malformed("program has no states".to_string()));
    }
    program
        .verify()
        .map_err(|(state, rule, defect)| LoadError::InvalidBlock {
            state,
            rule,
            reason: defect.to_string(),
        })?;
    Ok(program)
}

// Helper functions for writing

fn write_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn write_string(buf: &mut Vec<u8>, s: &str) {
    write_u32(buf, s.len() as u32);
    buf.extend_from_slice(s.as_bytes());
}

// Helper functions for reading

fn read_u8(cursor: &mut Cursor<&[u8]>) -> Result<u8, LoadError> {
    let mut buf = [0u8; 1];
    cursor
        .read_exact(&mut buf)
        .map_err(|_| LoadError::Truncated)?;
    Ok(buf[0])
}

fn read_u32(cursor: &mut Cursor<&[u8]>) -> Result<u32, LoadError> {
    let mut buf = [0u8; 4];
    cursor
        .read_exact(&mut buf)
        .map_err(|_| LoadError::Truncated)?;
    Ok(u32::from_le_bytes(buf))
}

/// Length prefix, bounded by the bytes that are actually left
fn read_len(cursor: &mut Cursor<&[u8]>) -> Result<usize, LoadError> {
    let len = read_u32(cursor)? as usize;
    let remaining = cursor.get_ref().len() - cursor.position() as usize;
    if len > remaining {
        return Err(LoadError::Truncated);
    }
    Ok(len)
}

fn read_string(cursor: &mut Cursor<&[u8]>) -> Result<SmolStr, LoadError> {
    let len = read_len(cursor)?;
    let mut buf = vec![0u8; len];
    cursor
        .read_exact(&mut buf)
        .map_err(|_| LoadError::Truncated)?;
    String::from_utf8(buf)
        .map(SmolStr::from)
        .map_err(|e| LoadError::Malformed(format!("invalid state name: {e}")))
}
