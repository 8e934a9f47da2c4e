//! Bytecode reference extraction.
//!
//! Walks every structural element of a class file that can reference
//! another symbol — the declared supertype and interfaces, field and
//! method declarations and their descriptors, generic signatures,
//! declared exceptions, and every instruction of every method body —
//! and folds each reference site into an [`IndexValue`] attributed to
//! the scanned class. Reference sites are not deduplicated: calling the
//! same method ten times yields a count of 10.
//!
//! Malformed bytecode is fatal for the file: on any error no value is
//! produced, so a truncated scan can never pollute the index.

mod classfile;
mod descriptor;
mod opcodes;

use crate::cancel::{CancelToken, Cancelled};
use crate::index::{IndexValue, SymbolKey};
use classfile::{ConstantPool, Reader};
use thiserror::Error;
use tracing::trace;

/// Fatal per-file extraction failure. The in-progress value is
/// discarded; retry policy is the host's decision.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("unexpected end of class file")]
    UnexpectedEof,
    #[error("invalid class file magic header")]
    InvalidMagic,
    #[error("unsupported constant pool tag {tag}")]
    UnsupportedConstant { tag: u8 },
    #[error("invalid constant pool index {index}")]
    InvalidConstantIndex { index: u16 },
    #[error("invalid UTF-8 string in constant pool: {0}")]
    Utf8Decode(#[from] std::string::FromUtf8Error),
    #[error("malformed descriptor: {0}")]
    InvalidDescriptor(String),
    #[error("unknown opcode 0x{opcode:02x} at code offset {offset}")]
    UnknownOpcode { opcode: u8, offset: usize },
    #[error("malformed code attribute at offset {offset}")]
    MalformedCode { offset: usize },
    #[error("extraction cancelled")]
    Cancelled(#[from] Cancelled),
}

/// Extract all symbol references from one class file, attributing them
/// to the class's own internal name.
pub fn extract(bytes: &[u8], cancel: &CancelToken) -> Result<IndexValue, ExtractError> {
    run(bytes, None, cancel)
}

/// Extract all symbol references from one class file, attributing them
/// to a caller-supplied location instead of the class's own name.
pub fn extract_at(
    bytes: &[u8],
    location: &str,
    cancel: &CancelToken,
) -> Result<IndexValue, ExtractError> {
    run(bytes, Some(location), cancel)
}

fn run(
    bytes: &[u8],
    location_override: Option<&str>,
    cancel: &CancelToken,
) -> Result<IndexValue, ExtractError> {
    let mut reader = Reader::new(bytes);
    reader.expect_magic()?;
    let _minor_version = reader.read_u2()?;
    let _major_version = reader.read_u2()?;
    let pool = ConstantPool::parse(&mut reader)?;

    let _access_flags = reader.read_u2()?;
    let this_class = reader.read_u2()?;
    let this_name = pool.class_name(this_class)?;
    let location = location_override.unwrap_or(this_name);

    let mut value = IndexValue::new();

    let super_class = reader.read_u2()?;
    if super_class != 0 {
        let name = pool.class_name(super_class)?;
        value.record(SymbolKey::class_ref(name), location);
    }

    let interfaces_count = reader.read_u2()?;
    for _ in 0..interfaces_count {
        let name = pool.class_name(reader.read_u2()?)?;
        value.record(SymbolKey::class_ref(name), location);
    }

    let fields_count = reader.read_u2()?;
    for _ in 0..fields_count {
        cancel.check()?;
        scan_member(&mut reader, &pool, &mut value, location, false)?;
    }

    let methods_count = reader.read_u2()?;
    for _ in 0..methods_count {
        cancel.check()?;
        scan_member(&mut reader, &pool, &mut value, location, true)?;
    }

    // Class-level attributes: only Signature carries type references
    // this extractor indexes
    let attributes_count = reader.read_u2()?;
    for _ in 0..attributes_count {
        scan_attribute(&mut reader, &pool, &mut value, location, false)?;
    }

    trace!(
        location,
        keys = value.len(),
        sites = value.total_sites(),
        "extracted class file"
    );

    Ok(value)
}

/// Scan one field or method declaration and its attributes.
fn scan_member(
    reader: &mut Reader<'_>,
    pool: &ConstantPool,
    value: &mut IndexValue,
    location: &str,
    is_method: bool,
) -> Result<(), ExtractError> {
    let _access_flags = reader.read_u2()?;
    let _name_index = reader.read_u2()?;
    let descriptor_index = reader.read_u2()?;

    let descriptor = pool.utf8(descriptor_index)?;
    for name in descriptor::class_names(descriptor)? {
        value.record(SymbolKey::class_ref(name), location);
    }

    let attributes_count = reader.read_u2()?;
    for _ in 0..attributes_count {
        scan_attribute(reader, pool, value, location, is_method)?;
    }
    Ok(())
}

/// Scan one attribute. `Signature` and (for methods) `Code` and
/// `Exceptions` contribute references; everything else is skipped.
fn scan_attribute(
    reader: &mut Reader<'_>,
    pool: &ConstantPool,
    value: &mut IndexValue,
    location: &str,
    is_method: bool,
) -> Result<(), ExtractError> {
    let name_index = reader.read_u2()?;
    let length = reader.read_u4()? as usize;
    let name = pool.utf8(name_index)?;

    match name {
        "Signature" => {
            let slice = reader.read_slice(length)?;
            let mut sub = Reader::new(slice);
            let signature = pool.utf8(sub.read_u2()?)?;
            for class_name in descriptor::class_names(signature)? {
                value.record(SymbolKey::class_ref(class_name), location);
            }
        }
        "Exceptions" if is_method => {
            let slice = reader.read_slice(length)?;
            let mut sub = Reader::new(slice);
            let count = sub.read_u2()?;
            for _ in 0..count {
                let class_name = pool.class_name(sub.read_u2()?)?;
                value.record(SymbolKey::class_ref(class_name), location);
            }
        }
        "Code" if is_method => {
            let slice = reader.read_slice(length)?;
            let mut sub = Reader::new(slice);
            scan_code(&mut sub, pool, value, location)?;
        }
        _ => reader.skip(length)?,
    }
    Ok(())
}

/// Scan a `Code` attribute body: instructions and the exception table.
fn scan_code(
    reader: &mut Reader<'_>,
    pool: &ConstantPool,
    value: &mut IndexValue,
    location: &str,
) -> Result<(), ExtractError> {
    let _max_stack = reader.read_u2()?;
    let _max_locals = reader.read_u2()?;
    let code_length = reader.read_u4()? as usize;
    let code = reader.read_slice(code_length)?;
    opcodes::walk_code(code, pool, value, location)?;

    let exception_table_length = reader.read_u2()?;
    for _ in 0..exception_table_length {
        let _start_pc = reader.read_u2()?;
        let _end_pc = reader.read_u2()?;
        let _handler_pc = reader.read_u2()?;
        let catch_type = reader.read_u2()?;
        // catch_type 0 is the catch-all handler for finally blocks
        if catch_type != 0 {
            let class_name = pool.class_name(catch_type)?;
            value.record(SymbolKey::class_ref(class_name), location);
        }
    }

    // Nested attributes (LineNumberTable etc.) carry no symbols we index
    let attributes_count = reader.read_u2()?;
    for _ in 0..attributes_count {
        let _name_index = reader.read_u2()?;
        let length = reader.read_u4()? as usize;
        reader.skip(length)?;
    }
    Ok(())
}
