//! Instruction-level walk over a method's `Code` attribute.
//!
//! Every instruction that names a field, method, or type through the
//! constant pool records one reference site. Operand widths must be
//! exact for the walk to stay aligned, including the padded
//! `tableswitch`/`lookupswitch` forms and the `wide` prefix.

use super::classfile::{ConstantPool, Reader};
use super::ExtractError;
use crate::index::{IndexValue, SymbolKey};

// Reference-bearing opcodes
const GETSTATIC: u8 = 0xb2;
const PUTFIELD: u8 = 0xb5;
const INVOKEVIRTUAL: u8 = 0xb6;
const INVOKESTATIC: u8 = 0xb8;
const INVOKEINTERFACE: u8 = 0xb9;
const INVOKEDYNAMIC: u8 = 0xba;
const NEW: u8 = 0xbb;
const ANEWARRAY: u8 = 0xbd;
const CHECKCAST: u8 = 0xc0;
const INSTANCEOF: u8 = 0xc1;
const MULTIANEWARRAY: u8 = 0xc5;
const LDC: u8 = 0x12;
const LDC_W: u8 = 0x13;

const TABLESWITCH: u8 = 0xaa;
const LOOKUPSWITCH: u8 = 0xab;
const WIDE: u8 = 0xc4;
const IINC: u8 = 0x84;

/// Walk the bytecode array of one method, recording a reference site
/// for each instruction that resolves a symbol through `pool`.
pub(crate) fn walk_code(
    code: &[u8],
    pool: &ConstantPool,
    value: &mut IndexValue,
    location: &str,
) -> Result<(), ExtractError> {
    let mut reader = Reader::new(code);

    while !reader.is_at_end() {
        let offset = reader.pos();
        let opcode = reader.read_u1()?;

        match opcode {
            GETSTATIC..=PUTFIELD => {
                let index = reader.read_u2()?;
                let member = pool.member_ref(index)?;
                if !member.is_field {
                    return Err(ExtractError::InvalidConstantIndex { index });
                }
                value.record(
                    SymbolKey::field_ref(member.owner, member.name, member.descriptor),
                    location,
                );
            }
            INVOKEVIRTUAL..=INVOKESTATIC => {
                let index = reader.read_u2()?;
                let member = pool.member_ref(index)?;
                if member.is_field {
                    return Err(ExtractError::InvalidConstantIndex { index });
                }
                value.record(
                    SymbolKey::method_ref(member.owner, member.name, member.descriptor),
                    location,
                );
            }
            INVOKEINTERFACE => {
                let index = reader.read_u2()?;
                let member = pool.member_ref(index)?;
                if member.is_field {
                    return Err(ExtractError::InvalidConstantIndex { index });
                }
                value.record(
                    SymbolKey::method_ref(member.owner, member.name, member.descriptor),
                    location,
                );
                reader.skip(2)?; // count byte + mandatory zero
            }
            INVOKEDYNAMIC => {
                // Names only a bootstrap method, no stable owner to key on
                reader.skip(4)?;
            }
            NEW | ANEWARRAY | CHECKCAST | INSTANCEOF => {
                let name = pool.class_name(reader.read_u2()?)?;
                value.record(SymbolKey::class_ref(name), location);
            }
            MULTIANEWARRAY => {
                let name = pool.class_name(reader.read_u2()?)?;
                value.record(SymbolKey::class_ref(name), location);
                reader.skip(1)?; // dimensions
            }
            LDC => {
                let index = u16::from(reader.read_u1()?);
                record_ldc_class(pool, index, value, location)?;
            }
            LDC_W => {
                let index = reader.read_u2()?;
                record_ldc_class(pool, index, value, location)?;
            }
            TABLESWITCH => {
                skip_switch_padding(&mut reader)?;
                reader.skip(4)?; // default
                let low = reader.read_u4()? as i32;
                let high = reader.read_u4()? as i32;
                if high < low {
                    return Err(ExtractError::MalformedCode { offset });
                }
                let entries = (i64::from(high) - i64::from(low) + 1) as usize;
                reader.skip(entries * 4)?;
            }
            LOOKUPSWITCH => {
                skip_switch_padding(&mut reader)?;
                reader.skip(4)?; // default
                let npairs = reader.read_u4()? as usize;
                reader.skip(npairs * 8)?;
            }
            WIDE => {
                let widened = reader.read_u1()?;
                if widened == IINC {
                    reader.skip(4)?;
                } else {
                    reader.skip(2)?;
                }
            }
            _ => match operand_width(opcode) {
                Some(width) => reader.skip(width)?,
                None => return Err(ExtractError::UnknownOpcode { opcode, offset }),
            },
        }
    }

    Ok(())
}

fn record_ldc_class(
    pool: &ConstantPool,
    index: u16,
    value: &mut IndexValue,
    location: &str,
) -> Result<(), ExtractError> {
    // only Class constants name a symbol, but the index must still
    // resolve to a usable pool slot
    if let Some(name) = pool.class_constant(index)? {
        value.record(SymbolKey::class_ref(name), location);
    }
    Ok(())
}

/// Switch operands are aligned to a 4-byte boundary from the start of
/// the code array.
fn skip_switch_padding(reader: &mut Reader<'_>) -> Result<(), ExtractError> {
    let padding = (4 - reader.pos() % 4) % 4;
    reader.skip(padding)
}

/// Fixed operand width in bytes for opcodes without symbol references.
/// `None` marks opcodes that are unknown or must be handled above.
fn operand_width(opcode: u8) -> Option<usize> {
    match opcode {
        // nop, consts, implicit-index loads/stores, array loads/stores,
        // stack ops, arithmetic, conversions, comparisons, returns,
        // arraylength, athrow, monitorenter/exit
        0x00..=0x0f
        | 0x1a..=0x35
        | 0x3b..=0x83
        | 0x85..=0x98
        | 0xac..=0xb1
        | 0xbe
        | 0xbf
        | 0xc2
        | 0xc3 => Some(0),
        // bipush, iload..aload, istore..astore, ret, newarray
        0x10 | 0x15..=0x19 | 0x36..=0x3a | 0xa9 | 0xbc => Some(1),
        // sipush, ldc2_w, iinc, branches, ifnull/ifnonnull
        0x11 | 0x14 | 0x84 | 0x99..=0xa8 | 0xc6 | 0xc7 => Some(2),
        // goto_w, jsr_w
        0xc8 | 0xc9 => Some(4),
        _ => None,
    }
}
