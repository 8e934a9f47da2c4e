//! Low-level class-file reading: bounds-checked big-endian cursor and
//! the constant pool.

use super::ExtractError;

/// Bounds-checked cursor over class-file bytes. All multi-byte reads
/// are big-endian, per the class-file format.
pub(crate) struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current offset from the start of the underlying slice.
    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub(crate) fn expect_magic(&mut self) -> Result<(), ExtractError> {
        const MAGIC: u32 = 0xCAFE_BABE;
        if self.read_u4()? != MAGIC {
            return Err(ExtractError::InvalidMagic);
        }
        Ok(())
    }

    pub(crate) fn read_u1(&mut self) -> Result<u8, ExtractError> {
        if self.pos >= self.data.len() {
            return Err(ExtractError::UnexpectedEof);
        }
        let value = self.data[self.pos];
        self.pos += 1;
        Ok(value)
    }

    pub(crate) fn read_u2(&mut self) -> Result<u16, ExtractError> {
        if self.pos + 2 > self.data.len() {
            return Err(ExtractError::UnexpectedEof);
        }
        let value = u16::from_be_bytes([self.data[self.pos], self.data[self.pos + 1]]);
        self.pos += 2;
        Ok(value)
    }

    pub(crate) fn read_u4(&mut self) -> Result<u32, ExtractError> {
        if self.pos + 4 > self.data.len() {
            return Err(ExtractError::UnexpectedEof);
        }
        let value = u32::from_be_bytes([
            self.data[self.pos],
            self.data[self.pos + 1],
            self.data[self.pos + 2],
            self.data[self.pos + 3],
        ]);
        self.pos += 4;
        Ok(value)
    }

    pub(crate) fn read_slice(&mut self, len: usize) -> Result<&'a [u8], ExtractError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or(ExtractError::UnexpectedEof)?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub(crate) fn skip(&mut self, len: usize) -> Result<(), ExtractError> {
        self.read_slice(len)?;
        Ok(())
    }
}

/// A parsed constant-pool entry. Only the shapes the extractor reads
/// back are retained; everything else collapses to `Other`.
#[derive(Debug, Clone)]
pub(crate) enum Constant {
    Utf8(String),
    Class {
        name_index: u16,
    },
    FieldRef {
        class_index: u16,
        name_and_type_index: u16,
    },
    MethodRef {
        class_index: u16,
        name_and_type_index: u16,
    },
    InterfaceMethodRef {
        class_index: u16,
        name_and_type_index: u16,
    },
    NameAndType {
        name_index: u16,
        descriptor_index: u16,
    },
    Other,
    /// Index 0 and the phantom slot after a long/double entry.
    Unusable,
}

/// A field or method reference resolved out of the constant pool.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MemberRef<'a> {
    pub owner: &'a str,
    pub name: &'a str,
    pub descriptor: &'a str,
    pub is_field: bool,
}

pub(crate) struct ConstantPool {
    entries: Vec<Constant>,
}

impl ConstantPool {
    pub(crate) fn parse(reader: &mut Reader<'_>) -> Result<Self, ExtractError> {
        let count = reader.read_u2()? as usize;
        let mut entries = Vec::with_capacity(count);
        entries.push(Constant::Unusable); // index 0 unused

        let mut index = 1;
        while index < count {
            let tag = reader.read_u1()?;
            let entry = match tag {
                1 => {
                    let length = reader.read_u2()? as usize;
                    let bytes = reader.read_slice(length)?;
                    Constant::Utf8(String::from_utf8(bytes.to_vec())?)
                }
                3 | 4 => {
                    // Integer, Float
                    reader.skip(4)?;
                    Constant::Other
                }
                5 | 6 => {
                    // Long, Double occupy two slots
                    reader.skip(8)?;
                    entries.push(Constant::Other);
                    index += 1;
                    Constant::Unusable
                }
                7 => Constant::Class {
                    name_index: reader.read_u2()?,
                },
                8 => {
                    // String
                    reader.skip(2)?;
                    Constant::Other
                }
                9 => Constant::FieldRef {
                    class_index: reader.read_u2()?,
                    name_and_type_index: reader.read_u2()?,
                },
                10 => Constant::MethodRef {
                    class_index: reader.read_u2()?,
                    name_and_type_index: reader.read_u2()?,
                },
                11 => Constant::InterfaceMethodRef {
                    class_index: reader.read_u2()?,
                    name_and_type_index: reader.read_u2()?,
                },
                12 => Constant::NameAndType {
                    name_index: reader.read_u2()?,
                    descriptor_index: reader.read_u2()?,
                },
                15 => {
                    // MethodHandle
                    reader.skip(3)?;
                    Constant::Other
                }
                16 => {
                    // MethodType
                    reader.skip(2)?;
                    Constant::Other
                }
                17 | 18 => {
                    // Dynamic, InvokeDynamic
                    reader.skip(4)?;
                    Constant::Other
                }
                19 | 20 => {
                    // Module, Package
                    reader.skip(2)?;
                    Constant::Other
                }
                other => return Err(ExtractError::UnsupportedConstant { tag: other }),
            };

            entries.push(entry);
            index += 1;
        }

        Ok(Self { entries })
    }

    fn get(&self, index: u16) -> Result<&Constant, ExtractError> {
        match self.entries.get(index as usize) {
            Some(Constant::Unusable) | None => {
                Err(ExtractError::InvalidConstantIndex { index })
            }
            Some(entry) => Ok(entry),
        }
    }

    pub(crate) fn utf8(&self, index: u16) -> Result<&str, ExtractError> {
        match self.get(index)? {
            Constant::Utf8(value) => Ok(value.as_str()),
            _ => Err(ExtractError::InvalidConstantIndex { index }),
        }
    }

    /// Internal name behind a Class constant.
    pub(crate) fn class_name(&self, index: u16) -> Result<&str, ExtractError> {
        match self.get(index)? {
            Constant::Class { name_index } => self.utf8(*name_index),
            _ => Err(ExtractError::InvalidConstantIndex { index }),
        }
    }

    /// Internal name behind the entry at `index` if it is a Class
    /// constant, `None` for any other valid constant (for `ldc`, which
    /// also loads ints, floats, strings, and method handles). An
    /// out-of-range or unusable slot is still an error.
    pub(crate) fn class_constant(&self, index: u16) -> Result<Option<&str>, ExtractError> {
        match self.get(index)? {
            Constant::Class { name_index } => Ok(Some(self.utf8(*name_index)?)),
            _ => Ok(None),
        }
    }

    /// Resolve a Fieldref, Methodref, or InterfaceMethodref entry.
    pub(crate) fn member_ref(&self, index: u16) -> Result<MemberRef<'_>, ExtractError> {
        let (class_index, name_and_type_index, is_field) = match self.get(index)? {
            Constant::FieldRef {
                class_index,
                name_and_type_index,
            } => (*class_index, *name_and_type_index, true),
            Constant::MethodRef {
                class_index,
                name_and_type_index,
            }
            | Constant::InterfaceMethodRef {
                class_index,
                name_and_type_index,
            } => (*class_index, *name_and_type_index, false),
            _ => return Err(ExtractError::InvalidConstantIndex { index }),
        };

        let (name_index, descriptor_index) = match self.get(name_and_type_index)? {
            Constant::NameAndType {
                name_index,
                descriptor_index,
            } => (*name_index, *descriptor_index),
            _ => {
                return Err(ExtractError::InvalidConstantIndex {
                    index: name_and_type_index,
                })
            }
        };

        Ok(MemberRef {
            owner: self.class_name(class_index)?,
            name: self.utf8(name_index)?,
            descriptor: self.utf8(descriptor_index)?,
            is_field,
        })
    }
}
