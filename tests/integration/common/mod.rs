//! Shared test support: assembles valid class-file bytes in memory so
//! extraction tests need no binary fixtures.

#![allow(dead_code)] // not every test binary uses every helper

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Const {
    Utf8(String),
    Class(u16),
    NameAndType(u16, u16),
    FieldRef(u16, u16),
    MethodRef(u16, u16),
    InterfaceMethodRef(u16, u16),
}

struct Member {
    access: u16,
    name_index: u16,
    descriptor_index: u16,
    /// (attribute name index, raw attribute body)
    attributes: Vec<(u16, Vec<u8>)>,
}

/// Assembles a structurally valid class file. Constant-pool entries are
/// interned on demand; the indices it hands out are the ones the
/// emitted pool uses, so tests can reference them from instruction
/// bytes.
pub struct ClassFileBuilder {
    constants: Vec<Const>,
    interned: HashMap<Const, u16>,
    this_class: u16,
    super_class: u16,
    interfaces: Vec<u16>,
    fields: Vec<Member>,
    methods: Vec<Member>,
    class_attributes: Vec<(u16, Vec<u8>)>,
}

impl ClassFileBuilder {
    pub fn new(this_name: &str, super_name: &str) -> Self {
        let mut builder = Self {
            constants: Vec::new(),
            interned: HashMap::new(),
            this_class: 0,
            super_class: 0,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            class_attributes: Vec::new(),
        };
        builder.this_class = builder.class(this_name);
        builder.super_class = builder.class(super_name);
        builder
    }

    fn intern(&mut self, constant: Const) -> u16 {
        if let Some(&index) = self.interned.get(&constant) {
            return index;
        }
        self.constants.push(constant.clone());
        let index = self.constants.len() as u16; // pool indices are 1-based
        self.interned.insert(constant, index);
        index
    }

    pub fn utf8(&mut self, value: &str) -> u16 {
        self.intern(Const::Utf8(value.to_string()))
    }

    pub fn class(&mut self, name: &str) -> u16 {
        let name_index = self.utf8(name);
        self.intern(Const::Class(name_index))
    }

    fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name_index = self.utf8(name);
        let descriptor_index = self.utf8(descriptor);
        self.intern(Const::NameAndType(name_index, descriptor_index))
    }

    pub fn field_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        let class_index = self.class(owner);
        let nat_index = self.name_and_type(name, descriptor);
        self.intern(Const::FieldRef(class_index, nat_index))
    }

    pub fn method_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        let class_index = self.class(owner);
        let nat_index = self.name_and_type(name, descriptor);
        self.intern(Const::MethodRef(class_index, nat_index))
    }

    pub fn interface_method_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        let class_index = self.class(owner);
        let nat_index = self.name_and_type(name, descriptor);
        self.intern(Const::InterfaceMethodRef(class_index, nat_index))
    }

    pub fn add_interface(&mut self, name: &str) {
        let index = self.class(name);
        self.interfaces.push(index);
    }

    pub fn add_field(&mut self, name: &str, descriptor: &str) {
        let name_index = self.utf8(name);
        let descriptor_index = self.utf8(descriptor);
        self.fields.push(Member {
            access: 0x0002, // private
            name_index,
            descriptor_index,
            attributes: Vec::new(),
        });
    }

    pub fn add_field_with_signature(&mut self, name: &str, descriptor: &str, signature: &str) {
        let name_index = self.utf8(name);
        let descriptor_index = self.utf8(descriptor);
        let attr_name = self.utf8("Signature");
        let signature_index = self.utf8(signature);
        self.fields.push(Member {
            access: 0x0002,
            name_index,
            descriptor_index,
            attributes: vec![(attr_name, signature_index.to_be_bytes().to_vec())],
        });
    }

    /// Add a method whose `Code` attribute holds `code` verbatim, with
    /// an optional exception table of `(start, end, handler, catch_type)`
    /// rows.
    pub fn add_method(&mut self, name: &str, descriptor: &str, code: &[u8]) {
        self.add_method_with_exceptions(name, descriptor, code, &[]);
    }

    pub fn add_method_with_exceptions(
        &mut self,
        name: &str,
        descriptor: &str,
        code: &[u8],
        exception_table: &[(u16, u16, u16, u16)],
    ) {
        let name_index = self.utf8(name);
        let descriptor_index = self.utf8(descriptor);
        let attr_name = self.utf8("Code");

        let mut body = Vec::new();
        push_u2(&mut body, 8); // max_stack
        push_u2(&mut body, 8); // max_locals
        push_u4(&mut body, code.len() as u32);
        body.extend_from_slice(code);
        push_u2(&mut body, exception_table.len() as u16);
        for &(start, end, handler, catch_type) in exception_table {
            push_u2(&mut body, start);
            push_u2(&mut body, end);
            push_u2(&mut body, handler);
            push_u2(&mut body, catch_type);
        }
        push_u2(&mut body, 0); // no nested attributes

        self.methods.push(Member {
            access: 0x0001, // public
            name_index,
            descriptor_index,
            attributes: vec![(attr_name, body)],
        });
    }

    /// Add an abstract method (no Code attribute) declaring thrown
    /// exception classes.
    pub fn add_method_throwing(&mut self, name: &str, descriptor: &str, exceptions: &[&str]) {
        let name_index = self.utf8(name);
        let descriptor_index = self.utf8(descriptor);
        let attr_name = self.utf8("Exceptions");

        let indices: Vec<u16> = exceptions.iter().map(|e| self.class(e)).collect();
        let mut body = Vec::new();
        push_u2(&mut body, indices.len() as u16);
        for index in indices {
            push_u2(&mut body, index);
        }

        self.methods.push(Member {
            access: 0x0401, // public abstract
            name_index,
            descriptor_index,
            attributes: vec![(attr_name, body)],
        });
    }

    pub fn set_class_signature(&mut self, signature: &str) {
        let attr_name = self.utf8("Signature");
        let signature_index = self.utf8(signature);
        self.class_attributes
            .push((attr_name, signature_index.to_be_bytes().to_vec()));
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        push_u4(&mut out, 0xCAFE_BABE);
        push_u2(&mut out, 0); // minor
        push_u2(&mut out, 52); // major: Java 8

        push_u2(&mut out, self.constants.len() as u16 + 1);
        for constant in &self.constants {
            match constant {
                Const::Utf8(value) => {
                    out.push(1);
                    push_u2(&mut out, value.len() as u16);
                    out.extend_from_slice(value.as_bytes());
                }
                Const::Class(name_index) => {
                    out.push(7);
                    push_u2(&mut out, *name_index);
                }
                Const::NameAndType(name_index, descriptor_index) => {
                    out.push(12);
                    push_u2(&mut out, *name_index);
                    push_u2(&mut out, *descriptor_index);
                }
                Const::FieldRef(class_index, nat_index) => {
                    out.push(9);
                    push_u2(&mut out, *class_index);
                    push_u2(&mut out, *nat_index);
                }
                Const::MethodRef(class_index, nat_index) => {
                    out.push(10);
                    push_u2(&mut out, *class_index);
                    push_u2(&mut out, *nat_index);
                }
                Const::InterfaceMethodRef(class_index, nat_index) => {
                    out.push(11);
                    push_u2(&mut out, *class_index);
                    push_u2(&mut out, *nat_index);
                }
            }
        }

        push_u2(&mut out, 0x0021); // public super
        push_u2(&mut out, self.this_class);
        push_u2(&mut out, self.super_class);

        push_u2(&mut out, self.interfaces.len() as u16);
        for index in &self.interfaces {
            push_u2(&mut out, *index);
        }

        for members in [&self.fields, &self.methods] {
            push_u2(&mut out, members.len() as u16);
            for member in members.iter() {
                push_u2(&mut out, member.access);
                push_u2(&mut out, member.name_index);
                push_u2(&mut out, member.descriptor_index);
                push_u2(&mut out, member.attributes.len() as u16);
                for (attr_name, body) in &member.attributes {
                    push_u2(&mut out, *attr_name);
                    push_u4(&mut out, body.len() as u32);
                    out.extend_from_slice(body);
                }
            }
        }

        push_u2(&mut out, self.class_attributes.len() as u16);
        for (attr_name, body) in &self.class_attributes {
            push_u2(&mut out, *attr_name);
            push_u4(&mut out, body.len() as u32);
            out.extend_from_slice(body);
        }

        out
    }
}

fn push_u2(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn push_u4(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}

// Instruction assembly helpers

pub fn invokevirtual(index: u16) -> Vec<u8> {
    let mut out = vec![0xb6];
    push_u2(&mut out, index);
    out
}

pub fn invokestatic(index: u16) -> Vec<u8> {
    let mut out = vec![0xb8];
    push_u2(&mut out, index);
    out
}

pub fn invokeinterface(index: u16) -> Vec<u8> {
    let mut out = vec![0xb9];
    push_u2(&mut out, index);
    out.push(1); // count
    out.push(0); // mandatory zero
    out
}

pub fn getfield(index: u16) -> Vec<u8> {
    let mut out = vec![0xb4];
    push_u2(&mut out, index);
    out
}

pub fn putfield(index: u16) -> Vec<u8> {
    let mut out = vec![0xb5];
    push_u2(&mut out, index);
    out
}

pub fn getstatic(index: u16) -> Vec<u8> {
    let mut out = vec![0xb2];
    push_u2(&mut out, index);
    out
}

pub fn new_instance(index: u16) -> Vec<u8> {
    let mut out = vec![0xbb];
    push_u2(&mut out, index);
    out
}

pub fn checkcast(index: u16) -> Vec<u8> {
    let mut out = vec![0xc0];
    push_u2(&mut out, index);
    out
}

pub fn ldc_class(index: u16) -> Vec<u8> {
    assert!(index <= u8::MAX as u16, "ldc index must fit in one byte");
    vec![0x12, index as u8]
}

pub const RETURN: u8 = 0xb1;
pub const ATHROW: u8 = 0xbf;
pub const ACONST_NULL: u8 = 0x01;
pub const POP: u8 = 0x57;
