//! Minimal class-file assembler for building test classpaths.
#![allow(dead_code)]

use std::collections::HashMap;

pub const ACC_PUBLIC: u16 = 0x0001;
pub const ACC_PRIVATE: u16 = 0x0002;
pub const ACC_STATIC: u16 = 0x0008;
pub const ACC_INTERFACE: u16 = 0x0200;
pub const ACC_ABSTRACT: u16 = 0x0400;
pub const ACC_SYNTHETIC: u16 = 0x1000;

pub const ACONST_NULL: u8 = 0x01;
pub const ICONST_0: u8 = 0x03;
pub const ILOAD_1: u8 = 0x1b;
pub const ALOAD_0: u8 = 0x2a;
pub const ALOAD_1: u8 = 0x2b;
pub const POP: u8 = 0x57;
pub const DUP: u8 = 0x59;
pub const IRETURN: u8 = 0xac;
pub const ARETURN: u8 = 0xb0;
pub const RETURN: u8 = 0xb1;
pub const ATHROW: u8 = 0xbf;
pub const IFNONNULL: u8 = 0xc7;

#[derive(Clone, PartialEq, Eq, Hash)]
enum Entry {
    Utf8(String),
    Class(u16),
    Str(u16),
    NameAndType(u16, u16),
    FieldRef(u16, u16),
    MethodRef(u16, u16),
    InterfaceMethodRef(u16, u16),
}

#[derive(Default)]
pub struct Pool {
    entries: Vec<Entry>,
    index: HashMap<Entry, u16>,
}

impl Pool {
    fn add(&mut self, entry: Entry) -> u16 {
        if let Some(&i) = self.index.get(&entry) {
            return i;
        }
        self.entries.push(entry.clone());
        let i = self.entries.len() as u16;
        self.index.insert(entry, i);
        i
    }

    pub fn utf8(&mut self, s: &str) -> u16 {
        self.add(Entry::Utf8(s.to_string()))
    }

    pub fn class(&mut self, name: &str) -> u16 {
        let n = self.utf8(name);
        self.add(Entry::Class(n))
    }

    pub fn string(&mut self, s: &str) -> u16 {
        let n = self.utf8(s);
        self.add(Entry::Str(n))
    }

    fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let n = self.utf8(name);
        let d = self.utf8(descriptor);
        self.add(Entry::NameAndType(n, d))
    }

    pub fn field_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        let c = self.class(owner);
        let nt = self.name_and_type(name, descriptor);
        self.add(Entry::FieldRef(c, nt))
    }

    pub fn method_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        let c = self.class(owner);
        let nt = self.name_and_type(name, descriptor);
        self.add(Entry::MethodRef(c, nt))
    }

    pub fn interface_method_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        let c = self.class(owner);
        let nt = self.name_and_type(name, descriptor);
        self.add(Entry::InterfaceMethodRef(c, nt))
    }

    fn write(&self, out: &mut Vec<u8>) {
        put_u2(out, self.entries.len() as u16 + 1);
        for entry in &self.entries {
            match entry {
                Entry::Utf8(s) => {
                    out.push(1);
                    put_u2(out, s.len() as u16);
                    out.extend_from_slice(s.as_bytes());
                }
                Entry::Class(n) => {
                    out.push(7);
                    put_u2(out, *n);
                }
                Entry::Str(n) => {
                    out.push(8);
                    put_u2(out, *n);
                }
                Entry::NameAndType(n, d) => {
                    out.push(12);
                    put_u2(out, *n);
                    put_u2(out, *d);
                }
                Entry::FieldRef(c, nt) => {
                    out.push(9);
                    put_u2(out, *c);
                    put_u2(out, *nt);
                }
                Entry::MethodRef(c, nt) => {
                    out.push(10);
                    put_u2(out, *c);
                    put_u2(out, *nt);
                }
                Entry::InterfaceMethodRef(c, nt) => {
                    out.push(11);
                    put_u2(out, *c);
                    put_u2(out, *nt);
                }
            }
        }
    }
}

/// Instruction stream of one method body.
pub struct Code<'p> {
    pool: &'p mut Pool,
    bytes: Vec<u8>,
    catch_types: Vec<u16>,
}

impl Code<'_> {
    pub fn op(&mut self, opcode: u8) -> &mut Self {
        self.bytes.push(opcode);
        self
    }

    pub fn branch(&mut self, opcode: u8, offset: i16) -> &mut Self {
        self.bytes.push(opcode);
        self.bytes.extend_from_slice(&offset.to_be_bytes());
        self
    }

    fn indexed(&mut self, opcode: u8, index: u16) -> &mut Self {
        self.bytes.push(opcode);
        put_u2(&mut self.bytes, index);
        self
    }

    pub fn getfield(&mut self, owner: &str, name: &str, descriptor: &str) -> &mut Self {
        let i = self.pool.field_ref(owner, name, descriptor);
        self.indexed(0xb4, i)
    }

    pub fn putfield(&mut self, owner: &str, name: &str, descriptor: &str) -> &mut Self {
        let i = self.pool.field_ref(owner, name, descriptor);
        self.indexed(0xb5, i)
    }

    pub fn getstatic(&mut self, owner: &str, name: &str, descriptor: &str) -> &mut Self {
        let i = self.pool.field_ref(owner, name, descriptor);
        self.indexed(0xb2, i)
    }

    pub fn invokevirtual(&mut self, owner: &str, name: &str, descriptor: &str) -> &mut Self {
        let i = self.pool.method_ref(owner, name, descriptor);
        self.indexed(0xb6, i)
    }

    pub fn invokespecial(&mut self, owner: &str, name: &str, descriptor: &str) -> &mut Self {
        let i = self.pool.method_ref(owner, name, descriptor);
        self.indexed(0xb7, i)
    }

    pub fn invokestatic(&mut self, owner: &str, name: &str, descriptor: &str) -> &mut Self {
        let i = self.pool.method_ref(owner, name, descriptor);
        self.indexed(0xb8, i)
    }

    pub fn invokeinterface(&mut self, owner: &str, name: &str, descriptor: &str, args: u8) -> &mut Self {
        let i = self.pool.interface_method_ref(owner, name, descriptor);
        self.indexed(0xb9, i);
        self.bytes.extend_from_slice(&[args, 0]);
        self
    }

    pub fn new_object(&mut self, class: &str) -> &mut Self {
        let i = self.pool.class(class);
        self.indexed(0xbb, i)
    }

    pub fn checkcast(&mut self, class: &str) -> &mut Self {
        let i = self.pool.class(class);
        self.indexed(0xc0, i)
    }

    pub fn ldc_class(&mut self, class: &str) -> &mut Self {
        let i = self.pool.class(class);
        self.indexed(0x13, i)
    }

    pub fn ldc_string(&mut self, value: &str) -> &mut Self {
        let i = self.pool.string(value);
        self.indexed(0x13, i)
    }

    /// Exception handler covering the whole body.
    pub fn catches(&mut self, class: &str) -> &mut Self {
        let i = self.pool.class(class);
        self.catch_types.push(i);
        self
    }
}

pub struct ClassWriter {
    pool: Pool,
    access: u16,
    this_class: u16,
    super_class: u16,
    interfaces: Vec<u16>,
    fields: Vec<Vec<u8>>,
    methods: Vec<Vec<u8>>,
    attributes: Vec<Vec<u8>>,
}

impl ClassWriter {
    /// Public class extending `java/lang/Object`.
    pub fn class(name: &str) -> Self {
        Self::with_access(name, ACC_PUBLIC, Some("java/lang/Object"))
    }

    /// Public interface; interfaces name `java/lang/Object` as superclass.
    pub fn interface(name: &str) -> Self {
        Self::with_access(name, ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT, Some("java/lang/Object"))
    }

    pub fn with_access(name: &str, access: u16, super_class: Option<&str>) -> Self {
        let mut pool = Pool::default();
        let this_class = pool.class(name);
        let super_class = super_class.map(|s| pool.class(s)).unwrap_or(0);
        Self {
            pool,
            access,
            this_class,
            super_class,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
        }
    }

    pub fn extends(mut self, super_class: &str) -> Self {
        self.super_class = self.pool.class(super_class);
        self
    }

    pub fn implements(mut self, interface: &str) -> Self {
        let i = self.pool.class(interface);
        self.interfaces.push(i);
        self
    }

    pub fn signature(mut self, signature: &str) -> Self {
        let attr = self.signature_attribute(signature);
        self.attributes.push(attr);
        self
    }

    pub fn field(self, name: &str, descriptor: &str) -> Self {
        self.field_full(ACC_PRIVATE, name, descriptor, None)
    }

    pub fn static_field(self, name: &str, descriptor: &str) -> Self {
        self.field_full(ACC_PRIVATE | ACC_STATIC, name, descriptor, None)
    }

    pub fn generic_field(self, name: &str, descriptor: &str, signature: &str) -> Self {
        self.field_full(ACC_PRIVATE, name, descriptor, Some(signature))
    }

    pub fn field_full(mut self, access: u16, name: &str, descriptor: &str, signature: Option<&str>) -> Self {
        let mut out = Vec::new();
        put_u2(&mut out, access);
        put_u2(&mut out, self.pool.utf8(name));
        put_u2(&mut out, self.pool.utf8(descriptor));
        let attrs: Vec<Vec<u8>> = signature
            .map(|s| self.signature_attribute(s))
            .into_iter()
            .collect();
        put_attributes(&mut out, &attrs);
        self.fields.push(out);
        self
    }

    /// Public concrete method.
    pub fn method<F>(self, name: &str, descriptor: &str, body: F) -> Self
    where
        F: FnOnce(&mut Code<'_>),
    {
        self.method_full(ACC_PUBLIC, name, descriptor, &[], Some(body))
    }

    pub fn static_method<F>(self, name: &str, descriptor: &str, body: F) -> Self
    where
        F: FnOnce(&mut Code<'_>),
    {
        self.method_full(ACC_PUBLIC | ACC_STATIC, name, descriptor, &[], Some(body))
    }

    pub fn abstract_method(self, name: &str, descriptor: &str, throws: &[&str]) -> Self {
        self.method_full::<fn(&mut Code<'_>)>(ACC_PUBLIC | ACC_ABSTRACT, name, descriptor, throws, None)
    }

    /// `aload_0; getfield <this>.field; <ret>`
    pub fn getter(self, name: &str, descriptor: &str, owner: &str, field: &str, ret: u8) -> Self {
        let field_descriptor = descriptor.trim_start_matches("()").to_string();
        self.method(name, descriptor, |c| {
            c.op(ALOAD_0).getfield(owner, field, &field_descriptor).op(ret);
        })
    }

    pub fn method_full<F>(
        mut self,
        access: u16,
        name: &str,
        descriptor: &str,
        throws: &[&str],
        body: Option<F>,
    ) -> Self
    where
        F: FnOnce(&mut Code<'_>),
    {
        let mut out = Vec::new();
        put_u2(&mut out, access);
        put_u2(&mut out, self.pool.utf8(name));
        put_u2(&mut out, self.pool.utf8(descriptor));

        let mut attrs = Vec::new();
        if let Some(body) = body {
            let mut code = Code {
                pool: &mut self.pool,
                bytes: Vec::new(),
                catch_types: Vec::new(),
            };
            body(&mut code);
            let Code { bytes, catch_types, .. } = code;

            let mut attr = Vec::new();
            put_u2(&mut attr, 8);
            put_u2(&mut attr, 8);
            put_u4(&mut attr, bytes.len() as u32);
            attr.extend_from_slice(&bytes);
            put_u2(&mut attr, catch_types.len() as u16);
            for catch_type in catch_types {
                put_u2(&mut attr, 0);
                put_u2(&mut attr, bytes.len() as u16);
                put_u2(&mut attr, 0);
                put_u2(&mut attr, catch_type);
            }
            put_u2(&mut attr, 0);
            attrs.push(self.attribute("Code", &attr));
        }
        if !throws.is_empty() {
            let mut attr = Vec::new();
            put_u2(&mut attr, throws.len() as u16);
            for class in throws {
                put_u2(&mut attr, self.pool.class(class));
            }
            attrs.push(self.attribute("Exceptions", &attr));
        }
        put_attributes(&mut out, &attrs);
        self.methods.push(out);
        self
    }

    fn attribute(&mut self, name: &str, body: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        put_u2(&mut out, self.pool.utf8(name));
        put_u4(&mut out, body.len() as u32);
        out.extend_from_slice(body);
        out
    }

    fn signature_attribute(&mut self, signature: &str) -> Vec<u8> {
        let index = self.pool.utf8(signature);
        self.attribute("Signature", &index.to_be_bytes())
    }

    pub fn build(self) -> Vec<u8> {
        let mut out = Vec::new();
        put_u4(&mut out, 0xCAFE_BABE);
        put_u2(&mut out, 0);
        put_u2(&mut out, 52);
        self.pool.write(&mut out);
        put_u2(&mut out, self.access);
        put_u2(&mut out, self.this_class);
        put_u2(&mut out, self.super_class);
        put_u2(&mut out, self.interfaces.len() as u16);
        for i in &self.interfaces {
            put_u2(&mut out, *i);
        }
        put_u2(&mut out, self.fields.len() as u16);
        for f in &self.fields {
            out.extend_from_slice(f);
        }
        put_u2(&mut out, self.methods.len() as u16);
        for m in &self.methods {
            out.extend_from_slice(m);
        }
        put_attributes(&mut out, &self.attributes);
        out
    }
}

fn put_attributes(out: &mut Vec<u8>, attrs: &[Vec<u8>]) {
    put_u2(out, attrs.len() as u16);
    for attr in attrs {
        out.extend_from_slice(attr);
    }
}

fn put_u2(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn put_u4(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}
