//! ABI type descriptors.
//!
//! A [`TypeSpec`] describes the encoded layout of a value stored in a box.
//! Only statically sized types can live in fixed-size slots; dynamic types
//! are representable so that a descriptor can be parsed and rejected with a
//! useful error instead of silently mis-sizing a slot.
//!
//! The textual form follows the usual ABI grammar:
//! `bool`, `byte`, `uint64`, `address`, `string`, `T[N]`, `T[]`, `(T1,T2,...)`.

use crate::address::Address;
use crate::error::TypesError;
use std::fmt;
use std::str::FromStr;

/// Deepest tuple or array nesting accepted in a type string.
pub const MAX_NESTING: usize = 32;

/// Static or dynamic ABI type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeSpec {
    Bool,
    Byte,
    /// Unsigned integer of the given bit width (multiple of 8, 8..=512).
    Uint(u16),
    Address,
    String,
    StaticArray(Box<TypeSpec>, usize),
    DynamicArray(Box<TypeSpec>),
    Tuple(Vec<TypeSpec>),
}

impl TypeSpec {
    /// Create a width-checked `uintN`.
    pub fn uint(bits: u16) -> Result<Self, TypesError> {
        if bits == 0 || bits % 8 != 0 || bits > 512 {
            return Err(TypesError::InvalidUintWidth(bits));
        }
        Ok(TypeSpec::Uint(bits))
    }

    /// `byte[N]`
    pub fn static_bytes(n: usize) -> Self {
        TypeSpec::StaticArray(Box::new(TypeSpec::Byte), n)
    }

    /// Whether the encoded length depends on the value.
    pub fn is_dynamic(&self) -> bool {
        match self {
            TypeSpec::String | TypeSpec::DynamicArray(_) => true,
            TypeSpec::StaticArray(elem, _) => elem.is_dynamic(),
            TypeSpec::Tuple(elems) => elems.iter().any(TypeSpec::is_dynamic),
            _ => false,
        }
    }

    /// Encoded size in bytes.
    ///
    /// Consecutive `bool` members of a tuple, and the members of a `bool[N]`,
    /// are bit-packed eight to a byte.
    pub fn byte_len(&self) -> Result<usize, TypesError> {
        match self {
            TypeSpec::Bool | TypeSpec::Byte => Ok(1),
            TypeSpec::Uint(bits) => Ok(*bits as usize / 8),
            TypeSpec::Address => Ok(Address::LEN),
            TypeSpec::String | TypeSpec::DynamicArray(_) => {
                Err(TypesError::DynamicType(self.to_string()))
            }
            TypeSpec::StaticArray(elem, n) => {
                if **elem == TypeSpec::Bool {
                    return Ok(n.div_ceil(8));
                }
                elem.byte_len()?
                    .checked_mul(*n)
                    .ok_or(TypesError::SizeOverflow)
            }
            TypeSpec::Tuple(elems) => {
                let mut total = 0usize;
                let mut i = 0;
                while i < elems.len() {
                    let size = if elems[i] == TypeSpec::Bool {
                        let run = elems[i..].iter().take_while(|t| **t == TypeSpec::Bool).count();
                        i += run;
                        run.div_ceil(8)
                    } else {
                        let size = elems[i].byte_len()?;
                        i += 1;
                        size
                    };
                    total = total.checked_add(size).ok_or(TypesError::SizeOverflow)?;
                }
                Ok(total)
            }
        }
    }
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSpec::Bool => write!(f, "bool"),
            TypeSpec::Byte => write!(f, "byte"),
            TypeSpec::Uint(bits) => write!(f, "uint{}", bits),
            TypeSpec::Address => write!(f, "address"),
            TypeSpec::String => write!(f, "string"),
            TypeSpec::StaticArray(elem, n) => write!(f, "{}[{}]", elem, n),
            TypeSpec::DynamicArray(elem) => write!(f, "{}[]", elem),
            TypeSpec::Tuple(elems) => {
                write!(f, "(")?;
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", elem)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl FromStr for TypeSpec {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = Parser {
            src: s.trim().as_bytes(),
            pos: 0,
            depth: 0,
            text: s,
        };
        let spec = parser.parse_type()?;
        if parser.pos != parser.src.len() {
            return Err(parser.error());
        }
        Ok(spec)
    }
}

struct Parser<'a> {
    src: &'a [u8],
    pos: usize,
    depth: usize,
    text: &'a str,
}

impl<'a> Parser<'a> {
    fn error(&self) -> TypesError {
        TypesError::InvalidTypeString(format!("{} (at offset {})", self.text, self.pos))
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ') | Some(b'\t')) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, byte: u8) -> Result<(), TypesError> {
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error())
        }
    }

    fn nest(&mut self) -> Result<(), TypesError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(TypesError::InvalidTypeString(format!(
                "{} (nested deeper than {})",
                self.text, MAX_NESTING
            )));
        }
        Ok(())
    }

    fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a [u8] {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
        &self.src[start..self.pos]
    }

    fn parse_type(&mut self) -> Result<TypeSpec, TypesError> {
        let depth = self.depth;
        let mut spec = if self.peek() == Some(b'(') {
            self.parse_tuple()?
        } else {
            self.parse_base()?
        };

        // Array suffixes bind left to right: uint64[2][3] is an array of 3 uint64[2].
        while self.peek() == Some(b'[') {
            self.nest()?;
            self.pos += 1;
            let digits = self.take_while(|b| b.is_ascii_digit());
            if digits.is_empty() {
                self.expect(b']')?;
                spec = TypeSpec::DynamicArray(Box::new(spec));
            } else {
                let n = std::str::from_utf8(digits)
                    .ok()
                    .and_then(|d| d.parse::<usize>().ok())
                    .ok_or_else(|| self.error())?;
                self.expect(b']')?;
                spec = TypeSpec::StaticArray(Box::new(spec), n);
            }
        }
        self.depth = depth;
        Ok(spec)
    }

    fn parse_tuple(&mut self) -> Result<TypeSpec, TypesError> {
        self.expect(b'(')?;
        self.nest()?;
        let mut elems = Vec::new();
        self.skip_ws();
        if self.peek() == Some(b')') {
            self.pos += 1;
            return Ok(TypeSpec::Tuple(elems));
        }
        loop {
            self.skip_ws();
            elems.push(self.parse_type()?);
            self.skip_ws();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b')') => {
                    self.pos += 1;
                    return Ok(TypeSpec::Tuple(elems));
                }
                _ => return Err(self.error()),
            }
        }
    }

    fn parse_base(&mut self) -> Result<TypeSpec, TypesError> {
        let ident = self.take_while(|b| b.is_ascii_alphanumeric());
        match ident {
            b"bool" => Ok(TypeSpec::Bool),
            b"byte" => Ok(TypeSpec::Byte),
            b"address" => Ok(TypeSpec::Address),
            b"string" => Ok(TypeSpec::String),
            _ => {
                let width = ident
                    .strip_prefix(b"uint")
                    .and_then(|w| std::str::from_utf8(w).ok())
                    .and_then(|w| w.parse::<u16>().ok())
                    .ok_or_else(|| self.error())?;
                TypeSpec::uint(width)
            }
        }
    }
}
