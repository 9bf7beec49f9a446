//! A cursor based reader/writer shared by encode and decode.
//!
//! Payload layouts are described once, as a sequence of `serialize*` calls on a
//! [`BinarySerializer`]. The same description writes a packet when the
//! serializer was built with [`BinarySerializer::writer`] and reads it back
//! when it was built with [`BinarySerializer::reader`]:
//!
//! ```rust
//! use oxygen_netcore::protocol::BinarySerializer;
//!
//! let mut port = 19132u16;
//! let mut host = String::from("10.0.0.1");
//!
//! let mut buffer = Vec::new();
//! let mut writer = BinarySerializer::writer(&mut buffer);
//! writer.serialize(&mut port).unwrap();
//! writer.serialize_string(&mut host, 64).unwrap();
//!
//! let (mut port, mut host) = (0u16, String::new());
//! let mut reader = BinarySerializer::reader(&buffer);
//! reader.serialize(&mut port).unwrap();
//! reader.serialize_string(&mut host, 64).unwrap();
//! assert_eq!((port, host.as_str()), (19132, "10.0.0.1"));
//! ```
//!
//! Lengths and element counts are prefixed with the smallest unsigned integer
//! that can hold the declared maximum. On read a declared length is checked
//! against both that maximum and the bytes actually left in the buffer before
//! anything gets allocated.
use byteorder::{ByteOrder, ReadBytesExt};

use crate::error::{ProtocolError, ProtocolResult};
use crate::protocol::Endian;

const TRUNCATED: ProtocolError = ProtocolError::MalformedPacket("buffer ended unexpectedly");

/// A fixed-width value that can go on the wire as is.
pub trait Primitive: Copy {
    fn read_from(source: &mut &[u8]) -> ProtocolResult<Self>;
    fn write_to(self, target: &mut Vec<u8>);
}

macro_rules! impl_primitive {
    ($ty: ty, $size: literal, $read: ident, $write: ident) => {
        impl Primitive for $ty {
            fn read_from(source: &mut &[u8]) -> ProtocolResult<Self> {
                source.$read::<Endian>().map_err(|_| TRUNCATED)
            }

            fn write_to(self, target: &mut Vec<u8>) {
                let mut bytes = [0u8; $size];
                Endian::$write(&mut bytes, self);
                target.extend_from_slice(&bytes);
            }
        }
    };
}

impl_primitive!(u16, 2, read_u16, write_u16);
impl_primitive!(u32, 4, read_u32, write_u32);
impl_primitive!(u64, 8, read_u64, write_u64);
impl_primitive!(i16, 2, read_i16, write_i16);
impl_primitive!(i32, 4, read_i32, write_i32);
impl_primitive!(i64, 8, read_i64, write_i64);

impl Primitive for u8 {
    fn read_from(source: &mut &[u8]) -> ProtocolResult<Self> {
        source.read_u8().map_err(|_| TRUNCATED)
    }

    fn write_to(self, target: &mut Vec<u8>) {
        target.push(self);
    }
}

impl Primitive for i8 {
    fn read_from(source: &mut &[u8]) -> ProtocolResult<Self> {
        source.read_i8().map_err(|_| TRUNCATED)
    }

    fn write_to(self, target: &mut Vec<u8>) {
        target.push(self as u8);
    }
}

impl Primitive for bool {
    fn read_from(source: &mut &[u8]) -> ProtocolResult<Self> {
        match u8::read_from(source)? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(ProtocolError::MalformedPacket("boolean out of range")),
        }
    }

    fn write_to(self, target: &mut Vec<u8>) {
        target.push(self as u8);
    }
}

/// Width of a length or count prefix, picked from the declared maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthPrefix {
    U8,
    U16,
    U32,
    U64,
}

impl LengthPrefix {
    pub fn for_max(max: usize) -> Self {
        let max = max as u64;
        if max <= u8::MAX as u64 {
            LengthPrefix::U8
        } else if max <= u16::MAX as u64 {
            LengthPrefix::U16
        } else if max <= u32::MAX as u64 {
            LengthPrefix::U32
        } else {
            LengthPrefix::U64
        }
    }

    pub fn width(self) -> usize {
        match self {
            LengthPrefix::U8 => 1,
            LengthPrefix::U16 => 2,
            LengthPrefix::U32 => 4,
            LengthPrefix::U64 => 8,
        }
    }
}

enum Mode<'a> {
    Reading { source: &'a [u8], position: usize },
    Writing { target: &'a mut Vec<u8>, start: usize },
}

/// Reads or writes packet fields, depending on how it was constructed.
///
/// A serializer borrows its buffer for one encode or decode call and is used by
/// a single thread, there is no shared state between two serializers.
pub struct BinarySerializer<'a> {
    mode: Mode<'a>,
}

impl<'a> BinarySerializer<'a> {
    /// A serializer that reads fields out of `source`.
    pub fn reader(source: &'a [u8]) -> Self {
        Self {
            mode: Mode::Reading {
                source,
                position: 0,
            },
        }
    }

    /// A serializer that appends fields to `target`.
    pub fn writer(target: &'a mut Vec<u8>) -> Self {
        let start = target.len();
        Self {
            mode: Mode::Writing { target, start },
        }
    }

    pub fn is_reading(&self) -> bool {
        matches!(self.mode, Mode::Reading { .. })
    }

    /// Bytes consumed so far when reading, bytes appended so far when writing.
    pub fn position(&self) -> usize {
        match &self.mode {
            Mode::Reading { position, .. } => *position,
            Mode::Writing { target, start } => target.len() - *start,
        }
    }

    /// Bytes left to read. Always `0` for a writer.
    pub fn remaining(&self) -> usize {
        match &self.mode {
            Mode::Reading { source, position } => source.len() - *position,
            Mode::Writing { .. } => 0,
        }
    }

    /// The unread tail of the buffer. Empty for a writer.
    pub fn remaining_bytes(&self) -> &'a [u8] {
        match &self.mode {
            Mode::Reading { source, position } => {
                let source: &'a [u8] = *source;
                &source[*position..]
            }
            Mode::Writing { .. } => &[],
        }
    }

    /// Reads or writes a fixed-width value.
    pub fn serialize<T: Primitive>(&mut self, value: &mut T) -> ProtocolResult<()> {
        match &mut self.mode {
            Mode::Reading { source, position } => {
                let mut cursor = &source[*position..];
                *value = T::read_from(&mut cursor)?;
                *position = source.len() - cursor.len();
            }
            Mode::Writing { target, .. } => value.write_to(target),
        }
        Ok(())
    }

    /// Reads or writes a length-prefixed UTF-8 string of at most `max_length` bytes.
    pub fn serialize_string(
        &mut self,
        value: &mut String,
        max_length: usize,
    ) -> ProtocolResult<()> {
        if self.is_reading() {
            let length = self.read_length(max_length)?;
            let bytes = self.take(length)?;
            *value = std::str::from_utf8(bytes)
                .map_err(|_| ProtocolError::MalformedPacket("string is not valid utf-8"))?
                .to_owned();
            Ok(())
        } else {
            self.write_length(value.len(), max_length)?;
            self.put(value.as_bytes());
            Ok(())
        }
    }

    /// Reads or writes a length-prefixed raw byte string of at most `max_length` bytes.
    pub fn serialize_bytes(
        &mut self,
        value: &mut Vec<u8>,
        max_length: usize,
    ) -> ProtocolResult<()> {
        if self.is_reading() {
            let length = self.read_length(max_length)?;
            let bytes = self.take(length)?;
            value.clear();
            value.extend_from_slice(bytes);
            Ok(())
        } else {
            self.write_length(value.len(), max_length)?;
            self.put(value.as_slice());
            Ok(())
        }
    }

    /// Reads or writes the element count of `container`.
    ///
    /// When reading, `container` is resized to the declared count with default
    /// elements, which the caller then serializes one by one. Every element
    /// must take at least one byte on the wire, a count larger than the bytes
    /// left is rejected before the container grows.
    pub fn serialize_array_size<T: Default>(
        &mut self,
        container: &mut Vec<T>,
        max_count: usize,
    ) -> ProtocolResult<()> {
        if self.is_reading() {
            let count = self.read_length(max_count)?;
            container.clear();
            container.resize_with(count, T::default);
            Ok(())
        } else {
            self.write_length(container.len(), max_count)
        }
    }

    fn read_length(&mut self, max: usize) -> ProtocolResult<usize> {
        let length = match LengthPrefix::for_max(max) {
            LengthPrefix::U8 => self.read_primitive::<u8>()? as u64,
            LengthPrefix::U16 => self.read_primitive::<u16>()? as u64,
            LengthPrefix::U32 => self.read_primitive::<u32>()? as u64,
            LengthPrefix::U64 => self.read_primitive::<u64>()?,
        };
        if length > max as u64 {
            return Err(ProtocolError::MalformedPacket("declared length exceeds its maximum"));
        }
        if length > self.remaining() as u64 {
            return Err(ProtocolError::MalformedPacket("declared length exceeds the buffer"));
        }
        Ok(length as usize)
    }

    fn write_length(&mut self, length: usize, max: usize) -> ProtocolResult<()> {
        if length > max {
            return Err(ProtocolError::LengthExceeded { length, max });
        }
        match LengthPrefix::for_max(max) {
            LengthPrefix::U8 => self.serialize(&mut (length as u8)),
            LengthPrefix::U16 => self.serialize(&mut (length as u16)),
            LengthPrefix::U32 => self.serialize(&mut (length as u32)),
            LengthPrefix::U64 => self.serialize(&mut (length as u64)),
        }
    }

    fn read_primitive<T: Primitive + Default>(&mut self) -> ProtocolResult<T> {
        let mut value = T::default();
        self.serialize(&mut value)?;
        Ok(value)
    }

    fn take(&mut self, length: usize) -> ProtocolResult<&'a [u8]> {
        match &mut self.mode {
            Mode::Reading { source, position } => {
                let source: &'a [u8] = *source;
                let end = position.checked_add(length).ok_or(TRUNCATED)?;
                let bytes = source.get(*position..end).ok_or(TRUNCATED)?;
                *position = end;
                Ok(bytes)
            }
            Mode::Writing { .. } => Ok(&[]),
        }
    }

    fn put(&mut self, bytes: &[u8]) {
        if let Mode::Writing { target, .. } = &mut self.mode {
            target.extend_from_slice(bytes);
        }
    }
}
