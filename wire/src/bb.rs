use crate::wire_type::{WireType, MAX_FIELD_NUMBER};

/// Longest canonical varint encoding of a 64-bit value.
pub const MAX_VARINT_BYTES: usize = 10;

/// A protobuf byte buffer meant for reading.
///
/// Every `decode_*` method mirrors the primitive of the same name in the
/// on-chain `ProtobufLib`, including its strictness: non-minimal varints,
/// out-of-range narrow integers and lengths running past the end of the
/// buffer are all rejected. A failed read leaves the index untouched.
///
/// ```
/// let mut bb = protosol_wire::ByteBuffer::new(&[0x08, 0x96, 0x01]);
/// assert_eq!(bb.decode_key(), Ok((1, protosol_wire::WireType::Varint)));
/// assert_eq!(bb.decode_int32(), Ok(150));
/// assert_eq!(bb.index(), 3);
/// ```
pub struct ByteBuffer<'a> {
    data: &'a [u8],
    index: usize,
}

impl<'a> ByteBuffer<'a> {
    /// Create a new ByteBuffer that wraps the provided byte slice.
    pub fn new(data: &'a [u8]) -> ByteBuffer<'a> {
        ByteBuffer { data, index: 0 }
    }

    /// Retrieves the underlying byte slice.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Retrieves the current index into the underlying byte slice.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Moves the read position, e.g. to rewind for a second decoding pass.
    pub fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    /// Try to read `len` raw bytes starting at the current index.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], ()> {
        let end = self.index.checked_add(len).ok_or(())?;
        if end > self.data.len() {
            return Err(());
        }
        let value = &self.data[self.index..end];
        self.index = end;
        Ok(value)
    }

    /// Try to read a canonical base-128 varint.
    pub fn decode_varint(&mut self) -> Result<u64, ()> {
        let mut value: u64 = 0;

        for i in 0..MAX_VARINT_BYTES {
            let byte = *self.data.get(self.index + i).ok_or(())?;
            value |= ((byte & 0x7F) as u64) << (i * 7);

            if byte & 0x80 == 0 {
                // A trailing zero byte means the encoding was not minimal
                if i > 0 && byte == 0 {
                    return Err(());
                }
                // The tenth byte only has room for the top bit of a u64
                if i == MAX_VARINT_BYTES - 1 && byte > 1 {
                    return Err(());
                }
                self.index += i + 1;
                return Ok(value);
            }
        }

        Err(())
    }

    /// Try to read a field key, returning `(field_number, wire_type)`.
    pub fn decode_key(&mut self) -> Result<(u64, WireType), ()> {
        let start = self.index;
        let key = self.decode_varint()?;
        let field_number = key >> 3;
        let wire_type = WireType::from_tag(key & 7);

        match wire_type {
            Some(wire_type) if field_number > 0 && field_number <= MAX_FIELD_NUMBER => {
                Ok((field_number, wire_type))
            }
            _ => {
                self.index = start;
                Err(())
            }
        }
    }

    fn decode_varint_with<T>(&mut self, convert: impl FnOnce(u64) -> Option<T>) -> Result<T, ()> {
        let start = self.index;
        let raw = self.decode_varint()?;
        convert(raw).ok_or_else(|| self.index = start)
    }

    pub fn decode_int32(&mut self) -> Result<i32, ()> {
        self.decode_varint_with(|raw| i32::try_from(raw as i64).ok())
    }

    pub fn decode_int64(&mut self) -> Result<i64, ()> {
        self.decode_varint_with(|raw| Some(raw as i64))
    }

    pub fn decode_uint32(&mut self) -> Result<u32, ()> {
        self.decode_varint_with(|raw| u32::try_from(raw).ok())
    }

    pub fn decode_uint64(&mut self) -> Result<u64, ()> {
        self.decode_varint()
    }

    pub fn decode_sint32(&mut self) -> Result<i32, ()> {
        self.decode_varint_with(|raw| {
            let raw = u32::try_from(raw).ok()?;
            Some(((raw >> 1) as i32) ^ -((raw & 1) as i32))
        })
    }

    pub fn decode_sint64(&mut self) -> Result<i64, ()> {
        self.decode_varint_with(|raw| Some(((raw >> 1) as i64) ^ -((raw & 1) as i64)))
    }

    pub fn decode_bool(&mut self) -> Result<bool, ()> {
        self.decode_varint_with(|raw| match raw {
            0 => Some(false),
            1 => Some(true),
            _ => None,
        })
    }

    /// Enums travel as int32 varints; range checking is the caller's job.
    pub fn decode_enum(&mut self) -> Result<i32, ()> {
        self.decode_int32()
    }

    pub fn decode_fixed32(&mut self) -> Result<u32, ()> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn decode_fixed64(&mut self) -> Result<u64, ()> {
        let bytes = self.read_bytes(8)?;
        let mut word = [0u8; 8];
        word.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(word))
    }

    pub fn decode_sfixed32(&mut self) -> Result<i32, ()> {
        self.decode_fixed32().map(|v| v as i32)
    }

    pub fn decode_sfixed64(&mut self) -> Result<i64, ()> {
        self.decode_fixed64().map(|v| v as i64)
    }

    /// Try to read a length prefix whose payload fits inside the buffer.
    /// Returns the payload length; the index is left at the payload start.
    pub fn decode_length_delimited(&mut self) -> Result<u64, ()> {
        let start = self.index;
        let len = self.decode_varint()?;
        let fits = usize::try_from(len)
            .ok()
            .and_then(|len| self.index.checked_add(len))
            .map_or(false, |end| end <= self.data.len());
        if !fits {
            self.index = start;
            return Err(());
        }
        Ok(len)
    }

    /// Header of an embedded message; identical framing to any length-delimited value.
    pub fn decode_embedded_message(&mut self) -> Result<u64, ()> {
        self.decode_length_delimited()
    }

    /// Header of a packed repeated field; identical framing to any length-delimited value.
    pub fn decode_packed_repeated(&mut self) -> Result<u64, ()> {
        self.decode_length_delimited()
    }
}

/// A protobuf byte buffer meant for writing.
///
/// ```
/// let mut bb = protosol_wire::ByteBufferMut::new();
/// bb.write_key(1, protosol_wire::WireType::Varint);
/// bb.write_varint(150);
/// assert_eq!(bb.data(), [0x08, 0x96, 0x01]);
/// ```
#[derive(Default)]
pub struct ByteBufferMut {
    data: Vec<u8>,
}

impl ByteBufferMut {
    /// Creates an empty ByteBufferMut ready for writing.
    pub fn new() -> ByteBufferMut {
        ByteBufferMut { data: vec![] }
    }

    /// Consumes this buffer and returns the underlying backing store.
    pub fn data(self) -> Vec<u8> {
        self.data
    }

    /// Returns the number of bytes written so far.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Write raw bytes without any framing.
    pub fn write_bytes(&mut self, value: &[u8]) {
        self.data.extend_from_slice(value);
    }

    pub fn write_varint(&mut self, mut value: u64) {
        loop {
            let byte = value as u8 & 0x7F;
            value >>= 7;

            if value == 0 {
                self.data.push(byte);
                return;
            }

            self.data.push(byte | 0x80);
        }
    }

    pub fn write_key(&mut self, field_number: u64, wire_type: WireType) {
        self.write_varint((field_number << 3) | wire_type.tag());
    }

    /// Negative values are sign-extended to ten bytes, as protobuf requires.
    pub fn write_int32(&mut self, value: i32) {
        self.write_varint(value as i64 as u64);
    }

    pub fn write_int64(&mut self, value: i64) {
        self.write_varint(value as u64);
    }

    pub fn write_sint32(&mut self, value: i32) {
        self.write_varint(((value << 1) ^ (value >> 31)) as u32 as u64);
    }

    pub fn write_sint64(&mut self, value: i64) {
        self.write_varint(((value << 1) ^ (value >> 63)) as u64);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.write_varint(value as u64);
    }

    pub fn write_fixed32(&mut self, value: u32) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_fixed64(&mut self, value: u64) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    /// Write a length prefix followed by the payload.
    pub fn write_length_delimited(&mut self, payload: &[u8]) {
        self.write_varint(payload.len() as u64);
        self.data.extend_from_slice(payload);
    }
}

#[test]
fn decode_varint() {
    let read = |bytes| ByteBuffer::new(bytes).decode_varint();
    assert_eq!(read(&[]), Err(()));
    assert_eq!(read(&[0]), Ok(0));
    assert_eq!(read(&[1]), Ok(1));
    assert_eq!(read(&[127]), Ok(127));
    assert_eq!(read(&[128]), Err(()));
    assert_eq!(read(&[128, 1]), Ok(128));
    assert_eq!(read(&[0x96, 0x01]), Ok(150));
    assert_eq!(read(&[255, 255, 255, 255, 15]), Ok(4294967295));
    assert_eq!(
        read(&[255, 255, 255, 255, 255, 255, 255, 255, 255, 1]),
        Ok(u64::MAX)
    );
}

#[test]
fn decode_varint_rejects_non_canonical() {
    let read = |bytes| ByteBuffer::new(bytes).decode_varint();
    // Trailing zero continuation byte
    assert_eq!(read(&[128, 0]), Err(()));
    assert_eq!(read(&[129, 0]), Err(()));
    // Tenth byte larger than one
    assert_eq!(
        read(&[255, 255, 255, 255, 255, 255, 255, 255, 255, 2]),
        Err(())
    );
    // Eleven bytes
    assert_eq!(
        read(&[128, 128, 128, 128, 128, 128, 128, 128, 128, 128, 1]),
        Err(())
    );
}

#[test]
fn decode_key() {
    let read = |bytes| ByteBuffer::new(bytes).decode_key();
    assert_eq!(read(&[0x08]), Ok((1, WireType::Varint)));
    assert_eq!(read(&[0x12]), Ok((2, WireType::LengthDelimited)));
    assert_eq!(read(&[0x1D]), Ok((3, WireType::Bits32)));
    assert_eq!(read(&[0x21]), Ok((4, WireType::Bits64)));
    // Field number zero
    assert_eq!(read(&[0x00]), Err(()));
    // Wire types 6 and 7
    assert_eq!(read(&[0x0E]), Err(()));
    assert_eq!(read(&[0x0F]), Err(()));
    // Field number above 2^29 - 1
    assert_eq!(read(&[0x80, 0x80, 0x80, 0x80, 0x20]), Err(()));
}

#[test]
fn decode_failure_keeps_index() {
    let mut bb = ByteBuffer::new(&[0x80, 0x80, 0x80, 0x80, 0x10]);
    assert_eq!(bb.decode_uint32(), Err(()));
    assert_eq!(bb.index(), 0);
    assert_eq!(bb.decode_key(), Err(()));
    assert_eq!(bb.index(), 0);
}

#[test]
fn decode_narrow_integers() {
    let read32 = |bytes| ByteBuffer::new(bytes).decode_int32();
    assert_eq!(read32(&[0x96, 0x01]), Ok(150));
    assert_eq!(
        read32(&[255, 255, 255, 255, 255, 255, 255, 255, 255, 1]),
        Ok(-1)
    );
    assert_eq!(
        read32(&[128, 128, 128, 128, 248, 255, 255, 255, 255, 1]),
        Ok(i32::MIN)
    );
    // 2^32 - 1 does not fit an int32
    assert_eq!(read32(&[255, 255, 255, 255, 15]), Err(()));

    let readu32 = |bytes| ByteBuffer::new(bytes).decode_uint32();
    assert_eq!(readu32(&[255, 255, 255, 255, 15]), Ok(u32::MAX));
    assert_eq!(readu32(&[128, 128, 128, 128, 16]), Err(()));

    let reads32 = |bytes| ByteBuffer::new(bytes).decode_sint32();
    assert_eq!(reads32(&[0]), Ok(0));
    assert_eq!(reads32(&[1]), Ok(-1));
    assert_eq!(reads32(&[2]), Ok(1));
    assert_eq!(reads32(&[3]), Ok(-2));
    assert_eq!(reads32(&[255, 255, 255, 255, 15]), Ok(i32::MIN));

    let reads64 = |bytes| ByteBuffer::new(bytes).decode_sint64();
    assert_eq!(reads64(&[137, 5]), Ok(-325));

    let readbool = |bytes| ByteBuffer::new(bytes).decode_bool();
    assert_eq!(readbool(&[0]), Ok(false));
    assert_eq!(readbool(&[1]), Ok(true));
    assert_eq!(readbool(&[2]), Err(()));
}

#[test]
fn decode_fixed_width() {
    let mut bb = ByteBuffer::new(&[0x84, 0x03, 0, 0, 0x28, 0x23, 0, 0, 0, 0, 0, 0]);
    assert_eq!(bb.decode_fixed32(), Ok(900));
    assert_eq!(bb.decode_fixed64(), Ok(9000));
    assert_eq!(bb.decode_fixed32(), Err(()));

    let mut bb = ByteBuffer::new(&[0x7C, 0xFC, 0xFF, 0xFF]);
    assert_eq!(bb.decode_sfixed32(), Ok(-900));
}

#[test]
fn decode_length_delimited() {
    let mut bb = ByteBuffer::new(&[3, 1, 2, 3]);
    assert_eq!(bb.decode_length_delimited(), Ok(3));
    assert_eq!(bb.index(), 1);
    assert_eq!(bb.read_bytes(3), Ok(&[1u8, 2, 3][..]));

    let mut bb = ByteBuffer::new(&[4, 1, 2, 3]);
    assert_eq!(bb.decode_length_delimited(), Err(()));
    assert_eq!(bb.index(), 0);
}

#[cfg(test)]
fn write_once(cb: fn(&mut ByteBufferMut)) -> Vec<u8> {
    let mut bb = ByteBufferMut::new();
    cb(&mut bb);
    bb.data()
}

#[test]
fn write_varint() {
    assert_eq!(write_once(|bb| bb.write_varint(0)), [0]);
    assert_eq!(write_once(|bb| bb.write_varint(150)), [0x96, 0x01]);
    assert_eq!(
        write_once(|bb| bb.write_varint(u64::MAX)),
        [255, 255, 255, 255, 255, 255, 255, 255, 255, 1]
    );
}

#[test]
fn write_signed() {
    assert_eq!(
        write_once(|bb| bb.write_int32(-1)),
        [255, 255, 255, 255, 255, 255, 255, 255, 255, 1]
    );
    assert_eq!(write_once(|bb| bb.write_sint32(-1)), [1]);
    assert_eq!(write_once(|bb| bb.write_sint32(1)), [2]);
    assert_eq!(write_once(|bb| bb.write_sint64(-325)), [137, 5]);
    assert_eq!(write_once(|bb| bb.write_int64(-1)), write_once(|bb| bb.write_int32(-1)));
    assert_eq!(write_once(|bb| bb.write_bool(true)), [1]);
    assert_eq!(write_once(|bb| bb.write_fixed32(900)), [0x84, 0x03, 0, 0]);
}

#[test]
fn write_then_read_sequence() {
    let mut out = ByteBufferMut::new();
    out.write_key(1, WireType::Varint);
    out.write_int32(-42);
    out.write_key(2, WireType::LengthDelimited);
    out.write_length_delimited(b"foo");
    out.write_key(3, WireType::Bits64);
    out.write_fixed64(9000);
    let data = out.data();

    let mut bb = ByteBuffer::new(&data);
    assert_eq!(bb.decode_key(), Ok((1, WireType::Varint)));
    assert_eq!(bb.decode_int32(), Ok(-42));
    assert_eq!(bb.decode_key(), Ok((2, WireType::LengthDelimited)));
    assert_eq!(bb.decode_length_delimited(), Ok(3));
    assert_eq!(bb.read_bytes(3), Ok(&b"foo"[..]));
    assert_eq!(bb.decode_key(), Ok((3, WireType::Bits64)));
    assert_eq!(bb.decode_fixed64(), Ok(9000));
    assert_eq!(bb.index(), data.len());
}
