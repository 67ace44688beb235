//! A Rust mirror of the on-chain protobuf primitive library that generated
//! Solidity decoders call into (`ProtobufLib`). The compiler uses the wire
//! type vocabulary from here, and the reference decoder in `protosol` runs
//! decoder plans against these primitives.
//!
//! ```
//! use protosol_wire::*;
//!
//! let mut out = ByteBufferMut::new();
//! out.write_key(3, WireType::LengthDelimited);
//! out.write_length_delimited(&[0x2a, 0x29]);
//!
//! let data = out.data();
//! let mut bb = ByteBuffer::new(&data);
//! assert_eq!(bb.decode_key(), Ok((3, WireType::LengthDelimited)));
//! assert_eq!(bb.decode_packed_repeated(), Ok(2));
//! assert_eq!(bb.decode_uint32(), Ok(42));
//! assert_eq!(bb.decode_uint32(), Ok(41));
//! ```

pub mod bb;
pub mod value;
pub mod wire_type;

pub use bb::*;
pub use value::*;
pub use wire_type::*;
