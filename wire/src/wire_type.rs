use std::fmt;

/// Largest field number a protobuf key can carry (2^29 - 1).
pub const MAX_FIELD_NUMBER: u64 = (1 << 29) - 1;

/// Protobuf wire types, in the order of their numeric tag.
///
/// The variant names match the `ProtobufLib.WireType` enum that generated
/// Solidity code refers to, so `Display` renders exactly the member name used
/// in emitted `check_key` comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WireType {
    Varint          = 0,
    Bits64          = 1,
    LengthDelimited = 2,
    StartGroup      = 3,
    EndGroup        = 4,
    Bits32          = 5,
}

impl WireType {
    /// Map the low three bits of a key to a wire type. Tags 6 and 7 are invalid.
    pub fn from_tag(tag: u64) -> Option<WireType> {
        match tag {
            0 => Some(WireType::Varint),
            1 => Some(WireType::Bits64),
            2 => Some(WireType::LengthDelimited),
            3 => Some(WireType::StartGroup),
            4 => Some(WireType::EndGroup),
            5 => Some(WireType::Bits32),
            _ => None,
        }
    }

    pub fn tag(self) -> u64 {
        self as u64
    }

    pub fn name(self) -> &'static str {
        match self {
            WireType::Varint          => "Varint",
            WireType::Bits64          => "Bits64",
            WireType::LengthDelimited => "LengthDelimited",
            WireType::StartGroup      => "StartGroup",
            WireType::EndGroup        => "EndGroup",
            WireType::Bits32          => "Bits32",
        }
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[test]
fn wire_type_tags() {
    for tag in 0..6 {
        assert_eq!(WireType::from_tag(tag).map(WireType::tag), Some(tag));
    }
    assert_eq!(WireType::from_tag(6), None);
    assert_eq!(WireType::from_tag(7), None);
    assert_eq!(WireType::LengthDelimited.to_string(), "LengthDelimited");
}
