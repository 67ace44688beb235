use proptest::prelude::*;
use protosol_compiler::{
    gen_enum::verify_enum_ordinals,
    types::{EnumSchema, EnumValue, FieldSchema, FieldType, FileSchema, MessageSchema, ScalarKind},
    verifier::{verify_schema, RESERVED_IDENTIFIERS},
    SchemaError,
};

fn file_with(message: MessageSchema) -> FileSchema {
    let mut file = FileSchema::new("props.proto");
    file.messages.push(message);
    file
}

fn message_numbered(numbers: &[i32]) -> MessageSchema {
    let fields = numbers
        .iter()
        .enumerate()
        .map(|(i, number)| FieldSchema::new(&format!("f{}", i), *number, FieldType::Scalar(ScalarKind::Uint64)))
        .collect();
    MessageSchema::new("Numbered", fields)
}

fn arb_element() -> impl Strategy<Value = FieldType> {
    prop_oneof![
        proptest::sample::select(ScalarKind::ALL.to_vec()).prop_map(FieldType::Scalar),
        Just(FieldType::Enum("Color".to_string())),
        Just(FieldType::Message("Other".to_string())),
    ]
}

proptest! {
    #[test]
    fn accepted_messages_are_numbered_densely(numbers in proptest::collection::vec(1i32..8, 1..8)) {
        let result = verify_schema(&file_with(message_numbered(&numbers)));
        let dense = numbers.iter().enumerate().all(|(i, n)| *n == i as i32 + 1);
        if dense {
            prop_assert_eq!(result, Ok(()));
        } else {
            let is_numbering_error = matches!(result, Err(SchemaError::FieldNumberingError { .. }));
            prop_assert!(is_numbering_error);
        }
    }

    #[test]
    fn accepted_enums_have_dense_ordinals(ordinals in proptest::collection::vec(0i32..6, 1..6)) {
        let def = EnumSchema {
            name:   "Props".to_string(),
            values: ordinals
                .iter()
                .enumerate()
                .map(|(i, number)| EnumValue { name: format!("V{}", i), number: *number })
                .collect(),
        };
        let dense = ordinals.iter().enumerate().all(|(i, n)| *n == i as i32);
        match verify_enum_ordinals(&def) {
            Ok(max) => {
                prop_assert!(dense);
                prop_assert_eq!(max as usize, ordinals.len() - 1);
            }
            Err(err) => {
                prop_assert!(!dense);
                let is_sequence_error = matches!(err, SchemaError::EnumOrdinalSequenceError { .. });
                prop_assert!(is_sequence_error);
            }
        }
    }

    #[test]
    fn repeated_fields_follow_packing_rules(ty in arb_element(), packed in any::<bool>()) {
        let field = FieldSchema::new("values", 1, ty.clone()).repeated(packed);
        let result = verify_schema(&file_with(MessageSchema::new("Repeats", vec![field])));

        let numeric_or_enum = ty.is_packable();
        let variable_length = matches!(ty, FieldType::Scalar(ScalarKind::String | ScalarKind::Bytes));
        match (numeric_or_enum, packed) {
            (true, true) => prop_assert_eq!(result, Ok(())),
            (true, false) => {
                let is_required = matches!(result, Err(SchemaError::PackingRequiredError { .. }));
                prop_assert!(is_required);
            }
            (false, true) => {
                let is_forbidden = matches!(result, Err(SchemaError::PackingForbiddenError { .. }));
                prop_assert!(is_forbidden);
            }
            (false, false) if variable_length => {
                let is_unsupported = matches!(result, Err(SchemaError::UnsupportedRepeatedTypeError { .. }));
                prop_assert!(is_unsupported);
            }
            (false, false) => prop_assert_eq!(result, Ok(())),
        }
    }

    #[test]
    fn reserved_identifiers_are_rejected(
        word in proptest::sample::select(RESERVED_IDENTIFIERS.iter().cloned().collect::<Vec<String>>()),
        position in 0usize..3,
    ) {
        let mut message = MessageSchema::new(
            "Holder",
            vec![FieldSchema::new("value", 1, FieldType::Scalar(ScalarKind::Bool))],
        );
        let mut file = FileSchema::new("props.proto");
        match position {
            0 => message.name = word.clone(),
            1 => message.fields[0].name = word.clone(),
            _ => file.enums.push(EnumSchema::new(&word, &["ZERO"])),
        }
        file.messages.push(message);

        prop_assert_eq!(
            verify_schema(&file),
            Err(SchemaError::KeywordCollisionError { identifier: word })
        );
    }
}

#[test]
fn gap_in_field_numbers_is_rejected() {
    assert_eq!(
        verify_schema(&file_with(message_numbered(&[1, 3]))),
        Err(SchemaError::FieldNumberingError {
            message:  "Numbered".to_string(),
            field:    "f1".to_string(),
            expected: 2,
            found:    3,
        })
    );
}
