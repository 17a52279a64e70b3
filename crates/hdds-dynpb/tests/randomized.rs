// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Seeded randomized tests.
//!
//! Random messages must survive a round trip, and random byte strings must
//! never make the decoder panic.

use hdds_dynpb::{
    build_file, marshal, new_message, unmarshal, CodecOptions, DynamicMessage, EnumSchemaBuilder,
    FieldType, FileSchemaBuilder, Kind, MapKey, MessageDescriptor, MessageSchemaBuilder, Value,
};

const ITERATIONS: usize = 500;

fn schema() -> MessageDescriptor {
    let schema = FileSchemaBuilder::new("random.proto", "random")
        .message(
            MessageSchemaBuilder::new("Record")
                .field("i32", 1, FieldType::Int32)
                .field("i64", 2, FieldType::Int64)
                .field("u32", 3, FieldType::Uint32)
                .field("u64", 4, FieldType::Uint64)
                .field("s32", 5, FieldType::Sint32)
                .field("s64", 6, FieldType::Sint64)
                .field("f32", 7, FieldType::Fixed32)
                .field("f64", 8, FieldType::Fixed64)
                .field("sf32", 9, FieldType::Sfixed32)
                .field("sf64", 10, FieldType::Sfixed64)
                .field("flag", 11, FieldType::Bool)
                .field("real", 12, FieldType::Double)
                .field("ratio", 13, FieldType::Float)
                .string_field("text", 14)
                .field("blob", 15, FieldType::Bytes)
                .enum_field("state", 16, "State")
                .message_field("child", 17, "Record")
                .repeated_field("samples", 18, FieldType::Sint64)
                .repeated_field("names", 19, FieldType::String)
                .repeated_message_field("children", 20, "Record")
                .map_field("tags", 21, FieldType::String, FieldType::Int32)
                .map_field_with_type("by_id", 22, FieldType::Uint64, FieldType::Message, "Record")
                .build(),
        )
        .enum_type(
            EnumSchemaBuilder::new("State")
                .value("IDLE")
                .value("BUSY")
                .value("DONE")
                .build(),
        )
        .build();
    build_file(&schema)
        .expect("build")
        .message_by_name("Record")
        .expect("Record")
}

fn random_string(rng: &mut fastrand::Rng) -> String {
    let len = rng.usize(0..12);
    (0..len).map(|_| rng.alphanumeric()).collect()
}

fn random_scalar(rng: &mut fastrand::Rng, kind: &Kind) -> Value {
    match kind {
        Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 => Value::I32(rng.i32(..)),
        Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => Value::I64(rng.i64(..)),
        Kind::Uint32 | Kind::Fixed32 => Value::U32(rng.u32(..)),
        Kind::Uint64 | Kind::Fixed64 => Value::U64(rng.u64(..)),
        Kind::Bool => Value::Bool(rng.bool()),
        Kind::Double => Value::F64(rng.f64() * 1e6 - 5e5),
        Kind::Float => Value::F32(rng.f32() * 100.0),
        Kind::String => Value::String(random_string(rng)),
        Kind::Bytes => Value::Bytes((0..rng.usize(0..16)).map(|_| rng.u8(..)).collect()),
        Kind::Enum(_) => Value::EnumNumber(rng.i32(0..3)),
        Kind::Message(_) => unreachable!("messages are built by random_message"),
    }
}

fn random_message(rng: &mut fastrand::Rng, desc: &MessageDescriptor, depth: u32) -> DynamicMessage {
    let mut msg = new_message(desc);
    for field in desc.fields() {
        if rng.u8(..4) == 0 {
            continue;
        }
        let value = if field.is_map() {
            let mut value = msg.new_field(&field).expect("map");
            let map = value.as_map_mut().expect("map");
            for _ in 0..rng.usize(0..4) {
                let key = match map.key_kind() {
                    Kind::String => MapKey::String(random_string(rng)),
                    _ => MapKey::U64(rng.u64(..)),
                };
                let item = match map.value_kind().clone() {
                    Kind::Message(d) if depth > 0 => Value::Message(random_message(rng, &d, depth - 1)),
                    Kind::Message(d) => Value::Message(new_message(&d)),
                    kind => random_scalar(rng, &kind),
                };
                map.insert(key, item).expect("insert");
            }
            value
        } else if field.is_list() {
            let mut value = msg.new_field(&field).expect("list");
            let list = value.as_list_mut().expect("list");
            for _ in 0..rng.usize(0..5) {
                let item = match list.kind().clone() {
                    Kind::Message(d) if depth > 0 => Value::Message(random_message(rng, &d, depth - 1)),
                    Kind::Message(d) => Value::Message(new_message(&d)),
                    kind => random_scalar(rng, &kind),
                };
                list.append(item).expect("append");
            }
            value
        } else {
            match field.kind() {
                Kind::Message(d) if depth > 0 => Value::Message(random_message(rng, &d, depth - 1)),
                Kind::Message(_) => continue,
                kind => random_scalar(rng, &kind),
            }
        };
        msg.set(&field, value).expect("set");
    }
    msg
}

#[test]
fn random_messages_roundtrip() {
    let desc = schema();
    let mut rng = fastrand::Rng::with_seed(0x5eed_cafe);
    for _ in 0..ITERATIONS {
        let msg = random_message(&mut rng, &desc, 3);
        let bytes = marshal(&msg).expect("marshal");
        let decoded = unmarshal(&bytes, &desc).expect("unmarshal");
        assert_eq!(decoded, msg);
        assert_eq!(marshal(&decoded).expect("re-marshal"), bytes);
    }
}

#[test]
fn random_unpacked_encoding_decodes_identically() {
    let desc = schema();
    let unpacked = CodecOptions::default().pack_repeated(false);
    let mut rng = fastrand::Rng::with_seed(7);
    for _ in 0..ITERATIONS / 5 {
        let msg = random_message(&mut rng, &desc, 2);
        let bytes = hdds_dynpb::marshal_with(&msg, &unpacked).expect("marshal");
        assert_eq!(unmarshal(&bytes, &desc).expect("unmarshal"), msg);
    }
}

#[test]
fn random_concatenation_merges() {
    let desc = schema();
    let mut rng = fastrand::Rng::with_seed(99);
    for _ in 0..ITERATIONS / 5 {
        let a = random_message(&mut rng, &desc, 1);
        let b = random_message(&mut rng, &desc, 1);

        let mut bytes = marshal(&a).expect("a");
        bytes.extend(marshal(&b).expect("b"));
        let decoded = unmarshal(&bytes, &desc).expect("unmarshal");

        let mut merged = a.clone();
        merged.merge_from(&b).expect("merge_from");
        assert_eq!(decoded, merged);
    }
}

#[test]
fn random_bytes_never_panic() {
    let desc = schema();
    let mut rng = fastrand::Rng::with_seed(0xbad_f00d);
    for _ in 0..ITERATIONS * 4 {
        let len = rng.usize(0..64);
        let input: Vec<u8> = (0..len).map(|_| rng.u8(..)).collect();
        if let Ok(msg) = unmarshal(&input, &desc) {
            // whatever decoded must re-encode to a stable form
            let once = marshal(&msg).expect("marshal");
            let again = unmarshal(&once, &desc).expect("re-decode");
            assert_eq!(marshal(&again).expect("re-marshal"), once);
        }
    }
}

#[test]
fn random_mutation_of_valid_encoding_never_panics() {
    let desc = schema();
    let mut rng = fastrand::Rng::with_seed(12345);
    for _ in 0..ITERATIONS {
        let msg = random_message(&mut rng, &desc, 2);
        let mut bytes = marshal(&msg).expect("marshal");
        if bytes.is_empty() {
            continue;
        }
        for _ in 0..rng.usize(1..4) {
            let at = rng.usize(..bytes.len());
            bytes[at] = rng.u8(..);
        }
        let cut = rng.usize(..=bytes.len());
        let _ = unmarshal(&bytes[..cut], &desc);
    }
}
