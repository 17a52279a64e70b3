// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::unreadable_literal)] // Byte vectors

//! Golden wire vectors.
//!
//! Each vector is the byte-exact encoding any conforming protobuf
//! implementation produces for the same logical message. Encoding must match
//! bit for bit; decoding the vector must yield the message back.

use hdds_dynpb::{
    build_file, marshal, new_message, unmarshal, DynamicMessage, FieldSchema, FieldType,
    FileDescriptor, FileSchemaBuilder, MessageDescriptor, MessageSchemaBuilder, Value,
};

fn single(field_type: FieldType) -> MessageDescriptor {
    let schema = FileSchemaBuilder::new("single.proto", "golden")
        .message(MessageSchemaBuilder::new("Single").field("v", 1, field_type).build())
        .build();
    build_file(&schema)
        .expect("build")
        .message_by_name("Single")
        .expect("Single")
}

fn example() -> FileDescriptor {
    let schema = FileSchemaBuilder::new("example.proto", "example")
        .message(
            MessageSchemaBuilder::new("Foo")
                .field("id", 1, FieldType::Int32)
                .string_field("title", 2)
                .build(),
        )
        .message(
            MessageSchemaBuilder::new("Bar")
                .map_field_with_type("bar_map", 1, FieldType::String, FieldType::Message, "Foo")
                .build(),
        )
        .message(
            MessageSchemaBuilder::new("Baz")
                .repeated_message_field("baz_list", 1, "Foo")
                .build(),
        )
        .build();
    build_file(&schema).expect("build")
}

fn foo(file: &FileDescriptor) -> DynamicMessage {
    let mut msg = new_message(&file.message_by_name("Foo").expect("Foo"));
    msg.set_by_name("id", 42).expect("id");
    msg.set_by_name("title", "aloha").expect("title");
    msg
}

/// Encode must produce `expected`; decoding `expected` must give `msg` back.
fn check(msg: &DynamicMessage, expected: &[u8]) {
    let bytes = marshal(msg).expect("marshal");
    assert_eq!(bytes, expected, "encoding of {:?}", msg);
    let decoded = unmarshal(expected, msg.descriptor()).expect("unmarshal");
    assert_eq!(&decoded, msg);
}

fn check_scalar(field_type: FieldType, value: impl Into<Value>, expected: &[u8]) {
    let desc = single(field_type);
    let mut msg = new_message(&desc);
    msg.set_by_name("v", value).expect("set");
    check(&msg, expected);
}

// ----------------------------------------------------------------------------
// Example messages
// ----------------------------------------------------------------------------

const FOO: &[u8] = b"\x08\x2a\x12\x05aloha";

#[test]
fn golden_foo() {
    check(&foo(&example()), FOO);
}

#[test]
fn golden_bar_map() {
    let file = example();
    let bar = file.message_by_name("Bar").expect("Bar");
    let field = bar.field_by_name("bar_map").expect("bar_map");
    let mut msg = new_message(&bar);
    let mut map = msg.new_field(&field).expect("map");
    // inserted out of order, emitted in key order
    map.as_map_mut().expect("map").insert("key2", foo(&file)).expect("key2");
    map.as_map_mut().expect("map").insert("key1", foo(&file)).expect("key1");
    msg.set(&field, map).expect("set");

    let mut expected: Vec<u8> = Vec::new();
    for key in [b"key1", b"key2"] {
        expected.extend_from_slice(&[0x0a, 0x11, 0x0a, 0x04]);
        expected.extend_from_slice(key);
        expected.extend_from_slice(&[0x12, 0x09]);
        expected.extend_from_slice(FOO);
    }
    check(&msg, &expected);
}

#[test]
fn golden_baz_list() {
    let file = example();
    let baz = file.message_by_name("Baz").expect("Baz");
    let field = baz.field_by_name("baz_list").expect("baz_list");
    let mut msg = new_message(&baz);
    let mut list = msg.new_field(&field).expect("list");
    for _ in 0..3 {
        list.as_list_mut().expect("list").append(foo(&file)).expect("append");
    }
    msg.set(&field, list).expect("set");

    let mut expected: Vec<u8> = Vec::new();
    for _ in 0..3 {
        expected.extend_from_slice(&[0x0a, 0x09]);
        expected.extend_from_slice(FOO);
    }
    check(&msg, &expected);
}

// ----------------------------------------------------------------------------
// Encoding guide vectors
// ----------------------------------------------------------------------------

#[test]
fn golden_varint_150() {
    check_scalar(FieldType::Int32, 150, &[0x08, 0x96, 0x01]);
}

#[test]
fn golden_string_testing() {
    let schema = FileSchemaBuilder::new("t.proto", "golden")
        .message(MessageSchemaBuilder::new("Test2").string_field("b", 2).build())
        .build();
    let desc = build_file(&schema).expect("build").message_by_name("Test2").expect("Test2");
    let mut msg = new_message(&desc);
    msg.set_by_name("b", "testing").expect("b");
    check(&msg, b"\x12\x07testing");
}

#[test]
fn golden_embedded_message() {
    let schema = FileSchemaBuilder::new("t.proto", "golden")
        .message(MessageSchemaBuilder::new("Test1").field("a", 1, FieldType::Int32).build())
        .message(MessageSchemaBuilder::new("Test3").message_field("c", 3, "Test1").build())
        .build();
    let file = build_file(&schema).expect("build");
    let mut inner = new_message(&file.message_by_name("Test1").expect("Test1"));
    inner.set_by_name("a", 150).expect("a");
    let mut msg = new_message(&file.message_by_name("Test3").expect("Test3"));
    msg.set_by_name("c", inner).expect("c");
    check(&msg, &[0x1a, 0x03, 0x08, 0x96, 0x01]);
}

#[test]
fn golden_empty_embedded_message_is_emitted() {
    let schema = FileSchemaBuilder::new("t.proto", "golden")
        .message(MessageSchemaBuilder::new("Test1").field("a", 1, FieldType::Int32).build())
        .message(MessageSchemaBuilder::new("Test3").message_field("c", 3, "Test1").build())
        .build();
    let file = build_file(&schema).expect("build");
    let inner = new_message(&file.message_by_name("Test1").expect("Test1"));
    let mut msg = new_message(&file.message_by_name("Test3").expect("Test3"));
    msg.set_by_name("c", inner).expect("c");
    check(&msg, &[0x1a, 0x00]);
}

#[test]
fn golden_packed_repeated() {
    let schema = FileSchemaBuilder::new("t.proto", "golden")
        .message(
            MessageSchemaBuilder::new("Test4")
                .repeated_field("d", 4, FieldType::Int32)
                .build(),
        )
        .build();
    let desc = build_file(&schema).expect("build").message_by_name("Test4").expect("Test4");
    let field = desc.field_by_name("d").expect("d");
    let mut msg = new_message(&desc);
    let mut list = msg.new_field(&field).expect("list");
    for v in [3, 270, 86942] {
        list.as_list_mut().expect("list").append(v).expect("append");
    }
    msg.set(&field, list).expect("set");
    check(&msg, &[0x22, 0x06, 0x03, 0x8e, 0x02, 0x9e, 0xa7, 0x05]);
}

#[test]
fn golden_explicitly_unpacked_repeated() {
    let schema = FileSchemaBuilder::new("t.proto", "golden")
        .message(
            MessageSchemaBuilder::new("Test5")
                .field_schema(
                    FieldSchema::new("d", 4, FieldType::Int32)
                        .repeated()
                        .with_packed(false),
                )
                .build(),
        )
        .build();
    let desc = build_file(&schema).expect("build").message_by_name("Test5").expect("Test5");
    let field = desc.field_by_name("d").expect("d");
    let mut msg = new_message(&desc);
    let mut list = msg.new_field(&field).expect("list");
    for v in [1, 2] {
        list.as_list_mut().expect("list").append(v).expect("append");
    }
    msg.set(&field, list).expect("set");
    check(&msg, &[0x20, 0x01, 0x20, 0x02]);
}

// ----------------------------------------------------------------------------
// Scalar encodings
// ----------------------------------------------------------------------------

#[test]
fn golden_negative_int32_sign_extended() {
    check_scalar(
        FieldType::Int32,
        -1,
        &[0x08, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01],
    );
}

#[test]
fn golden_zigzag() {
    check_scalar(FieldType::Sint32, -1, &[0x08, 0x01]);
    check_scalar(FieldType::Sint32, 1, &[0x08, 0x02]);
    check_scalar(FieldType::Sint64, -2i64, &[0x08, 0x03]);
    check_scalar(
        FieldType::Sint32,
        i32::MIN,
        &[0x08, 0xff, 0xff, 0xff, 0xff, 0x0f],
    );
}

#[test]
fn golden_fixed_width() {
    check_scalar(FieldType::Fixed32, 1u32, &[0x0d, 0x01, 0x00, 0x00, 0x00]);
    check_scalar(
        FieldType::Fixed64,
        1u64,
        &[0x09, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
    );
    check_scalar(FieldType::Sfixed32, -2, &[0x0d, 0xfe, 0xff, 0xff, 0xff]);
    check_scalar(FieldType::Float, 1.0f32, &[0x0d, 0x00, 0x00, 0x80, 0x3f]);
    check_scalar(
        FieldType::Double,
        1.0f64,
        &[0x09, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xf0, 0x3f],
    );
}

#[test]
fn golden_bool_and_bytes() {
    check_scalar(FieldType::Bool, true, &[0x08, 0x01]);
    check_scalar(FieldType::Bytes, vec![0xdeu8, 0xad], &[0x0a, 0x02, 0xde, 0xad]);
}

#[test]
fn golden_uint64_max() {
    check_scalar(
        FieldType::Uint64,
        u64::MAX,
        &[0x08, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01],
    );
}

#[test]
fn golden_max_field_number() {
    let schema = FileSchemaBuilder::new("t.proto", "golden")
        .message(
            MessageSchemaBuilder::new("Far")
                .field("v", 536_870_911, FieldType::Int32)
                .build(),
        )
        .build();
    let desc = build_file(&schema).expect("build").message_by_name("Far").expect("Far");
    let mut msg = new_message(&desc);
    msg.set_by_name("v", 1).expect("v");
    check(&msg, &[0xf8, 0xff, 0xff, 0xff, 0x0f, 0x01]);
}

// ----------------------------------------------------------------------------
// Layout
// ----------------------------------------------------------------------------

#[test]
fn golden_fields_in_number_order() {
    let schema = FileSchemaBuilder::new("t.proto", "golden")
        .message(
            MessageSchemaBuilder::new("Order")
                .field("c", 3, FieldType::Int32)
                .field("a", 1, FieldType::Int32)
                .field("b", 2, FieldType::Int32)
                .build(),
        )
        .build();
    let desc = build_file(&schema).expect("build").message_by_name("Order").expect("Order");
    let mut msg = new_message(&desc);
    msg.set_by_name("c", 3).expect("c");
    msg.set_by_name("b", 2).expect("b");
    msg.set_by_name("a", 1).expect("a");
    check(&msg, &[0x08, 0x01, 0x10, 0x02, 0x18, 0x03]);
}

#[test]
fn golden_map_entry_keeps_default_value() {
    let schema = FileSchemaBuilder::new("t.proto", "golden")
        .message(
            MessageSchemaBuilder::new("Counts")
                .map_field("counts", 1, FieldType::String, FieldType::Int32)
                .build(),
        )
        .build();
    let desc = build_file(&schema).expect("build").message_by_name("Counts").expect("Counts");
    let field = desc.field_by_name("counts").expect("counts");
    let mut msg = new_message(&desc);
    let mut map = msg.new_field(&field).expect("map");
    map.as_map_mut().expect("map").insert("a", 0).expect("insert");
    msg.set(&field, map).expect("set");
    check(&msg, &[0x0a, 0x05, 0x0a, 0x01, 0x61, 0x10, 0x00]);
}

#[test]
fn golden_unknown_fields_follow_known_fields() {
    let desc = single(FieldType::Int32);
    // field 3 (unknown) arrives before field 1
    let input = [0x18, 0x05, 0x08, 0x01];
    let msg = unmarshal(&input, &desc).expect("unmarshal");
    assert_eq!(msg.unknown_fields(), &[0x18, 0x05]);
    assert_eq!(marshal(&msg).expect("marshal"), vec![0x08, 0x01, 0x18, 0x05]);
}

#[test]
fn golden_default_values_are_omitted() {
    let desc = single(FieldType::Int32);
    let mut msg = new_message(&desc);
    msg.set_by_name("v", 0).expect("v");
    assert!(marshal(&msg).expect("marshal").is_empty());
}
