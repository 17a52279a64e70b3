// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Example readability

//! Foo / Bar / Baz walkthrough.
//!
//! Builds three message types at run time, fills a `Foo`, a map of `Foo`
//! (`Bar`) and a list of `Foo` (`Baz`), pushes each through the wire codec
//! and prints what comes back.
//!
//! Run with `RUST_LOG=debug cargo run --example foo_bar_baz` to see registry
//! and codec logs.

use hdds_dynpb::{
    build_registry, marshal, new_message, unmarshal, DynamicMessage, FieldType, FileSchemaBuilder,
    MessageDescriptor, MessageSchemaBuilder, WireError,
};

fn foo(desc: &MessageDescriptor) -> Result<DynamicMessage, WireError> {
    let mut msg = new_message(desc);
    msg.set_by_name("id", 42)?;
    msg.set_by_name("title", "aloha")?;
    Ok(msg)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

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
    let registry = build_registry([&schema])?;
    let foo_desc = registry.message_by_name("example.Foo").ok_or("Foo not registered")?;
    let bar_desc = registry.message_by_name("example.Bar").ok_or("Bar not registered")?;
    let baz_desc = registry.message_by_name("example.Baz").ok_or("Baz not registered")?;

    // Foo
    let bytes = marshal(&foo(&foo_desc)?)?;
    println!("Foo encoded: {:02x?}", bytes);
    let decoded = unmarshal(&bytes, &foo_desc)?;
    decoded.range(|field, value| {
        println!("field: {} value: {:?}", field.name(), value);
        true
    });
    println!("get {:?}", decoded.get_by_name("title")?);

    // Bar
    let bar_map = bar_desc.field_by_name("bar_map").ok_or("missing bar_map")?;
    let mut bar = new_message(&bar_desc);
    let mut map = bar.new_field(&bar_map)?;
    if let Some(entries) = map.as_map_mut() {
        entries.insert("key1", foo(&foo_desc)?)?;
        entries.insert("key2", foo(&foo_desc)?)?;
    }
    bar.set(&bar_map, map)?;

    let bytes = marshal(&bar)?;
    println!("Bar encoded: {} bytes", bytes.len());
    let decoded = unmarshal(&bytes, &bar_desc)?;
    if let Some(map) = decoded.get(&bar_map)?.as_map() {
        map.range(|key, value| {
            println!("key: {} value: {:?}", key, value.as_message());
            true
        });
    }

    // Baz
    let baz_list = baz_desc.field_by_name("baz_list").ok_or("missing baz_list")?;
    let mut baz = new_message(&baz_desc);
    let mut list = baz.new_field(&baz_list)?;
    if let Some(items) = list.as_list_mut() {
        for _ in 0..3 {
            items.append(foo(&foo_desc)?)?;
        }
    }
    baz.set(&baz_list, list)?;

    let bytes = marshal(&baz)?;
    println!("Baz encoded: {} bytes", bytes.len());
    let decoded = unmarshal(&bytes, &baz_desc)?;
    if let Some(list) = decoded.get(&baz_list)?.as_list() {
        for (i, item) in list.iter().enumerate() {
            println!("index: {} value: {:?}", i, item.as_message());
        }
    }

    Ok(())
}
