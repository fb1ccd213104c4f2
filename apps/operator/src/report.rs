//! Operator-facing rendering of records and store failures.

use std::io::{self, Write};

use client_core::{CollectionSnapshot, EditState};
use shared::{domain::PersonRecord, error::StoreFailure};

/// Adds a retry hint to a store failure. The failure itself stays coarse.
pub fn describe_failure(failure: &StoreFailure) -> String {
    let lower = failure.message.to_ascii_lowercase();
    if lower.contains("error sending request")
        || lower.contains("connection refused")
        || lower.contains("dns")
        || lower.contains("timed out")
    {
        format!("Store unreachable; check the store URL/network and retry ({failure}).")
    } else if lower.starts_with("401") || lower.starts_with("403") || lower.contains("jwt") {
        format!("Store refused the credentials; check the API key ({failure}).")
    } else {
        format!("Store rejected the {}; retry or adjust the input ({failure}).", failure.operation)
    }
}

pub fn write_records(out: &mut impl Write, snapshot: &CollectionSnapshot) -> io::Result<()> {
    for record in snapshot.records.iter() {
        write_record(out, record)?;
    }
    writeln!(out, "{} Records", snapshot.len())
}

pub fn write_record(out: &mut impl Write, record: &PersonRecord) -> io::Result<()> {
    writeln!(
        out,
        "#{:<4} {}  {}  {}  {}  {}  ({})",
        record.display_id.0,
        record.id,
        record.name,
        record.id_number,
        record.email,
        record.phone,
        record.created_at.format("%Y-%m-%d %H:%M"),
    )
}

pub fn write_mode(out: &mut impl Write, state: &EditState) -> io::Result<()> {
    match state.target() {
        Some(record) => writeln!(out, "{}: #{} {}", state.heading(), record.display_id, record.name),
        None => writeln!(out, "{}", state.heading()),
    }
}
