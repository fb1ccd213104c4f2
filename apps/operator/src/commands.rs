use std::io::Write;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Subcommand};
use client_core::{RecordsHandle, RefreshOutcome};
use shared::domain::{RecordFields, RecordId};
use tracing::debug;

use crate::report::{describe_failure, write_mode, write_records};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print every record in display order.
    List,
    /// Create a record.
    Add(NewRecordArgs),
    /// Update the record with the given id.
    Edit {
        id: String,
        #[command(flatten)]
        changes: FieldChanges,
    },
    /// Delete the record with the given id.
    Remove { id: String },
}

#[derive(Args, Debug)]
pub struct NewRecordArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub id_number: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub phone: String,
}

impl From<NewRecordArgs> for RecordFields {
    fn from(args: NewRecordArgs) -> Self {
        Self {
            name: args.name,
            id_number: args.id_number,
            email: args.email,
            phone: args.phone,
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct FieldChanges {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub id_number: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
}

impl FieldChanges {
    pub fn apply(self, draft: &mut RecordFields) {
        if let Some(v) = self.name {
            draft.name = v;
        }
        if let Some(v) = self.id_number {
            draft.id_number = v;
        }
        if let Some(v) = self.email {
            draft.email = v;
        }
        if let Some(v) = self.phone {
            draft.phone = v;
        }
    }
}

pub async fn execute(
    handle: &dyn RecordsHandle,
    command: Command,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        Command::List => {
            refresh_and_report(handle, out).await?;
        }
        Command::Add(args) => {
            let fields = RecordFields::from(args);
            handle
                .submit(&fields)
                .await
                .map_err(|failure| anyhow!(describe_failure(&failure)))?;
            writeln!(out, "Saved.")?;
            print_records(handle, out).await?;
        }
        Command::Edit { id, changes } => {
            if let RefreshOutcome::Failed(failure) = handle.refresh().await {
                return Err(anyhow!(describe_failure(&failure)));
            }
            let id = RecordId::new(id);
            let record = handle
                .snapshot()
                .await
                .find(&id)
                .cloned()
                .with_context(|| format!("no record with id {id}"))?;

            handle.request_edit(record).await;
            let state = handle.edit_state().await;
            write_mode(out, &state)?;

            let mut draft = state.draft();
            changes.apply(&mut draft);
            debug!(%id, ?draft, "submitting edit");
            handle
                .submit(&draft)
                .await
                .map_err(|failure| anyhow!(describe_failure(&failure)))?;
            writeln!(out, "Updated.")?;
            print_records(handle, out).await?;
        }
        Command::Remove { id } => {
            let id = RecordId::new(id);
            handle
                .delete_record(&id)
                .await
                .map_err(|failure| anyhow!(describe_failure(&failure)))?;
            writeln!(out, "Deleted {id}.")?;
            print_records(handle, out).await?;
        }
    }
    Ok(())
}

async fn refresh_and_report(handle: &dyn RecordsHandle, out: &mut impl Write) -> Result<()> {
    if let RefreshOutcome::Failed(failure) = handle.refresh().await {
        writeln!(out, "Showing last known records. {}", describe_failure(&failure))?;
    }
    print_records(handle, out).await
}

async fn print_records(handle: &dyn RecordsHandle, out: &mut impl Write) -> Result<()> {
    let snapshot = handle.snapshot().await;
    write_records(out, &snapshot)?;
    Ok(())
}

#[cfg(test)]
#[path = "tests/commands_tests.rs"]
mod tests;
