//! Command implementations for the contacts CLI.
//!
//! Each command writes its human-facing output to `out` so it can be
//! exercised in tests without spawning the binary.

use std::io::{BufRead, Write};

use anyhow::{Context, Result, bail};
use tracing::debug;

use crate::core::format::{is_storable_field, is_storable_name};
use crate::core::phone::validate_phone;
use crate::core::types::{Contact, Outcome};
use crate::io::store::{ContactStore, InitReport};

/// Form fields after trimming and the required-field checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactInput {
    pub name: String,
    pub phone: String,
    pub email: String,
}

impl ContactInput {
    /// Trim all fields; name and phone are required.
    pub fn from_fields(name: &str, phone: &str, email: Option<&str>) -> Result<Self> {
        let input = Self {
            name: name.trim().to_string(),
            phone: phone.trim().to_string(),
            email: email.unwrap_or("").trim().to_string(),
        };
        if input.name.is_empty() || input.phone.is_empty() {
            bail!("name and phone are required");
        }
        if !is_storable_name(&input.name) {
            bail!("name must not start with '#' or contain ',' or line breaks");
        }
        for (label, value) in [("phone", &input.phone), ("email", &input.email)] {
            ensure_storable(label, value)?;
        }
        Ok(input)
    }
}

/// Outcome of `contacts delete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    /// The user answered no at the confirmation prompt.
    Declined,
}

pub fn init(store: &ContactStore, out: &mut impl Write) -> Result<InitReport> {
    let report = store.initialize()?;
    let state = if report.created { "created" } else { "exists" };
    writeln!(out, "init: file={} {}", store.path().display(), state)?;
    if !report.dir_writable {
        writeln!(out, "warning: no write permission in the contacts directory")?;
    }
    Ok(report)
}

/// Print every contact as an aligned table, or as JSON.
pub fn list(store: &ContactStore, json: bool, out: &mut impl Write) -> Result<()> {
    let contacts = store.list()?;
    if json {
        let mut payload = serde_json::to_string_pretty(&contacts).context("serialize contacts")?;
        payload.push('\n');
        out.write_all(payload.as_bytes())?;
    } else {
        out.write_all(render_table(&contacts).as_bytes())?;
    }
    Ok(())
}

pub fn create(store: &ContactStore, input: &ContactInput, out: &mut impl Write) -> Result<Outcome> {
    let outcome = store.create(&input.name, &input.phone, &input.email)?;
    report_mutation(store, outcome, out)?;
    Ok(outcome)
}

pub fn update(store: &ContactStore, input: &ContactInput, out: &mut impl Write) -> Result<Outcome> {
    let outcome = store.update(&input.name, &input.phone, &input.email)?;
    report_mutation(store, outcome, out)?;
    Ok(outcome)
}

/// Delete `name`, asking on `prompt_in` first when `confirm` is set.
pub fn delete(
    store: &ContactStore,
    name: &str,
    confirm: bool,
    prompt_in: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<DeleteOutcome> {
    let name = name.trim();
    if name.is_empty() {
        bail!("select a contact name to delete");
    }
    if confirm && !ask_yes_no(&format!("Delete contact '{name}'? [y/N] "), prompt_in, out)? {
        writeln!(out, "delete cancelled")?;
        return Ok(DeleteOutcome::Declined);
    }

    if !store.delete(name)? {
        writeln!(out, "error: {}", Outcome::NotFound)?;
        return Ok(DeleteOutcome::NotFound);
    }
    writeln!(out, "{}", Outcome::Deleted)?;
    out.write_all(render_table(&store.list()?).as_bytes())?;
    Ok(DeleteOutcome::Deleted)
}

pub fn check_phone(phone: &str, out: &mut impl Write) -> Result<bool> {
    let valid = validate_phone(phone);
    let verdict = if valid { "valid" } else { "invalid" };
    writeln!(out, "phone '{phone}' is {verdict}")?;
    Ok(valid)
}

/// Render contacts as `NAME  PHONE  EMAIL` columns padded to the widest cell.
pub fn render_table(contacts: &[Contact]) -> String {
    const HEADERS: [&str; 3] = ["NAME", "PHONE", "EMAIL"];
    if contacts.is_empty() {
        return "no contacts\n".to_string();
    }

    let mut widths = HEADERS.map(|header| header.chars().count());
    for contact in contacts {
        for (width, cell) in widths.iter_mut().zip(cells(contact)) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut buf = String::new();
    push_row(&mut buf, HEADERS, widths);
    for contact in contacts {
        push_row(&mut buf, cells(contact), widths);
    }
    buf
}

fn cells(contact: &Contact) -> [&str; 3] {
    [contact.name.as_str(), contact.phone.as_str(), contact.email.as_str()]
}

fn push_row(buf: &mut String, row: [&str; 3], widths: [usize; 3]) {
    let line = row
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    buf.push_str(line.trim_end());
    buf.push('\n');
}

/// Print the outcome and, on success, the refreshed table.
fn report_mutation(store: &ContactStore, outcome: Outcome, out: &mut impl Write) -> Result<()> {
    if !outcome.is_success() {
        writeln!(out, "error: {outcome}")?;
        return Ok(());
    }
    writeln!(out, "{outcome}")?;
    out.write_all(render_table(&store.list()?).as_bytes())?;
    Ok(())
}

fn ask_yes_no(prompt: &str, input: &mut impl BufRead, out: &mut impl Write) -> Result<bool> {
    write!(out, "{prompt}")?;
    out.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer).context("read confirmation")?;
    let answer = answer.trim().to_lowercase();
    debug!(answer = %answer, "confirmation answered");
    Ok(matches!(answer.as_str(), "y" | "yes"))
}

fn ensure_storable(label: &str, value: &str) -> Result<()> {
    if !is_storable_field(value) {
        bail!("{label} must not contain ',' or line breaks");
    }
    Ok(())
}
