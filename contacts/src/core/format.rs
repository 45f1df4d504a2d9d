//! Line format of the contacts file.
//!
//! One contact per line as `name,phone,email`. Lines starting with `#` are
//! comments and blank lines are ignored. The email field may be omitted.

use super::types::Contact;

pub const COMMENT_MARKER: char = '#';
pub const FIELD_SEPARATOR: char = ',';

/// Contacts parsed from a file, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedContacts {
    pub contacts: Vec<Contact>,
    /// 1-based line numbers of data lines that had no phone field.
    pub malformed_lines: Vec<usize>,
}

/// Parse the full contents of a contacts file.
pub fn parse_contacts(text: &str) -> ParsedContacts {
    let mut parsed = ParsedContacts::default();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(COMMENT_MARKER) {
            continue;
        }
        match parse_line(line) {
            Some(contact) => parsed.contacts.push(contact),
            None => parsed.malformed_lines.push(index + 1),
        }
    }
    parsed
}

/// Parse one trimmed data line. Fields beyond the third are ignored.
pub fn parse_line(line: &str) -> Option<Contact> {
    let mut fields = line.split(FIELD_SEPARATOR);
    let name = fields.next()?;
    let phone = fields.next()?;
    let email = fields.next().unwrap_or("");
    Some(Contact::new(name, phone, email))
}

pub fn render_line(contact: &Contact) -> String {
    format!(
        "{}{sep}{}{sep}{}",
        contact.name,
        contact.phone,
        contact.email,
        sep = FIELD_SEPARATOR
    )
}

/// Render a full file: header comment followed by every contact.
pub fn render_file(header: &str, contacts: &[Contact]) -> String {
    let mut buf = String::new();
    buf.push_str(header);
    buf.push('\n');
    for contact in contacts {
        buf.push_str(&render_line(contact));
        buf.push('\n');
    }
    buf
}

/// Header written when the file is first created.
pub fn created_header(timestamp: &str) -> String {
    format!("{COMMENT_MARKER} Contacts file created on {timestamp}")
}

/// Header written on every full rewrite.
pub fn updated_header(timestamp: &str) -> String {
    format!("{COMMENT_MARKER} Last updated: {timestamp}")
}

/// True if `value` can be stored in a single field without corrupting the line.
pub fn is_storable_field(value: &str) -> bool {
    !value.contains([FIELD_SEPARATOR, '\n', '\r'])
}

/// True if `name` can lead a data line: storable and not read back as a comment.
pub fn is_storable_name(name: &str) -> bool {
    is_storable_field(name) && !name.trim_start().starts_with(COMMENT_MARKER)
}
