//! File-backed contact store.
//!
//! The file is the single source of truth: every operation re-reads it, and
//! `update`/`delete` rewrite it in full behind a fresh header comment.
//! `create` only appends. There is no locking; the last writer wins.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use tracing::{Span, debug, error, info, info_span, warn};

use crate::core::format::{
    created_header, is_storable_field, is_storable_name, parse_contacts, render_file,
    render_line, updated_header,
};
use crate::core::phone::validate_phone;
use crate::core::types::{Contact, Outcome};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// What `initialize` found on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitReport {
    /// The file did not exist and was created with a header comment.
    pub created: bool,
    /// The containing directory is writable. `false` is reported, not fatal.
    pub dir_writable: bool,
}

/// Contact store backed by a single delimited text file.
///
/// Logging goes through the span handed in at construction, so callers
/// decide how store events are labelled and filtered.
#[derive(Debug, Clone)]
pub struct ContactStore {
    path: PathBuf,
    span: Span,
}

struct Loaded {
    contacts: Vec<Contact>,
    /// Existing content does not end with a newline; an append must add one.
    missing_trailing_newline: bool,
}

impl ContactStore {
    pub fn new(path: impl Into<PathBuf>, span: Span) -> Self {
        Self {
            path: path.into(),
            span,
        }
    }

    /// Store with a `contact_store` span carrying the file path.
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let span = info_span!("contact_store", path = %path.display());
        Self::new(path, span)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure the contacts file exists, creating it with a header if absent.
    pub fn initialize(&self) -> Result<InitReport> {
        let _guard = self.span.enter();
        let absolute = std::path::absolute(&self.path).unwrap_or_else(|_| self.path.clone());
        info!(path = %absolute.display(), "opening contacts file");

        let dir_writable = directory_writable(&absolute);
        if dir_writable {
            debug!("contacts directory is writable");
        } else {
            warn!(path = %absolute.display(), "no write permission in contacts directory");
        }

        let created = self.ensure_file().inspect_err(|err| {
            error!(error = %format_args!("{err:#}"), "failed to create contacts file");
        })?;
        Ok(InitReport {
            created,
            dir_writable,
        })
    }

    /// All contacts in file order.
    ///
    /// A missing file is treated as empty and recreated.
    pub fn list(&self) -> Result<Vec<Contact>> {
        let _guard = self.span.enter();
        Ok(self.load()?.contacts)
    }

    /// Append a new contact. Rejects duplicate names first, then bad phones.
    ///
    /// Fields are trimmed before storing, since lines are trimmed on read.
    /// A name or email the line format cannot hold yields `InvalidField`.
    pub fn create(&self, name: &str, phone: &str, email: &str) -> Result<Outcome> {
        let _guard = self.span.enter();
        let (name, phone, email) = (name.trim(), phone.trim(), email.trim());
        if !is_storable_name(name) || !is_storable_field(email) {
            info!(name, "create rejected: field cannot be stored");
            return Ok(Outcome::InvalidField);
        }
        let loaded = self.load()?;
        if loaded.contacts.iter().any(|contact| contact.matches_name(name)) {
            info!(name, "create rejected: duplicate name");
            return Ok(Outcome::Duplicate);
        }
        if !validate_phone(phone) {
            info!(name, phone, "create rejected: invalid phone");
            return Ok(Outcome::InvalidPhone);
        }

        let mut line = String::new();
        if loaded.missing_trailing_newline {
            line.push('\n');
        }
        line.push_str(&render_line(&Contact::new(name, phone, email)));
        line.push('\n');
        self.append(&line).inspect_err(|err| {
            error!(error = %format_args!("{err:#}"), "failed to append contact");
        })?;

        info!(name, "contact created");
        Ok(Outcome::Created)
    }

    /// Replace phone and email of every contact matching `name`.
    ///
    /// The file is rewritten even when nothing matches, refreshing the header.
    /// Phone and email are trimmed like in `create`.
    pub fn update(&self, name: &str, new_phone: &str, new_email: &str) -> Result<Outcome> {
        let _guard = self.span.enter();
        let (name, new_phone, new_email) = (name.trim(), new_phone.trim(), new_email.trim());
        if !validate_phone(new_phone) {
            info!(name, phone = new_phone, "update rejected: invalid phone");
            return Ok(Outcome::InvalidPhone);
        }
        if !is_storable_field(new_email) {
            info!(name, "update rejected: email cannot be stored");
            return Ok(Outcome::InvalidField);
        }

        let mut contacts = self.load()?.contacts;
        let mut matched = false;
        for contact in contacts.iter_mut().filter(|contact| contact.matches_name(name)) {
            contact.phone = new_phone.to_string();
            contact.email = new_email.to_string();
            matched = true;
        }
        self.rewrite(&contacts)?;

        if matched {
            info!(name, "contact updated");
            Ok(Outcome::Updated)
        } else {
            info!(name, "update found no matching contact");
            Ok(Outcome::NotFound)
        }
    }

    /// Remove every contact matching the trimmed `name`. Writes only if something matched.
    pub fn delete(&self, name: &str) -> Result<bool> {
        let _guard = self.span.enter();
        let name = name.trim();
        let mut contacts = self.load()?.contacts;
        let before = contacts.len();
        contacts.retain(|contact| !contact.matches_name(name));
        let removed = before - contacts.len();
        if removed == 0 {
            info!(name, "delete found no matching contact");
            return Ok(false);
        }
        self.rewrite(&contacts)?;
        info!(name, removed, "contact deleted");
        Ok(true)
    }

    fn load(&self) -> Result<Loaded> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                warn!("contacts file not found, recreating it");
                if let Err(err) = self.ensure_file() {
                    error!(error = %format_args!("{err:#}"), "failed to recreate contacts file");
                }
                return Ok(Loaded {
                    contacts: Vec::new(),
                    missing_trailing_newline: false,
                });
            }
            Err(err) => {
                error!(error = %err, "failed to read contacts file");
                return Err(err)
                    .with_context(|| format!("read contacts {}", self.path.display()));
            }
        };

        let parsed = parse_contacts(&contents);
        for line in &parsed.malformed_lines {
            warn!(line, "skipping contact line without phone field");
        }
        debug!(count = parsed.contacts.len(), "contacts read");
        Ok(Loaded {
            contacts: parsed.contacts,
            missing_trailing_newline: !contents.is_empty() && !contents.ends_with('\n'),
        })
    }

    /// Create the file with a creation header. Returns `false` if it already existed.
    fn ensure_file(&self) -> Result<bool> {
        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                debug!("contacts file already exists");
                return Ok(false);
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("create contacts {}", self.path.display()));
            }
        };
        let header = created_header(&timestamp_now());
        writeln!(file, "{header}")
            .with_context(|| format!("write header {}", self.path.display()))?;
        info!("contacts file created");
        Ok(true)
    }

    fn append(&self, text: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("open contacts {}", self.path.display()))?;
        file.write_all(text.as_bytes())
            .with_context(|| format!("append contacts {}", self.path.display()))
    }

    fn rewrite(&self, contacts: &[Contact]) -> Result<()> {
        let contents = render_file(&updated_header(&timestamp_now()), contacts);
        debug!(count = contacts.len(), "rewriting contacts file");
        write_atomic(&self.path, &contents).inspect_err(|err| {
            error!(error = %format_args!("{err:#}"), "failed to rewrite contacts file");
        })
    }
}

fn timestamp_now() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Write to a sibling temp file, then rename over `path`.
fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let mut tmp_name = path
        .file_name()
        .with_context(|| format!("contacts path missing file name {}", path.display()))?
        .to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp contacts {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace contacts {}", path.display()))?;
    Ok(())
}

/// True if this process can create files in the directory holding `file`.
///
/// Creates a scratch file there that is removed on drop.
fn directory_writable(file: &Path) -> bool {
    let dir = match file.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    match tempfile::Builder::new()
        .prefix(".contacts-write-check")
        .tempfile_in(dir)
    {
        Ok(_) => true,
        Err(err) => {
            debug!(dir = %dir.display(), error = %err, "write check failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestStore;

    #[test]
    fn initialize_creates_file_with_header() {
        let fixture = TestStore::new().expect("store");
        let report = fixture.store.initialize().expect("initialize");
        assert!(report.created);
        assert!(report.dir_writable);

        let contents = fixture.contents();
        assert!(contents.starts_with("# Contacts file created on "));
        assert_eq!(contents.lines().count(), 1);
    }

    #[test]
    fn initialize_keeps_existing_file() {
        let fixture = TestStore::with_contents("Ana,555-1234,a@x.com\n").expect("store");
        let report = fixture.store.initialize().expect("initialize");
        assert!(!report.created);
        assert_eq!(fixture.contents(), "Ana,555-1234,a@x.com\n");
    }

    #[test]
    fn list_recreates_missing_file() {
        let fixture = TestStore::new().expect("store");
        let contacts = fixture.store.list().expect("list");
        assert!(contacts.is_empty());
        assert!(fixture.path.is_file());
        assert!(fixture.contents().starts_with('#'));
    }

    #[test]
    fn list_returns_contacts_in_file_order() {
        let fixture =
            TestStore::with_contents("# header\nBob,600100200\nAna,555-1234,a@x.com\n")
                .expect("store");
        let contacts = fixture.store.list().expect("list");
        assert_eq!(
            contacts,
            vec![
                Contact::new("Bob", "600100200", ""),
                Contact::new("Ana", "555-1234", "a@x.com"),
            ]
        );
    }

    #[test]
    fn list_fails_on_unreadable_contents() {
        let fixture = TestStore::new().expect("store");
        fs::write(&fixture.path, [0xff, 0xfe, b'\n']).expect("write");
        let err = fixture.store.list().unwrap_err();
        assert!(format!("{err:#}").contains("read contacts"));
    }

    #[test]
    fn create_then_list_yields_submitted_fields() {
        let fixture = TestStore::new().expect("store");
        fixture.store.initialize().expect("initialize");
        let outcome = fixture
            .store
            .create("Ana", "555-1234", "a@x.com")
            .expect("create");
        assert_eq!(outcome, Outcome::Created);
        assert_eq!(
            fixture.store.list().expect("list"),
            vec![Contact::new("Ana", "555-1234", "a@x.com")]
        );
    }

    #[test]
    fn create_rejects_duplicate_in_any_case() {
        let fixture = TestStore::new().expect("store");
        fixture
            .store
            .create("Ana", "555-1234", "a@x.com")
            .expect("create");
        let before = fixture.contents();

        let outcome = fixture.store.create("ana", "000-0000", "").expect("create");
        assert_eq!(outcome, Outcome::Duplicate);
        assert_eq!(fixture.contents(), before);

        let contacts = fixture.store.list().expect("list");
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].name, "Ana");
        assert_eq!(contacts[0].phone, "555-1234");
    }

    #[test]
    fn create_checks_duplicate_before_phone() {
        let fixture = TestStore::with_contents("Ana,555-1234,\n").expect("store");
        let outcome = fixture.store.create("ANA", "bad", "").expect("create");
        assert_eq!(outcome, Outcome::Duplicate);
    }

    #[test]
    fn create_rejects_invalid_phone_without_writing() {
        let fixture = TestStore::with_contents("# header\n").expect("store");
        let outcome = fixture.store.create("Ana", "12345", "").expect("create");
        assert_eq!(outcome, Outcome::InvalidPhone);
        assert_eq!(fixture.contents(), "# header\n");
    }

    #[test]
    fn create_appends_without_rewriting() {
        let fixture = TestStore::with_contents("# old header\nBob,600100200,\n").expect("store");
        fixture.store.create("Ana", "555-1234", "").expect("create");
        assert_eq!(
            fixture.contents(),
            "# old header\nBob,600100200,\nAna,555-1234,\n"
        );
    }

    #[test]
    fn create_starts_new_line_after_unterminated_content() {
        let fixture = TestStore::with_contents("Bob,600100200,").expect("store");
        fixture.store.create("Ana", "555-1234", "").expect("create");
        let names: Vec<String> = fixture
            .store
            .list()
            .expect("list")
            .into_iter()
            .map(|contact| contact.name)
            .collect();
        assert_eq!(names, vec!["Bob", "Ana"]);
    }

    #[test]
    fn update_changes_only_matching_entry() {
        let fixture = TestStore::with_contents(
            "# header\nAna,555-1234,a@x.com\nBob,600100200,b@x.com\nCid,+34 600 1,\n",
        )
        .expect("store");
        let outcome = fixture
            .store
            .update("ana", "555-9999", "new@x.com")
            .expect("update");
        assert_eq!(outcome, Outcome::Updated);
        assert_eq!(
            fixture.store.list().expect("list"),
            vec![
                Contact::new("Ana", "555-9999", "new@x.com"),
                Contact::new("Bob", "600100200", "b@x.com"),
                Contact::new("Cid", "+34 600 1", ""),
            ]
        );
        assert!(fixture.contents().starts_with("# Last updated: "));
    }

    #[test]
    fn update_missing_name_refreshes_header() {
        let fixture =
            TestStore::with_contents("# Contacts file created on 2020-01-01 00:00:00\nBob,600100200,\n")
                .expect("store");
        let outcome = fixture.store.update("Zed", "555-1234", "").expect("update");
        assert_eq!(outcome, Outcome::NotFound);

        let contents = fixture.contents();
        assert!(contents.starts_with("# Last updated: "));
        assert_eq!(
            fixture.store.list().expect("list"),
            vec![Contact::new("Bob", "600100200", "")]
        );
    }

    #[test]
    fn update_rejects_invalid_phone_before_touching_file() {
        let fixture = TestStore::with_contents("# header\nAna,555-1234,\n").expect("store");
        let outcome = fixture.store.update("Ana", "555", "").expect("update");
        assert_eq!(outcome, Outcome::InvalidPhone);
        assert_eq!(fixture.contents(), "# header\nAna,555-1234,\n");
    }

    #[test]
    fn delete_removes_all_case_insensitive_matches() {
        let fixture = TestStore::with_contents(
            "# header\nAna,555-1234,\nBob,600100200,\nANA,555-0000,\n",
        )
        .expect("store");
        assert!(fixture.store.delete("ana").expect("delete"));
        assert_eq!(
            fixture.store.list().expect("list"),
            vec![Contact::new("Bob", "600100200", "")]
        );
        assert!(fixture.contents().starts_with("# Last updated: "));
    }

    #[test]
    fn delete_missing_name_does_not_write() {
        let fixture = TestStore::with_contents("# header\nAna,555-1234,\n").expect("store");
        assert!(!fixture.store.delete("Bob").expect("delete"));
        assert_eq!(fixture.contents(), "# header\nAna,555-1234,\n");
    }

    #[test]
    fn rewrite_leaves_no_temp_file() {
        let fixture = TestStore::with_contents("Ana,555-1234,\n").expect("store");
        fixture.store.update("Ana", "555-4321", "").expect("update");
        let entries: Vec<_> = fs::read_dir(fixture.dir())
            .expect("read dir")
            .map(|entry| entry.expect("entry").file_name())
            .collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn sequence_of_operations_nets_out() {
        let fixture = TestStore::new().expect("store");
        let store = &fixture.store;
        store.initialize().expect("initialize");
        assert_eq!(store.create("Ana", "555-1234", "a@x.com").expect("c"), Outcome::Created);
        assert_eq!(store.create("Bob", "600100200", "").expect("c"), Outcome::Created);
        assert_eq!(store.create("Cid", "700 200 300", "c@x.com").expect("c"), Outcome::Created);
        assert_eq!(store.update("bob", "611-111-111", "b@x.com").expect("u"), Outcome::Updated);
        assert!(store.delete("ANA").expect("d"));
        assert_eq!(store.create("Ana", "+1 555 0000", "").expect("c"), Outcome::Created);

        assert_eq!(
            store.list().expect("list"),
            vec![
                Contact::new("Bob", "611-111-111", "b@x.com"),
                Contact::new("Cid", "700 200 300", "c@x.com"),
                Contact::new("Ana", "+1 555 0000", ""),
            ]
        );
    }

    #[test]
    fn writable_directory_check_leaves_no_files() {
        let temp = tempfile::tempdir().expect("tempdir");
        assert!(directory_writable(&temp.path().join("contacts.txt")));
        assert_eq!(fs::read_dir(temp.path()).expect("read dir").count(), 0);
    }

    #[test]
    fn missing_directory_is_not_writable() {
        let temp = tempfile::tempdir().expect("tempdir");
        assert!(!directory_writable(&temp.path().join("missing").join("contacts.txt")));
    }

    #[test]
    fn readonly_directory_matches_actual_access() {
        let temp = tempfile::tempdir().expect("tempdir");
        let dir = temp.path().join("locked");
        fs::create_dir(&dir).expect("mkdir");
        let original = fs::metadata(&dir).expect("meta").permissions();
        let mut locked = original.clone();
        locked.set_readonly(true);
        fs::set_permissions(&dir, locked).expect("set readonly");

        // Privileged users can still write into a read-only directory.
        let can_write = fs::write(dir.join("check"), "").is_ok();
        let _ = fs::remove_file(dir.join("check"));
        assert_eq!(directory_writable(&dir.join("contacts.txt")), can_write);

        fs::set_permissions(&dir, original).expect("restore permissions");
        assert!(directory_writable(&dir.join("contacts.txt")));
    }

    #[test]
    fn create_rejects_name_read_back_as_comment() {
        let fixture = TestStore::new().expect("store");
        fixture.store.initialize().expect("initialize");
        let before = fixture.contents();

        for _ in 0..2 {
            let outcome = fixture.store.create("#Ana", "555-1234", "").expect("create");
            assert_eq!(outcome, Outcome::InvalidField);
        }
        assert_eq!(fixture.contents(), before);
        assert!(fixture.store.list().expect("list").is_empty());
    }

    #[test]
    fn create_rejects_separator_in_email() {
        let fixture = TestStore::new().expect("store");
        let outcome = fixture
            .store
            .create("Ana", "555-1234", "a@x.com,b@x.com")
            .expect("create");
        assert_eq!(outcome, Outcome::InvalidField);
        let outcome = fixture.store.update("Ana", "555-1234", "a\nb").expect("update");
        assert_eq!(outcome, Outcome::InvalidField);
    }

    #[test]
    fn create_trims_fields_so_list_round_trips() {
        let fixture = TestStore::new().expect("store");
        let outcome = fixture
            .store
            .create(" Ana", " 555-1234 ", "a@x.com ")
            .expect("create");
        assert_eq!(outcome, Outcome::Created);
        assert_eq!(
            fixture.store.list().expect("list"),
            vec![Contact::new("Ana", "555-1234", "a@x.com")]
        );
        assert_eq!(
            fixture.store.create("ana ", "555-0000", "").expect("create"),
            Outcome::Duplicate
        );
    }
}
