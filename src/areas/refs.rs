//! Git references (branches, remote-tracking branches, HEAD, tags)
//!
//! References are human-readable names pointing to commits. They are stored
//! either as loose files under the git directory or as lines of the
//! `packed-refs` file. A loose ref always wins over its packed entry.
//!
//! ## File Format
//!
//! Loose references are text files containing either:
//! - A 40-character SHA-1 hash (direct reference)
//! - `ref: <path>` for symbolic references
//!
//! `packed-refs` holds one `<sha> <full ref name>` per line; lines starting
//! with `#` are comments and lines starting with `^` carry peeled tag targets.

use crate::artifacts::branch::ref_name::{RefName, SymRefName};
use crate::artifacts::objects::object_id::ObjectId;
use anyhow::Context;
use derive_new::new;
use file_guard::Lock;
use std::collections::HashMap;
use std::io::Write;
use std::ops::DerefMut;
use std::path::Path;
use tracing::debug;

/// Git references reader
///
/// Resolves ref names the way `git rev-parse` does for plain names.
#[derive(Debug, new)]
pub struct Refs {
    /// Path to the git directory (typically `.git`)
    path: Box<Path>,
}

/// Regex pattern for parsing symbolic references
const SYMREF_REGEX: &str = r"^ref: (.+)$";

/// Name of the HEAD reference
pub const HEAD_REF_NAME: &str = "HEAD";

const PACKED_REFS_FILE: &str = "packed-refs";

/// Symbolic ref chains longer than this are treated as broken
const MAX_SYMREF_DEPTH: usize = 5;

/// Internal representation of a reference value
#[derive(Debug, Clone)]
enum SymRefOrOid {
    /// Symbolic reference pointing to another ref
    SymRef { sym_ref_name: SymRefName },
    /// Direct object ID
    Oid(ObjectId),
}

impl SymRefOrOid {
    fn read_symref_or_oid(path: &Path) -> anyhow::Result<Option<SymRefOrOid>> {
        if !path.is_file() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read ref file at {:?}", path))?;
        let content = content.trim();

        if content.is_empty() {
            return Ok(None);
        }

        let symref_match = regex::Regex::new(SYMREF_REGEX)?.captures(content);
        if let Some(symref_match) = symref_match {
            Ok(Some(SymRefOrOid::SymRef {
                sym_ref_name: SymRefName::new(symref_match[1].trim().to_string()),
            }))
        } else {
            Ok(Some(SymRefOrOid::Oid(
                ObjectId::try_parse(content.to_string())
                    .with_context(|| format!("corrupt ref file at {:?}", path))?,
            )))
        }
    }
}

impl Refs {
    /// Resolve a ref name to the commit id it currently points to
    ///
    /// Each candidate from [`RefName::candidates`] is tried in order; the first
    /// one that exists, either loose or packed, decides the result.
    ///
    /// # Returns
    ///
    /// - `Some(ObjectId)` if the ref exists and points to an object
    /// - `None` if no such ref exists, or it is a dangling symbolic ref
    pub fn resolve(&self, name: &RefName) -> anyhow::Result<Option<ObjectId>> {
        let packed_refs = self.read_packed_refs()?;

        for candidate in name.candidates() {
            let is_loose = self.path.join(&candidate).is_file();

            if is_loose || packed_refs.contains_key(&candidate) {
                let oid = self.read_ref_with(&candidate, &packed_refs, 0)?;
                debug!(ref_name = %name, full_name = %candidate, ?oid, "resolved ref");

                return Ok(oid);
            }
        }

        debug!(ref_name = %name, "ref does not exist");
        Ok(None)
    }

    fn read_ref_with(
        &self,
        full_name: &str,
        packed_refs: &HashMap<String, ObjectId>,
        depth: usize,
    ) -> anyhow::Result<Option<ObjectId>> {
        if depth > MAX_SYMREF_DEPTH {
            anyhow::bail!("too many levels of symbolic refs at {}", full_name);
        }

        let ref_content = SymRefOrOid::read_symref_or_oid(&self.path.join(full_name))?;

        match ref_content {
            Some(SymRefOrOid::SymRef { sym_ref_name }) => {
                self.read_ref_with(sym_ref_name.as_ref_path(), packed_refs, depth + 1)
            }
            Some(SymRefOrOid::Oid(oid)) => Ok(Some(oid)),
            None => Ok(packed_refs.get(full_name).cloned()),
        }
    }

    fn read_packed_refs(&self) -> anyhow::Result<HashMap<String, ObjectId>> {
        let path = self.packed_refs_path();
        if !path.is_file() {
            return Ok(HashMap::new());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read packed refs at {:?}", path))?;

        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('^'))
            .map(|line| {
                let (oid, name) = line
                    .split_once(' ')
                    .with_context(|| format!("corrupt packed refs line: {line:?}"))?;
                Ok((name.trim().to_string(), ObjectId::try_parse(oid.to_string())?))
            })
            .collect()
    }

    /// Write a ref file under an exclusive lock, creating parent directories
    ///
    /// `full_name` is relative to the git directory, e.g. `refs/heads/master`
    /// or `HEAD`; `raw_ref` is either an object id or `ref: <target>`.
    pub fn update_ref_file(&self, full_name: &str, raw_ref: String) -> anyhow::Result<()> {
        let path = self.path.join(full_name);

        // create all the parent directories if they don't exist
        std::fs::create_dir_all(path.parent().with_context(|| {
            format!(
                "failed to create parent directories for ref file at {:?}",
                path
            )
        })?)?;

        // open the ref file as WRONLY and CREAT to write commit_id to it
        let mut ref_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .with_context(|| format!("failed to open ref file at {:?}", path))?;
        let mut lock = file_guard::lock(&mut ref_file, Lock::Exclusive, 0, 1)?;
        lock.deref_mut().write_all(raw_ref.as_bytes())?;

        Ok(())
    }

    pub fn packed_refs_path(&self) -> Box<Path> {
        self.path.join(PACKED_REFS_FILE).into_boxed_path()
    }
}
