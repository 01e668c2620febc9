//! Object database
//!
//! Objects are stored zlib-compressed under `.git/objects/<xx>/<yyyy…>`, or
//! in packfiles under `.git/objects/pack` once `git gc`, `clone` or `fetch`
//! has packed them. Loose objects are looked up first. History
//! reconciliation only reads from the database; writing loose objects is
//! kept for tooling and test fixtures that need to lay out a repository.

use crate::areas::pack::PackFile;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object::{Object, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use anyhow::Context;
use bytes::Bytes;
use fake::rand;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::debug;

const PACK_DIR: &str = "pack";
const PACK_INDEX_EXTENSION: &str = "idx";

#[derive(Debug)]
pub struct Database {
    path: Box<Path>,
    /// Pack indexes loaded so far, rescanned when a lookup misses
    packs: RwLock<Vec<PackFile>>,
}

impl Database {
    pub fn new(path: Box<Path>) -> Self {
        Database {
            path,
            packs: RwLock::new(Vec::new()),
        }
    }

    pub fn objects_path(&self) -> &Path {
        &self.path
    }

    pub fn store(&self, object: &impl Object) -> anyhow::Result<ObjectId> {
        let object_id = object.object_id()?;
        let object_path = self.path.join(object_id.to_path());
        let object_content = object.serialize()?;

        // write the object to disk unless it already exists
        // otherwise, create the object directory
        if !object_path.exists() {
            std::fs::create_dir_all(
                object_path
                    .parent()
                    .context(format!("Invalid object path {}", object_path.display()))?,
            )
            .context(format!(
                "Unable to create object directory {}",
                object_path.display()
            ))?;

            self.write_object(object_path, object_content)?;
        }

        Ok(object_id)
    }

    /// Read a commit, distinguishing a missing object from an unreadable one
    ///
    /// # Returns
    ///
    /// - `Ok(Some(commit))` when the object exists and is a commit
    /// - `Ok(None)` when no object with this id is stored, loose or packed
    /// - `Err(_)` when the object cannot be read, is corrupt or is not a commit
    pub fn find_commit(&self, object_id: &ObjectId) -> anyhow::Result<Option<Commit>> {
        let Some((object_type, body)) = self.read_object(object_id)? else {
            return Ok(None);
        };

        match object_type {
            ObjectType::Commit => Ok(Some(
                Commit::deserialize(Cursor::new(body))
                    .with_context(|| format!("Unable to parse commit {object_id}"))?,
            )),
            other => anyhow::bail!("object {} is a {}, not a commit", object_id, other),
        }
    }

    /// Read an object's type and body, `None` when it is neither loose nor packed
    ///
    /// A miss rescans the pack directory once, so packs written by a fetch
    /// or a gc since the last lookup are found.
    pub fn read_object(&self, object_id: &ObjectId) -> anyhow::Result<Option<(ObjectType, Bytes)>> {
        let object_path = self.path.join(object_id.to_path());
        if object_path.is_file() {
            return self.read_loose_object(object_path, object_id).map(Some);
        }

        if let Some(object) = self.read_packed_object(object_id)? {
            return Ok(Some(object));
        }
        if self.refresh_packs()? {
            return self.read_packed_object(object_id);
        }

        Ok(None)
    }

    fn read_loose_object(
        &self,
        object_path: PathBuf,
        object_id: &ObjectId,
    ) -> anyhow::Result<(ObjectType, Bytes)> {
        let object_content = self.read_object_file(object_path)?;
        let mut object_reader = Cursor::new(object_content);

        let object_type = ObjectType::parse_object_type(&mut object_reader)
            .with_context(|| format!("Invalid object header for {object_id}"))?;
        let body_start = object_reader.position() as usize;

        Ok((object_type, object_reader.into_inner().slice(body_start..)))
    }

    fn read_packed_object(
        &self,
        object_id: &ObjectId,
    ) -> anyhow::Result<Option<(ObjectType, Bytes)>> {
        let packs = self
            .packs
            .read()
            .map_err(|_| anyhow::anyhow!("pack list lock poisoned"))?;

        for pack in packs.iter() {
            if let Some(object) = pack.read_object(object_id)? {
                return Ok(Some(object));
            }
        }

        Ok(None)
    }

    /// Bring the loaded packs in line with the pack directory
    ///
    /// Returns `true` when the set of packs changed.
    fn refresh_packs(&self) -> anyhow::Result<bool> {
        let index_paths = self.pack_index_paths()?;
        let mut packs = self
            .packs
            .write()
            .map_err(|_| anyhow::anyhow!("pack list lock poisoned"))?;

        let unchanged = packs.len() == index_paths.len()
            && packs
                .iter()
                .zip(&index_paths)
                .all(|(pack, path)| pack.index_path() == path);
        if unchanged {
            return Ok(false);
        }

        let mut previous = std::mem::take(&mut *packs);
        let mut refreshed = Vec::with_capacity(index_paths.len());
        for index_path in index_paths {
            match previous
                .iter()
                .position(|pack| pack.index_path() == index_path)
            {
                Some(position) => refreshed.push(previous.swap_remove(position)),
                None => refreshed.push(PackFile::open(&index_path)?),
            }
        }

        debug!(
            packs = refreshed.len(),
            objects = refreshed.iter().map(PackFile::object_count).sum::<usize>(),
            "loaded pack indexes"
        );
        *packs = refreshed;

        Ok(true)
    }

    /// Index files with a pack next to them, sorted by name
    fn pack_index_paths(&self) -> anyhow::Result<Vec<PathBuf>> {
        let pack_dir = self.objects_path().join(PACK_DIR);
        if !pack_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut index_paths = std::fs::read_dir(&pack_dir)
            .with_context(|| format!("Unable to list packs in {}", pack_dir.display()))?
            .map(|entry| entry.map(|entry| entry.path()))
            .collect::<Result<Vec<_>, std::io::Error>>()
            .with_context(|| format!("Unable to list packs in {}", pack_dir.display()))?
            .into_iter()
            .filter(|path| {
                path.extension()
                    .is_some_and(|extension| extension == PACK_INDEX_EXTENSION)
                    && path.with_extension("pack").is_file()
            })
            .collect::<Vec<_>>();
        index_paths.sort();

        Ok(index_paths)
    }

    fn read_object_file(&self, object_path: PathBuf) -> anyhow::Result<Bytes> {
        // read the object file
        let object_content = std::fs::read(&object_path).context(format!(
            "Unable to read object file {}",
            object_path.display()
        ))?;

        // decompress the object content
        let object_content = Self::decompress(object_content.into())?;

        Ok(object_content)
    }

    fn write_object(&self, object_path: PathBuf, object_content: Bytes) -> anyhow::Result<()> {
        let object_dir = object_path
            .parent()
            .context(format!("Invalid object path {}", object_path.display()))?;
        let temp_object_path = object_dir.join(Self::generate_temp_name());

        // compress the object content
        let object_content = Self::compress(object_content)?;

        let mut file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_object_path)
            .context(format!(
                "Unable to open object file {}",
                temp_object_path.display()
            ))?;

        file.write_all(&object_content).context(format!(
            "Unable to write object file {}",
            temp_object_path.display()
        ))?;

        // rename the temp file to the object file to make it atomic
        std::fs::rename(&temp_object_path, &object_path).context(format!(
            "Unable to rename object file to {}",
            object_path.display()
        ))?;

        Ok(())
    }

    fn compress(data: Bytes) -> anyhow::Result<Bytes> {
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder
            .write_all(&data)
            .context("Unable to compress object content")?;

        encoder
            .finish()
            .map(|compressed_content| compressed_content.into())
            .context("Unable to finish compressing object content")
    }

    fn decompress(data: Bytes) -> anyhow::Result<Bytes> {
        let mut decoder = flate2::read::ZlibDecoder::new(&*data);
        let mut decompressed_content = Vec::new();
        decoder
            .read_to_end(&mut decompressed_content)
            .context("Unable to decompress object content")?;

        Ok(decompressed_content.into())
    }

    fn generate_temp_name() -> String {
        format!("tmp-obj-{}", rand::random::<u32>())
    }
}
