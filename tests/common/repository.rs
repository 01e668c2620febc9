use crate::common::pack::pack_loose_objects;
use crate::common::redirect_temp_dir;
use assert_fs::TempDir;
use bit_history::areas::repository::Repository;
use bit_history::artifacts::objects::commit::{Author, Commit};
use bit_history::artifacts::objects::object_id::ObjectId;
use chrono::{DateTime, FixedOffset};
use std::io::Write;
use std::path::Path;

const EMPTY_TREE: &str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";
/// 2023-01-01 12:00:00 +0000
const EPOCH: i64 = 1_672_574_400;

/// A repository laid out on disk with the library's own object and ref writers
pub struct RepositoryFixture {
    dir: TempDir,
    repository: Repository,
    clock: i64,
}

impl RepositoryFixture {
    pub fn init() -> Self {
        redirect_temp_dir();
        let dir = TempDir::new().expect("Failed to create temp dir");
        let git_dir = dir.path().join(".git");
        std::fs::create_dir_all(git_dir.join("objects")).unwrap();
        std::fs::create_dir_all(git_dir.join("refs").join("heads")).unwrap();
        std::fs::write(git_dir.join("HEAD"), "ref: refs/heads/master\n").unwrap();
        let repository = Repository::open(dir.path()).unwrap();

        RepositoryFixture {
            dir,
            repository,
            clock: EPOCH,
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    /// Store a commit one minute after the previous one
    pub fn commit(&mut self, parents: &[&ObjectId], message: &str) -> ObjectId {
        self.commit_by("fake_user", parents, message)
    }

    pub fn commit_by(&mut self, author: &str, parents: &[&ObjectId], message: &str) -> ObjectId {
        self.clock += 60;
        self.commit_at(author, parents, message, self.clock)
    }

    pub fn commit_at(
        &mut self,
        author: &str,
        parents: &[&ObjectId],
        message: &str,
        seconds: i64,
    ) -> ObjectId {
        let timestamp = DateTime::from_timestamp(seconds, 0)
            .unwrap()
            .with_timezone(&FixedOffset::east_opt(0).unwrap());
        let commit = Commit::new(
            parents.iter().map(|oid| (*oid).clone()).collect(),
            ObjectId::try_parse(EMPTY_TREE.to_string()).unwrap(),
            Author::new(
                author.to_string(),
                "fake_email@email.com".to_string(),
                timestamp,
            ),
            format!("{message}\n"),
        );

        self.repository.database().store(&commit).unwrap()
    }

    pub fn set_ref(&self, full_name: &str, oid: &ObjectId) {
        self.repository
            .refs()
            .update_ref_file(full_name, format!("{oid}\n"))
            .unwrap();
    }

    pub fn set_symref(&self, full_name: &str, target: &str) {
        self.repository
            .refs()
            .update_ref_file(full_name, format!("ref: {target}\n"))
            .unwrap();
    }

    /// Write a `packed-refs` file holding the given entries
    pub fn pack_refs(&self, entries: &[(&str, &ObjectId)]) {
        let mut content = String::from("# pack-refs with: peeled fully-peeled sorted \n");
        for (name, oid) in entries {
            content.push_str(&format!("{oid} {name}\n"));
        }
        std::fs::write(self.repository.refs().packed_refs_path(), content).unwrap();
    }

    /// Replace a stored object with bytes that do not inflate
    pub fn corrupt_object(&self, oid: &ObjectId) {
        let path = self
            .repository
            .database()
            .objects_path()
            .join(oid.to_path());
        std::fs::remove_file(&path).unwrap();
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"not a zlib stream").unwrap();
    }

    /// Move all stored objects into a single packfile
    pub fn pack_objects(&self) {
        pack_loose_objects(self.repository.database().objects_path());
    }
}
