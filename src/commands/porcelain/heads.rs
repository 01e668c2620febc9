use crate::areas::repository::Repository;
use crate::artifacts::history::reconcile::HeadRefs;
use std::io::Write;

const UNRESOLVED: &str = "unresolved";

impl Repository {
    /// Print what the local and remote heads currently resolve to
    pub fn heads(&self, heads: &HeadRefs, writer: &mut dyn Write) -> anyhow::Result<()> {
        let name_width = heads
            .local
            .as_ref()
            .len()
            .max(heads.remote.as_ref().len());

        for (role, name) in [("local", &heads.local), ("remote", &heads.remote)] {
            let target = self
                .resolve_head(name)?
                .map(|oid| oid.to_string())
                .unwrap_or_else(|| UNRESOLVED.to_string());

            writeln!(
                writer,
                "{role:<6}  {:<name_width$}  {target}",
                name.as_ref()
            )?;
        }

        Ok(())
    }
}
