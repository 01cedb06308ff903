//! Writes one generated file according to its conflict policy.

use std::fmt;
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::{
    application::ports::{Filesystem, Prompter},
    domain::ConflictPolicy,
    error::TrellisResult,
};

/// What happened to a destination file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "action", content = "reason")]
pub enum FileAction {
    Created,
    Overwritten,
    Appended,
    Skipped(SkipReason),
}

impl FileAction {
    pub fn is_write(&self) -> bool {
        !matches!(self, Self::Skipped(_))
    }
}

impl fmt::Display for FileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => f.write_str("created"),
            Self::Overwritten => f.write_str("overwritten"),
            Self::Appended => f.write_str("appended"),
            Self::Skipped(reason) => write!(f, "skipped ({reason})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Keep policy and the file exists.
    AlreadyExists,
    /// The user answered no to the overwrite question.
    Declined,
    /// Overwrite needed confirmation but nobody could be asked.
    NotConfirmed,
    /// Destination resolved outside the base directory.
    OutsideBaseDir,
    /// Source resolved outside the template directory.
    OutsideTemplateRoot,
    /// Reading or rendering the source failed.
    RenderFailed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyExists => f.write_str("already exists"),
            Self::Declined => f.write_str("overwrite declined"),
            Self::NotConfirmed => f.write_str("exists, use --force to overwrite"),
            Self::OutsideBaseDir => f.write_str("outside the target directory"),
            Self::OutsideTemplateRoot => f.write_str("source outside the template"),
            Self::RenderFailed(reason) => write!(f, "render failed: {reason}"),
        }
    }
}

/// Applies a [`ConflictPolicy`] and writes the content produced on demand.
pub struct FileMaterializer<'a> {
    filesystem: &'a dyn Filesystem,
    prompter: &'a dyn Prompter,
    overwrite_existing: bool,
}

impl<'a> FileMaterializer<'a> {
    pub fn new(
        filesystem: &'a dyn Filesystem,
        prompter: &'a dyn Prompter,
        overwrite_existing: bool,
    ) -> Self {
        Self {
            filesystem,
            prompter,
            overwrite_existing,
        }
    }

    /// Write `dest` with the output of `render`.
    ///
    /// `render` is only called once the policy allows writing. Its failure is
    /// logged and reported as a skip; filesystem failures while writing are
    /// returned as errors.
    pub fn write<F>(&self, dest: &Path, render: F, policy: ConflictPolicy) -> TrellisResult<FileAction>
    where
        F: FnOnce() -> TrellisResult<Vec<u8>>,
    {
        let exists = self.filesystem.exists(dest);

        let action = match (policy, exists) {
            (ConflictPolicy::Keep, true) => {
                info!(path = %dest.display(), "File already exists, skipping");
                return Ok(FileAction::Skipped(SkipReason::AlreadyExists));
            }
            (ConflictPolicy::Overwrite, true) => {
                if let Some(skip) = self.confirm_overwrite(dest)? {
                    return Ok(FileAction::Skipped(skip));
                }
                FileAction::Overwritten
            }
            (ConflictPolicy::Append, true) => FileAction::Appended,
            (_, false) => FileAction::Created,
        };

        let content = match render() {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %dest.display(), error = %e, "Could not produce file, skipping");
                return Ok(FileAction::Skipped(SkipReason::RenderFailed(e.to_string())));
            }
        };

        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.filesystem.create_dir_all(parent)?;
        }

        match action {
            FileAction::Appended => self.filesystem.append_file(dest, &content)?,
            _ => self.filesystem.write_file(dest, &content)?,
        }

        info!(path = %dest.display(), %action, "Wrote file");
        Ok(action)
    }

    fn confirm_overwrite(&self, dest: &Path) -> TrellisResult<Option<SkipReason>> {
        if self.overwrite_existing {
            return Ok(None);
        }
        if !self.prompter.is_interactive() {
            info!(path = %dest.display(), "File exists and overwrite not forced, skipping");
            return Ok(Some(SkipReason::NotConfirmed));
        }
        let question = format!("{} already exists. Overwrite?", dest.display());
        if self.prompter.confirm(&question)? {
            Ok(None)
        } else {
            info!(path = %dest.display(), "Overwrite declined");
            Ok(Some(SkipReason::Declined))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{
        ApplicationError,
        ports::{MockFilesystem, MockPrompter},
    };
    use std::path::PathBuf;

    fn existing(exists: bool) -> MockFilesystem {
        let mut fs = MockFilesystem::new();
        fs.expect_exists().return_const(exists);
        fs.expect_create_dir_all().returning(|_| Ok(()));
        fs
    }

    fn batch() -> MockPrompter {
        let mut prompter = MockPrompter::new();
        prompter.expect_is_interactive().return_const(false);
        prompter.expect_confirm().never();
        prompter
    }

    fn content() -> TrellisResult<Vec<u8>> {
        Ok(b"hello".to_vec())
    }

    #[test]
    fn keep_leaves_existing_files_alone() {
        let mut fs = existing(true);
        fs.expect_write_file().never();
        fs.expect_append_file().never();
        let prompter = batch();

        let action = FileMaterializer::new(&fs, &prompter, false)
            .write(
                Path::new("/out/a.txt"),
                || panic!("must not render"),
                ConflictPolicy::Keep,
            )
            .unwrap();
        assert_eq!(action, FileAction::Skipped(SkipReason::AlreadyExists));
    }

    #[test]
    fn new_files_are_created_with_parents() {
        let mut fs = MockFilesystem::new();
        fs.expect_exists().return_const(false);
        fs.expect_create_dir_all()
            .withf(|p| p == Path::new("/out/src"))
            .times(1)
            .returning(|_| Ok(()));
        fs.expect_write_file()
            .withf(|p, c| p == Path::new("/out/src/a.rs") && c == b"hello")
            .times(1)
            .returning(|_, _| Ok(()));
        let prompter = batch();

        let action = FileMaterializer::new(&fs, &prompter, false)
            .write(Path::new("/out/src/a.rs"), content, ConflictPolicy::Keep)
            .unwrap();
        assert_eq!(action, FileAction::Created);
    }

    #[test]
    fn overwrite_without_force_is_skipped_unattended() {
        let mut fs = existing(true);
        fs.expect_write_file().never();
        let prompter = batch();

        let action = FileMaterializer::new(&fs, &prompter, false)
            .write(Path::new("/out/a"), content, ConflictPolicy::Overwrite)
            .unwrap();
        assert_eq!(action, FileAction::Skipped(SkipReason::NotConfirmed));
    }

    #[test]
    fn overwrite_with_force_replaces() {
        let mut fs = existing(true);
        fs.expect_write_file().times(1).returning(|_, _| Ok(()));
        let prompter = batch();

        let action = FileMaterializer::new(&fs, &prompter, true)
            .write(Path::new("/out/a"), content, ConflictPolicy::Overwrite)
            .unwrap();
        assert_eq!(action, FileAction::Overwritten);
    }

    #[test]
    fn overwrite_asks_when_interactive() {
        for (answer, expected) in [
            (true, FileAction::Overwritten),
            (false, FileAction::Skipped(SkipReason::Declined)),
        ] {
            let mut fs = existing(true);
            fs.expect_write_file()
                .times(usize::from(answer))
                .returning(|_, _| Ok(()));
            let mut prompter = MockPrompter::new();
            prompter.expect_is_interactive().return_const(true);
            prompter
                .expect_confirm()
                .withf(|q: &str| q.contains("/out/a"))
                .times(1)
                .returning(move |_| Ok(answer));

            let action = FileMaterializer::new(&fs, &prompter, false)
                .write(Path::new("/out/a"), content, ConflictPolicy::Overwrite)
                .unwrap();
            assert_eq!(action, expected);
        }
    }

    #[test]
    fn append_appends_to_existing_files() {
        let mut fs = existing(true);
        fs.expect_append_file().times(1).returning(|_, _| Ok(()));
        fs.expect_write_file().never();
        let prompter = batch();

        let action = FileMaterializer::new(&fs, &prompter, false)
            .write(Path::new("/out/.gitignore"), content, ConflictPolicy::Append)
            .unwrap();
        assert_eq!(action, FileAction::Appended);
    }

    #[test]
    fn render_failures_are_skips() {
        let mut fs = existing(false);
        fs.expect_write_file().never();
        let prompter = batch();

        let action = FileMaterializer::new(&fs, &prompter, false)
            .write(
                Path::new("/out/a"),
                || {
                    Err(ApplicationError::RenderingFailed {
                        reason: "unclosed tag".into(),
                    }
                    .into())
                },
                ConflictPolicy::Overwrite,
            )
            .unwrap();
        assert!(matches!(
            action,
            FileAction::Skipped(SkipReason::RenderFailed(ref r)) if r.contains("unclosed tag")
        ));
    }

    #[test]
    fn write_failures_are_fatal() {
        let mut fs = existing(false);
        fs.expect_write_file().returning(|p, _| {
            Err(ApplicationError::FilesystemError {
                path: PathBuf::from(p),
                reason: "disk full".into(),
            }
            .into())
        });
        let prompter = batch();

        let result = FileMaterializer::new(&fs, &prompter, false).write(
            Path::new("/out/a"),
            content,
            ConflictPolicy::Overwrite,
        );
        assert!(result.is_err());
    }
}
