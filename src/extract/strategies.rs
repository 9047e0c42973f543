//! Layout heuristics, tried in order until one locates the binary.

use super::{Located, SearchContext, fallback};
use crate::error::Result;
use archivefs::ArchiveView;

/// A named way of locating a binary inside an archive.
#[derive(Clone, Copy)]
pub struct Strategy {
    /// Name used in logs and in "not found" errors.
    pub name: &'static str,
    find: fn(&dyn ArchiveView, &SearchContext<'_>) -> Result<Option<Located>>,
}

impl Strategy {
    /// Run the strategy. `None` means it did not apply or found nothing.
    pub fn find(&self, view: &dyn ArchiveView, ctx: &SearchContext<'_>) -> Result<Option<Located>> {
        (self.find)(view, ctx)
    }
}

impl std::fmt::Debug for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Strategy").field(&self.name).finish()
    }
}

/// All strategies, in the order they are tried.
pub const STRATEGIES: [Strategy; 5] = [
    Strategy {
        name: "direct-name",
        find: direct_name,
    },
    Strategy {
        name: "archive-name",
        find: archive_name,
    },
    Strategy {
        name: "path-override",
        find: path_override,
    },
    Strategy {
        name: "top-level-dir",
        find: top_level_dir,
    },
    Strategy {
        name: "raw-tar-stream",
        find: fallback::raw_tar_stream,
    },
];

fn entry_if_file(view: &dyn ArchiveView, path: String) -> Option<Located> {
    view.is_file(&path).then_some(Located::Entry(path))
}

/// `name` at the archive root.
fn direct_name(view: &dyn ArchiveView, ctx: &SearchContext<'_>) -> Result<Option<Located>> {
    Ok(entry_if_file(view, ctx.binary.to_string()))
}

/// The archive's own file name at the root; single compressed files are
/// exposed that way.
fn archive_name(view: &dyn ArchiveView, ctx: &SearchContext<'_>) -> Result<Option<Located>> {
    Ok(ctx
        .archive_name()
        .and_then(|name| entry_if_file(view, name.to_string())))
}

fn path_override(view: &dyn ArchiveView, ctx: &SearchContext<'_>) -> Result<Option<Located>> {
    Ok(ctx
        .path_override
        .and_then(|path| entry_if_file(view, path.to_string())))
}

/// A single root directory holding `name`, `bin/name` or the override.
fn top_level_dir(view: &dyn ArchiveView, ctx: &SearchContext<'_>) -> Result<Option<Located>> {
    let root = view.root_entries();
    let [entry] = root.as_slice() else {
        log::debug!(
            "{}: {} top-level entries, skipping top-level-dir",
            ctx.binary,
            root.len()
        );
        return Ok(None);
    };
    if !entry.is_dir() {
        return Ok(None);
    }

    let dir = entry.name.as_str();
    let mut candidates = vec![
        format!("{dir}/{}", ctx.binary),
        format!("{dir}/bin/{}", ctx.binary),
    ];
    if let Some(path) = ctx.path_override {
        candidates.push(format!("{dir}/{path}"));
    }

    Ok(candidates
        .into_iter()
        .find_map(|candidate| entry_if_file(view, candidate)))
}
