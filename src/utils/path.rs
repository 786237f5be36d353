//! Lexical path checks.

use std::path::{Component, Path};

/// Whether `relative`, joined onto a directory, stays inside it.
///
/// Purely lexical, nothing is resolved on disk: `js/../app.js` stays inside,
/// `js/../../app.js` and `/app.js` do not.
pub fn stays_within(relative: &Path) -> bool {
    let mut depth = 0usize;
    for component in relative.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => match depth.checked_sub(1) {
                Some(up) => depth = up,
                None => return false,
            },
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    true
}
