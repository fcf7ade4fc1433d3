//! Project path encoding used by Claude Code's history directory.
//!
//! Claude Code stores sessions for `/home/user/my-project` under
//! `~/.claude/projects/-home-user-my-project/`.

use std::path::{Path, PathBuf};

/// Encode a project path the way Claude Code names its history directory.
pub fn encode_project_path(path: &Path) -> String {
    path.to_string_lossy().replace('/', "-")
}

/// Best-effort inverse of [`encode_project_path`].
///
/// The encoding is lossy because directory names may contain dashes, so the
/// path is rebuilt greedily against what exists on disk: a dash is kept
/// inside a component when the combined name exists, and becomes a
/// separator when the split path exists. When neither exists the parts are
/// combined unless the path so far is a real directory.
pub fn decode_project_path(encoded: &str) -> PathBuf {
    decode_with(encoded, |p| p.exists())
}

fn decode_with(encoded: &str, exists: impl Fn(&Path) -> bool) -> PathBuf {
    let Some(rest) = encoded.strip_prefix('-') else {
        return PathBuf::from(encoded);
    };

    let absolute = |parts: &[&str]| PathBuf::from(format!("/{}", parts.join("/")));

    let mut components: Vec<String> = Vec::new();
    let mut current = String::new();

    for part in rest.split('-') {
        if current.is_empty() {
            current = part.to_string();
            continue;
        }

        let combined = format!("{}-{}", current, part);

        let (combined_path, separate_path, parent_path) = {
            let mut parts: Vec<&str> = components.iter().map(String::as_str).collect();
            parts.push(&current);
            let parent_path = absolute(&parts);
            parts.push(part);
            let separate_path = absolute(&parts);

            parts.truncate(components.len());
            parts.push(&combined);
            (absolute(&parts), separate_path, parent_path)
        };

        if exists(&combined_path) {
            current = combined;
        } else if exists(&separate_path) || exists(&parent_path) {
            components.push(std::mem::replace(&mut current, part.to_string()));
        } else {
            current = combined;
        }
    }

    if !current.is_empty() {
        components.push(current);
    }

    let parts: Vec<&str> = components.iter().map(String::as_str).collect();
    absolute(&parts)
}
