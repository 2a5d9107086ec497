use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::models::{Category, GroupListing, StudentHandle};

pub const DEFAULT_MAX_IN_FLIGHT: usize = 4;

fn empty_listing() -> GroupListing {
    Category::ALL
        .into_iter()
        .map(|category| (category, Vec::new()))
        .collect()
}

/// One participant per line, either a handle or an email. The result is
/// sorted and de-duplicated.
pub fn parse_roster(text: &str) -> Vec<StudentHandle> {
    let mut roster: Vec<StudentHandle> = text.lines().filter_map(StudentHandle::new).collect();
    roster.sort();
    roster.dedup();
    roster
}

pub async fn load_roster(path: &Path) -> anyhow::Result<Vec<StudentHandle>> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read roster {}", path.display()))?;
    let roster = parse_roster(&text);
    if roster.is_empty() {
        anyhow::bail!("roster {} lists no students", path.display());
    }
    tracing::info!(path = %path.display(), students = roster.len(), "roster loaded");
    Ok(roster)
}

async fn list_category(root: PathBuf, category: Category) -> anyhow::Result<Vec<String>> {
    let dir = root.join(category.as_str());
    let mut entries = match tokio::fs::read_dir(&dir).await {
        Ok(entries) => entries,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(dir = %dir.display(), "category directory missing, treating as empty");
            return Ok(Vec::new());
        }
        Err(error) => {
            return Err(error).with_context(|| format!("failed to list {}", dir.display()));
        }
    };

    let mut names = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .with_context(|| format!("failed to list {}", dir.display()))?
    {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        names.push(name);
    }
    names.sort();
    Ok(names)
}

/// Lists `root/<category>/` for every category, at most `max_in_flight`
/// directories at a time. Fails as a whole if any listing fails or if
/// `root` itself is not a directory.
pub async fn scan_contributions(root: &Path, max_in_flight: usize) -> anyhow::Result<GroupListing> {
    let metadata = tokio::fs::metadata(root)
        .await
        .with_context(|| format!("contributions root {} is not readable", root.display()))?;
    if !metadata.is_dir() {
        anyhow::bail!("contributions root {} is not a directory", root.display());
    }

    let permits = Arc::new(Semaphore::new(max_in_flight.max(1)));
    let mut tasks = JoinSet::new();

    for category in Category::ALL {
        let permits = Arc::clone(&permits);
        let root = root.to_path_buf();
        tasks.spawn(async move {
            let _permit = permits.acquire_owned().await?;
            let names = list_category(root, category).await?;
            anyhow::Ok((category, names))
        });
    }

    let mut listing = empty_listing();
    while let Some(joined) = tasks.join_next().await {
        let (category, names) = joined.context("directory listing task failed")??;
        tracing::debug!(%category, entries = names.len(), "category listed");
        listing.insert(category, names);
    }

    Ok(listing)
}

/// Reads a `category,group` CSV export of the contributions tree.
pub fn load_groups_csv(path: &Path) -> anyhow::Result<GroupListing> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        category: String,
        group: String,
    }

    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut listing = empty_listing();

    // Record 0 sits on line 2, after the header.
    for (record, result) in reader.deserialize::<CsvRow>().enumerate() {
        let line = record + 2;
        let row = result.with_context(|| format!("bad line {line} in {}", path.display()))?;
        let category: Category = row
            .category
            .parse()
            .map_err(|message: String| anyhow::anyhow!(message))
            .with_context(|| format!("bad line {line} in {}", path.display()))?;
        listing.entry(category).or_default().push(row.group);
    }

    tracing::info!(
        path = %path.display(),
        entries = listing.values().map(Vec::len).sum::<usize>(),
        "group listing loaded"
    );
    Ok(listing)
}
