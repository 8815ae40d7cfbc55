use std::path::Path;

use colored::Colorize;

use crate::commands::open_for_write;
use crate::error::{Result, TodoError};
use crate::model::Tag;
use crate::output::{self, Format};
use crate::store::repo::Repo;
use crate::tags::TagManager;

fn lookup(tags: &TagManager<'_>, id_or_name: &str) -> Result<Tag> {
    tags.resolve(id_or_name)?
        .ok_or_else(|| TodoError::TagNotFound(id_or_name.trim().to_string()))
}

pub fn add(data_dir: &Path, name: &str, color: Option<&str>, format: Format) -> Result<()> {
    let (repo, _lock) = open_for_write(data_dir)?;
    let tag = TagManager::new(&repo.db).create_tag(name, color)?;
    output::print_tag(&tag, format)
}

pub fn list(data_dir: &Path, query: Option<&str>, format: Format) -> Result<()> {
    let repo = Repo::open(data_dir)?;
    let tags = TagManager::new(&repo.db).search_tags(query.unwrap_or(""))?;
    output::print_tags(&tags, format)
}

pub fn rename(
    data_dir: &Path,
    id_or_name: &str,
    name: Option<&str>,
    color: Option<&str>,
    format: Format,
) -> Result<()> {
    let (repo, _lock) = open_for_write(data_dir)?;
    let tags = TagManager::new(&repo.db);
    let mut tag = lookup(&tags, id_or_name)?;
    if let Some(name) = name {
        tag.name = name.trim().to_string();
    }
    if let Some(color) = color {
        tag.color = color.to_string();
    }
    if !tags.update_tag(&tag)? {
        return Err(TodoError::TagNotFound(tag.id.to_string()));
    }
    output::print_tag(&tag, format)
}

pub fn delete(data_dir: &Path, id_or_name: &str, format: Format) -> Result<()> {
    let (repo, _lock) = open_for_write(data_dir)?;
    let tags = TagManager::new(&repo.db);
    let tag = lookup(&tags, id_or_name)?;
    tags.delete_tag(tag.id)?;
    match format {
        Format::Json => println!("{}", serde_json::json!({ "deleted": tag.id, "name": tag.name })),
        Format::Pretty => println!("{} tag {}", "Deleted".red(), tag.name.bold()),
        Format::Minimal => println!("{}", tag.id),
    }
    Ok(())
}

/// Link a tag to a task, creating the tag first when given an unknown name.
pub fn attach(data_dir: &Path, task_id: i64, id_or_name: &str, format: Format) -> Result<()> {
    let (repo, _lock) = open_for_write(data_dir)?;
    if repo.db.get_task_by_id(task_id)?.is_none() {
        return Err(TodoError::TaskNotFound(task_id));
    }
    let tags = TagManager::new(&repo.db);
    let tag = match tags.resolve(id_or_name)? {
        Some(tag) => tag,
        None => tags.get_or_create_tag(id_or_name)?,
    };
    let linked = repo.db.add_task_tag(task_id, tag.id)?;
    print_link(&repo, task_id, &tag, linked, format)
}

pub fn detach(data_dir: &Path, task_id: i64, id_or_name: &str, format: Format) -> Result<()> {
    let (repo, _lock) = open_for_write(data_dir)?;
    let tag = lookup(&TagManager::new(&repo.db), id_or_name)?;
    let unlinked = repo.db.remove_task_tag(task_id, tag.id)?;
    print_link(&repo, task_id, &tag, unlinked, format)
}

fn print_link(repo: &Repo, task_id: i64, tag: &Tag, changed: bool, format: Format) -> Result<()> {
    let current = repo.db.get_tags_for_task(task_id)?;
    match format {
        Format::Json => println!(
            "{}",
            serde_json::json!({
                "task_id": task_id,
                "tag": tag,
                "changed": changed,
                "tags": current,
            })
        ),
        Format::Pretty => {
            let state = if changed { "updated".green() } else { "unchanged".dimmed() };
            println!("{} {} [{}]", format!("#{task_id}").cyan(), state, output::tag_names(&current));
        }
        Format::Minimal => println!("{}", output::tag_names(&current)),
    }
    Ok(())
}
