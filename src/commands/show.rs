use std::path::Path;

use crate::error::{Result, TodoError};
use crate::output::{self, Format};
use crate::store::repo::Repo;

pub fn run(data_dir: &Path, id: i64, format: Format) -> Result<()> {
    let repo = Repo::open(data_dir)?;
    let task = repo
        .db
        .get_task_by_id(id)?
        .ok_or(TodoError::TaskNotFound(id))?;
    output::print_task(&task, format)
}
