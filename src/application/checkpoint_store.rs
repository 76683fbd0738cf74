// Persistence trait for the incremental migration high-water mark
use crate::domain::measurement::RowId;

pub trait CheckpointStore: Send + Sync {
    /// Last saved row id, or `None` when nothing has been saved yet
    fn load(&self) -> anyhow::Result<Option<RowId>>;

    /// Replace the saved row id
    fn save(&self, id: RowId) -> anyhow::Result<()>;
}
