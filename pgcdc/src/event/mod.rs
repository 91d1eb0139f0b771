pub mod event;
pub mod operation;
pub mod row_id;

pub use event::Event;
pub use operation::Operation;
pub use row_id::RowId;
