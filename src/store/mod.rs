pub mod alarms;
pub mod db;
pub mod lock;
pub mod repo;
pub mod schema;
pub mod tags;
pub mod tasks;

pub use db::TodoDb;
