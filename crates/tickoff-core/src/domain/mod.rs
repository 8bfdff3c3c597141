//! Domain model (ids, todo entity, caller identity).

pub mod ids;
pub mod todo;
pub mod user;

pub use ids::{Id, IdMarker, TodoId, UserId};
pub use todo::{NewTodo, Todo, TodoPatch, TodoStatus};
pub use user::{Role, Viewer};
