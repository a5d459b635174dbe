mod handler;

pub use handler::{create, destroy, filter, retrieve, update};
