pub mod collect;

pub use collect::handle_collect;
