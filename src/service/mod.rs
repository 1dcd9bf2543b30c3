//! Record stores: the generic CRUD protocol and its entity and dictionary instantiations.

mod crud;
mod dictionary;
mod entity;

pub use crud::RecordStore;
pub use dictionary::DictionaryStore;
pub use entity::EntityStore;
