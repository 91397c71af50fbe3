mod store;

pub use store::MemoryRoleStore;
