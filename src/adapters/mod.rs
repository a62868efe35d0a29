// Adapters layer: the two backends behind `DatabaseAdapter`, and the factory that picks one.

pub mod factory;
pub mod local;
pub mod local_store;
pub mod realtime;
pub mod remote;
pub mod rest_client;

pub use factory::{create_adapter, Adapter};
pub use local::LocalAdapter;
pub use local_store::LocalStore;
pub use remote::{RemoteAdapter, RemoteSettings};
