// Domain layer: canonical model, table catalogue, and the adapter contract (port).

pub mod events;
pub mod filter;
pub mod model;
pub mod ports;
pub mod table;
