pub mod memory;
pub mod repository;
pub mod scylla;

pub use memory::InMemoryOrderRepository;
pub use repository::{OrderRepository, RepositoryError};
pub use scylla::ScyllaOrderRepository;
