mod repository;

pub use repository::InMemoryAuditRepository;
