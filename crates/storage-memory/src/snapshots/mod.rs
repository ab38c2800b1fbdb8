mod repository;

pub use repository::InMemorySnapshotRepository;
