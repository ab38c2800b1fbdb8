mod repository;

pub use repository::InMemoryFeeConfigRepository;
