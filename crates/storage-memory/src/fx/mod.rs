mod repository;

pub use repository::InMemoryFxRepository;
