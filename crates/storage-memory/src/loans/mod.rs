mod repository;

pub use repository::InMemoryLoanRepository;
