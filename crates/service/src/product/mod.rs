//! Product catalog: domain types, repository, validators and the service.
//!
//! Layout follows the usual three layers (domain, repository, service); the
//! sea-orm adapter lives under `repo`.

pub mod domain;
pub mod repository;
pub mod repo;
pub mod validation;
pub mod service;

pub use domain::{CreateProductRequest, Product, ProductFilter, ProductSearchRequest, UpdateProductRequest};
pub use repository::ProductRepository;
pub use service::ProductService;
