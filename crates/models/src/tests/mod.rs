/// Product table CRUD, soft delete and search tests
pub mod product_tests;
