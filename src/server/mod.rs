pub mod app;
pub mod deserializers;
pub mod pagination;
pub mod quiz;
pub mod routes;
