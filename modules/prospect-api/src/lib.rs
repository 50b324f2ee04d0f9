pub mod rest;
pub mod routes;
