pub mod microdata_api;
