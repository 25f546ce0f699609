pub mod config;

pub mod domain {
    pub mod catalog;
    pub mod error;
    pub mod model {
        pub mod book;
        pub mod bookmark;
        pub mod id;
        pub mod progress;
    }
    pub mod repository;
}

pub mod application {
    pub mod error;
    pub mod reader;
    pub mod service;
}

pub mod infra {
    pub mod catalog_file;
    pub mod json_store;
    pub mod memory_store;
}

pub mod interface {
    pub mod mcp;
    pub mod view;
}
