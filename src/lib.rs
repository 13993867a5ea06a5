//! Access-controlled management backend for a face-recognition training
//! pipeline: users and role-based menu access, per-user face datasets kept in
//! an object store, training jobs dispatched over a message queue, and a
//! cached key-value parameter registry.

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod keyed_lock;
pub mod queue;
pub mod routes;
pub mod state;
pub mod storage;
pub mod store;
pub mod testing;

pub mod crypto {
    pub mod password;
    pub mod token;
}

pub mod models {
    pub mod dataset;
    pub mod param;
    pub mod role;
    pub mod session;
    pub mod training;
    pub mod user;
}

pub mod repositories {
    pub mod dataset;
    pub mod param;
    pub mod role;
    pub mod training;
    pub mod user;
}

pub mod services {
    pub mod access;
    pub mod auth;
    pub mod datasets;
    pub mod params;
    pub mod roles;
    pub mod training;
}

pub mod handlers {
    pub mod auth;
    pub mod datasets;
    pub mod params;
    pub mod response;
    pub mod roles;
    pub mod users;
}

pub mod middleware_layer {
    pub mod auth;
}

pub mod validation {
    pub mod auth;
}
