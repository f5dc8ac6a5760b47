#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Standalone entry point for the CrowdWatch API server.
//!
//! Configuration comes from the environment (or `.env`): `BIND_ADDR`,
//! `PORT`, `AI_PROVIDER`, `AI_MODEL`, `AI_BASE_URL` and the provider
//! credentials.

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    crowdwatch_server::run_server().await
}
