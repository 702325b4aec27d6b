//! HTTP JSON API, enabled with `--ui web`.

mod server;

pub use server::{
    ApiError, DashboardHandle, DashboardServer, DashboardStatus, OWNER_HEADER, build_router,
    start_server, start_server_with_retry, status_for,
};
