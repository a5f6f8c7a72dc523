//! Server-rendered pages: forms, session cookie handling and flash notices.

pub(crate) mod error;
pub(crate) mod flash;
pub(crate) mod forms;
pub(crate) mod handlers;
pub(crate) mod render;
pub(crate) mod routes;
pub(crate) mod views;
