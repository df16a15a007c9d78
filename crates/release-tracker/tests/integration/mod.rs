#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_lines)]

mod helpers;
mod upsert_http_tests;
