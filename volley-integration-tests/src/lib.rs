//! End-to-end tests driving the engine against an in-process echo server.
//! All of the content lives in `tests/`.
