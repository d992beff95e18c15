//! Database-level tests that need a real Postgres server (Docker).
