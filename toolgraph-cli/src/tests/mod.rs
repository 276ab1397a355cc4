//! Unit tests for toolgraph-cli, organized by module.
