//! Workspace-level integration tests for smallmp. See `tests/`.
