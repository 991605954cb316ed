//! End-to-end tests for the LDAP query element live under `tests/`.
