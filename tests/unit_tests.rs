//! Entry point for the component-level test suite under `tests/unit/`.

mod unit;
