//! Step definitions for reviewer assignment scenarios.

mod then;
