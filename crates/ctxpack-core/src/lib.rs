//! Core types and configuration for ctxpack.
//!
//! This crate defines the `ctxpack.toml` schema ([`CtxpackConfig`]),
//! the image-metadata lookup seam ([`ImageConfigFetcher`]), and shared
//! error types.

pub mod config;
pub mod error;
pub mod image;

pub use config::{BuildArgs, BuildConfig, ContextConfig, CtxpackConfig, parse_build_arg};
pub use error::{Error, Result};
pub use image::{ImageConfigFetcher, ImageFetchError, InsecureRegistries};
