#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for OCR operations.
pub const TRACING_TARGET_OCR: &str = "ocrsim_core::ocr";

/// Tracing target for batch orchestration.
pub const TRACING_TARGET_BATCH: &str = "ocrsim_core::ocr::batch";

mod error;

pub mod ocr;

pub use error::{BoxedError, Error, ErrorKind, Result};
