//! # CarePulse Core
//!
//! 患者登记系统的核心模块，提供基础数据结构、参考数据、错误定义和通用工具。

pub mod error;
pub mod models;
pub mod reference;
pub mod utils;

pub use error::{CarePulseError, Result};
pub use models::*;
pub use reference::{Doctor, ReferenceData};
