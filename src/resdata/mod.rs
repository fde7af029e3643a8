//! Core reservoir-data storage engine.
//!
//! Layered bottom-up: the record codec ([`stream`]) frames a physical file
//! into length-prefixed records; the keyword layer ([`keyword`]) reads and
//! writes named, typed, counted array blocks through it; the grid layer
//! ([`grid`], [`index`], [`lgr`], [`nnc`], [`fault_block`]) builds the
//! corner-point grid model on top. Consumers query the grid layer only and
//! never see the record codec directly.

pub mod cache;
pub mod error;
pub mod fault_block;
mod formatted;
pub mod grid;
pub mod index;
pub mod keyword;
pub mod lgr;
pub mod nnc;
pub mod stream;

pub use cache::{CacheEntry, KeywordCache};
pub use error::{ResdataError, Result};
pub use fault_block::{CornerPoint, FaultBlockLayer};
pub use grid::{Grid, MAIN_GRID_ID};
pub use index::{ActiveIndexMap, GridDims};
pub use keyword::{Keyword, KwData, KwHeader, KwType};
pub use lgr::{LgrNode, MAIN_GRID_NAME};
pub use nnc::{NncInfo, NncVector};
pub use stream::{Endian, RecordStream, MAX_RECORD_BYTES};
