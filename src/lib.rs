//! # resdata-reader
//!
//! A reader/writer for ECLIPSE-style binary reservoir data files: the
//! Fortran-sequential record codec, the named/typed keyword blocks framed by
//! it, and the corner-point grid model (active cell indexing, nested local
//! grid refinements, non-neighbor connections, fault block layers) built on
//! top.
pub mod resdata;

// Re-export the main types for convenience
pub use resdata::{
    ActiveIndexMap, CacheEntry, Endian, FaultBlockLayer, Grid, GridDims, Keyword, KeywordCache,
    KwData, KwHeader, KwType, LgrNode, NncInfo, NncVector, RecordStream, ResdataError, Result,
};
